//! Flight rule.

use flags_event_system::{Area, Flag, GameMode, Player, ServerContext, TeleportCause};
use tracing::debug;

/// What the flight rule did to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightOutcome {
    /// Flight is not managed here: global flight, creative mode or no flag
    Skipped,
    Granted,
    AlreadyAllowed,
    /// Bypass permission or trust keeps the current state
    Exempt,
    /// Was flying; brought down and flight revoked
    Landed,
    Revoked,
}

/// Applies the destination area's Flight setting to `player`.
pub fn adjust_flight(
    context: &dyn ServerContext,
    area: &dyn Area,
    player: &dyn Player,
    flag: Option<&Flag>,
) -> FlightOutcome {
    if context.allow_flight() || player.game_mode() == GameMode::Creative {
        return FlightOutcome::Skipped;
    }
    let Some(flag) = flag else {
        return FlightOutcome::Skipped;
    };

    if area.value(flag) {
        if player.allow_flight() {
            return FlightOutcome::AlreadyAllowed;
        }
        player.send_message(&area.message(flag, None));
        player.set_allow_flight(true);
        debug!("🕊️ Flight granted to {} in {}", player.name(), area.name());
        return FlightOutcome::Granted;
    }

    if player.has_permission(&flag.bypass_permission()) || area.has_trust(flag, player) {
        return FlightOutcome::Exempt;
    }

    let landed = player.is_flying();
    if landed {
        let ground = context.highest_block_at(&player.location()).add(0.0, 1.0, 0.0);
        if !player.teleport(ground, TeleportCause::Plugin) {
            debug!("Teleport of {} to the ground was refused", player.name());
        }
        player.set_flying(false);
    }
    player.set_allow_flight(false);

    if landed {
        debug!("🪂 {} brought down in {}", player.name(), area.name());
        FlightOutcome::Landed
    } else {
        FlightOutcome::Revoked
    }
}
