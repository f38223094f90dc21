//! Two-tone doorbell for area owners.

use crate::config::DoorbellSettings;
use flags_event_system::{Area, Flag, Player, ServerContext, Sound};
use std::sync::Arc;
use tracing::debug;

/// Rings the doorbell of `area` if `player` is a visitor.
///
/// Every online owner hears the first tone now. A single delayed task then
/// walks the owner list again and plays the second tone to the owners still
/// online at that point. Returns false when the bell did not ring.
pub fn ring(
    context: &Arc<dyn ServerContext>,
    area: &Arc<dyn Area>,
    player: &dyn Player,
    flag: Option<&Flag>,
    settings: &DoorbellSettings,
) -> bool {
    let Some(flag) = flag else {
        return false;
    };
    let Some(owners) = area.ownership() else {
        return false;
    };
    if !area.value(flag) || owners.contains(player.name()) {
        return false;
    }

    let first = settings.first_tone();
    let heard = play_to_online_owners(context.as_ref(), area.as_ref(), &first);
    debug!(
        "🔔 {} rang the doorbell of {} ({} owners online)",
        player.name(),
        area.name(),
        heard
    );

    let context_for_task = Arc::clone(context);
    let area_for_task = Arc::clone(area);
    let second = settings.second_tone();
    context.scheduler().run_later(
        "border_patrol::doorbell",
        settings.delay(),
        move || {
            play_to_online_owners(context_for_task.as_ref(), area_for_task.as_ref(), &second);
        },
    );
    true
}

/// Plays `sound` to each online owner at their own location.
fn play_to_online_owners(context: &dyn ServerContext, area: &dyn Area, sound: &Sound) -> usize {
    let Some(owners) = area.ownership() else {
        return 0;
    };

    let mut heard = 0;
    for owner in owners.iter().filter_map(|name| context.online_player(name)) {
        owner.play_sound(&owner.location(), sound);
        heard += 1;
    }
    heard
}

#[cfg(test)]
mod tests {
    use super::*;
    use flags_event_system::testing::{TestArea, TestServer};
    use flags_event_system::FlagDefinition;
    use std::time::{Duration, Instant};

    fn doorbell() -> Flag {
        Flag::new(
            "Doorbell",
            "BorderPatrol",
            &FlagDefinition {
                description: String::new(),
                default: false,
                area_message: String::new(),
                world_message: String::new(),
            },
        )
    }

    #[test]
    fn test_owner_does_not_ring_own_bell() {
        let server = TestServer::new();
        let alice = server.add_player("alice");
        let area: Arc<dyn Area> =
            Arc::new(TestArea::owned("claim", "Home", &["alice"]).with_value("Doorbell", true));

        let rang = ring(
            &server.context(),
            &area,
            &*alice,
            Some(&doorbell()),
            &DoorbellSettings::default(),
        );

        assert!(!rang);
        assert!(alice.sounds().is_empty());
        assert_eq!(server.task_scheduler().pending(), 0);
    }

    #[test]
    fn test_non_ownable_area_has_no_bell() {
        let server = TestServer::new();
        let bob = server.add_player("bob");
        let area: Arc<dyn Area> =
            Arc::new(TestArea::new("region", "Plaza").with_value("Doorbell", true));

        let rang = ring(
            &server.context(),
            &area,
            &*bob,
            Some(&doorbell()),
            &DoorbellSettings::default(),
        );

        assert!(!rang);
    }

    #[test]
    fn test_tones_use_configured_pitches() {
        let server = TestServer::new();
        let alice = server.add_player("alice");
        let bob = server.add_player("bob");
        let area: Arc<dyn Area> =
            Arc::new(TestArea::owned("claim", "Home", &["alice"]).with_value("Doorbell", true));
        let settings = DoorbellSettings {
            first_pitch: 1.5,
            second_pitch: 0.5,
            delay_ms: 200,
            ..DoorbellSettings::default()
        };

        assert!(ring(&server.context(), &area, &*bob, Some(&doorbell()), &settings));
        assert_eq!(server.task_scheduler().pending(), 1);

        server.run_tasks_until(Instant::now() + Duration::from_millis(250));

        let pitches: Vec<f32> = alice.sounds().iter().map(|(_, sound)| sound.pitch).collect();
        assert_eq!(pitches, vec![1.5, 0.5]);
        assert!(bob.sounds().is_empty());
    }
}
