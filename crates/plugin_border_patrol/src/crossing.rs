//! AllowEntry / AllowLeave decisions.

use crate::suppression::NotifiedPlayers;
use flags_event_system::{Area, Flag, Player, TaskScheduler};
use std::sync::Arc;
use tracing::debug;

/// Whether `player` may cross the border of `area` under `flag`.
///
/// An unresolved flag never blocks anyone. Otherwise the area's value, the
/// flag's bypass permission and the area's trust list each allow the
/// crossing on their own.
pub fn crossing_allowed(area: &dyn Area, player: &dyn Player, flag: Option<&Flag>) -> bool {
    let Some(flag) = flag else {
        return true;
    };

    area.value(flag)
        || player.has_permission(&flag.bypass_permission())
        || area.has_trust(flag, player)
}

/// Sends denial messages, at most one per player per suppression window.
#[derive(Clone)]
pub struct DenialNotifier {
    notified: Arc<NotifiedPlayers>,
    scheduler: Arc<TaskScheduler>,
}

impl DenialNotifier {
    pub fn new(notified: Arc<NotifiedPlayers>, scheduler: Arc<TaskScheduler>) -> Self {
        Self {
            notified,
            scheduler,
        }
    }

    pub fn notified(&self) -> &Arc<NotifiedPlayers> {
        &self.notified
    }

    /// Like [`crossing_allowed`], but tells a denied player why.
    ///
    /// The area's message for `flag` is sent only if the player is outside
    /// any suppression window; sending it opens a new window.
    pub fn check(&self, area: &dyn Area, player: &dyn Player, flag: Option<&Flag>) -> bool {
        if crossing_allowed(area, player, flag) {
            return true;
        }

        if let Some(flag) = flag {
            if self.notified.suppress(player.id(), &self.scheduler) {
                player.send_message(&area.message(flag, Some(player.name())));
                debug!("🚫 {} denied by {} in {}", player.name(), flag.name(), area.name());
            }
        }
        false
    }
}

impl std::fmt::Debug for DenialNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DenialNotifier")
            .field("notified", &self.notified.len())
            .finish()
    }
}
