//! Players recently shown a denial message.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use flags_event_system::{PlayerId, TaskScheduler};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

/// Time-windowed set of players who must not be sent another denial message.
///
/// Each entry carries the instant its window closes. Marking a player
/// schedules the removal of that one entry, so every player gets a full
/// window regardless of when the others were marked.
#[derive(Debug)]
pub struct NotifiedPlayers {
    entries: DashMap<PlayerId, Instant>,
    window: Duration,
}

impl NotifiedPlayers {
    pub fn new(window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn is_suppressed(&self, player: PlayerId) -> bool {
        self.entries.contains_key(&player)
    }

    /// Starts a window for `player` at `now`.
    ///
    /// Returns the window's deadline, or `None` if the player is already
    /// suppressed. An existing window is never extended.
    pub fn mark_notified(&self, player: PlayerId, now: Instant) -> Option<Instant> {
        match self.entries.entry(player) {
            Entry::Occupied(_) => None,
            Entry::Vacant(vacant) => {
                let deadline = now + self.window;
                vacant.insert(deadline);
                Some(deadline)
            }
        }
    }

    /// Marks `player` and schedules the end of its window.
    ///
    /// Returns false if the player was already suppressed.
    pub fn suppress(self: &Arc<Self>, player: PlayerId, scheduler: &TaskScheduler) -> bool {
        let Some(deadline) = self.mark_notified(player, Instant::now()) else {
            return false;
        };

        let notified = Arc::clone(self);
        scheduler.run_at("border_patrol::release_notified", deadline, move || {
            notified.release(player, deadline);
        });
        true
    }

    /// Ends the window that closes at `deadline`.
    ///
    /// A newer window for the same player is left alone.
    pub fn release(&self, player: PlayerId, deadline: Instant) -> bool {
        let removed = self
            .entries
            .remove_if(&player, |_, current| *current == deadline)
            .is_some();
        if removed {
            trace!("Suppression window closed for {}", player);
        }
        removed
    }

    /// Drops every entry whose window closed at or before `now`.
    pub fn clear_expired(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, deadline| *deadline > now);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
