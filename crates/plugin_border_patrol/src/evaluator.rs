//! Border rule evaluation for area transitions.

use crate::config::{BorderPatrolConfig, DoorbellSettings};
use crate::crossing::{crossing_allowed, DenialNotifier};
use crate::doorbell;
use crate::flags::BorderFlags;
use crate::flight::{adjust_flight, FlightOutcome};
use crate::notify::{notify_transition, Notification};
use crate::suppression::NotifiedPlayers;
use flags_event_system::{Cancellable, PlayerChangedAreaEvent, ServerContext};
use std::sync::Arc;
use tracing::debug;

/// Everything the monitor pass did for one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub notification: Option<Notification>,
    pub doorbell_rang: bool,
    pub flight: FlightOutcome,
}

/// Applies Border Patrol's rules to area transitions.
///
/// Owns the suppression set shared by the entry and exit checks.
pub struct BorderEvaluator {
    context: Arc<dyn ServerContext>,
    flags: BorderFlags,
    denials: DenialNotifier,
    doorbell: DoorbellSettings,
}

impl BorderEvaluator {
    pub fn new(context: Arc<dyn ServerContext>, flags: BorderFlags, config: &BorderPatrolConfig) -> Self {
        let notified = Arc::new(NotifiedPlayers::new(config.suppression_window()));
        let denials = DenialNotifier::new(notified, context.scheduler());

        Self {
            context,
            flags,
            denials,
            doorbell: config.doorbell.clone(),
        }
    }

    pub fn flags(&self) -> &BorderFlags {
        &self.flags
    }

    pub fn notified(&self) -> &Arc<NotifiedPlayers> {
        self.denials.notified()
    }

    /// Cancellable pass: vetoes the transition if the player may not enter
    /// the new area or may not leave the old one.
    ///
    /// Both directions are checked even when the first fails; the shared
    /// suppression set keeps it to one message.
    pub fn evaluate_crossing(&self, event: &mut PlayerChangedAreaEvent) -> bool {
        let player = event.player().as_ref();
        let entry_allowed =
            self.denials
                .check(event.area().as_ref(), player, self.flags.allow_entry.as_ref());
        let leave_allowed =
            self.denials
                .check(event.area_left().as_ref(), player, self.flags.allow_leave.as_ref());

        let allowed = entry_allowed && leave_allowed;
        if !allowed {
            debug!(
                "⛔ Vetoed move of {} from {} to {}",
                player.name(),
                event.area_left().name(),
                event.area().name()
            );
            event.set_cancelled(true);
        }
        allowed
    }

    /// Whether both crossing rules allow the transition, without telling
    /// the player anything.
    pub fn crossing_permitted(&self, event: &PlayerChangedAreaEvent) -> bool {
        let player = event.player().as_ref();
        crossing_allowed(event.area().as_ref(), player, self.flags.allow_entry.as_ref())
            && crossing_allowed(
                event.area_left().as_ref(),
                player,
                self.flags.allow_leave.as_ref(),
            )
    }

    /// Monitor pass, for transitions that went through.
    pub fn after_crossing(&self, event: &PlayerChangedAreaEvent) -> TransitionOutcome {
        let player = event.player().as_ref();

        // A player about to be pushed back gets no welcome.
        let notification = if self.crossing_permitted(event) {
            notify_transition(
                event.area().as_ref(),
                event.area_left().as_ref(),
                player,
                self.flags.notify_enter.as_ref(),
                self.flags.notify_exit.as_ref(),
            )
        } else {
            None
        };

        let doorbell_rang = doorbell::ring(
            &self.context,
            event.area(),
            player,
            self.flags.doorbell.as_ref(),
            &self.doorbell,
        );

        let flight = adjust_flight(
            self.context.as_ref(),
            event.area().as_ref(),
            player,
            self.flags.flight.as_ref(),
        );

        TransitionOutcome {
            notification,
            doorbell_rang,
            flight,
        }
    }
}

impl std::fmt::Debug for BorderEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BorderEvaluator")
            .field("flags", &self.flags)
            .field("denials", &self.denials)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flags_event_system::testing::{TestArea, TestServer};
    use flags_event_system::Area;

    fn evaluator(server: &Arc<TestServer>) -> BorderEvaluator {
        let flags = BorderFlags::register(&*server.flag_registrar()).expect("flags");
        BorderEvaluator::new(server.context(), flags, &BorderPatrolConfig::default())
    }

    #[test]
    fn test_denied_exit_cancels_event() {
        let server = TestServer::new();
        let evaluator = evaluator(&server);
        let bob = server.add_player("bob");
        let jail: Arc<dyn Area> =
            Arc::new(TestArea::owned("claim", "Jail", &["warden"]).with_value("AllowLeave", false));

        let mut event = PlayerChangedAreaEvent::new(bob.clone(), server.world(), jail);

        assert!(!evaluator.evaluate_crossing(&mut event));
        assert!(event.is_cancelled());
        assert_eq!(
            bob.messages(),
            vec!["You are not allowed to leave warden's claim, bob.".to_string()]
        );
    }

    #[test]
    fn test_monitor_pass_skips_welcome_when_crossing_denied() {
        let server = TestServer::new();
        let evaluator = evaluator(&server);
        let bob = server.add_player("bob");
        let vault: Arc<dyn Area> = Arc::new(
            TestArea::owned("claim", "Vault", &["alice"])
                .with_value("AllowEntry", false)
                .with_value("NotifyEnter", true),
        );

        let event = PlayerChangedAreaEvent::new(bob.clone(), vault, server.world());
        let outcome = evaluator.after_crossing(&event);

        assert_eq!(outcome.notification, None);
        assert!(bob.messages().is_empty());
        assert!(evaluator.notified().is_empty());
    }

    #[test]
    fn test_open_transition_has_no_effects() {
        let server = TestServer::new();
        let evaluator = evaluator(&server);
        let bob = server.add_player("bob");
        let field: Arc<dyn Area> = Arc::new(TestArea::new("region", "Field"));

        let mut event = PlayerChangedAreaEvent::new(bob.clone(), field, server.world());

        assert!(evaluator.evaluate_crossing(&mut event));
        let outcome = evaluator.after_crossing(&event);
        assert_eq!(
            outcome,
            TransitionOutcome {
                notification: None,
                doorbell_rang: false,
                flight: FlightOutcome::Revoked,
            }
        );
        assert!(bob.messages().is_empty());
    }
}
