//! NotifyEnter / NotifyExit messages.

use flags_event_system::{Area, Flag, Player};
use tracing::debug;

/// Which message a transition produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Enter,
    Exit,
}

/// Sends at most one of the enter and exit messages.
///
/// The enter message wins when both apply. Owners of the area in question
/// are never notified about their own area.
pub fn notify_transition(
    entered: &dyn Area,
    left: &dyn Area,
    player: &dyn Player,
    notify_enter: Option<&Flag>,
    notify_exit: Option<&Flag>,
) -> Option<Notification> {
    if let Some(flag) = notify_enter {
        if entered.value(flag) && !entered.is_owner(player.name()) {
            player.send_message(&entered.message(flag, Some(player.name())));
            debug!("👋 {} entered {}", player.name(), entered.name());
            return Some(Notification::Enter);
        }
    }

    if let Some(flag) = notify_exit {
        if left.value(flag) && !left.is_owner(player.name()) {
            player.send_message(&left.message(flag, Some(player.name())));
            debug!("👋 {} left {}", player.name(), left.name());
            return Some(Notification::Exit);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use flags_event_system::testing::{TestArea, TestPlayer};
    use flags_event_system::FlagDefinition;

    fn flag(name: &str, message: &str) -> Flag {
        Flag::new(
            name,
            "BorderPatrol",
            &FlagDefinition {
                description: String::new(),
                default: false,
                area_message: message.to_string(),
                world_message: message.to_string(),
            },
        )
    }

    #[test]
    fn test_owner_entering_own_area_falls_through_to_exit() {
        let enter = flag("NotifyEnter", "Welcome to {AreaName}");
        let exit = flag("NotifyExit", "Goodbye from {AreaName}");
        let player = TestPlayer::new("alice");
        let home = TestArea::owned("claim", "Home", &["alice"]).with_value("NotifyEnter", true);
        let market = TestArea::owned("claim", "Market", &["carol"]).with_value("NotifyExit", true);

        let sent = notify_transition(&home, &market, &player, Some(&enter), Some(&exit));

        assert_eq!(sent, Some(Notification::Exit));
        assert_eq!(player.messages(), vec!["Goodbye from Market".to_string()]);
    }

    #[test]
    fn test_non_ownable_area_notifies_everyone() {
        let enter = flag("NotifyEnter", "Welcome to {AreaName}");
        let player = TestPlayer::new("alice");
        let plaza = TestArea::new("region", "Plaza").with_value("NotifyEnter", true);
        let world = TestArea::world("world");

        let sent = notify_transition(&plaza, &world, &player, Some(&enter), None);

        assert_eq!(sent, Some(Notification::Enter));
    }

    #[test]
    fn test_unregistered_flags_send_nothing() {
        let player = TestPlayer::new("alice");
        let plaza = TestArea::new("region", "Plaza").with_value("NotifyEnter", true);
        let world = TestArea::world("world");

        assert_eq!(notify_transition(&plaza, &world, &player, None, None), None);
        assert!(player.messages().is_empty());
    }
}
