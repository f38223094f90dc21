//! The flags Border Patrol registers and reads.

use crate::error::BorderPatrolError;
use flags_event_system::{Flag, FlagRegistry, ModuleFlags};
use tracing::{info, warn};

/// Identifier the flags are registered under.
pub const MODULE_GROUP: &str = "BorderPatrol";

/// Packaged flag definitions.
pub const DEFINITIONS: &str = include_str!("../resources/flags.toml");

pub const ALLOW_ENTRY: &str = "AllowEntry";
pub const ALLOW_LEAVE: &str = "AllowLeave";
pub const NOTIFY_ENTER: &str = "NotifyEnter";
pub const NOTIFY_EXIT: &str = "NotifyExit";
pub const FLIGHT: &str = "Flight";
pub const DOORBELL: &str = "Doorbell";

pub fn packaged_definitions() -> Result<ModuleFlags, BorderPatrolError> {
    ModuleFlags::from_toml_str(DEFINITIONS)
        .map_err(|e| BorderPatrolError::FlagDefinitions(e.to_string()))
}

/// Border Patrol's flags as resolved at startup.
///
/// A flag that could not be resolved stays `None`, and every rule that
/// depends on it is skipped.
#[derive(Debug, Clone, Default)]
pub struct BorderFlags {
    pub allow_entry: Option<Flag>,
    pub allow_leave: Option<Flag>,
    pub notify_enter: Option<Flag>,
    pub notify_exit: Option<Flag>,
    pub flight: Option<Flag>,
    pub doorbell: Option<Flag>,
}

impl BorderFlags {
    /// Registers the packaged definitions and resolves each flag by name.
    pub fn register(registry: &dyn FlagRegistry) -> Result<Self, BorderPatrolError> {
        let definitions = packaged_definitions()?;
        let registered = registry.register(&definitions, MODULE_GROUP);
        info!(
            "🚧 {} of {} Border Patrol flags newly registered",
            registered.len(),
            definitions.flag.len()
        );
        Ok(Self::resolve(registry))
    }

    /// Looks every flag up in `registry`.
    pub fn resolve(registry: &dyn FlagRegistry) -> Self {
        let lookup = |name: &str| {
            let flag = registry.flag(name);
            if flag.is_none() {
                warn!("⚠️ Flag {} is not registered, its rule is disabled", name);
            }
            flag
        };

        Self {
            allow_entry: lookup(ALLOW_ENTRY),
            allow_leave: lookup(ALLOW_LEAVE),
            notify_enter: lookup(NOTIFY_ENTER),
            notify_exit: lookup(NOTIFY_EXIT),
            flight: lookup(FLIGHT),
            doorbell: lookup(DOORBELL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flags_event_system::FlagRegistrar;

    #[test]
    fn test_packaged_definitions() {
        let definitions = packaged_definitions().expect("packaged flags should parse");

        let names: Vec<_> = definitions.names().collect();
        assert_eq!(
            names,
            vec![ALLOW_ENTRY, ALLOW_LEAVE, DOORBELL, FLIGHT, NOTIFY_ENTER, NOTIFY_EXIT]
        );
        assert!(definitions.flag[ALLOW_ENTRY].default);
        assert!(definitions.flag[ALLOW_LEAVE].default);
        assert!(!definitions.flag[FLIGHT].default);
    }

    #[test]
    fn test_register_resolves_all_flags() {
        let registrar = FlagRegistrar::new();

        let flags = BorderFlags::register(&registrar).expect("registration");

        assert_eq!(registrar.len(), 6);
        let doorbell = flags.doorbell.expect("Doorbell resolved");
        assert_eq!(doorbell.group(), MODULE_GROUP);
        assert!(flags.flight.is_some());
    }

    #[test]
    fn test_resolve_leaves_missing_flags_empty() {
        let registrar = FlagRegistrar::new();

        let flags = BorderFlags::resolve(&registrar);

        assert!(flags.allow_entry.is_none());
        assert!(flags.doorbell.is_none());
    }
}
