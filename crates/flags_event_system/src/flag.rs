//! Flag definitions, the registrar and message templating.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// One entry of a module's packaged flag-definition file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagDefinition {
    /// Shown by the framework's help commands
    pub description: String,
    /// Value used by areas that never set the flag
    #[serde(default)]
    pub default: bool,
    /// Message template used inside areas
    pub area_message: String,
    /// Message template used when the area is the world itself
    pub world_message: String,
}

/// All flag definitions shipped by a module, keyed by flag name.
///
/// ```toml
/// [flag.AllowEntry]
/// description = "Allows players to enter the area."
/// default = true
/// area_message = "You cannot enter {AreaName}."
/// world_message = "You cannot enter {AreaName}."
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleFlags {
    #[serde(default)]
    pub flag: BTreeMap<String, FlagDefinition>,
}

impl ModuleFlags {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.flag.keys().map(String::as_str)
    }
}

/// A registered flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Flag {
    name: String,
    description: String,
    default: bool,
    area_message: String,
    world_message: String,
    group: String,
}

impl Flag {
    pub fn new(name: impl Into<String>, group: impl Into<String>, definition: &FlagDefinition) -> Self {
        Self {
            name: name.into(),
            description: definition.description.clone(),
            default: definition.default,
            area_message: definition.area_message.clone(),
            world_message: definition.world_message.clone(),
            group: group.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn default_value(&self) -> bool {
        self.default
    }

    pub fn area_message(&self) -> &str {
        &self.area_message
    }

    pub fn world_message(&self) -> &str {
        &self.world_message
    }

    /// Module identifier the flag was registered under.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Permission that exempts a player from this flag's restriction.
    pub fn bypass_permission(&self) -> String {
        format!("flags.flag.{}", self.name)
    }
}

/// The framework's flag registry.
pub trait FlagRegistry: Send + Sync {
    /// Registers every definition in `module` under `group` and returns the
    /// flags that were newly registered.
    fn register(&self, module: &ModuleFlags, group: &str) -> Vec<Flag>;

    /// Resolves a flag by name.
    fn flag(&self, name: &str) -> Option<Flag>;
}

/// In-memory flag registry.
#[derive(Debug, Default)]
pub struct FlagRegistrar {
    flags: DashMap<String, Flag>,
}

impl FlagRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl FlagRegistry for FlagRegistrar {
    fn register(&self, module: &ModuleFlags, group: &str) -> Vec<Flag> {
        let mut registered = Vec::with_capacity(module.flag.len());

        for (name, definition) in &module.flag {
            if self.flags.contains_key(name) {
                warn!("⚠️ Flag {} is already registered, skipping ({})", name, group);
                continue;
            }
            let flag = Flag::new(name.as_str(), group, definition);
            self.flags.insert(name.clone(), flag.clone());
            registered.push(flag);
        }

        info!("🚩 Registered {} flags for {}", registered.len(), group);
        registered
    }

    fn flag(&self, name: &str) -> Option<Flag> {
        self.flags.get(name).map(|entry| entry.value().clone())
    }
}

/// Values substituted into a flag message template.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageParams<'a> {
    pub area_type: &'a str,
    pub area_name: &'a str,
    pub owner: Option<&'a str>,
    pub player: Option<&'a str>,
}

/// Expands `{AreaType}`, `{AreaName}`, `{Owner}` and `{Player}`.
///
/// Placeholders without a value are left in place.
pub fn format_message(template: &str, params: &MessageParams<'_>) -> String {
    let mut message = template
        .replace("{AreaType}", &params.area_type.to_lowercase())
        .replace("{AreaName}", params.area_name);
    if let Some(owner) = params.owner {
        message = message.replace("{Owner}", owner);
    }
    if let Some(player) = params.player {
        message = message.replace("{Player}", player);
    }
    message
}
