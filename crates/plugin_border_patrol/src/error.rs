use flags_event_system::PluginError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while setting up Border Patrol.
#[derive(Debug, Error)]
pub enum BorderPatrolError {
    #[error("Failed to access config file {}: {source}", .path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse packaged flag definitions: {0}")]
    FlagDefinitions(String),
}

impl From<BorderPatrolError> for PluginError {
    fn from(error: BorderPatrolError) -> Self {
        PluginError::InitializationFailed(error.to_string())
    }
}
