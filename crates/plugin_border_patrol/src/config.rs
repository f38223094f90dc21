//! Border Patrol settings.
//!
//! Loaded from a TOML file next to the module. A missing file is created with
//! the defaults below.
//!
//! ```toml
//! [suppression]
//! window_ms = 5000
//!
//! [doorbell]
//! sound = "note.piano"
//! volume = 1.0
//! first_pitch = 1.0
//! second_pitch = 0.8
//! delay_ms = 500
//!
//! [scheduler]
//! tick_interval_ms = 50
//! ```

use crate::error::BorderPatrolError;
use flags_event_system::Sound;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Lowest and highest pitch the host can play.
const PITCH_RANGE: std::ops::RangeInclusive<f32> = 0.5..=2.0;

fn default_window_ms() -> u64 {
    5000
}

fn default_sound() -> String {
    "note.piano".to_string()
}

fn default_volume() -> f32 {
    1.0
}

fn default_first_pitch() -> f32 {
    1.0
}

fn default_second_pitch() -> f32 {
    0.8
}

fn default_delay_ms() -> u64 {
    500
}

fn default_tick_interval() -> u64 {
    50
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BorderPatrolConfig {
    #[serde(default)]
    pub suppression: SuppressionSettings,
    #[serde(default)]
    pub doorbell: DoorbellSettings,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
}

/// How long a player who was shown a denial message is left alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuppressionSettings {
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

impl Default for SuppressionSettings {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
        }
    }
}

/// The two tones played to area owners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoorbellSettings {
    #[serde(default = "default_sound")]
    pub sound: String,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default = "default_first_pitch")]
    pub first_pitch: f32,
    #[serde(default = "default_second_pitch")]
    pub second_pitch: f32,
    /// Gap between the two tones
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for DoorbellSettings {
    fn default() -> Self {
        Self {
            sound: default_sound(),
            volume: default_volume(),
            first_pitch: default_first_pitch(),
            second_pitch: default_second_pitch(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl DoorbellSettings {
    pub fn first_tone(&self) -> Sound {
        Sound::new(self.sound.as_str(), self.volume, self.first_pitch)
    }

    pub fn second_tone(&self) -> Sound {
        Sound::new(self.sound.as_str(), self.volume, self.second_pitch)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// How often the host drains delayed tasks
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
        }
    }
}

impl BorderPatrolConfig {
    /// Loads the config, writing the defaults to `path` if it does not exist.
    pub async fn load_from_file(path: &Path) -> Result<Self, BorderPatrolError> {
        let io_error = |source: std::io::Error| BorderPatrolError::ConfigIo {
            path: path.to_path_buf(),
            source,
        };

        if path.exists() {
            let content = tokio::fs::read_to_string(path).await.map_err(io_error)?;
            Self::from_toml_str(&content)
        } else {
            let default_config = Self::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content)
                .await
                .map_err(io_error)?;
            info!("📄 Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, BorderPatrolError> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<(), BorderPatrolError> {
        if self.suppression.window_ms == 0 {
            return Err(BorderPatrolError::InvalidConfig(
                "Suppression window must be greater than zero".to_string(),
            ));
        }

        let doorbell = &self.doorbell;
        if doorbell.sound.trim().is_empty() {
            return Err(BorderPatrolError::InvalidConfig(
                "Doorbell sound cannot be empty".to_string(),
            ));
        }
        if doorbell.volume <= 0.0 {
            return Err(BorderPatrolError::InvalidConfig(format!(
                "Doorbell volume must be positive, got {}",
                doorbell.volume
            )));
        }
        for (name, pitch) in [
            ("first_pitch", doorbell.first_pitch),
            ("second_pitch", doorbell.second_pitch),
        ] {
            if !PITCH_RANGE.contains(&pitch) {
                return Err(BorderPatrolError::InvalidConfig(format!(
                    "Doorbell {name} must be between {} and {}, got {pitch}",
                    PITCH_RANGE.start(),
                    PITCH_RANGE.end()
                )));
            }
        }
        if doorbell.delay_ms == 0 {
            return Err(BorderPatrolError::InvalidConfig(
                "Doorbell delay must be greater than zero".to_string(),
            ));
        }

        if self.scheduler.tick_interval_ms == 0 {
            return Err(BorderPatrolError::InvalidConfig(
                "Scheduler tick interval must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn suppression_window(&self) -> Duration {
        Duration::from_millis(self.suppression.window_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.scheduler.tick_interval_ms)
    }
}
