//! # Border Patrol
//!
//! Flags module that enforces area borders. It listens for players moving
//! between areas and applies six flags:
//!
//! - **AllowEntry / AllowLeave**: veto the move, telling the player why at
//!   most once per suppression window
//! - **NotifyEnter / NotifyExit**: greet visitors, one message per move
//! - **Doorbell**: two tones for the owners when a visitor walks in
//! - **Flight**: grant or revoke flight, landing players safely
//!
//! The cancellable checks run at normal priority. Everything else runs in a
//! monitor handler once the move is final.

pub mod config;
pub mod crossing;
pub mod doorbell;
pub mod error;
pub mod evaluator;
pub mod flags;
pub mod flight;
pub mod notify;
pub mod suppression;

pub use config::BorderPatrolConfig;
pub use error::BorderPatrolError;
pub use evaluator::{BorderEvaluator, TransitionOutcome};
pub use flags::BorderFlags;
pub use suppression::NotifiedPlayers;

use async_trait::async_trait;
use flags_event_system::{
    EventPriority, EventSystem, LogLevel, PlayerChangedAreaEvent, PluginError,
    ServerContext, SimplePlugin,
};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Host plugin Border Patrol depends on.
pub const FLAGS_PLUGIN: &str = "Flags";

pub struct BorderPatrolPlugin {
    name: String,
    config: BorderPatrolConfig,
    evaluator: Option<Arc<BorderEvaluator>>,
    scheduler_driver: Option<JoinHandle<()>>,
}

impl BorderPatrolPlugin {
    pub fn new() -> Self {
        Self::with_config(BorderPatrolConfig::default())
    }

    pub fn with_config(config: BorderPatrolConfig) -> Self {
        Self {
            name: "FlagsBorderPatrol".to_string(),
            config,
            evaluator: None,
            scheduler_driver: None,
        }
    }

    /// Loads and validates the config at `path`, creating it if missing.
    pub async fn from_config_file(path: &Path) -> Result<Self, BorderPatrolError> {
        let config = BorderPatrolConfig::load_from_file(path).await?;
        config.validate()?;
        Ok(Self::with_config(config))
    }

    pub fn config(&self) -> &BorderPatrolConfig {
        &self.config
    }

    /// The evaluator, once handlers are registered.
    pub fn evaluator(&self) -> Option<&Arc<BorderEvaluator>> {
        self.evaluator.as_ref()
    }

    /// Fails unless the Flags framework is present with border patrol on.
    fn check_prerequisites(context: &dyn ServerContext) -> Result<(), PluginError> {
        if !context.is_plugin_enabled(FLAGS_PLUGIN) {
            let message = "Flags was not found. Shutting down.";
            context.log(LogLevel::Error, message);
            return Err(PluginError::InitializationFailed(message.to_string()));
        }

        if !context.border_patrol_enabled() {
            let message = "Flags Border Patrol is disabled. Shutting down.";
            context.log(LogLevel::Error, message);
            return Err(PluginError::InitializationFailed(message.to_string()));
        }

        Ok(())
    }
}

impl Default for BorderPatrolPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SimplePlugin for BorderPatrolPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    async fn register_handlers(
        &mut self,
        events: Arc<EventSystem>,
        context: Arc<dyn ServerContext>,
    ) -> Result<(), PluginError> {
        Self::check_prerequisites(context.as_ref())?;
        self.config.validate()?;

        let flags = BorderFlags::register(context.registrar().as_ref())?;
        let evaluator = Arc::new(BorderEvaluator::new(
            Arc::clone(&context),
            flags,
            &self.config,
        ));

        let crossing = Arc::clone(&evaluator);
        events
            .on(
                EventPriority::Normal,
                true,
                move |event: &mut PlayerChangedAreaEvent| {
                    crossing.evaluate_crossing(event);
                    Ok(())
                },
            )
            .await
            .map_err(|e| PluginError::InitializationFailed(e.to_string()))?;

        let monitor = Arc::clone(&evaluator);
        events
            .on_monitor(true, move |event: &PlayerChangedAreaEvent| {
                monitor.after_crossing(event);
                Ok(())
            })
            .await
            .map_err(|e| PluginError::InitializationFailed(e.to_string()))?;

        self.evaluator = Some(evaluator);
        info!("🚧 Border Patrol handlers registered");
        Ok(())
    }

    async fn on_init(&mut self, context: Arc<dyn ServerContext>) -> Result<(), PluginError> {
        let driver = context
            .scheduler()
            .spawn_driver(self.config.tick_interval());
        self.scheduler_driver = Some(driver);

        context.log(
            LogLevel::Info,
            &format!("🚧 {} v{} is patrolling the borders", self.name, self.version()),
        );
        Ok(())
    }

    async fn on_shutdown(&mut self, context: Arc<dyn ServerContext>) -> Result<(), PluginError> {
        if let Some(driver) = self.scheduler_driver.take() {
            driver.abort();
        }

        context.log(LogLevel::Info, "🚧 Border Patrol shut down");
        Ok(())
    }
}
