//! # Flags Event System
//!
//! Host-side API that Flags modules are written against. The land-management
//! framework owns areas, flags, trust lists and player sessions; modules only
//! see them through the traits exported here and react to the events the host
//! fires when players move between areas.
//!
//! ## Architecture Overview
//!
//! - **Flags** (`flag`): named boolean settings registered by modules from a
//!   packaged definition file and resolved by name through a [`FlagRegistry`].
//! - **Areas** (`area`): territorial regions exposing per-flag values, trust
//!   lists and optional ownership.
//! - **Players** (`player`): live sessions that can be messaged, teleported
//!   and have their flight state adjusted.
//! - **Events** (`events`): a priority-ordered dispatcher. Handlers below
//!   [`EventPriority::Monitor`] may cancel an event; monitor handlers only
//!   observe the outcome.
//! - **Scheduling** (`scheduler`): delayed one-shot tasks drained by a single
//!   tick loop.
//!
//! ## Module Development
//!
//! ```rust,ignore
//! use flags_event_system::*;
//!
//! struct Welcome;
//!
//! #[async_trait]
//! impl SimplePlugin for Welcome {
//!     fn name(&self) -> &str { "welcome" }
//!     fn version(&self) -> &str { "1.0.0" }
//!
//!     async fn register_handlers(
//!         &mut self,
//!         events: Arc<EventSystem>,
//!         _context: Arc<dyn ServerContext>,
//!     ) -> Result<(), PluginError> {
//!         events
//!             .on_monitor(true, |event: &PlayerChangedAreaEvent| {
//!                 event.player().send_message("Welcome!");
//!                 Ok(())
//!             })
//!             .await
//!             .map_err(|e| PluginError::InitializationFailed(e.to_string()))
//!     }
//! }
//! ```

mod area;
mod events;
mod flag;
mod player;
mod scheduler;
pub mod testing;

pub use area::{Area, OwnerList};
pub use events::{
    Cancellable, Event, EventPriority, EventSystem, EventSystemStats, PlayerChangedAreaEvent,
};
pub use flag::{
    format_message, Flag, FlagDefinition, FlagRegistrar, FlagRegistry, MessageParams, ModuleFlags,
};
pub use player::{GameMode, Player, Sound, TeleportCause};
pub use scheduler::TaskScheduler;

pub use async_trait::async_trait;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

// ============================================================================
// Core Types
// ============================================================================

/// Unique identifier for a connected player.
///
/// Wraps a UUID so player ids cannot be confused with other ids in the
/// system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Creates a new random player ID using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a player ID from a string representation.
    pub fn from_str(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point in block space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate (east-west axis)
    pub x: f64,
    /// Y coordinate (vertical axis)
    pub y: f64,
    /// Z coordinate (north-south axis)
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Returns this position offset by the given amounts.
    pub fn add(&self, dx: f64, dy: f64, dz: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

/// A position inside a named world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub world: String,
    pub position: Position,
}

impl Location {
    pub fn new(world: impl Into<String>, position: Position) -> Self {
        Self {
            world: world.into(),
            position,
        }
    }

    /// Returns this location offset by the given amounts, in the same world.
    pub fn add(&self, dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            world: self.world.clone(),
            position: self.position.add(dx, dy, dz),
        }
    }
}

// ============================================================================
// Server Context and Plugin Lifecycle
// ============================================================================

/// Access to host services for a loaded module.
///
/// Everything a module needs beyond the event payload itself comes through
/// here: the flag registrar, server-wide settings, online players, world
/// queries and the task scheduler.
pub trait ServerContext: Send + Sync {
    /// Returns the event system shared by the host and all modules.
    fn events(&self) -> Arc<EventSystem>;

    /// Logs a message through the host's logging pipeline.
    fn log(&self, level: LogLevel, message: &str);

    /// Returns true if the named plugin is loaded and enabled on the host.
    fn is_plugin_enabled(&self, name: &str) -> bool;

    /// Returns true if the Flags framework has border patrol turned on.
    ///
    /// When this is off the framework never fires area transition events.
    fn border_patrol_enabled(&self) -> bool;

    /// Returns the framework's flag registrar.
    fn registrar(&self) -> Arc<dyn FlagRegistry>;

    /// Returns true if the server allows flight for everyone.
    fn allow_flight(&self) -> bool;

    /// Looks up an online player by name.
    fn online_player(&self, name: &str) -> Option<Arc<dyn Player>>;

    /// Returns the location of the highest solid block in the column
    /// containing `location`.
    fn highest_block_at(&self, location: &Location) -> Location;

    /// Returns the scheduler used for delayed tasks.
    fn scheduler(&self) -> Arc<TaskScheduler>;
}

/// Simplified module trait.
///
/// # Lifecycle
///
/// 1. **Handler Registration**: `register_handlers()` checks prerequisites,
///    registers flags and installs event handlers
/// 2. **Initialization**: `on_init()` is called with server context
/// 3. **Operation**: the module receives events
/// 4. **Shutdown**: `on_shutdown()` is called for cleanup
#[async_trait]
pub trait SimplePlugin: Send + Sync + 'static {
    /// Returns the name of this module.
    fn name(&self) -> &str;

    /// Returns the version string of this module.
    fn version(&self) -> &str;

    /// Registers event handlers.
    ///
    /// Returning an error leaves the module disabled; no handler it managed
    /// to install before failing should remain effective.
    async fn register_handlers(
        &mut self,
        events: Arc<EventSystem>,
        context: Arc<dyn ServerContext>,
    ) -> Result<(), PluginError>;

    /// Initialize the module after its handlers are in place.
    async fn on_init(&mut self, _context: Arc<dyn ServerContext>) -> Result<(), PluginError> {
        Ok(())
    }

    /// Shutdown the module gracefully.
    async fn on_shutdown(&mut self, _context: Arc<dyn ServerContext>) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Runs the two-phase enable sequence for a module.
///
/// Handler registration always completes before `on_init` is called. Any
/// failure is logged and returned; the caller treats the module as disabled.
pub async fn enable_plugin<P>(plugin: &mut P, context: Arc<dyn ServerContext>) -> Result<(), PluginError>
where
    P: SimplePlugin + ?Sized,
{
    info!("🔌 Enabling {} v{}", plugin.name(), plugin.version());

    if let Err(e) = plugin
        .register_handlers(context.events(), Arc::clone(&context))
        .await
    {
        error!("❌ {} failed to register handlers: {}", plugin.name(), e);
        return Err(e);
    }

    if let Err(e) = plugin.on_init(Arc::clone(&context)).await {
        error!("❌ {} failed to initialize: {}", plugin.name(), e);
        return Err(e);
    }

    info!("✅ {} enabled", plugin.name());
    Ok(())
}

/// Log levels for host-routed module logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Critical errors, including fatal startup conditions
    Error,
    /// Warning conditions that should be investigated
    Warn,
    /// General informational messages
    Info,
    /// Detailed information for debugging
    Debug,
    /// Very detailed trace information
    Trace,
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during event system operations.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// A handler was invoked with an event of the wrong type
    #[error("Handler {0} received an event of an unexpected type")]
    TypeMismatch(String),
    /// The handler cannot be registered at the requested priority
    #[error("Invalid priority for {0}: monitor handlers must be registered with on_monitor")]
    InvalidPriority(String),
    /// Handler execution failed during event processing
    #[error("Handler execution error: {0}")]
    HandlerExecution(String),
}

/// Errors that can occur during module lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// Module initialization failed during startup
    #[error("Plugin initialization failed: {0}")]
    InitializationFailed(String),
    /// A required host plugin or resource was not found
    #[error("Plugin not found: {0}")]
    NotFound(String),
}
