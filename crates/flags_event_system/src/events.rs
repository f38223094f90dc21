//! Priority-ordered event dispatch with cancellation.
//!
//! Handlers are stored per event key and kept sorted by [`EventPriority`].
//! Every handler below `Monitor` receives the event mutably and may cancel
//! it; monitor handlers run last and only see the settled outcome.

use crate::{Area, EventError, Player};
use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Implemented by events that handlers may veto.
pub trait Cancellable {
    fn is_cancelled(&self) -> bool;
    fn set_cancelled(&mut self, cancelled: bool);
}

/// An event that can be fired through the [`EventSystem`].
pub trait Event: Cancellable + Send + Sync + Any + 'static {
    /// Stable key used to route this event to its handlers.
    fn event_key() -> &'static str
    where
        Self: Sized;
}

/// Order in which handlers observe an event.
///
/// Lower priorities run first, so `Highest` gets the final say on
/// cancellation and `Monitor` sees the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventPriority {
    Lowest,
    Low,
    Normal,
    High,
    Highest,
    Monitor,
}

/// Type-erased handler stored by the event system.
trait EventHandler: Send + Sync {
    fn handle(&self, event: &mut dyn Any) -> Result<(), EventError>;
    fn priority(&self) -> EventPriority;
    fn ignore_cancelled(&self) -> bool;
    fn handler_name(&self) -> &str;
}

/// Handler that may mutate (and cancel) the event.
struct TypedEventHandler<E, F> {
    handler: F,
    name: String,
    priority: EventPriority,
    ignore_cancelled: bool,
    _phantom: PhantomData<fn(E)>,
}

impl<E, F> EventHandler for TypedEventHandler<E, F>
where
    E: Event,
    F: Fn(&mut E) -> Result<(), EventError> + Send + Sync,
{
    fn handle(&self, event: &mut dyn Any) -> Result<(), EventError> {
        let event = event
            .downcast_mut::<E>()
            .ok_or_else(|| EventError::TypeMismatch(self.name.clone()))?;
        (self.handler)(event)
    }

    fn priority(&self) -> EventPriority {
        self.priority
    }

    fn ignore_cancelled(&self) -> bool {
        self.ignore_cancelled
    }

    fn handler_name(&self) -> &str {
        &self.name
    }
}

/// Observation-only handler; it never gets a mutable reference.
struct MonitorEventHandler<E, F> {
    handler: F,
    name: String,
    ignore_cancelled: bool,
    _phantom: PhantomData<fn(E)>,
}

impl<E, F> EventHandler for MonitorEventHandler<E, F>
where
    E: Event,
    F: Fn(&E) -> Result<(), EventError> + Send + Sync,
{
    fn handle(&self, event: &mut dyn Any) -> Result<(), EventError> {
        let event = event
            .downcast_ref::<E>()
            .ok_or_else(|| EventError::TypeMismatch(self.name.clone()))?;
        (self.handler)(event)
    }

    fn priority(&self) -> EventPriority {
        EventPriority::Monitor
    }

    fn ignore_cancelled(&self) -> bool {
        self.ignore_cancelled
    }

    fn handler_name(&self) -> &str {
        &self.name
    }
}

/// Statistics about the event system's usage.
#[derive(Debug, Default, Clone)]
pub struct EventSystemStats {
    /// Total number of registered event handlers
    pub total_handlers: usize,
    /// Total number of events emitted that had at least one handler
    pub events_emitted: u64,
    /// Events that were cancelled once all handlers had run
    pub events_cancelled: u64,
}

/// The event dispatcher shared by the host and all modules.
///
/// Handlers for one event key run sequentially in priority order, and within
/// a priority in registration order. A failing handler is logged and does
/// not stop the remaining handlers.
pub struct EventSystem {
    /// Map of event keys to their handlers, sorted by priority
    handlers: RwLock<HashMap<String, Vec<Arc<dyn EventHandler>>>>,
    stats: RwLock<EventSystemStats>,
}

impl EventSystem {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            stats: RwLock::new(EventSystemStats::default()),
        }
    }

    /// Registers a handler that may modify or cancel the event.
    ///
    /// With `ignore_cancelled` set, the handler is skipped for events that an
    /// earlier handler already cancelled.
    pub async fn on<E, F>(
        &self,
        priority: EventPriority,
        ignore_cancelled: bool,
        handler: F,
    ) -> Result<(), EventError>
    where
        E: Event,
        F: Fn(&mut E) -> Result<(), EventError> + Send + Sync + 'static,
    {
        let handler_name = format!("{}::{:?}", E::event_key(), priority);
        if priority == EventPriority::Monitor {
            return Err(EventError::InvalidPriority(handler_name));
        }

        let typed_handler = TypedEventHandler {
            handler,
            name: handler_name,
            priority,
            ignore_cancelled,
            _phantom: PhantomData,
        };
        self.register_handler(E::event_key(), Arc::new(typed_handler))
            .await
    }

    /// Registers a monitor handler, run after the outcome is final.
    pub async fn on_monitor<E, F>(&self, ignore_cancelled: bool, handler: F) -> Result<(), EventError>
    where
        E: Event,
        F: Fn(&E) -> Result<(), EventError> + Send + Sync + 'static,
    {
        let monitor_handler = MonitorEventHandler {
            handler,
            name: format!("{}::Monitor", E::event_key()),
            ignore_cancelled,
            _phantom: PhantomData,
        };
        self.register_handler(E::event_key(), Arc::new(monitor_handler))
            .await
    }

    async fn register_handler(
        &self,
        event_key: &str,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), EventError> {
        let priority = handler.priority();
        let mut handlers = self.handlers.write().await;
        let list = handlers.entry(event_key.to_string()).or_default();
        let index = list
            .iter()
            .position(|existing| existing.priority() > priority)
            .unwrap_or(list.len());
        list.insert(index, handler);

        let mut stats = self.stats.write().await;
        stats.total_handlers += 1;

        info!("📝 Registered {:?} handler for {}", priority, event_key);
        Ok(())
    }

    /// Fires an event through every registered handler.
    ///
    /// Returns once all handlers have run; inspect
    /// [`Cancellable::is_cancelled`] afterwards to learn whether the action
    /// should go ahead.
    pub async fn emit<E>(&self, event: &mut E) -> Result<(), EventError>
    where
        E: Event,
    {
        let event_key = E::event_key();
        let handlers = self.handlers.read().await;

        let Some(event_handlers) = handlers.get(event_key) else {
            debug!("No handlers for event: {}", event_key);
            return Ok(());
        };

        debug!(
            "📤 Emitting {} to {} handlers",
            event_key,
            event_handlers.len()
        );

        for handler in event_handlers {
            if handler.ignore_cancelled() && event.is_cancelled() {
                continue;
            }
            let erased: &mut dyn Any = &mut *event;
            if let Err(e) = handler.handle(erased) {
                error!("❌ Handler {} failed: {}", handler.handler_name(), e);
            }
        }

        let mut stats = self.stats.write().await;
        stats.events_emitted += 1;
        if event.is_cancelled() {
            stats.events_cancelled += 1;
        }

        Ok(())
    }

    /// Number of handlers registered for an event type.
    pub async fn handler_count<E: Event>(&self) -> usize {
        let handlers = self.handlers.read().await;
        handlers.get(E::event_key()).map_or(0, Vec::len)
    }

    pub async fn get_stats(&self) -> EventSystemStats {
        let stats = self.stats.read().await;
        stats.clone()
    }
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Area Transition Event
// ============================================================================

/// Fired when a player crosses from one area into another.
///
/// Either side may be the world itself when the player steps into or out of
/// an explicitly defined area.
pub struct PlayerChangedAreaEvent {
    player: Arc<dyn Player>,
    area: Arc<dyn Area>,
    area_left: Arc<dyn Area>,
    cancelled: bool,
}

impl PlayerChangedAreaEvent {
    pub fn new(player: Arc<dyn Player>, area: Arc<dyn Area>, area_left: Arc<dyn Area>) -> Self {
        Self {
            player,
            area,
            area_left,
            cancelled: false,
        }
    }

    pub fn player(&self) -> &Arc<dyn Player> {
        &self.player
    }

    /// The area being entered.
    pub fn area(&self) -> &Arc<dyn Area> {
        &self.area
    }

    /// The area being left.
    pub fn area_left(&self) -> &Arc<dyn Area> {
        &self.area_left
    }
}

impl Cancellable for PlayerChangedAreaEvent {
    fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }
}

impl Event for PlayerChangedAreaEvent {
    fn event_key() -> &'static str {
        "area:player_changed"
    }
}

impl std::fmt::Debug for PlayerChangedAreaEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerChangedAreaEvent")
            .field("player", &self.player.name())
            .field("area", &self.area.name())
            .field("area_left", &self.area_left.name())
            .field("cancelled", &self.cancelled)
            .finish()
    }
}
