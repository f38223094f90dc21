//! In-memory host for exercising modules without a running server.
//!
//! [`TestServer`] implements [`ServerContext`] on top of a real
//! [`EventSystem`], [`FlagRegistrar`] and [`TaskScheduler`]. Players and
//! areas are recording doubles: every side effect a module performs on them
//! is kept so assertions can inspect it afterwards.
//!
//! ```rust,ignore
//! let server = TestServer::new();
//! let player = server.add_player("bob");
//! let area = Arc::new(TestArea::owned("claim", "Farm", &["alice"]));
//!
//! let mut event = PlayerChangedAreaEvent::new(player.clone(), area, server.world());
//! server.events().emit(&mut event).await?;
//!
//! assert_eq!(player.messages().len(), 1);
//! ```

use crate::{
    Area, EventSystem, Flag, FlagRegistrar, FlagRegistry, GameMode, Location, LogLevel, OwnerList,
    Player, PlayerId, Position, ServerContext, Sound, TaskScheduler, TeleportCause,
};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::EnvFilter;

/// Installs a test-friendly tracing subscriber.
///
/// Honours `RUST_LOG`, defaulting to `debug`. Safe to call from every test;
/// only the first call installs the subscriber.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Test Server
// ============================================================================

/// In-memory [`ServerContext`].
///
/// Starts with the "Flags" plugin enabled, border patrol on, global flight
/// disallowed and the ground at y = 64.
pub struct TestServer {
    events: Arc<EventSystem>,
    registrar: Arc<FlagRegistrar>,
    scheduler: Arc<TaskScheduler>,
    players: DashMap<String, Arc<TestPlayer>>,
    plugins: DashMap<String, bool>,
    border_patrol: AtomicBool,
    allow_flight: AtomicBool,
    ground_level: Mutex<f64>,
    logs: Mutex<Vec<(LogLevel, String)>>,
    world: Arc<TestArea>,
}

impl TestServer {
    pub fn new() -> Arc<Self> {
        let plugins = DashMap::new();
        plugins.insert("Flags".to_string(), true);

        Arc::new(Self {
            events: Arc::new(EventSystem::new()),
            registrar: Arc::new(FlagRegistrar::new()),
            scheduler: Arc::new(TaskScheduler::new()),
            players: DashMap::new(),
            plugins,
            border_patrol: AtomicBool::new(true),
            allow_flight: AtomicBool::new(false),
            ground_level: Mutex::new(64.0),
            logs: Mutex::new(Vec::new()),
            world: Arc::new(TestArea::world("world")),
        })
    }

    /// This server as a trait object, the way modules receive it.
    pub fn context(self: &Arc<Self>) -> Arc<dyn ServerContext> {
        Arc::clone(self) as Arc<dyn ServerContext>
    }

    /// The world area, with every flag at its default value.
    pub fn world(&self) -> Arc<dyn Area> {
        Arc::clone(&self.world) as Arc<dyn Area>
    }

    pub fn flag_registrar(&self) -> Arc<FlagRegistrar> {
        Arc::clone(&self.registrar)
    }

    pub fn task_scheduler(&self) -> Arc<TaskScheduler> {
        Arc::clone(&self.scheduler)
    }

    /// Runs every scheduled task due at `now`.
    pub fn run_tasks_until(&self, now: Instant) -> usize {
        self.scheduler.run_due(now)
    }

    pub fn set_plugin_enabled(&self, name: &str, enabled: bool) {
        self.plugins.insert(name.to_string(), enabled);
    }

    pub fn set_border_patrol_enabled(&self, enabled: bool) {
        self.border_patrol.store(enabled, Ordering::SeqCst);
    }

    pub fn set_allow_flight(&self, allow: bool) {
        self.allow_flight.store(allow, Ordering::SeqCst);
    }

    /// Height of the highest solid block in every column.
    pub fn set_ground_level(&self, y: f64) {
        *self.ground_level.lock() = y;
    }

    /// Connects a player and returns its recording double.
    pub fn add_player(&self, name: &str) -> Arc<TestPlayer> {
        let player = Arc::new(TestPlayer::new(name));
        self.players
            .insert(name.to_lowercase(), Arc::clone(&player));
        player
    }

    /// Disconnects a player. The double stays usable but reports offline.
    pub fn remove_player(&self, name: &str) -> Option<Arc<TestPlayer>> {
        let (_, player) = self.players.remove(&name.to_lowercase())?;
        player.set_online(false);
        Some(player)
    }

    /// Messages logged through [`ServerContext::log`].
    pub fn logs(&self) -> Vec<(LogLevel, String)> {
        self.logs.lock().clone()
    }
}

impl ServerContext for TestServer {
    fn events(&self) -> Arc<EventSystem> {
        Arc::clone(&self.events)
    }

    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Error => error!("{}", message),
            LogLevel::Warn => warn!("{}", message),
            LogLevel::Info => info!("{}", message),
            LogLevel::Debug => debug!("{}", message),
            LogLevel::Trace => trace!("{}", message),
        }
        self.logs.lock().push((level, message.to_string()));
    }

    fn is_plugin_enabled(&self, name: &str) -> bool {
        self.plugins.get(name).map_or(false, |enabled| *enabled)
    }

    fn border_patrol_enabled(&self) -> bool {
        self.border_patrol.load(Ordering::SeqCst)
    }

    fn registrar(&self) -> Arc<dyn FlagRegistry> {
        Arc::clone(&self.registrar) as Arc<dyn FlagRegistry>
    }

    fn allow_flight(&self) -> bool {
        self.allow_flight.load(Ordering::SeqCst)
    }

    fn online_player(&self, name: &str) -> Option<Arc<dyn Player>> {
        self.players
            .get(&name.to_lowercase())
            .filter(|player| player.is_online())
            .map(|player| Arc::clone(player.value()) as Arc<dyn Player>)
    }

    fn highest_block_at(&self, location: &Location) -> Location {
        let ground = *self.ground_level.lock();
        Location::new(
            location.world.clone(),
            Position::new(location.position.x, ground, location.position.z),
        )
    }

    fn scheduler(&self) -> Arc<TaskScheduler> {
        Arc::clone(&self.scheduler)
    }
}

// ============================================================================
// Test Player
// ============================================================================

/// Flight and movement calls in the order a player received them.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerAction {
    Teleport(Location, TeleportCause),
    SetFlying(bool),
    SetAllowFlight(bool),
}

#[derive(Debug)]
struct PlayerState {
    permissions: HashSet<String>,
    messages: Vec<String>,
    sounds: Vec<(Location, Sound)>,
    actions: Vec<PlayerAction>,
    allow_flight: bool,
    flying: bool,
    game_mode: GameMode,
    location: Location,
    online: bool,
}

/// Recording [`Player`] double.
#[derive(Debug)]
pub struct TestPlayer {
    id: PlayerId,
    name: String,
    state: Mutex<PlayerState>,
}

impl TestPlayer {
    pub fn new(name: &str) -> Self {
        Self {
            id: PlayerId::new(),
            name: name.to_string(),
            state: Mutex::new(PlayerState {
                permissions: HashSet::new(),
                messages: Vec::new(),
                sounds: Vec::new(),
                actions: Vec::new(),
                allow_flight: false,
                flying: false,
                game_mode: GameMode::Survival,
                location: Location::new("world", Position::new(0.5, 80.0, 0.5)),
                online: true,
            }),
        }
    }

    pub fn grant_permission(&self, permission: &str) {
        self.state.lock().permissions.insert(permission.to_string());
    }

    pub fn set_game_mode(&self, mode: GameMode) {
        self.state.lock().game_mode = mode;
    }

    pub fn set_location(&self, location: Location) {
        self.state.lock().location = location;
    }

    pub fn set_online(&self, online: bool) {
        self.state.lock().online = online;
    }

    /// Sets flight state directly, without recording an action.
    pub fn set_flight_state(&self, allow_flight: bool, flying: bool) {
        let mut state = self.state.lock();
        state.allow_flight = allow_flight;
        state.flying = flying;
    }

    pub fn messages(&self) -> Vec<String> {
        self.state.lock().messages.clone()
    }

    pub fn sounds(&self) -> Vec<(Location, Sound)> {
        self.state.lock().sounds.clone()
    }

    pub fn actions(&self) -> Vec<PlayerAction> {
        self.state.lock().actions.clone()
    }

    pub fn teleports(&self) -> Vec<(Location, TeleportCause)> {
        self.state
            .lock()
            .actions
            .iter()
            .filter_map(|action| match action {
                PlayerAction::Teleport(location, cause) => Some((location.clone(), *cause)),
                _ => None,
            })
            .collect()
    }

    /// Forgets recorded messages, sounds and actions.
    pub fn clear_history(&self) {
        let mut state = self.state.lock();
        state.messages.clear();
        state.sounds.clear();
        state.actions.clear();
    }
}

impl Player for TestPlayer {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.state.lock().permissions.contains(permission)
    }

    fn send_message(&self, message: &str) {
        self.state.lock().messages.push(message.to_string());
    }

    fn allow_flight(&self) -> bool {
        self.state.lock().allow_flight
    }

    fn set_allow_flight(&self, allow: bool) {
        let mut state = self.state.lock();
        state.allow_flight = allow;
        if !allow {
            state.flying = false;
        }
        state.actions.push(PlayerAction::SetAllowFlight(allow));
    }

    fn is_flying(&self) -> bool {
        self.state.lock().flying
    }

    fn set_flying(&self, flying: bool) {
        let mut state = self.state.lock();
        state.flying = flying;
        state.actions.push(PlayerAction::SetFlying(flying));
    }

    fn game_mode(&self) -> GameMode {
        self.state.lock().game_mode
    }

    fn location(&self) -> Location {
        self.state.lock().location.clone()
    }

    fn teleport(&self, destination: Location, cause: TeleportCause) -> bool {
        let mut state = self.state.lock();
        state.location = destination.clone();
        state.actions.push(PlayerAction::Teleport(destination, cause));
        true
    }

    fn play_sound(&self, location: &Location, sound: &Sound) {
        self.state
            .lock()
            .sounds
            .push((location.clone(), sound.clone()));
    }

    fn is_online(&self) -> bool {
        self.state.lock().online
    }
}

// ============================================================================
// Test Area
// ============================================================================

/// Fixed-content [`Area`] double built with `with_*` calls.
#[derive(Debug, Clone)]
pub struct TestArea {
    name: String,
    area_type: String,
    values: HashMap<String, bool>,
    trust: HashMap<String, HashSet<String>>,
    owners: Option<OwnerList>,
}

impl TestArea {
    /// An area that does not support ownership.
    pub fn new(area_type: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            area_type: area_type.to_string(),
            values: HashMap::new(),
            trust: HashMap::new(),
            owners: None,
        }
    }

    /// An ownable area with the given owners.
    pub fn owned(area_type: &str, name: &str, owners: &[&str]) -> Self {
        Self {
            owners: Some(OwnerList::new(owners.iter().copied())),
            ..Self::new(area_type, name)
        }
    }

    /// The world itself.
    pub fn world(name: &str) -> Self {
        Self::new("world", name)
    }

    pub fn with_value(mut self, flag: &str, value: bool) -> Self {
        self.values.insert(flag.to_string(), value);
        self
    }

    pub fn with_trust(mut self, flag: &str, player: &str) -> Self {
        self.trust
            .entry(flag.to_string())
            .or_default()
            .insert(player.to_lowercase());
        self
    }
}

impl Area for TestArea {
    fn name(&self) -> &str {
        &self.name
    }

    fn area_type(&self) -> &str {
        &self.area_type
    }

    fn value(&self, flag: &Flag) -> bool {
        self.values
            .get(flag.name())
            .copied()
            .unwrap_or_else(|| flag.default_value())
    }

    fn has_trust(&self, flag: &Flag, player: &dyn Player) -> bool {
        self.trust
            .get(flag.name())
            .map_or(false, |trusted| trusted.contains(&player.name().to_lowercase()))
    }

    fn ownership(&self) -> Option<&OwnerList> {
        self.owners.as_ref()
    }
}
