//! SimpleCase: lootbox crates bound to blocks.
//!
//! [`CratePlugin`] plugs a [`CrateManager`] into a host through the
//! [`Plugin`] trait. The manager and its background sweeper handle files;
//! everything that touches the world runs inside host callbacks on the main tick.

pub mod admin;
pub mod error;
pub mod listener;
pub mod opening;
pub mod roulette;

#[cfg(test)]
mod mock;

use std::collections::HashMap;
use std::sync::Arc;

use scase_plugin_api::{EventResult, LogLevel, Plugin, PluginEvent, PluginInfo, ServerApi};
use scase_registry::{CrateConfig, CrateManager};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub use error::PluginError;
use opening::HeldRoll;
pub use opening::{CratePreview, OpenMode};
use roulette::{Roulette, Step};

pub const PLUGIN_NAME: &str = "SimpleCase";
/// Block and item tag holding the (lowercase) crate name.
pub const CRATE_TAG: &str = "crate_name";

/// Host task draining sweep evictions.
pub const EVICTION_TASK: u32 = 1;
/// Host task advancing roulette animations, every tick.
pub const ANIMATION_TASK: u32 = 2;
const EVICTION_INTERVAL_TICKS: u64 = 20;

const SOUND_START: &str = "block.note_block.pling";
const SOUND_CLICK: &str = "ui.button.click";
const SOUND_WIN: &str = "entity.player.levelup";

pub struct CratePlugin {
    config: Option<CrateConfig>,
    manager: Option<Arc<CrateManager>>,
    runtime: Option<Runtime>,
    sweeper: Option<JoinHandle<()>>,
    /// Running roulettes by player name.
    sessions: HashMap<String, Roulette>,
    /// Unclaimed instant rolls by player name.
    held: HashMap<String, HeldRoll>,
}

impl CratePlugin {
    pub fn new() -> Self {
        Self {
            config: None,
            manager: None,
            runtime: None,
            sweeper: None,
            sessions: HashMap::new(),
            held: HashMap::new(),
        }
    }

    /// Start with an explicit config instead of the host-provided one.
    pub fn with_config(config: CrateConfig) -> Self {
        Self {
            config: Some(config),
            ..Self::new()
        }
    }

    pub fn manager(&self) -> Option<&Arc<CrateManager>> {
        self.manager.as_ref()
    }

    pub(crate) fn require_manager(&self) -> Result<&Arc<CrateManager>, PluginError> {
        self.manager.as_ref().ok_or(PluginError::NotEnabled)
    }

    /// Mode used when a player right-clicks a crate block.
    pub fn default_mode(&self) -> OpenMode {
        if self.config.as_ref().map_or(true, |c| c.animation) {
            OpenMode::Animated
        } else {
            OpenMode::Instant
        }
    }

    pub(crate) fn max_key_grant(&self) -> u32 {
        self.config.as_ref().map_or(10_000, |c| c.max_key_grant)
    }

    pub fn is_opening(&self, player: &str) -> bool {
        self.sessions.contains_key(player)
    }

    pub(crate) fn start_session(
        &mut self,
        player: &str,
        roulette: Roulette,
        api: &mut dyn ServerApi,
    ) {
        render(api, player, &roulette);
        api.play_sound(player, SOUND_START, 0.8, 0.8);
        self.sessions.insert(player.to_string(), roulette);
    }

    /// Advance every roulette by one tick.
    pub fn tick_sessions(&mut self, api: &mut dyn ServerApi) {
        let mut closed = Vec::new();
        for (player, roulette) in &mut self.sessions {
            match roulette.tick() {
                Step::Idle => {}
                Step::Moved { click_pitch } => {
                    render(api, player, roulette);
                    if let Some(pitch) = click_pitch {
                        api.play_sound(player, SOUND_CLICK, 0.3, pitch);
                    }
                }
                Step::Finished => {
                    render(api, player, roulette);
                    award(api, player, roulette);
                }
                Step::Closed => {
                    api.close_window(player);
                    closed.push(player.clone());
                }
            }
        }
        for player in closed {
            self.sessions.remove(&player);
        }
    }

    /// Stop `player`'s roulette. An unfinished roll is paid out at once.
    pub fn abort_session(&mut self, player: &str, api: &mut dyn ServerApi) {
        if let Some(roulette) = self.sessions.remove(player) {
            if !roulette.is_finished() {
                award(api, player, &roulette);
            }
        }
    }

    /// Settle everything `player` has in flight: a spin or a held roll.
    pub fn release_player(&mut self, player: &str, api: &mut dyn ServerApi) {
        self.abort_session(player, api);
        self.claim_roll(player, api);
    }

    /// Pay out every open roll and stop the host tasks. Runs while the host
    /// API is still available, ahead of [`Plugin::on_disable`].
    pub fn stop(&mut self, api: &mut dyn ServerApi) {
        let players: Vec<String> = self
            .sessions
            .keys()
            .chain(self.held.keys())
            .cloned()
            .collect();
        for player in players {
            self.release_player(&player, api);
            api.close_window(&player);
        }
        api.cancel_task(PLUGIN_NAME, EVICTION_TASK);
        api.cancel_task(PLUGIN_NAME, ANIMATION_TASK);
    }

    fn drain_evictions(&self, api: &mut dyn ServerApi) {
        let Some(manager) = &self.manager else {
            return;
        };
        for name in manager.take_evictions() {
            let unbound = self.unbind_blocks(api, &name);
            api.log(
                LogLevel::Info,
                &format!("Crate {name} was removed from disk; unbound {unbound} blocks"),
            );
        }
    }
}

impl Default for CratePlugin {
    fn default() -> Self {
        Self::new()
    }
}

fn render(api: &mut dyn ServerApi, player: &str, roulette: &Roulette) {
    let title = format!("{} - Roulette", roulette.crate_name());
    api.render_window(player, &title, &roulette.window());
}

fn award(api: &mut dyn ServerApi, player: &str, roulette: &Roulette) {
    match roulette.winner() {
        Some(item) => {
            api.play_sound(player, SOUND_WIN, 1.0, 1.2);
            api.send_message(player, &format!("You won {}!", item.label()));
            api.give_item(player, item.clone());
        }
        None => api.send_message(player, "This crate is empty"),
    }
}

impl Plugin for CratePlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: PLUGIN_NAME.into(),
            version: env!("CARGO_PKG_VERSION").into(),
            description: "Lootbox crates opened with keys".into(),
            author: "polardev".into(),
        }
    }

    fn on_enable(&mut self, api: &mut dyn ServerApi) {
        let config = self.config.get_or_insert_with(|| CrateConfig {
            data_dir: api.data_folder(PLUGIN_NAME),
            ..CrateConfig::default()
        });
        let manager = Arc::new(CrateManager::new(config));

        match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("scase-io")
            .enable_all()
            .build()
        {
            Ok(runtime) => {
                self.sweeper = manager.spawn_sweeper(runtime.handle());
                self.runtime = Some(runtime);
            }
            Err(e) => {
                error!("Failed to start background runtime, crates will only save on shutdown: {e}")
            }
        }

        api.schedule_repeating(
            PLUGIN_NAME,
            EVICTION_INTERVAL_TICKS,
            EVICTION_INTERVAL_TICKS,
            EVICTION_TASK,
        );
        api.schedule_repeating(PLUGIN_NAME, 1, 1, ANIMATION_TASK);

        api.log(
            LogLevel::Info,
            &format!("{PLUGIN_NAME} enabled with {} crates", manager.registry().len()),
        );
        self.manager = Some(manager);
    }

    fn on_disable(&mut self) {
        let unsettled = self.sessions.len() + self.held.len();
        if unsettled > 0 {
            warn!("Dropping {unsettled} unsettled crate openings on disable");
            self.sessions.clear();
            self.held.clear();
        }
        if let Some(manager) = self.manager.take() {
            manager.shutdown();
        }
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
        info!("{PLUGIN_NAME} disabled");
    }

    fn on_event(&mut self, event: &PluginEvent, api: &mut dyn ServerApi) -> EventResult {
        match event {
            PluginEvent::BlockInteract {
                player, position, ..
            } => self.on_block_interact(player, *position, api),
            PluginEvent::BlockBreak {
                player, position, ..
            } => self.on_block_break(player, *position, api),
            PluginEvent::PlayerQuit { player } | PluginEvent::WindowClosed { player } => {
                self.release_player(&player.name, api);
                EventResult::Continue
            }
            PluginEvent::ServerStopping => {
                self.stop(api);
                EventResult::Continue
            }
        }
    }

    fn on_task(&mut self, task_id: u32, api: &mut dyn ServerApi) {
        match task_id {
            EVICTION_TASK => self.drain_evictions(api),
            ANIMATION_TASK => self.tick_sessions(api),
            _ => {}
        }
    }

    fn default_config(&self) -> Option<serde_json::Value> {
        serde_json::to_value(CrateConfig::default()).ok()
    }

    fn load_config(&mut self, config: serde_json::Value) {
        match CrateConfig::from_json(config) {
            Ok(config) => self.config = Some(config),
            Err(e) => warn!("Invalid {PLUGIN_NAME} config, using defaults: {e}"),
        }
    }
}
