//! Plugin API: the types and traits shared between a host server and the
//! crate plugin.
//!
//! The host owns the world, inventories, block data and the tick loop. The
//! plugin only sees the snapshots and deferred writes exposed here.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ─── Types ───────────────────────────────────────────────────────────────────

/// Largest stack a single inventory slot holds.
pub const MAX_STACK_SIZE: u16 = 64;

/// Identifier the host uses for an empty slot.
pub const AIR: &str = "minecraft:air";

/// An item stack, decoupled from the host's wire representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginItem {
    /// Namespaced item identifier, e.g. `minecraft:diamond`.
    pub id: String,
    pub count: u16,
    #[serde(default)]
    pub metadata: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lore: Vec<String>,
    /// Persistent key/value data attached to the stack.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl PluginItem {
    /// Create a plain stack with no name, lore or tags.
    pub fn new(id: impl Into<String>, count: u16) -> Self {
        Self {
            id: id.into(),
            count,
            metadata: 0,
            display_name: None,
            lore: Vec::new(),
            tags: BTreeMap::new(),
        }
    }

    /// An empty slot (air).
    pub fn empty() -> Self {
        Self::new(AIR, 0)
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0 || self.id.is_empty() || self.id == AIR
    }

    /// Same item in every respect except the stack size.
    pub fn is_similar(&self, other: &PluginItem) -> bool {
        self.id == other.id
            && self.metadata == other.metadata
            && self.display_name == other.display_name
            && self.lore == other.lore
            && self.tags == other.tags
    }

    pub fn with_count(mut self, count: u16) -> Self {
        self.count = count;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Name shown to players: the custom name, or the identifier without namespace.
    pub fn label(&self) -> &str {
        match &self.display_name {
            Some(name) => name,
            None => self.id.rsplit(':').next().unwrap_or(&self.id),
        }
    }
}

/// Information about an online player, passed to plugins in events.
#[derive(Debug, Clone)]
pub struct PluginPlayer {
    pub name: String,
    pub uuid: String,
    pub runtime_id: u64,
    pub position: (f32, f32, f32),
    pub gamemode: i32,
}

/// Block position for plugin events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginBlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl PluginBlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Log level for plugin logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

/// Result of dispatching an event to a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Continue normal handling.
    Continue,
    /// Event was cancelled by this plugin.
    Cancelled,
    /// Let a `BlockBreak` go ahead, but without the block's default drops.
    SuppressDrops,
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// All events that plugins can listen to.
#[derive(Debug, Clone)]
pub enum PluginEvent {
    // --- Player events ---
    PlayerQuit {
        player: PluginPlayer,
    },
    /// The player closed a window opened through `ServerApi::render_window`.
    WindowClosed {
        player: PluginPlayer,
    },

    // --- Block events ---
    BlockBreak {
        player: PluginPlayer,
        position: PluginBlockPos,
        block_id: String,
    },
    /// Right-click on a block.
    BlockInteract {
        player: PluginPlayer,
        position: PluginBlockPos,
        block_id: String,
    },

    // --- Server events ---
    /// Sent before plugins are disabled, while the API is still usable.
    ServerStopping,
}

impl PluginEvent {
    /// Whether this event type can be cancelled by a plugin.
    pub fn is_cancellable(&self) -> bool {
        matches!(
            self,
            PluginEvent::BlockBreak { .. } | PluginEvent::BlockInteract { .. }
        )
    }
}

// ─── Plugin trait ────────────────────────────────────────────────────────────

/// Metadata about a plugin.
#[derive(Debug, Clone)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
}

/// The Plugin trait: implemented by every plugin the host loads.
pub trait Plugin: Send {
    /// Return plugin metadata.
    fn info(&self) -> PluginInfo;

    /// Called when the plugin is loaded. Use `api` to schedule tasks.
    fn on_enable(&mut self, api: &mut dyn ServerApi);

    /// Called when the plugin is unloaded.
    fn on_disable(&mut self) {}

    /// Called for every dispatched event. Return `Cancelled` to cancel cancellable events.
    fn on_event(&mut self, event: &PluginEvent, api: &mut dyn ServerApi) -> EventResult {
        let _ = (event, api);
        EventResult::Continue
    }

    /// Called on the main tick when a scheduled task fires.
    fn on_task(&mut self, task_id: u32, api: &mut dyn ServerApi) {
        let _ = (task_id, api);
    }

    /// Return a default config as JSON. If `Some`, the plugin gets a config file.
    fn default_config(&self) -> Option<serde_json::Value> {
        None
    }

    /// Called with the loaded config (from `plugins/<name>/config.json`).
    fn load_config(&mut self, _config: serde_json::Value) {}
}

// ─── Server API ──────────────────────────────────────────────────────────────

/// Safe read/write access to server state, passed to plugins during callbacks.
///
/// Read methods return data immediately. Write methods are deferred (applied
/// after the plugin callback returns).
pub trait ServerApi {
    // --- Players ---
    fn online_players(&self) -> Vec<PluginPlayer>;
    fn get_player(&self, name: &str) -> Option<PluginPlayer>;
    fn send_message(&mut self, player_name: &str, message: &str);

    // --- Inventory ---
    /// Full inventory contents, one entry per slot (empty slots included).
    fn inventory(&self, player_name: &str) -> Vec<PluginItem>;
    fn set_inventory_slot(&mut self, player_name: &str, slot: usize, item: PluginItem);
    /// Add to the player's inventory; whatever does not fit is dropped at their feet.
    fn give_item(&mut self, player_name: &str, item: PluginItem);
    /// Show a read-only window of items to the player. Layout is up to the host.
    fn render_window(&mut self, player_name: &str, title: &str, slots: &[PluginItem]);
    fn close_window(&mut self, player_name: &str);
    fn play_sound(&mut self, player_name: &str, sound: &str, volume: f32, pitch: f32);

    // --- Blocks ---
    /// Persistent data stored on a block entity.
    fn block_tag(&self, pos: PluginBlockPos, key: &str) -> Option<String>;
    fn set_block_tag(&mut self, pos: PluginBlockPos, key: &str, value: &str);
    fn remove_block_tag(&mut self, pos: PluginBlockPos, key: &str);
    /// Positions in loaded chunks whose `key` tag equals `value`.
    fn find_tagged_blocks(&self, key: &str, value: &str) -> Vec<PluginBlockPos>;
    fn drop_item(&mut self, pos: PluginBlockPos, item: PluginItem);

    // --- Server ---
    fn log(&self, level: LogLevel, message: &str);
    /// Directory the host reserves for this plugin's files.
    fn data_folder(&self, plugin_name: &str) -> PathBuf;

    // --- Scheduler ---
    fn schedule_repeating(
        &mut self,
        plugin_name: &str,
        delay_ticks: u64,
        interval_ticks: u64,
        task_id: u32,
    );
    fn cancel_task(&mut self, plugin_name: &str, task_id: u32);
}

// ─── Tests ───────────────────────────────────────────────────────────────────
