//! In-memory `ServerApi` for tests. Writes apply immediately.

use std::collections::HashMap;
use std::path::PathBuf;

use scase_plugin_api::{LogLevel, PluginBlockPos, PluginItem, PluginPlayer, ServerApi};

pub fn test_player(name: &str) -> PluginPlayer {
    PluginPlayer {
        name: name.into(),
        uuid: format!("00000000-0000-0000-0000-{:012}", name.len()),
        runtime_id: name.len() as u64,
        position: (0.5, 65.62, 0.5),
        gamemode: 0,
    }
}

pub struct MockApi {
    pub data_dir: PathBuf,
    pub players: Vec<PluginPlayer>,
    pub inventories: HashMap<String, Vec<PluginItem>>,
    pub messages: Vec<(String, String)>,
    pub given: Vec<(String, PluginItem)>,
    pub drops: Vec<(PluginBlockPos, PluginItem)>,
    pub windows: Vec<(String, String, Vec<PluginItem>)>,
    pub closed: Vec<String>,
    pub sounds: Vec<(String, String, f32)>,
    pub tags: HashMap<(PluginBlockPos, String), String>,
    /// (delay, interval, task id)
    pub tasks: Vec<(u64, u64, u32)>,
    pub cancelled: Vec<u32>,
}

impl MockApi {
    /// A world with one online player, `Alice`, and a fresh temp data folder.
    pub fn new() -> Self {
        let data_dir =
            std::env::temp_dir().join(format!("scase_plugin_{}", rand::random::<u64>()));
        std::fs::create_dir_all(&data_dir).unwrap();
        Self {
            data_dir,
            players: vec![test_player("Alice")],
            inventories: HashMap::new(),
            messages: Vec::new(),
            given: Vec::new(),
            drops: Vec::new(),
            windows: Vec::new(),
            closed: Vec::new(),
            sounds: Vec::new(),
            tags: HashMap::new(),
            tasks: Vec::new(),
            cancelled: Vec::new(),
        }
    }

    pub fn add_player(&mut self, name: &str) {
        self.players.push(test_player(name));
    }

    pub fn cleanup(&self) {
        std::fs::remove_dir_all(&self.data_dir).ok();
    }
}

impl ServerApi for MockApi {
    fn online_players(&self) -> Vec<PluginPlayer> {
        self.players.clone()
    }

    fn get_player(&self, name: &str) -> Option<PluginPlayer> {
        self.players.iter().find(|p| p.name == name).cloned()
    }

    fn send_message(&mut self, player_name: &str, message: &str) {
        self.messages
            .push((player_name.to_string(), message.to_string()));
    }

    fn inventory(&self, player_name: &str) -> Vec<PluginItem> {
        self.inventories
            .get(player_name)
            .cloned()
            .unwrap_or_default()
    }

    fn set_inventory_slot(&mut self, player_name: &str, slot: usize, item: PluginItem) {
        let inventory = self.inventories.entry(player_name.to_string()).or_default();
        if slot >= inventory.len() {
            inventory.resize(slot + 1, PluginItem::empty());
        }
        inventory[slot] = item;
    }

    fn give_item(&mut self, player_name: &str, item: PluginItem) {
        self.given.push((player_name.to_string(), item));
    }

    fn render_window(&mut self, player_name: &str, title: &str, slots: &[PluginItem]) {
        self.windows
            .push((player_name.to_string(), title.to_string(), slots.to_vec()));
    }

    fn close_window(&mut self, player_name: &str) {
        self.closed.push(player_name.to_string());
    }

    fn play_sound(&mut self, player_name: &str, sound: &str, _volume: f32, pitch: f32) {
        self.sounds
            .push((player_name.to_string(), sound.to_string(), pitch));
    }

    fn block_tag(&self, pos: PluginBlockPos, key: &str) -> Option<String> {
        self.tags.get(&(pos, key.to_string())).cloned()
    }

    fn set_block_tag(&mut self, pos: PluginBlockPos, key: &str, value: &str) {
        self.tags.insert((pos, key.to_string()), value.to_string());
    }

    fn remove_block_tag(&mut self, pos: PluginBlockPos, key: &str) {
        self.tags.remove(&(pos, key.to_string()));
    }

    fn find_tagged_blocks(&self, key: &str, value: &str) -> Vec<PluginBlockPos> {
        self.tags
            .iter()
            .filter(|((_, k), v)| k == key && v.as_str() == value)
            .map(|((pos, _), _)| *pos)
            .collect()
    }

    fn drop_item(&mut self, pos: PluginBlockPos, item: PluginItem) {
        self.drops.push((pos, item));
    }

    fn log(&self, _level: LogLevel, _message: &str) {}

    fn data_folder(&self, plugin_name: &str) -> PathBuf {
        self.data_dir.join(plugin_name)
    }

    fn schedule_repeating(
        &mut self,
        _plugin_name: &str,
        delay_ticks: u64,
        interval_ticks: u64,
        task_id: u32,
    ) {
        self.tasks.push((delay_ticks, interval_ticks, task_id));
    }

    fn cancel_task(&mut self, _plugin_name: &str, task_id: u32) {
        self.cancelled.push(task_id);
    }
}
