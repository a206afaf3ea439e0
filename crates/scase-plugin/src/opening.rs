//! Key checks, key consumption, and instant openings that hold their roll
//! until the player claims or re-rolls it.

use scase_plugin_api::{PluginItem, ServerApi};
use scase_registry::{Crate, CrateError};

use crate::roulette::empty_placeholder;
use crate::{CratePlugin, PluginError};

/// How a crate is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Roll once and hold the result until it is claimed or re-rolled.
    Instant,
    /// Spin the roulette; the winner is paid when it stops.
    Animated,
}

/// An instant roll waiting to be claimed.
#[derive(Debug, Clone, PartialEq)]
pub struct HeldRoll {
    /// Lowercase key of the crate it came from.
    pub crate_key: String,
    /// `None` when the crate had no rewards.
    pub item: Option<PluginItem>,
}

/// What a player sees before choosing how to open a crate.
#[derive(Debug, Clone, PartialEq)]
pub struct CratePreview {
    pub name: String,
    pub rewards: Vec<PluginItem>,
    pub has_key: bool,
}

/// First slot holding a stack similar to `key`.
pub fn find_key_slot(inventory: &[PluginItem], key: &PluginItem) -> Option<usize> {
    inventory
        .iter()
        .position(|item| !item.is_empty() && item.is_similar(key))
}

/// Whether the inventory can pay for one opening. Keyless crates always can.
pub fn has_key(inventory: &[PluginItem], krate: &Crate) -> bool {
    match krate.key_item() {
        Some(key) => find_key_slot(inventory, &key).is_some(),
        None => true,
    }
}

/// Take one key from the inventory. Returns the slot that changed.
///
/// A stack of one becomes an empty slot.
pub fn take_one(inventory: &mut [PluginItem], key: &PluginItem) -> Option<usize> {
    let slot = find_key_slot(inventory, key)?;
    let stack = &mut inventory[slot];
    if stack.count > 1 {
        stack.count -= 1;
    } else {
        *stack = PluginItem::empty();
    }
    Some(slot)
}

/// Charge `player` one key for `krate`. Returns `false` if they have none.
pub fn consume_key(api: &mut dyn ServerApi, player: &str, krate: &Crate) -> bool {
    let Some(key) = krate.key_item() else {
        return true;
    };
    let mut inventory = api.inventory(player);
    match take_one(&mut inventory, &key) {
        Some(slot) => {
            let updated = inventory.swap_remove(slot);
            api.set_inventory_slot(player, slot, updated);
            true
        }
        None => false,
    }
}

impl CratePlugin {
    /// Rewards of `crate_name` and whether `player` can pay for an opening.
    pub fn preview(
        &self,
        api: &dyn ServerApi,
        player: &str,
        crate_name: &str,
    ) -> Result<CratePreview, PluginError> {
        let krate = self.find_crate(crate_name)?;
        Ok(CratePreview {
            name: krate.name().to_string(),
            rewards: krate.items(),
            has_key: has_key(&api.inventory(player), &krate),
        })
    }

    /// Open `crate_name` for `player` in the chosen mode.
    ///
    /// Fails without side effects when the player holds no key.
    pub fn open_by_name(
        &mut self,
        api: &mut dyn ServerApi,
        player: &str,
        crate_name: &str,
        mode: OpenMode,
    ) -> Result<(), PluginError> {
        let krate = self.find_crate(crate_name)?;
        if !has_key(&api.inventory(player), &krate) {
            return Err(PluginError::MissingKey(krate.name().to_string()));
        }
        self.open_crate(player, &krate, mode, api);
        Ok(())
    }

    pub fn held_roll(&self, player: &str) -> Option<&HeldRoll> {
        self.held.get(player)
    }

    /// Roll `krate`, show the result and hold it for `player`.
    pub(crate) fn hold_roll(&mut self, player: &str, krate: &Crate, api: &mut dyn ServerApi) {
        let item = krate.random_item();
        let shown = item.clone().unwrap_or_else(empty_placeholder);
        api.render_window(player, &format!("{} - Opening", krate.name()), &[shown]);
        match &item {
            Some(item) => api.send_message(player, &format!("You rolled {}", item.label())),
            None => api.send_message(player, "This crate is empty"),
        }
        self.held.insert(
            player.to_string(),
            HeldRoll {
                crate_key: krate.key(),
                item,
            },
        );
    }

    /// Give `player` their held roll, if any. Returns the item handed out.
    pub fn claim_roll(&mut self, player: &str, api: &mut dyn ServerApi) -> Option<PluginItem> {
        let item = self.held.remove(player)?.item?;
        api.send_message(player, &format!("You received {}", item.label()));
        api.give_item(player, item.clone());
        Some(item)
    }

    /// Spend another key: pay out the held roll, then roll the same crate again.
    ///
    /// Without a key the held roll is left untouched.
    pub fn reroll(&mut self, player: &str, api: &mut dyn ServerApi) -> Result<(), PluginError> {
        let crate_key = self
            .held
            .get(player)
            .map(|held| held.crate_key.clone())
            .ok_or_else(|| PluginError::NothingHeld(player.to_string()))?;
        let krate = self.find_crate(&crate_key)?;
        if !consume_key(api, player, &krate) {
            api.send_message(player, "You need another key to roll again");
            return Err(PluginError::MissingKey(krate.name().to_string()));
        }
        self.claim_roll(player, api);
        self.hold_roll(player, &krate, api);
        Ok(())
    }

    fn find_crate(&self, name: &str) -> Result<Crate, PluginError> {
        self.require_manager()?
            .get_crate(name)
            .ok_or_else(|| CrateError::NotFound(name.to_string()).into())
    }
}
