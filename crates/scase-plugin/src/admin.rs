//! Administrative operations: creating, editing and deleting crates, and
//! handing out keys.

use scase_plugin_api::{PluginBlockPos, PluginItem, ServerApi, MAX_STACK_SIZE};
use scase_registry::{Crate, CrateError};
use tracing::info;

use crate::{CratePlugin, PluginError, CRATE_TAG};

/// Target name that grants keys to every online player.
pub const ALL_PLAYERS: &str = "all";

impl CratePlugin {
    /// Create a crate whose display item is `block_id`, and bind the `anchor` block to it.
    pub fn create_crate(
        &self,
        api: &mut dyn ServerApi,
        name: &str,
        anchor: PluginBlockPos,
        block_id: &str,
    ) -> Result<Crate, PluginError> {
        let manager = self.require_manager()?;
        let display = PluginItem::new(block_id, 1).with_name(format!("Case {name}"));
        let krate = manager.create_crate(name, display)?;
        api.set_block_tag(anchor, CRATE_TAG, &krate.key());
        Ok(krate)
    }

    /// Delete a crate, its file, and every binding in loaded chunks.
    pub fn delete_crate(&self, api: &mut dyn ServerApi, name: &str) -> Result<(), PluginError> {
        let manager = self.require_manager()?;
        if !manager.delete_crate(name) {
            return Err(CrateError::NotFound(name.to_string()).into());
        }
        self.unbind_blocks(api, &name.to_lowercase());
        Ok(())
    }

    /// Strip the crate tag from every loaded block bound to `key`.
    pub fn unbind_blocks(&self, api: &mut dyn ServerApi, key: &str) -> usize {
        let positions = api.find_tagged_blocks(CRATE_TAG, key);
        for pos in &positions {
            api.remove_block_tag(*pos, CRATE_TAG);
        }
        positions.len()
    }

    /// Require `key` to open the crate. Written to disk at once.
    pub fn set_key(&self, name: &str, key: PluginItem) -> Result<(), PluginError> {
        if key.is_empty() {
            return Err(PluginError::EmptyItem);
        }
        let manager = self.require_manager()?;
        let mut krate = manager
            .get_crate(name)
            .ok_or_else(|| CrateError::NotFound(name.to_string()))?;
        krate.set_key_item(Some(key.with_count(1)));
        manager.save_crate_immediately(&krate)?;
        Ok(())
    }

    /// Replace the reward list. Saved on the next sweep. Returns the reward count.
    pub fn set_rewards(&self, name: &str, items: Vec<PluginItem>) -> Result<usize, PluginError> {
        let manager = self.require_manager()?;
        let count = manager
            .update_crate(name, |krate| {
                krate.set_items(items);
                krate.item_count()
            })
            .ok_or_else(|| CrateError::NotFound(name.to_string()))?;
        Ok(count)
    }

    /// Give `amount` keys of `crate_name` to `target` (or everyone, for `"all"`).
    ///
    /// `amount` is clamped to `1..=max_key_grant`. Returns how many players got keys.
    pub fn give_keys(
        &self,
        api: &mut dyn ServerApi,
        crate_name: &str,
        target: &str,
        amount: u32,
    ) -> Result<usize, PluginError> {
        let manager = self.require_manager()?;
        let krate = manager
            .get_crate(crate_name)
            .ok_or_else(|| CrateError::NotFound(crate_name.to_string()))?;
        let key = krate
            .key_item()
            .ok_or_else(|| PluginError::NoKeySet(krate.name().to_string()))?;

        let amount = amount.clamp(1, self.max_key_grant().max(1));
        let recipients: Vec<String> = if target.eq_ignore_ascii_case(ALL_PLAYERS) {
            api.online_players().into_iter().map(|p| p.name).collect()
        } else {
            let player = api
                .get_player(target)
                .ok_or_else(|| PluginError::PlayerNotFound(target.to_string()))?;
            vec![player.name]
        };

        let stacks = key_stacks(&key, amount);
        for player in &recipients {
            for stack in &stacks {
                api.give_item(player, stack.clone());
            }
        }
        info!(
            "Gave {amount} {} keys to {} players",
            krate.name(),
            recipients.len()
        );
        Ok(recipients.len())
    }
}

/// Split `amount` keys into full stacks plus one remainder stack.
pub fn key_stacks(key: &PluginItem, amount: u32) -> Vec<PluginItem> {
    let max = u32::from(MAX_STACK_SIZE);
    let mut stacks = Vec::with_capacity(amount.div_ceil(max) as usize);
    let mut remaining = amount;
    while remaining > 0 {
        let size = remaining.min(max);
        stacks.push(key.clone().with_count(size as u16));
        remaining -= size;
    }
    stacks
}
