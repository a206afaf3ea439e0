//! Block callbacks: opening a crate on right-click and picking it up on break.

use scase_plugin_api::{EventResult, PluginBlockPos, PluginPlayer, ServerApi};
use scase_registry::Crate;
use tracing::debug;

use crate::opening::{consume_key, OpenMode};
use crate::roulette::Roulette;
use crate::{CratePlugin, CRATE_TAG};

impl CratePlugin {
    /// Right-click on a block. Bound blocks open their crate instead of the block's own UI.
    pub fn on_block_interact(
        &mut self,
        player: &PluginPlayer,
        pos: PluginBlockPos,
        api: &mut dyn ServerApi,
    ) -> EventResult {
        let Some(name) = api.block_tag(pos, CRATE_TAG) else {
            return EventResult::Continue;
        };
        let Some(krate) = self.manager().and_then(|m| m.get_crate(&name)) else {
            api.send_message(&player.name, "Crate data not found");
            return EventResult::Cancelled;
        };

        let mode = self.default_mode();
        self.open_crate(&player.name, &krate, mode, api);
        EventResult::Cancelled
    }

    /// Breaking a bound block drops the crate item instead of the block.
    pub fn on_block_break(
        &mut self,
        player: &PluginPlayer,
        pos: PluginBlockPos,
        api: &mut dyn ServerApi,
    ) -> EventResult {
        let Some(name) = api.block_tag(pos, CRATE_TAG) else {
            return EventResult::Continue;
        };
        api.remove_block_tag(pos, CRATE_TAG);

        let Some(krate) = self.manager().and_then(|m| m.get_crate(&name)) else {
            return EventResult::Continue;
        };
        let item = krate.display_item().with_tag(CRATE_TAG, krate.key());
        api.drop_item(pos, item);
        debug!(
            "{} picked up crate {} at {:?}",
            player.name,
            krate.name(),
            pos
        );
        EventResult::SuppressDrops
    }

    /// Charge a key and open `krate` in `mode`.
    ///
    /// A spinning roulette blocks further openings; a held instant roll is
    /// paid out first.
    pub fn open_crate(
        &mut self,
        player: &str,
        krate: &Crate,
        mode: OpenMode,
        api: &mut dyn ServerApi,
    ) {
        if self.is_opening(player) {
            return;
        }
        self.claim_roll(player, api);
        if !consume_key(api, player, krate) {
            api.send_message(player, "You need the right key to open this crate");
            return;
        }

        match mode {
            OpenMode::Animated => {
                let roulette = Roulette::new(krate, &mut rand::thread_rng());
                self.start_session(player, roulette, api);
            }
            OpenMode::Instant => self.hold_roll(player, krate, api),
        }
    }
}
