//! The crate definition: a named lootbox with a display item, an optional
//! key and a list of reward candidates.

use std::fmt;
use std::hash::{Hash, Hasher};

use rand::seq::SliceRandom;
use rand::Rng;
use scase_plugin_api::PluginItem;

/// A lootbox definition.
///
/// Getters hand out owned copies and setters take owned values, so nothing
/// outside the registry can alias its state. Identity is the lowercase name.
#[derive(Debug, Clone)]
pub struct Crate {
    name: String,
    display_item: PluginItem,
    key_item: Option<PluginItem>,
    items: Vec<PluginItem>,
}

impl Crate {
    pub fn new(name: impl Into<String>, display_item: PluginItem) -> Self {
        Self {
            name: name.into(),
            display_item,
            key_item: None,
            items: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registry key: the lowercase name.
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn display_item(&self) -> PluginItem {
        self.display_item.clone()
    }

    pub fn set_display_item(&mut self, item: PluginItem) {
        self.display_item = item;
    }

    pub fn key_item(&self) -> Option<PluginItem> {
        self.key_item.clone()
    }

    /// `None` removes the key requirement.
    pub fn set_key_item(&mut self, item: Option<PluginItem>) {
        self.key_item = item;
    }

    pub fn has_key(&self) -> bool {
        self.key_item.is_some()
    }

    pub fn items(&self) -> Vec<PluginItem> {
        self.items.clone()
    }

    /// Borrowed view for read-only iteration inside the registry crate.
    pub(crate) fn items_ref(&self) -> &[PluginItem] {
        &self.items
    }

    /// Append a reward. Empty stacks are ignored.
    pub fn add_item(&mut self, item: PluginItem) {
        if !item.is_empty() {
            self.items.push(item);
        }
    }

    /// Remove the reward at `index`. Returns `false` if out of range.
    pub fn remove_item(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.items.remove(index);
            true
        } else {
            false
        }
    }

    /// Replace every reward. Empty stacks are dropped.
    pub fn set_items<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = PluginItem>,
    {
        self.items = items.into_iter().filter(|i| !i.is_empty()).collect();
    }

    pub fn clear_items(&mut self) {
        self.items.clear();
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Uniform draw over all rewards. `None` if the crate has none.
    pub fn random_item(&self) -> Option<PluginItem> {
        self.random_item_with(&mut rand::thread_rng())
    }

    pub fn random_item_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<PluginItem> {
        self.items.choose(rng).cloned()
    }
}

impl PartialEq for Crate {
    fn eq(&self, other: &Self) -> bool {
        self.name.to_lowercase() == other.name.to_lowercase()
    }
}

impl Eq for Crate {}

impl Hash for Crate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.to_lowercase().hash(state);
    }
}

impl fmt::Display for Crate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Crate{{name='{}', itemCount={}, hasKey={}}}",
            self.name,
            self.items.len(),
            self.has_key()
        )
    }
}

/// Crate names double as file names: non-empty ASCII letters, digits, `_` or `-`.
pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
