//! In-memory name → crate map shared between the main tick and the sweeper.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::model::Crate;

/// Thread-safe crate store keyed by lowercase name.
///
/// Values go in and come out by copy. Use [`CrateRegistry::update`] to edit a
/// crate in place under the write lock.
#[derive(Debug, Default)]
pub struct CrateRegistry {
    crates: RwLock<HashMap<String, Crate>>,
}

impl CrateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Writes are single inserts/removes or one closure over one value, so a
    // poisoned lock never guards a half-written map.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Crate>> {
        self.crates.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Crate>> {
        self.crates.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, name: &str) -> Option<Crate> {
        self.read().get(&name.to_lowercase()).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(&name.to_lowercase())
    }

    /// Insert or replace. Returns the previous crate under the same key.
    pub fn put(&self, krate: Crate) -> Option<Crate> {
        self.write().insert(krate.key(), krate)
    }

    /// Insert only if no crate uses this name yet. Returns whether it was inserted.
    pub fn insert_if_absent(&self, krate: Crate) -> bool {
        let mut crates = self.write();
        let key = krate.key();
        if crates.contains_key(&key) {
            return false;
        }
        crates.insert(key, krate);
        true
    }

    pub fn remove(&self, name: &str) -> Option<Crate> {
        self.write().remove(&name.to_lowercase())
    }

    /// Run `f` against the stored crate while holding the write lock.
    pub fn update<R>(&self, name: &str, f: impl FnOnce(&mut Crate) -> R) -> Option<R> {
        self.write().get_mut(&name.to_lowercase()).map(f)
    }

    /// Lowercase keys, in no particular order.
    pub fn names(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    pub fn snapshot(&self) -> Vec<Crate> {
        self.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scase_plugin_api::PluginItem;
    use std::sync::Arc;

    fn make(name: &str) -> Crate {
        Crate::new(name, PluginItem::new("minecraft:chest", 1))
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let reg = CrateRegistry::new();
        reg.put(make("Gold"));
        assert_eq!(reg.get("gold").unwrap().name(), "Gold");
        assert_eq!(reg.get("GOLD").unwrap().name(), "Gold");
        assert!(reg.contains("gOlD"));
        assert!(reg.get("silver").is_none());
    }

    #[test]
    fn put_replaces_same_key() {
        let reg = CrateRegistry::new();
        assert!(reg.put(make("Gold")).is_none());
        let previous = reg.put(make("GOLD")).unwrap();
        assert_eq!(previous.name(), "Gold");
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("gold").unwrap().name(), "GOLD");
    }

    #[test]
    fn insert_if_absent_keeps_first() {
        let reg = CrateRegistry::new();
        assert!(reg.insert_if_absent(make("Gold")));
        assert!(!reg.insert_if_absent(make("gold")));
        assert_eq!(reg.get("GOLD").unwrap().name(), "Gold");
    }

    #[test]
    fn remove_and_names() {
        let reg = CrateRegistry::new();
        reg.put(make("Gold"));
        reg.put(make("Silver"));
        let mut names = reg.names();
        names.sort();
        assert_eq!(names, vec!["gold", "silver"]);

        assert!(reg.remove("SILVER").is_some());
        assert!(reg.remove("silver").is_none());
        assert_eq!(reg.names(), vec!["gold"]);
    }

    #[test]
    fn update_edits_in_place() {
        let reg = CrateRegistry::new();
        reg.put(make("Gold"));
        let count = reg.update("gold", |c| {
            c.add_item(PluginItem::new("minecraft:diamond", 1));
            c.item_count()
        });
        assert_eq!(count, Some(1));
        assert_eq!(reg.get("Gold").unwrap().item_count(), 1);
        assert_eq!(reg.update("missing", |c| c.item_count()), None);
    }

    #[test]
    fn get_returns_detached_copy() {
        let reg = CrateRegistry::new();
        reg.put(make("Gold"));
        let mut copy = reg.get("gold").unwrap();
        copy.add_item(PluginItem::new("minecraft:diamond", 1));
        assert!(reg.get("gold").unwrap().is_empty());
    }

    #[test]
    fn concurrent_writers_and_readers() {
        let reg = Arc::new(CrateRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let reg = reg.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        reg.put(make(&format!("crate-{t}-{i}")));
                        let _ = reg.names();
                        reg.update(&format!("crate-{t}-{i}"), |c| {
                            c.add_item(PluginItem::new("minecraft:stone", 1))
                        });
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(reg.len(), 400);
        assert!(reg.snapshot().iter().all(|c| c.item_count() == 1));
    }
}
