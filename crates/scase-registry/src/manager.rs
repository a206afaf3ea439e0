//! Crate manager: registry + files + the periodic sweep that keeps them in step.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use scase_plugin_api::PluginItem;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::CrateConfig;
use crate::error::CrateError;
use crate::model::{is_valid_name, Crate};
use crate::registry::CrateRegistry;
use crate::storage::CrateStore;

// ─── SweepReport ────────────────────────────────────────────────────────────

/// What one sweep did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Dirty crates written this sweep.
    pub saved: Vec<String>,
    /// Dirty crates whose write failed. They stay registered but leave the
    /// dirty set; a later edit or shutdown writes them again.
    pub failed: Vec<String>,
    /// Crates unloaded because their file disappeared.
    pub evicted: Vec<String>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty() && self.failed.is_empty() && self.evicted.is_empty()
    }
}

// ─── CrateManager ───────────────────────────────────────────────────────────

/// Owns every loaded crate and its backing file.
///
/// Share it as `Arc<CrateManager>`. Reads and edits can come from any thread;
/// writes to disk are batched through the dirty set and flushed by
/// [`CrateManager::sweep`], which the background sweeper runs on a timer.
pub struct CrateManager {
    registry: CrateRegistry,
    store: CrateStore,
    pending: Mutex<HashSet<String>>,
    /// Held around every file write or delete, so a registry read and the
    /// write of that snapshot are never split by another writer.
    io_lock: Mutex<()>,
    evictions_tx: mpsc::UnboundedSender<String>,
    evictions_rx: Mutex<mpsc::UnboundedReceiver<String>>,
    shutdown_tx: watch::Sender<bool>,
    sweep_delay: Duration,
    sweep_interval: Option<Duration>,
}

impl CrateManager {
    /// Build a manager from config and load every crate file.
    pub fn new(config: &CrateConfig) -> Self {
        Self::open(
            CrateStore::new(config.crates_dir()),
            config.sweep_delay(),
            config.sweep_interval(),
        )
    }

    /// Build a manager over `store` and load every crate file in it.
    pub fn open(store: CrateStore, sweep_delay: Duration, sweep_interval: Option<Duration>) -> Self {
        if let Err(e) = store.ensure_dir() {
            error!("Failed to create crates directory: {e}");
        }

        let registry = CrateRegistry::new();
        for krate in store.load_all() {
            if let Some(previous) = registry.put(krate) {
                warn!("Duplicate crate name {}, keeping the last file read", previous.name());
            }
        }
        info!("Loaded {} crates from {}", registry.len(), store.dir().display());

        let (evictions_tx, evictions_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            registry,
            store,
            pending: Mutex::new(HashSet::new()),
            io_lock: Mutex::new(()),
            evictions_tx,
            evictions_rx: Mutex::new(evictions_rx),
            shutdown_tx,
            sweep_delay,
            sweep_interval: sweep_interval.filter(|d| !d.is_zero()),
        }
    }

    fn pending(&self) -> MutexGuard<'_, HashSet<String>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn io_guard(&self) -> MutexGuard<'_, ()> {
        self.io_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn registry(&self) -> &CrateRegistry {
        &self.registry
    }

    pub fn store(&self) -> &CrateStore {
        &self.store
    }

    // --- Lookups ---

    pub fn get_crate(&self, name: &str) -> Option<Crate> {
        self.registry.get(name)
    }

    pub fn crate_names(&self) -> Vec<String> {
        self.registry.names()
    }

    // --- Lifecycle ---

    /// Register a new crate and write its file right away.
    ///
    /// Names must be non-blank and use only ASCII letters, digits, `_` or `-`,
    /// since the lowercase name doubles as the file name.
    pub fn create_crate(&self, name: &str, display_item: PluginItem) -> Result<Crate, CrateError> {
        if !is_valid_name(name) {
            return Err(CrateError::InvalidName(name.to_string()));
        }

        let _io = self.io_guard();
        let krate = Crate::new(name, display_item);
        if !self.registry.insert_if_absent(krate.clone()) {
            return Err(CrateError::AlreadyExists(name.to_string()));
        }
        if let Err(e) = self.store.save(&krate) {
            self.registry.remove(name);
            return Err(e.into());
        }
        info!("Created crate {name}");
        Ok(krate)
    }

    /// Unload a crate and delete its file. Returns whether it existed.
    pub fn delete_crate(&self, name: &str) -> bool {
        let key = name.to_lowercase();
        let _io = self.io_guard();
        let existed = self.registry.remove(&key).is_some();
        self.pending().remove(&key);

        match self.store.delete(&key) {
            Ok(()) => info!("Deleted crate file {}", self.store.path_for(&key).display()),
            Err(e) => warn!("Failed to delete crate file: {e}"),
        }
        existed
    }

    /// Edit a crate in place and queue it for the next sweep.
    pub fn update_crate<R>(&self, name: &str, f: impl FnOnce(&mut Crate) -> R) -> Option<R> {
        let result = self.registry.update(name, f)?;
        self.mark_for_save(name);
        Some(result)
    }

    // --- Saving ---

    /// Queue a crate for the next sweep. Repeated marks collapse into one write.
    pub fn mark_for_save(&self, name: &str) {
        self.pending().insert(name.to_lowercase());
    }

    pub fn pending_count(&self) -> usize {
        self.pending().len()
    }

    /// Replace the registered version of `krate` and write it now.
    ///
    /// A crate that is no longer registered is not brought back.
    pub fn save_crate_immediately(&self, krate: &Crate) -> Result<(), CrateError> {
        let _io = self.io_guard();
        self.registry
            .update(krate.name(), |current| *current = krate.clone())
            .ok_or_else(|| CrateError::NotFound(krate.name().to_string()))?;
        self.pending().remove(&krate.key());
        self.store.save(krate)?;
        Ok(())
    }

    /// Write every registered crate. Returns how many writes succeeded.
    pub fn save_all(&self) -> usize {
        let _io = self.io_guard();
        self.pending().clear();
        let mut saved = 0;
        for krate in self.registry.snapshot() {
            match self.store.save(&krate) {
                Ok(()) => saved += 1,
                Err(e) => error!("Failed to save crate {}: {e}", krate.name()),
            }
        }
        saved
    }

    /// Flush the dirty set, then unload crates whose file is gone.
    ///
    /// Every evicted name is also queued for [`CrateManager::take_evictions`]
    /// so the main tick can unbind placed blocks.
    pub fn sweep(&self) -> SweepReport {
        let _io = self.io_guard();
        let mut report = SweepReport::default();

        let dirty: Vec<String> = std::mem::take(&mut *self.pending()).into_iter().collect();
        for name in dirty {
            let Some(krate) = self.registry.get(&name) else {
                continue;
            };
            match self.store.save(&krate) {
                Ok(()) => report.saved.push(name),
                Err(e) => {
                    error!("Failed to save crate {}: {e}", krate.name());
                    report.failed.push(name);
                }
            }
        }

        for name in self.registry.names() {
            if self.store.exists(&name) || report.failed.contains(&name) {
                continue;
            }
            if self.registry.remove(&name).is_some() {
                self.pending().remove(&name);
                info!("Crate file for {name} is gone, unloading crate");
                // The receiver lives in `self`, so the channel cannot be closed.
                let _ = self.evictions_tx.send(name.clone());
                report.evicted.push(name);
            }
        }

        report
    }

    /// Names evicted by sweeps since the last call.
    pub fn take_evictions(&self) -> Vec<String> {
        let mut rx = self.evictions_rx.lock().unwrap_or_else(|e| e.into_inner());
        let mut names = Vec::new();
        while let Ok(name) = rx.try_recv() {
            names.push(name);
        }
        names
    }

    // --- Background ---

    /// Start the periodic sweep on `handle`. Returns `None` when sweeps are disabled.
    ///
    /// File I/O runs on the blocking pool. The task exits once
    /// [`CrateManager::shutdown`] is called.
    pub fn spawn_sweeper(self: &Arc<Self>, handle: &Handle) -> Option<JoinHandle<()>> {
        let interval = self.sweep_interval?;
        let manager = Arc::clone(self);
        let mut shutdown = self.shutdown_tx.subscribe();
        let start = time::Instant::now() + self.sweep_delay;

        Some(handle.spawn(async move {
            let mut ticker = time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                if *shutdown.borrow() {
                    break;
                }
                tokio::select! {
                    _ = ticker.tick() => {
                        let m = Arc::clone(&manager);
                        match tokio::task::spawn_blocking(move || m.sweep()).await {
                            Ok(report) if !report.is_empty() => debug!(
                                "Crate sweep: {} saved, {} failed, {} evicted",
                                report.saved.len(),
                                report.failed.len(),
                                report.evicted.len()
                            ),
                            Ok(_) => {}
                            Err(e) => error!("Crate sweep task failed: {e}"),
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!("Crate sweeper stopped");
        }))
    }

    pub fn is_shut_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Stop the sweeper and write every crate. Never fails; errors are logged.
    pub fn shutdown(&self) {
        info!("Shutting down crate manager...");
        let started = std::time::Instant::now();

        self.shutdown_tx.send_replace(true);
        let total = self.registry.len();
        let saved = self.save_all();

        info!(
            "Crate manager shutdown completed in {}ms. Saved {saved}/{total} crates.",
            started.elapsed().as_millis()
        );
    }
}
