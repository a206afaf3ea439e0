//! Crate registry: lootbox definitions, their in-memory store, and the
//! per-crate JSON files that back it.
//!
//! [`CrateManager`] is the entry point. It owns the [`CrateRegistry`], the
//! [`CrateStore`] on disk and the dirty set drained by each sweep.

pub mod config;
pub mod error;
pub mod manager;
pub mod model;
pub mod registry;
pub mod storage;

pub use config::CrateConfig;
pub use error::{CrateError, StorageError};
pub use manager::{CrateManager, SweepReport};
pub use model::Crate;
pub use registry::CrateRegistry;
pub use storage::CrateStore;
