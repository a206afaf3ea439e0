use scase_registry::CrateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("plugin is not enabled")]
    NotEnabled,

    #[error("crate `{0}` has no key set")]
    NoKeySet(String),

    #[error("item must not be empty")]
    EmptyItem,

    #[error("player `{0}` not found")]
    PlayerNotFound(String),

    #[error("no key for crate `{0}`")]
    MissingKey(String),

    #[error("player `{0}` has no roll to re-roll")]
    NothingHeld(String),

    #[error(transparent)]
    Crate(#[from] CrateError),
}
