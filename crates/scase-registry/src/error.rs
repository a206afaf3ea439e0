//! Registry error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed crate file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("crate file {path} is missing `{field}`")]
    MissingField { path: PathBuf, field: &'static str },

    #[error("crate file {path} has invalid name `{name}`")]
    InvalidName { path: PathBuf, name: String },

    #[error("crate file {path} does not match its name `{name}`")]
    NameMismatch { path: PathBuf, name: String },
}

#[derive(Debug, Error)]
pub enum CrateError {
    #[error("crate `{0}` already exists")]
    AlreadyExists(String),

    #[error("invalid crate name `{0}`")]
    InvalidName(String),

    #[error("crate `{0}` not found")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
