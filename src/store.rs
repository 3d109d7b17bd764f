use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use crate::scenario::{Scenario, ScenarioParams};
use crate::validation::ValidationError;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by scenario stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode scenario file: {0}")]
    Encode(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not reach scenario server: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Scenario server returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Not logged in or session expired")]
    Unauthorized,

    #[error("Scenario not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Invalid(#[from] ValidationError),
}

/// Which side of the storage split a store lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Remote,
    Local,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::Remote => write!(f, "remote"),
            StorageKind::Local => write!(f, "local"),
        }
    }
}

/// Storage capability for saved scenarios
///
/// Implementations are interchangeable; which one is used is decided once per
/// session (see [`crate::session::ScenarioSession`]).
#[async_trait]
pub trait ScenarioStore: Send + Sync {
    fn kind(&self) -> StorageKind;

    /// Validate and persist a scenario, returning the stored record with its
    /// assigned id and creation time
    async fn save(&self, params: ScenarioParams) -> Result<Scenario>;

    /// All saved scenarios in insertion order
    async fn list(&self) -> Result<Vec<Scenario>>;

    async fn delete(&self, id: &str) -> Result<()>;
}
