use thiserror::Error;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, services::match_watcher::WatcherError};

/// Errors that can occur while setting up a coordinator.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Coordinator settings or game definition cannot be run.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A referenced game does not exist.
    #[error("resource not found: {0}")]
    NotFound(String),
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::InvalidConfig(format!("validation failed: {}", err))
    }
}

/// Why a game run stopped without producing winners.
#[derive(Debug, Error)]
pub enum PlayError {
    /// The match watcher reported a failure; the run is aborted.
    #[error("match watcher failed")]
    Watcher(#[source] WatcherError),
    /// The caller cancelled the run.
    #[error("game run cancelled")]
    Cancelled,
}

impl PlayError {
    /// Whether the run was stopped by its caller rather than by a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PlayError::Cancelled)
    }
}

impl From<WatcherError> for PlayError {
    fn from(err: WatcherError) -> Self {
        PlayError::Watcher(err)
    }
}
