//! Error types for the stressmon engine

use thiserror::Error;

/// Errors surfaced by the acquisition and scoring engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Device unreachable: {0}")]
    ConnectionUnreachable(String),

    #[error("Malformed sensor response: {0}")]
    MalformedResponse(String),

    #[error("Monitoring requires an active device connection")]
    NotConnected,

    #[error("Monitoring is already running")]
    AlreadyRunning,

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}
