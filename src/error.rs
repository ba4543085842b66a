use thiserror::Error;

use crate::models::Phase;

/// Failures of a classifier backend. Both variants are recovered by falling
/// back to the rule-based classifier and never reach the volunteer.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// The model call failed or timed out
    #[error("classification unavailable: {0}")]
    Unavailable(String),
    /// The model answered, but not with a usable classification
    #[error("malformed classifier output: {0}")]
    Malformed(String),
}

/// Phase table errors. Unreachable with a validated table.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("phase {0:?} is not defined in the phase table")]
    UnknownPhase(Phase),
    #[error("invalid phase table: {0}")]
    InvalidPhaseTable(String),
}

/// Failure to write a session record. Logged and retried on the next turn.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize session record: {0}")]
    Serialize(#[from] serde_json::Error),
}
