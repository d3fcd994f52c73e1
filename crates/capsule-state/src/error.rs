//! Error types for the network state.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for network state operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur while loading, saving or updating network state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("network not bootstrapped")]
    NotBootstrapped,

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error in {}: {reason}", path.display())]
    Deserialize { path: PathBuf, reason: String },

    #[error("invalid network state: {0}")]
    Invalid(#[from] capsule_core::ValidationError),

    #[error("node set {0} not found")]
    NodeSetNotFound(usize),

    #[error("node set {node_set} has no {kind} config")]
    MissingSubnode { node_set: String, kind: String },
}
