//! Error types for the substrate

use thiserror::Error;

/// Result type for substrate operations
pub type Result<T> = std::result::Result<T, SubstrateError>;

/// Substrate errors
#[derive(Error, Debug)]
pub enum SubstrateError {
    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error (history envelopes)
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// A stored value could not be decoded
    #[error("Corrupted value under key {key}: {detail}")]
    Corrupted {
        /// Key whose value failed to decode
        key: String,
        /// What failed
        detail: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for SubstrateError {
    fn from(err: rocksdb::Error) -> Self {
        SubstrateError::Storage(err.to_string())
    }
}
