//! Core types shared by the substrate surface
//!
//! All types are designed for:
//! - Deterministic serialization (record bytes are caller-supplied JSON,
//!   history envelopes are bincode)
//! - Memory safety (no unsafe code)
//! - Replay stability (transaction metadata can be derived, never sampled)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Namespace for deterministically derived transaction ids
const TX_ID_NAMESPACE: Uuid = Uuid::from_u128(0x7261_696c_2d74_7820_6964_2d6e_616d_6573);

/// Storage partition a key lives in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Partition {
    /// Public world state, readable by every organization
    Public,
    /// Named private collection; non-members see only content hashes
    Private(String),
}

impl Partition {
    /// Private partition with the given collection name
    pub fn private(name: impl Into<String>) -> Self {
        Partition::Private(name.into())
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partition::Public => write!(f, "public"),
            Partition::Private(name) => write!(f, "private:{}", name),
        }
    }
}

/// SHA-256 content hash of a private value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash the given bytes
    pub fn of(bytes: &[u8]) -> Self {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hasher.finalize().into())
    }

    /// Wrap raw hash bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw hash bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Transaction metadata assigned by the substrate for one unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxMeta {
    /// Substrate-assigned transaction id
    pub tx_id: Uuid,
    /// Substrate-assigned commit timestamp
    pub timestamp: DateTime<Utc>,
}

impl TxMeta {
    /// Metadata with an explicit id and timestamp
    pub fn new(tx_id: Uuid, timestamp: DateTime<Utc>) -> Self {
        Self { tx_id, timestamp }
    }

    /// Deterministic metadata derived from a commit sequence number.
    ///
    /// Replaying the same invocation sequence with the same sequence
    /// numbers reproduces identical transaction ids and timestamps, which
    /// keeps history bytes stable across independent executors.
    pub fn derived(seq: u64) -> Self {
        let tx_id = Uuid::new_v5(&TX_ID_NAMESPACE, &seq.to_be_bytes());
        let timestamp =
            DateTime::from_timestamp(seq as i64, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        Self { tx_id, timestamp }
    }
}

/// One committed mutation of a key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Transaction that produced this value
    pub tx_id: Uuid,
    /// Commit timestamp of that transaction
    pub timestamp: DateTime<Utc>,
    /// Value bytes as written
    pub value: Vec<u8>,
}

/// Equality selector for rich queries over stored JSON records.
///
/// Every named field must be present in the record and equal to the given
/// value for the record to match. An empty selector matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector(BTreeMap<String, serde_json::Value>);

impl Selector {
    /// Empty selector (matches all records)
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `name` to equal `value`
    pub fn field(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Whether the given record satisfies every constraint
    pub fn matches(&self, record: &serde_json::Value) -> bool {
        self.0.iter().all(|(name, want)| record.get(name) == Some(want))
    }

    /// Number of constraints
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the selector has no constraints
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
