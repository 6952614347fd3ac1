//! Backend seam beneath the unit of work
//!
//! A backend exposes the raw keyed spaces (world state, private data,
//! private hashes) plus history, and applies one commit batch atomically.
//! Policy never lives here.

use crate::error::Result;
use crate::store::StreamStats;
use crate::types::{HistoryEntry, Partition, TxMeta};
use std::sync::Arc;

/// A raw keyed space inside the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Space {
    /// Public world state
    WorldState,
    /// Private data of one collection
    PrivateData(String),
    /// Content hashes of one collection's private data
    PrivateHash(String),
}

impl Space {
    /// The data space backing a partition
    pub fn data(partition: &Partition) -> Self {
        match partition {
            Partition::Public => Space::WorldState,
            Partition::Private(name) => Space::PrivateData(name.clone()),
        }
    }

    /// The partition a data space belongs to, if it is a data space
    pub fn partition(&self) -> Option<Partition> {
        match self {
            Space::WorldState => Some(Partition::Public),
            Space::PrivateData(name) => Some(Partition::Private(name.clone())),
            Space::PrivateHash(_) => None,
        }
    }

    /// Stable label used for history addressing and fingerprints
    pub fn label(&self) -> String {
        match self {
            Space::WorldState => "w".to_string(),
            Space::PrivateData(name) => format!("p:{}", name),
            Space::PrivateHash(name) => format!("h:{}", name),
        }
    }
}

/// One write staged by a unit of work.
///
/// Only data spaces are staged directly; the backend derives the content
/// hash write for private data and the history entry for every write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedWrite {
    /// Target data space
    pub space: Space,
    /// Key within the space
    pub key: String,
    /// Value bytes
    pub value: Vec<u8>,
}

/// Raw keyed storage with atomic batch commit
pub trait Backend {
    /// Read one key from a space (committed state only)
    fn read(&self, space: &Space, key: &str) -> Result<Option<Vec<u8>>>;

    /// Lexicographic scan over a space; empty bounds are unbounded
    fn scan<'a>(
        &'a self,
        space: &Space,
        start: &str,
        end: &str,
    ) -> Result<Box<dyn Iterator<Item = Result<(String, Vec<u8>)>> + 'a>>;

    /// Committed mutation history for one key, newest first
    fn history<'a>(
        &'a self,
        partition: &Partition,
        key: &str,
    ) -> Result<Box<dyn Iterator<Item = Result<HistoryEntry>> + 'a>>;

    /// Apply all writes atomically, appending one history entry per write
    /// under the given transaction metadata
    fn apply(&self, meta: &TxMeta, writes: &[StagedWrite]) -> Result<()>;

    /// Stream accounting shared by every stream opened on this backend
    fn stream_stats(&self) -> &Arc<StreamStats>;
}
