//! In-memory backend for tests and replay verification
//!
//! Ordered maps behind reader-writer locks. Scans snapshot the matching
//! entries under the read lock; there is no substrate-side cursor to hold,
//! so the snapshot itself is the released resource.

use crate::backend::{Backend, Space, StagedWrite};
use crate::error::Result;
use crate::store::StreamStats;
use crate::types::{ContentHash, HistoryEntry, Partition, TxMeta};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;

/// In-memory backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    spaces: RwLock<HashMap<Space, BTreeMap<String, Vec<u8>>>>,
    history: RwLock<HashMap<(Partition, String), Vec<HistoryEntry>>>,
    stats: Arc<StreamStats>,
}

impl MemoryBackend {
    /// Empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic digest of all committed state and history.
    ///
    /// Two backends that received the same commits in the same order
    /// produce identical fingerprints; replay tests compare these.
    pub fn fingerprint(&self) -> ContentHash {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();

        let spaces = self.spaces.read();
        let mut labels: Vec<(String, &BTreeMap<String, Vec<u8>>)> = spaces
            .iter()
            .map(|(space, map)| (space.label(), map))
            .collect();
        labels.sort_by(|a, b| a.0.cmp(&b.0));

        for (label, map) in labels {
            hasher.update(label.as_bytes());
            for (key, value) in map {
                hasher.update(key.as_bytes());
                hasher.update([0u8]);
                hasher.update(value);
                hasher.update([0u8]);
            }
        }

        let history = self.history.read();
        let mut keys: Vec<&(Partition, String)> = history.keys().collect();
        keys.sort_by_key(|(partition, key)| (partition.to_string(), key.clone()));

        for hkey in keys {
            let (partition, key) = hkey;
            hasher.update(partition.to_string().as_bytes());
            hasher.update(key.as_bytes());
            for entry in &history[hkey] {
                hasher.update(entry.tx_id.as_bytes());
                hasher.update(
                    entry
                        .timestamp
                        .timestamp_nanos_opt()
                        .unwrap_or(0)
                        .to_be_bytes(),
                );
                hasher.update(&entry.value);
            }
        }

        ContentHash::from_bytes(hasher.finalize().into())
    }
}

impl Backend for MemoryBackend {
    fn read(&self, space: &Space, key: &str) -> Result<Option<Vec<u8>>> {
        let spaces = self.spaces.read();
        Ok(spaces.get(space).and_then(|map| map.get(key).cloned()))
    }

    fn scan<'a>(
        &'a self,
        space: &Space,
        start: &str,
        end: &str,
    ) -> Result<Box<dyn Iterator<Item = Result<(String, Vec<u8>)>> + 'a>> {
        // An inverted range is empty, not a panic.
        if !start.is_empty() && !end.is_empty() && start >= end {
            return Ok(Box::new(std::iter::empty()));
        }

        let lower = if start.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Included(start)
        };
        let upper = if end.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end)
        };

        let spaces = self.spaces.read();
        let entries: Vec<(String, Vec<u8>)> = match spaces.get(space) {
            Some(map) => map
                .range::<str, _>((lower, upper))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            None => Vec::new(),
        };

        Ok(Box::new(entries.into_iter().map(Ok)))
    }

    fn history<'a>(
        &'a self,
        partition: &Partition,
        key: &str,
    ) -> Result<Box<dyn Iterator<Item = Result<HistoryEntry>> + 'a>> {
        let history = self.history.read();
        let entries: Vec<HistoryEntry> = history
            .get(&(partition.clone(), key.to_string()))
            .map(|entries| entries.iter().rev().cloned().collect())
            .unwrap_or_default();

        Ok(Box::new(entries.into_iter().map(Ok)))
    }

    fn apply(&self, meta: &TxMeta, writes: &[StagedWrite]) -> Result<()> {
        let mut spaces = self.spaces.write();
        let mut history = self.history.write();

        for write in writes {
            let partition = match write.space.partition() {
                Some(partition) => partition,
                None => continue, // hash spaces are derived, never staged
            };

            if let Space::PrivateData(collection) = &write.space {
                let hash = ContentHash::of(&write.value);
                spaces
                    .entry(Space::PrivateHash(collection.clone()))
                    .or_default()
                    .insert(write.key.clone(), hash.as_bytes().to_vec());
            }

            spaces
                .entry(write.space.clone())
                .or_default()
                .insert(write.key.clone(), write.value.clone());

            history
                .entry((partition, write.key.clone()))
                .or_default()
                .push(HistoryEntry {
                    tx_id: meta.tx_id,
                    timestamp: meta.timestamp,
                    value: write.value.clone(),
                });
        }

        Ok(())
    }

    fn stream_stats(&self) -> &Arc<StreamStats> {
        &self.stats
    }
}
