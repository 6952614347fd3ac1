//! Per-invocation unit of work
//!
//! One invocation = one unit of work. Reads observe committed state only;
//! writes accumulate in a staging buffer and become visible all at once on
//! `commit`, or never, if the unit of work is dropped. This is what makes
//! a rejected or retried invocation free of partial side effects.

use crate::backend::{Backend, Space, StagedWrite};
use crate::error::{Result, SubstrateError};
use crate::store::{HistoryStream, KvStream, LedgerStore, StreamGuard};
use crate::types::{ContentHash, HistoryEntry, Partition, Selector, TxMeta};

/// Buffered transaction against one backend
pub struct UnitOfWork<'b, B: Backend> {
    backend: &'b B,
    writes: Vec<StagedWrite>,
}

impl<'b, B: Backend> UnitOfWork<'b, B> {
    /// Begin a unit of work reading the backend's committed state
    pub fn begin(backend: &'b B) -> Self {
        Self {
            backend,
            writes: Vec::new(),
        }
    }

    /// Number of staged writes
    pub fn staged(&self) -> usize {
        self.writes.len()
    }

    /// Apply every staged write atomically under the given metadata.
    ///
    /// A read-only unit of work commits as a no-op.
    pub fn commit(self, meta: TxMeta) -> Result<()> {
        if self.writes.is_empty() {
            return Ok(());
        }
        self.backend.apply(&meta, &self.writes)
    }

    /// Drop every staged write
    pub fn discard(self) {
        tracing::debug!(staged = self.writes.len(), "Unit of work discarded");
    }

    fn stage(&mut self, space: Space, key: &str, value: &[u8]) {
        self.writes.push(StagedWrite {
            space,
            key: key.to_string(),
            value: value.to_vec(),
        });
    }
}

impl<B: Backend> LedgerStore for UnitOfWork<'_, B> {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.backend.read(&Space::WorldState, key)
    }

    fn put_state(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.stage(Space::WorldState, key, value);
        Ok(())
    }

    fn get_private(&self, collection: &str, key: &str) -> Result<Option<Vec<u8>>> {
        self.backend
            .read(&Space::PrivateData(collection.to_string()), key)
    }

    fn put_private(&mut self, collection: &str, key: &str, value: &[u8]) -> Result<()> {
        self.stage(Space::PrivateData(collection.to_string()), key, value);
        Ok(())
    }

    fn get_private_hash(&self, collection: &str, key: &str) -> Result<Option<ContentHash>> {
        let stored = self
            .backend
            .read(&Space::PrivateHash(collection.to_string()), key)?;

        match stored {
            Some(bytes) => {
                let raw: [u8; 32] =
                    bytes
                        .as_slice()
                        .try_into()
                        .map_err(|_| SubstrateError::Corrupted {
                            key: key.to_string(),
                            detail: "expected 32-byte content hash".to_string(),
                        })?;
                Ok(Some(ContentHash::from_bytes(raw)))
            }
            None => Ok(None),
        }
    }

    fn get_range<'a>(
        &'a self,
        partition: &Partition,
        start: &str,
        end: &str,
    ) -> Result<KvStream<'a>> {
        let inner = self.backend.scan(&Space::data(partition), start, end)?;
        let guard = StreamGuard::register(self.backend.stream_stats().clone());
        Ok(KvStream::new(inner, guard))
    }

    fn get_query_result<'a>(
        &'a self,
        partition: &Partition,
        selector: &Selector,
    ) -> Result<KvStream<'a>> {
        let inner = self.backend.scan(&Space::data(partition), "", "")?;
        let selector = selector.clone();

        let filtered = inner.filter_map(move |item| match item {
            Ok((key, bytes)) => match serde_json::from_slice::<serde_json::Value>(&bytes) {
                Ok(doc) if selector.matches(&doc) => Some(Ok((key, bytes))),
                Ok(_) => None,
                Err(err) => Some(Err(SubstrateError::Corrupted {
                    key,
                    detail: err.to_string(),
                })),
            },
            Err(err) => Some(Err(err)),
        });

        let guard = StreamGuard::register(self.backend.stream_stats().clone());
        Ok(KvStream::new(Box::new(filtered), guard))
    }

    fn get_history<'a>(&'a self, partition: &Partition, key: &str) -> Result<HistoryStream<'a>> {
        let inner = self.backend.history(partition, key)?;
        let guard = StreamGuard::register(self.backend.stream_stats().clone());
        Ok(HistoryStream::new(inner, guard))
    }
}
