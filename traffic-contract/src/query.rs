//! Read-only query facade
//!
//! Typed, lazy views over the substrate's scan surface. Each stream wraps
//! a substrate cursor, deserializes records on the fly, and releases the
//! cursor when dropped, whether drained or abandoned early. Streams are
//! forward-only; a fresh invocation gets a fresh stream.

use crate::error::Result;
use crate::registry::AssetRegistry;
use crate::types::Asset;
use chrono::{DateTime, Utc};
use ledger_substrate::{HistoryStream, KvStream, LedgerStore, Selector};
use std::marker::PhantomData;
use uuid::Uuid;

/// Lazy (key, record) sequence
pub struct RecordStream<'a, A: Asset> {
    inner: KvStream<'a>,
    _marker: PhantomData<A>,
}

impl<'a, A: Asset> RecordStream<'a, A> {
    fn new(inner: KvStream<'a>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// Release the underlying cursor without draining
    pub fn close(self) {}

    /// Drain the stream, then release the cursor
    pub fn collect_all(self) -> Result<Vec<(String, A)>> {
        let mut records = Vec::new();
        for item in self {
            records.push(item?);
        }
        Ok(records)
    }
}

impl<A: Asset> Iterator for RecordStream<'_, A> {
    type Item = Result<(String, A)>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        Some(item.map_err(Into::into).and_then(|(key, bytes)| {
            let record: A = serde_json::from_slice(&bytes)?;
            Ok((key, record))
        }))
    }
}

/// One historical value of a key, as recorded by the substrate
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord<A> {
    /// Transaction that wrote this value
    pub tx_id: Uuid,
    /// Commit timestamp of that transaction
    pub timestamp: DateTime<Utc>,
    /// The record as it stood after the write
    pub record: A,
}

/// Lazy mutation history for one key, newest first
pub struct RecordHistory<'a, A: Asset> {
    inner: HistoryStream<'a>,
    _marker: PhantomData<A>,
}

impl<'a, A: Asset> RecordHistory<'a, A> {
    fn new(inner: HistoryStream<'a>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// Release the underlying cursor without draining
    pub fn close(self) {}

    /// Drain the stream, then release the cursor
    pub fn collect_all(self) -> Result<Vec<HistoryRecord<A>>> {
        let mut records = Vec::new();
        for item in self {
            records.push(item?);
        }
        Ok(records)
    }
}

impl<A: Asset> Iterator for RecordHistory<'_, A> {
    type Item = Result<HistoryRecord<A>>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        Some(item.map_err(Into::into).and_then(|entry| {
            let record: A = serde_json::from_slice(&entry.value)?;
            Ok(HistoryRecord {
                tx_id: entry.tx_id,
                timestamp: entry.timestamp,
                record,
            })
        }))
    }
}

/// Entry points for scans over one registry's partition
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryFacade;

impl QueryFacade {
    /// Every record of the registry's asset type, by discriminator tag
    pub fn all_of_type<'a, A: Asset, S: LedgerStore>(
        store: &'a S,
        registry: &AssetRegistry<A>,
    ) -> Result<RecordStream<'a, A>> {
        let selector = Selector::new().field("assetType", A::TYPE.tag());
        let inner = store.get_query_result(registry.partition(), &selector)?;
        Ok(RecordStream::new(inner))
    }

    /// Lexicographic key-range scan; empty bounds are unbounded
    pub fn range<'a, A: Asset, S: LedgerStore>(
        store: &'a S,
        registry: &AssetRegistry<A>,
        start: &str,
        end: &str,
    ) -> Result<RecordStream<'a, A>> {
        let inner = store.get_range(registry.partition(), start, end)?;
        Ok(RecordStream::new(inner))
    }

    /// Full mutation history for one key, newest first
    pub fn history<'a, A: Asset, S: LedgerStore>(
        store: &'a S,
        registry: &AssetRegistry<A>,
        key: &str,
    ) -> Result<RecordHistory<'a, A>> {
        let inner = store.get_history(registry.partition(), key)?;
        Ok(RecordHistory::new(inner))
    }
}
