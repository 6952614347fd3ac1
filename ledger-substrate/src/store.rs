//! The ledger surface consumed by contract code
//!
//! `LedgerStore` is the narrow interface an invocation sees: keyed reads
//! and staged writes against public state and private collections, plus
//! range, rich-query, and history scans returned as lazy streams.
//!
//! Streams are forward-only and restartable only by re-invocation. The
//! substrate-side cursor is released when the stream is dropped, whether it
//! was exhausted, closed early, or abandoned on an error path; open-stream
//! accounting is kept so tests can assert nothing leaked.

use crate::error::Result;
use crate::types::{ContentHash, HistoryEntry, Partition, Selector};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Keyed reads and writes plus scans, as seen by one unit of work
pub trait LedgerStore {
    /// Read a public-state value
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stage a public-state write
    fn put_state(&mut self, key: &str, value: &[u8]) -> Result<()>;

    /// Read a private value (members only; enforcement is the substrate's)
    fn get_private(&self, collection: &str, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stage a private write; the substrate records a content hash beside it
    fn put_private(&mut self, collection: &str, key: &str, value: &[u8]) -> Result<()>;

    /// Read the content hash of a private value without exposing content
    fn get_private_hash(&self, collection: &str, key: &str) -> Result<Option<ContentHash>>;

    /// Lexicographic key-range scan; empty bounds are unbounded
    fn get_range<'a>(
        &'a self,
        partition: &Partition,
        start: &str,
        end: &str,
    ) -> Result<KvStream<'a>>;

    /// Predicate search over stored JSON records
    fn get_query_result<'a>(
        &'a self,
        partition: &Partition,
        selector: &Selector,
    ) -> Result<KvStream<'a>>;

    /// Committed mutation history for one key, newest first
    fn get_history<'a>(&'a self, partition: &Partition, key: &str) -> Result<HistoryStream<'a>>;
}

/// Open/closed stream accounting shared by all streams of one backend
#[derive(Debug, Default)]
pub struct StreamStats {
    opened: AtomicU64,
    closed: AtomicU64,
}

impl StreamStats {
    /// Streams opened since the backend was created
    pub fn opened(&self) -> u64 {
        self.opened.load(Ordering::SeqCst)
    }

    /// Streams released since the backend was created
    pub fn closed(&self) -> u64 {
        self.closed.load(Ordering::SeqCst)
    }

    /// Streams currently holding a cursor
    pub fn in_flight(&self) -> u64 {
        self.opened().saturating_sub(self.closed())
    }
}

/// RAII registration of one open stream
#[derive(Debug)]
pub(crate) struct StreamGuard {
    stats: Arc<StreamStats>,
}

impl StreamGuard {
    pub(crate) fn register(stats: Arc<StreamStats>) -> Self {
        stats.opened.fetch_add(1, Ordering::SeqCst);
        Self { stats }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Lazy (key, value) sequence from a range or rich query
pub struct KvStream<'a> {
    inner: Box<dyn Iterator<Item = Result<(String, Vec<u8>)>> + 'a>,
    _guard: StreamGuard,
}

impl<'a> KvStream<'a> {
    pub(crate) fn new(
        inner: Box<dyn Iterator<Item = Result<(String, Vec<u8>)>> + 'a>,
        guard: StreamGuard,
    ) -> Self {
        Self {
            inner,
            _guard: guard,
        }
    }

    /// Release the underlying cursor without draining
    pub fn close(self) {}

    /// Drain the stream, then release the cursor
    pub fn collect_all(self) -> Result<Vec<(String, Vec<u8>)>> {
        let mut entries = Vec::new();
        for item in self {
            entries.push(item?);
        }
        Ok(entries)
    }
}

impl Iterator for KvStream<'_> {
    type Item = Result<(String, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl std::fmt::Debug for KvStream<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvStream").finish_non_exhaustive()
    }
}

/// Lazy history sequence for one key, newest first
pub struct HistoryStream<'a> {
    inner: Box<dyn Iterator<Item = Result<HistoryEntry>> + 'a>,
    _guard: StreamGuard,
}

impl<'a> HistoryStream<'a> {
    pub(crate) fn new(
        inner: Box<dyn Iterator<Item = Result<HistoryEntry>> + 'a>,
        guard: StreamGuard,
    ) -> Self {
        Self {
            inner,
            _guard: guard,
        }
    }

    /// Release the underlying cursor without draining
    pub fn close(self) {}

    /// Drain the stream, then release the cursor
    pub fn collect_all(self) -> Result<Vec<HistoryEntry>> {
        let mut entries = Vec::new();
        for item in self {
            entries.push(item?);
        }
        Ok(entries)
    }
}

impl Iterator for HistoryStream<'_> {
    type Item = Result<HistoryEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl std::fmt::Debug for HistoryStream<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStream").finish_non_exhaustive()
    }
}
