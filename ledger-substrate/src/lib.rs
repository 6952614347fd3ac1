//! RoadGrid Ledger Substrate
//!
//! The replicated-ledger substrate the traffic contract runs against,
//! reduced to the narrow surface the contract consumes: keyed public state,
//! named private collections with content hashes, range and rich queries,
//! and per-key mutation history.
//!
//! # Architecture
//!
//! - **Unit of work**: every invocation reads committed state and stages
//!   writes in a buffer; `commit` applies the whole buffer atomically or
//!   not at all
//! - **Backends**: RocksDB column families for durable deployments, an
//!   in-memory store for tests and replay checks
//! - **Streams**: range/rich/history results are lazy, forward-only
//!   sequences that release their cursor when dropped
//!
//! # Invariants
//!
//! - Deterministic replay: same commits in the same order → same state
//! - No partial commits: an abandoned unit of work leaves no trace
//! - Private content never crosses the hash boundary: non-members see only
//!   the SHA-256 of a private value

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod backend;
pub mod error;
pub mod memory;
pub mod rocks;
pub mod store;
pub mod types;
pub mod unit_of_work;

// Re-exports
pub use backend::{Backend, Space, StagedWrite};
pub use error::{Result, SubstrateError};
pub use memory::MemoryBackend;
pub use rocks::{RocksBackend, RocksTuning};
pub use store::{HistoryStream, KvStream, LedgerStore, StreamStats};
pub use types::{ContentHash, HistoryEntry, Partition, Selector, TxMeta};
pub use unit_of_work::UnitOfWork;
