//! RocksDB backend
//!
//! # Column Families
//!
//! - `world_state` - Public state (key: ledger key)
//! - `private_data` - Private collections (key: collection || 0x00 || key)
//! - `private_hash` - SHA-256 of private values (same composite key)
//! - `history` - Append-only mutation log (key: space || 0x00 || key ||
//!   0x00 || commit height || write index)
//! - `meta` - Commit counter

use crate::backend::{Backend, Space, StagedWrite};
use crate::error::{Result, SubstrateError};
use crate::store::StreamStats;
use crate::types::{ContentHash, HistoryEntry, Partition, TxMeta};
use chrono::DateTime;
use parking_lot::Mutex;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, DBCompactionStyle, Direction, IteratorMode, Options,
    WriteBatch, DB,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Column family names
const CF_WORLD: &str = "world_state";
const CF_PRIVATE: &str = "private_data";
const CF_PRIVATE_HASH: &str = "private_hash";
const CF_HISTORY: &str = "history";
const CF_META: &str = "meta";

/// Meta key holding the commit counter
const COMMIT_HEIGHT_KEY: &[u8] = b"commit_height";

/// RocksDB tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksTuning {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Target file size (MB)
    pub target_file_size_mb: u64,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for RocksTuning {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 4,
            target_file_size_mb: 64,
            max_background_jobs: 2,
            enable_statistics: false,
        }
    }
}

/// Serialized history record; the stored form of one mutation
#[derive(Debug, Serialize, Deserialize)]
struct HistoryEnvelope {
    tx_id: Uuid,
    timestamp_nanos: i64,
    value: Vec<u8>,
}

/// RocksDB backend
pub struct RocksBackend {
    db: DB,
    commit_lock: Mutex<()>,
    stats: Arc<StreamStats>,
}

impl RocksBackend {
    /// Open or create a database at the given path
    pub fn open(path: impl AsRef<Path>, tuning: &RocksTuning) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_write_buffer_size(tuning.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(tuning.max_write_buffer_number);
        db_opts.set_target_file_size_base(tuning.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(tuning.max_background_jobs);
        db_opts.set_compaction_style(DBCompactionStyle::Universal);

        if tuning.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_WORLD, Self::cf_options_state()),
            ColumnFamilyDescriptor::new(CF_PRIVATE, Self::cf_options_state()),
            ColumnFamilyDescriptor::new(CF_PRIVATE_HASH, Self::cf_options_hash()),
            ColumnFamilyDescriptor::new(CF_HISTORY, Self::cf_options_history()),
            ColumnFamilyDescriptor::new(CF_META, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened RocksDB substrate at {:?}", path);

        Ok(Self {
            db,
            commit_lock: Mutex::new(()),
            stats: Arc::new(StreamStats::default()),
        })
    }

    fn cf_options_state() -> Options {
        let mut opts = Options::default();
        // State is frequently read, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_hash() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_options_history() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts.set_bottommost_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| SubstrateError::Storage(format!("Column family {} not found", name)))
    }

    fn cf_for(&self, space: &Space) -> Result<&ColumnFamily> {
        match space {
            Space::WorldState => self.cf_handle(CF_WORLD),
            Space::PrivateData(_) => self.cf_handle(CF_PRIVATE),
            Space::PrivateHash(_) => self.cf_handle(CF_PRIVATE_HASH),
        }
    }

    /// Composite storage key for a space
    fn composite_key(space: &Space, key: &str) -> Vec<u8> {
        match space {
            Space::WorldState => key.as_bytes().to_vec(),
            Space::PrivateData(collection) | Space::PrivateHash(collection) => {
                let mut composite = collection.as_bytes().to_vec();
                composite.push(0);
                composite.extend_from_slice(key.as_bytes());
                composite
            }
        }
    }

    /// History key: space label || 0x00 || key || 0x00 || height || index
    fn history_key(label: &str, key: &str, height: u64, index: u32) -> Vec<u8> {
        let mut hkey = label.as_bytes().to_vec();
        hkey.push(0);
        hkey.extend_from_slice(key.as_bytes());
        hkey.push(0);
        hkey.extend_from_slice(&height.to_be_bytes());
        hkey.extend_from_slice(&index.to_be_bytes());
        hkey
    }

    fn commit_height(&self) -> Result<u64> {
        let cf = self.cf_handle(CF_META)?;
        match self.db.get_cf(cf, COMMIT_HEIGHT_KEY)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    SubstrateError::Corrupted {
                        key: "commit_height".to_string(),
                        detail: "expected 8-byte counter".to_string(),
                    }
                })?;
                Ok(u64::from_be_bytes(raw))
            }
            None => Ok(0),
        }
    }

    fn decode_key(raw: &[u8]) -> Result<String> {
        String::from_utf8(raw.to_vec()).map_err(|_| SubstrateError::Corrupted {
            key: String::from_utf8_lossy(raw).into_owned(),
            detail: "non-utf8 ledger key".to_string(),
        })
    }
}

impl Backend for RocksBackend {
    fn read(&self, space: &Space, key: &str) -> Result<Option<Vec<u8>>> {
        let cf = self.cf_for(space)?;
        Ok(self.db.get_cf(cf, Self::composite_key(space, key))?)
    }

    fn scan<'a>(
        &'a self,
        space: &Space,
        start: &str,
        end: &str,
    ) -> Result<Box<dyn Iterator<Item = Result<(String, Vec<u8>)>> + 'a>> {
        let cf = self.cf_for(space)?;

        // Composite prefix for private spaces; empty for world state.
        let prefix: Vec<u8> = match space {
            Space::WorldState => Vec::new(),
            Space::PrivateData(collection) | Space::PrivateHash(collection) => {
                let mut prefix = collection.as_bytes().to_vec();
                prefix.push(0);
                prefix
            }
        };

        let seek = {
            let mut seek = prefix.clone();
            seek.extend_from_slice(start.as_bytes());
            seek
        };

        let prefix_len = prefix.len();
        let end = end.to_string();

        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&seek, Direction::Forward));

        // Stay inside the composite prefix, strip it, and apply the
        // exclusive upper bound on the logical key.
        let bounded = iter
            .take_while(move |item| match item {
                Ok((raw_key, _)) => raw_key.starts_with(&prefix),
                Err(_) => true,
            })
            .map(move |item| {
                let (raw_key, value) = item?;
                let key = Self::decode_key(&raw_key[prefix_len..])?;
                Ok((key, value.into_vec()))
            })
            .take_while(move |item: &Result<(String, Vec<u8>)>| match item {
                Ok((key, _)) => end.is_empty() || key.as_str() < end.as_str(),
                Err(_) => true,
            });

        Ok(Box::new(bounded))
    }

    fn history<'a>(
        &'a self,
        partition: &Partition,
        key: &str,
    ) -> Result<Box<dyn Iterator<Item = Result<HistoryEntry>> + 'a>> {
        let cf = self.cf_handle(CF_HISTORY)?;
        let label = Space::data(partition).label();

        let mut prefix = label.as_bytes().to_vec();
        prefix.push(0);
        prefix.extend_from_slice(key.as_bytes());
        prefix.push(0);

        // Newest first: reverse scan from past the last possible suffix
        // (8-byte height + 4-byte index).
        let mut upper = prefix.clone();
        upper.extend_from_slice(&[0xFF; 12]);

        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&upper, Direction::Reverse));

        let mapped = iter
            .map(|item| {
                let (raw_key, value) = item?;
                Ok((raw_key, value))
            })
            .take_while(move |item: &Result<(Box<[u8]>, Box<[u8]>)>| match item {
                Ok((raw_key, _)) => raw_key.starts_with(&prefix),
                Err(_) => true,
            })
            .map(|item: Result<(Box<[u8]>, Box<[u8]>)>| {
                let (raw_key, value) = item?;
                let envelope: HistoryEnvelope =
                    bincode::deserialize(&value).map_err(|err| SubstrateError::Corrupted {
                        key: String::from_utf8_lossy(&raw_key).into_owned(),
                        detail: err.to_string(),
                    })?;
                Ok(HistoryEntry {
                    tx_id: envelope.tx_id,
                    timestamp: DateTime::from_timestamp_nanos(envelope.timestamp_nanos),
                    value: envelope.value,
                })
            });

        Ok(Box::new(mapped))
    }

    fn apply(&self, meta: &TxMeta, writes: &[StagedWrite]) -> Result<()> {
        // Serializes commits so the height counter stays linear.
        let _commit_guard = self.commit_lock.lock();

        let height = self.commit_height()? + 1;
        let mut batch = WriteBatch::default();

        let cf_history = self.cf_handle(CF_HISTORY)?;
        let cf_meta = self.cf_handle(CF_META)?;

        for (index, write) in writes.iter().enumerate() {
            let label = match write.space.partition() {
                Some(_) => write.space.label(),
                None => continue, // hash spaces are derived, never staged
            };

            let cf = self.cf_for(&write.space)?;
            batch.put_cf(cf, Self::composite_key(&write.space, &write.key), &write.value);

            if let Space::PrivateData(collection) = &write.space {
                let hash_space = Space::PrivateHash(collection.clone());
                let cf_hash = self.cf_for(&hash_space)?;
                let hash = ContentHash::of(&write.value);
                batch.put_cf(
                    cf_hash,
                    Self::composite_key(&hash_space, &write.key),
                    hash.as_bytes(),
                );
            }

            let envelope = HistoryEnvelope {
                tx_id: meta.tx_id,
                timestamp_nanos: meta.timestamp.timestamp_nanos_opt().unwrap_or(0),
                value: write.value.clone(),
            };
            batch.put_cf(
                cf_history,
                Self::history_key(&label, &write.key, height, index as u32),
                bincode::serialize(&envelope)?,
            );
        }

        batch.put_cf(cf_meta, COMMIT_HEIGHT_KEY, height.to_be_bytes());

        self.db.write(batch)?;

        tracing::debug!(
            tx_id = %meta.tx_id,
            height,
            writes = writes.len(),
            "Unit of work committed"
        );

        Ok(())
    }

    fn stream_stats(&self) -> &Arc<StreamStats> {
        &self.stats
    }
}
