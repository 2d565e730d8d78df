//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `records` - Append-only record log (key: big-endian sequence number)
//! - `state` - Current state snapshot (single key)
//! - `meta` - Log metadata (next sequence number)
//!
//! A commit writes the new records, the updated snapshot, and the advanced
//! sequence counter in one `WriteBatch`, so disk state is always a prefix-
//! consistent view of the ledger.

use crate::{
    error::{Error, Result},
    state::TokenState,
    types::{SequencedRecord, TokenRecord},
    Config,
};
use chrono::Utc;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use std::sync::Arc;

/// Column family names
const CF_RECORDS: &str = "records";
const CF_STATE: &str = "state";
const CF_META: &str = "meta";

/// Snapshot key within the state column family
const STATE_KEY: &[u8] = b"current";

/// Next-sequence key within the meta column family
const NEXT_SEQUENCE_KEY: &[u8] = b"next_sequence";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,
}

impl Storage {
    /// Open or create the database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_RECORDS, Self::cf_options_records()),
            ColumnFamilyDescriptor::new(CF_STATE, Self::cf_options_state()),
            ColumnFamilyDescriptor::new(CF_META, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = ?path, "Opened RocksDB");

        Ok(Self { db: Arc::new(db) })
    }

    fn cf_options_records() -> Options {
        let mut opts = Options::default();
        // Append-only log compresses well
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_state() -> Options {
        let mut opts = Options::default();
        // Snapshot is rewritten on every commit, favor speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    // State snapshot operations

    /// Load the persisted state snapshot, if one exists
    pub fn load_state(&self) -> Result<Option<TokenState>> {
        let cf = self.cf_handle(CF_STATE)?;

        match self.db.get_cf(cf, STATE_KEY)? {
            Some(value) => {
                let state: TokenState = bincode::deserialize(&value)?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    /// Persist the genesis snapshot and initialize the sequence counter
    pub fn init_state(&self, state: &TokenState) -> Result<()> {
        let mut batch = WriteBatch::default();

        let cf_state = self.cf_handle(CF_STATE)?;
        batch.put_cf(cf_state, STATE_KEY, bincode::serialize(state)?);

        let cf_meta = self.cf_handle(CF_META)?;
        batch.put_cf(cf_meta, NEXT_SEQUENCE_KEY, 0u64.to_be_bytes());

        self.db.write(batch)?;

        tracing::info!(
            owner = %state.owner(),
            cap = state.cap(),
            "Genesis state persisted"
        );

        Ok(())
    }

    /// Next sequence number to be assigned
    pub fn next_sequence(&self) -> Result<u64> {
        let cf = self.cf_handle(CF_META)?;

        match self.db.get_cf(cf, NEXT_SEQUENCE_KEY)? {
            Some(value) => {
                let bytes: [u8; 8] = value
                    .as_slice()
                    .try_into()
                    .map_err(|_| Error::Storage("corrupt sequence counter".to_string()))?;
                Ok(u64::from_be_bytes(bytes))
            }
            None => Ok(0),
        }
    }

    /// Atomically append records and replace the state snapshot
    ///
    /// Returns the records with their assigned sequence numbers.
    pub fn commit(
        &self,
        state: &TokenState,
        records: &[TokenRecord],
    ) -> Result<Vec<SequencedRecord>> {
        let mut sequence = self.next_sequence()?;
        let emitted_at = Utc::now();

        let mut batch = WriteBatch::default();
        let cf_records = self.cf_handle(CF_RECORDS)?;
        let cf_state = self.cf_handle(CF_STATE)?;
        let cf_meta = self.cf_handle(CF_META)?;

        let mut sequenced = Vec::with_capacity(records.len());
        for record in records {
            let entry = SequencedRecord {
                sequence,
                record: record.clone(),
                emitted_at,
            };
            batch.put_cf(cf_records, sequence.to_be_bytes(), bincode::serialize(&entry)?);
            sequenced.push(entry);
            sequence += 1;
        }

        batch.put_cf(cf_state, STATE_KEY, bincode::serialize(state)?);
        batch.put_cf(cf_meta, NEXT_SEQUENCE_KEY, sequence.to_be_bytes());

        self.db.write(batch)?;

        tracing::debug!(
            appended = records.len(),
            next_sequence = sequence,
            "Commit written"
        );

        Ok(sequenced)
    }

    // Record log operations

    /// Get a single record by sequence number
    pub fn get_record(&self, sequence: u64) -> Result<SequencedRecord> {
        let cf = self.cf_handle(CF_RECORDS)?;

        let value = self
            .db
            .get_cf(cf, sequence.to_be_bytes())?
            .ok_or_else(|| Error::Storage(format!("record {} not found", sequence)))?;

        let entry: SequencedRecord = bincode::deserialize(&value)?;
        Ok(entry)
    }

    /// Replay the record log in emission order, starting at `from_sequence`
    pub fn records_from(&self, from_sequence: u64) -> Result<Vec<SequencedRecord>> {
        let cf = self.cf_handle(CF_RECORDS)?;

        let start = from_sequence.to_be_bytes();
        let iter = self.db.iterator_cf(
            cf,
            IteratorMode::From(&start, rocksdb::Direction::Forward),
        );

        let mut entries = Vec::new();
        for item in iter {
            let (_, value) = item?;
            let entry: SequencedRecord = bincode::deserialize(&value)?;
            entries.push(entry);
        }

        Ok(entries)
    }
}
