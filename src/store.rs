//! Store Module
//!
//! The public operation surface, binding catalog, locks, queries and
//! mutations together for one table.
//!
//! ## Concurrency Model
//!
//! The store spawns no threads of its own — it reacts to caller-issued
//! operations, any number of which may run concurrently on shared
//! references:
//!
//! - Mutual exclusion is per file path (each shard file and the catalog
//!   document are independent lock domains).
//! - A shard's streaming read, its rewrite/append, and its recorded-size
//!   refresh form one critical section under that shard's lock.
//! - Multi-shard operations take and release shard locks one at a time,
//!   so reads and mutations may interleave shard-by-shard.
//! - None of this coordinates separate OS processes on the same files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::info;

use crate::catalog::{Catalog, ShardInfo};
use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::mutation::{InsertOutcome, MutationEngine};
use crate::query::{GetOptions, QueryEngine};
use crate::lock::LockManager;
use crate::record::{empty_aux, Record};

/// An embedded document store bound to one table of one database.
///
/// Cheap to share behind an `Arc`; all operations take `&self`.
pub struct Store {
    /// Store configuration
    config: Config,

    /// Per-path locks shared by every operation of this store
    locks: Arc<LockManager>,

    /// Catalog metadata (in-memory copy of `info.json`)
    catalog: Mutex<Catalog>,
}

impl Store {
    /// Open or create a store with the given config.
    ///
    /// Creates the database root, the catalog document, and the table's
    /// directory with its first shard if any of them are missing.
    pub fn open(config: Config) -> Result<Self> {
        if config.table.is_empty() {
            return Err(StoreError::Config("table name must not be empty".to_string()));
        }
        if config.shard_size_limit == 0 {
            return Err(StoreError::Config(
                "shard size limit must be a positive number of bytes".to_string(),
            ));
        }
        if config.read_chunk_size == 0 {
            return Err(StoreError::Config(
                "read chunk size must be a positive number of bytes".to_string(),
            ));
        }

        let locks = Arc::new(LockManager::new());
        let mut catalog = Catalog::open(&config.root_dir, config.shard_size_limit, Arc::clone(&locks))?;
        catalog.ensure_table(&config.table)?;

        info!(
            root = %config.root_dir.display(),
            table = config.table.as_str(),
            "opened store"
        );

        Ok(Self {
            config,
            locks,
            catalog: Mutex::new(catalog),
        })
    }

    /// Open with a root path and table name (convenience method)
    ///
    /// Uses default config values for everything else.
    pub fn open_path(root: &Path, table: &str) -> Result<Self> {
        let config = Config::builder().root_dir(root).table(table).build();
        Self::open(config)
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Append records to the table's active shard.
    ///
    /// Each record becomes one newline-terminated line; the shard's
    /// recorded size is refreshed afterward, which may retire the shard
    /// and open a fresh one.
    pub fn insert(&self, records: &[Record]) -> Result<()> {
        self.mutations().insert(records)
    }

    /// Append a single record (convenience method)
    pub fn insert_one(&self, record: Record) -> Result<()> {
        self.insert(std::slice::from_ref(&record))
    }

    /// Insert `records` only if no stored record satisfies `predicate`.
    pub fn insert_if_not_exist<F>(
        &self,
        records: &[Record],
        predicate: F,
        query_data: Option<&Value>,
    ) -> Result<InsertOutcome>
    where
        F: Fn(&Record, &Value) -> bool,
    {
        if self.get_one(&predicate, query_data)?.is_some() {
            return Ok(InsertOutcome::AlreadyExists);
        }
        self.insert(records)?;
        Ok(InsertOutcome::Inserted)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Fetch matching records.
    ///
    /// Strategy depends on the options:
    /// - no `limit`: full scan, stable-sorted if a sort field is given
    ///   (`from` then skips leading matches)
    /// - `limit`, no sort field: paginated chunk with one skip counter
    ///   shared across shard boundaries
    /// - `limit` and sort field: bounded online top-K
    pub fn get<F>(&self, predicate: F, options: GetOptions) -> Result<Vec<Record>>
    where
        F: Fn(&Record, &Value) -> bool,
    {
        let aux = options.query_data.clone().unwrap_or_else(empty_aux);
        let shards = self.shard_files();
        let engine = self.queries();
        let from = options.from.unwrap_or(0);

        match (options.limit, options.sort_field.as_deref()) {
            (Some(limit), None) => engine.find_page(&shards, &predicate, &aux, from, limit),
            (Some(limit), Some(field)) => {
                engine.find_top_k(&shards, &predicate, &aux, field, options.reverse, from, limit)
            }
            (None, sort_field) => {
                let sort = sort_field.map(|field| (field, options.reverse));
                let mut results = engine.find_all(&shards, &predicate, &aux, sort)?;
                if from > 0 {
                    results.drain(..from.min(results.len()));
                }
                Ok(results)
            }
        }
    }

    /// First record satisfying `predicate`, in shard order then line
    /// order; stops scanning on the first hit.
    pub fn get_one<F>(&self, predicate: F, query_data: Option<&Value>) -> Result<Option<Record>>
    where
        F: Fn(&Record, &Value) -> bool,
    {
        let aux = query_data.cloned().unwrap_or_else(empty_aux);
        self.queries().find_one(&self.shard_files(), &predicate, &aux)
    }

    /// Number of records satisfying `predicate`
    pub fn count<F>(&self, predicate: F, query_data: Option<&Value>) -> Result<usize>
    where
        F: Fn(&Record, &Value) -> bool,
    {
        let aux = query_data.cloned().unwrap_or_else(empty_aux);
        self.queries().count(&self.shard_files(), &predicate, &aux)
    }

    /// Up to `limit` matching records drawn uniformly at random, without
    /// replacement. Rejects `limit == 0` before touching any shard.
    pub fn get_random<F>(
        &self,
        predicate: F,
        query_data: Option<&Value>,
        limit: usize,
    ) -> Result<Vec<Record>>
    where
        F: Fn(&Record, &Value) -> bool,
    {
        let aux = query_data.cloned().unwrap_or_else(empty_aux);
        self.queries().sample(&self.shard_files(), &predicate, &aux, limit)
    }

    // =========================================================================
    // Update / Delete
    // =========================================================================

    /// Replace every record satisfying `predicate` with
    /// `update(record, update_data)`, preserving line positions.
    ///
    /// Shards are processed independently; there is no atomicity across
    /// shards — a failure partway leaves earlier shards updated.
    /// Returns true if anything changed.
    pub fn update<F, U>(
        &self,
        predicate: F,
        update: U,
        query_data: Option<&Value>,
        update_data: Option<&Value>,
    ) -> Result<bool>
    where
        F: Fn(&Record, &Value) -> bool,
        U: Fn(&Record, &Value) -> Record,
    {
        let aux = query_data.cloned().unwrap_or_else(empty_aux);
        let update_aux = update_data.cloned().unwrap_or_else(empty_aux);
        self.mutations().update(&predicate, &update, &aux, &update_aux)
    }

    /// Remove every record satisfying `predicate`.
    ///
    /// Same shard-by-shard rewrite as `update`, with matching lines
    /// omitted. Returns true if anything was removed.
    pub fn delete<F>(&self, predicate: F, query_data: Option<&Value>) -> Result<bool>
    where
        F: Fn(&Record, &Value) -> bool,
    {
        let aux = query_data.cloned().unwrap_or_else(empty_aux);
        self.mutations().delete(&predicate, &aux)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the database root directory
    pub fn root_dir(&self) -> &Path {
        &self.config.root_dir
    }

    /// Get the table name this store operates on
    pub fn table(&self) -> &str {
        &self.config.table
    }

    /// Get the number of shards the table currently holds
    pub fn shard_count(&self) -> usize {
        self.catalog.lock().shard_count(&self.config.table)
    }

    /// Get the table's shard descriptors in catalog order
    pub fn shards(&self) -> Vec<ShardInfo> {
        self.catalog.lock().shards_of(&self.config.table)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn queries(&self) -> QueryEngine<'_> {
        QueryEngine::new(&self.locks, self.config.read_chunk_size)
    }

    fn mutations(&self) -> MutationEngine<'_> {
        MutationEngine::new(
            &self.locks,
            &self.catalog,
            &self.config.table,
            self.config.read_chunk_size,
        )
    }

    /// Snapshot of the table's shard paths in catalog order
    fn shard_files(&self) -> Vec<PathBuf> {
        self.catalog
            .lock()
            .shard_paths(&self.config.table)
            .into_iter()
            .map(|(path, _)| path)
            .collect()
    }
}
