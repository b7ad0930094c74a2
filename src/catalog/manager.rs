//! Catalog Manager
//!
//! Owns the database/table/shard metadata and the rollover policy.
//!
//! ## Responsibilities
//! - Load or create the catalog document on open
//! - Create tables (directory + first shard) on first reference
//! - Track shard sizes from the filesystem and retire full shards
//! - Persist the full catalog document after every change

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::lock::LockManager;

use super::meta::{CatalogInfo, ShardInfo, TableInfo};
use super::{shard_file_name, CATALOG_FILENAME};

/// Manages the catalog document for one database root.
///
/// The manager itself is not synchronized; the owning store keeps it
/// behind a mutex. Disk writes of `info.json` additionally go through
/// the per-path lock manager, so a persist never interleaves with
/// another operation touching the same file.
pub struct Catalog {
    /// Database root directory
    root: PathBuf,

    /// Path of the catalog document (`{root}/info.json`)
    info_path: PathBuf,

    /// Per-shard size threshold triggering rollover (in bytes)
    shard_size_limit: u64,

    /// Shared per-path locks (same instance the engines use)
    locks: Arc<LockManager>,

    /// In-memory copy of the catalog document
    info: CatalogInfo,
}

impl Catalog {
    /// Open or create the catalog for a database root.
    ///
    /// Creates the root directory and an empty catalog document if
    /// either is missing.
    pub fn open(root: &Path, shard_size_limit: u64, locks: Arc<LockManager>) -> Result<Self> {
        fs::create_dir_all(root)?;

        let info_path = root.join(CATALOG_FILENAME);
        let info = if info_path.exists() {
            let bytes = locks.with_lock(&info_path, || Ok(fs::read(&info_path)?))?;
            serde_json::from_slice(&bytes).map_err(|e| {
                StoreError::Catalog(format!("invalid catalog document: {}", e))
            })?
        } else {
            let name = root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "db".to_string());
            CatalogInfo::new(name, root.to_path_buf())
        };

        let catalog = Self {
            root: root.to_path_buf(),
            info_path,
            shard_size_limit,
            locks,
            info,
        };
        if !catalog.info_path.exists() {
            catalog.persist()?;
        }
        Ok(catalog)
    }

    /// Create table `name` if absent: directory, first shard file, and a
    /// metadata entry with that shard marked active. Idempotent.
    pub fn ensure_table(&mut self, name: &str) -> Result<()> {
        if self.info.table(name).is_some() {
            return Ok(());
        }

        let table_path = self.root.join(name);
        fs::create_dir_all(&table_path)?;

        let first = shard_file_name(1);
        fs::File::create(table_path.join(&first))?;

        self.info.tables.push(TableInfo {
            name: name.to_string(),
            path: table_path,
            shard_count: 1,
            shards: vec![ShardInfo::new_active(first)],
        });
        self.persist()?;

        info!(table = name, "created table");
        Ok(())
    }

    /// Path of the table's current active shard.
    ///
    /// Always resolved from the live metadata, which is republished
    /// under the same lock scope that performs rollover — callers get
    /// the freshest pointer available at lookup time.
    pub fn active_shard_path(&self, table: &str) -> Result<PathBuf> {
        let table = self.table(table)?;
        let shard = table.active_shard().ok_or_else(|| {
            StoreError::Catalog(format!("table '{}' has no active shard", table.name))
        })?;
        Ok(table.path.join(&shard.file))
    }

    /// Active shard file name (for pairing with `record_write`)
    pub fn active_shard_file(&self, table: &str) -> Result<String> {
        let table = self.table(table)?;
        let shard = table.active_shard().ok_or_else(|| {
            StoreError::Catalog(format!("table '{}' has no active shard", table.name))
        })?;
        Ok(shard.file.clone())
    }

    /// Record that `shard_file` of `table` was written.
    ///
    /// Re-reads the shard's actual size from the filesystem — the file,
    /// not an in-memory counter, is the source of truth, which tolerates
    /// appends made by any operation serialized through the shard's
    /// lock. If the shard is active and now exceeds the size threshold,
    /// it is retired and a fresh shard becomes the insert target.
    /// Persists the full catalog document on every call.
    pub fn record_write(&mut self, table: &str, shard_file: &str) -> Result<()> {
        let limit = self.shard_size_limit;
        let table = self.table_mut(table)?;

        let shard_path = table.path.join(shard_file);
        let size = fs::metadata(&shard_path)?.len();

        let shard = table
            .shards
            .iter_mut()
            .find(|s| s.file == shard_file)
            .ok_or_else(|| {
                StoreError::Catalog(format!("unknown shard file '{}'", shard_file))
            })?;
        shard.size = size;
        debug!(shard = shard_file, size, "recorded shard size");

        if shard.active && size > limit {
            shard.active = false;

            let next = shard_file_name(table.shard_count + 1);
            fs::File::create(table.path.join(&next))?;
            table.shards.push(ShardInfo::new_active(next.clone()));
            table.shard_count += 1;

            info!(
                table = table.name.as_str(),
                retired = shard_file,
                active = next.as_str(),
                size,
                "rolled over active shard"
            );
        }

        self.persist()
    }

    /// Ordered shard descriptors for a table (empty if unknown)
    pub fn shards_of(&self, table: &str) -> Vec<ShardInfo> {
        self.info
            .table(table)
            .map(|t| t.shards.clone())
            .unwrap_or_default()
    }

    /// Ordered `(path, file name)` pairs of a table's shards
    pub fn shard_paths(&self, table: &str) -> Vec<(PathBuf, String)> {
        self.info
            .table(table)
            .map(|t| {
                t.shards
                    .iter()
                    .map(|s| (t.path.join(&s.file), s.file.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of shards a table holds (0 if unknown)
    pub fn shard_count(&self, table: &str) -> usize {
        self.info.table(table).map(|t| t.shards.len()).unwrap_or(0)
    }

    /// Path of the catalog document
    pub fn info_path(&self) -> &Path {
        &self.info_path
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn table(&self, name: &str) -> Result<&TableInfo> {
        self.info
            .table(name)
            .ok_or_else(|| StoreError::Catalog(format!("unknown table '{}'", name)))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut TableInfo> {
        self.info
            .table_mut(name)
            .ok_or_else(|| StoreError::Catalog(format!("unknown table '{}'", name)))
    }

    /// Rewrite the full catalog document under its file lock.
    ///
    /// A failure here is fatal to the triggering call: on-disk shard
    /// state and metadata may then diverge, which requires manual
    /// repair.
    fn persist(&self) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&self.info)?;
        self.locks
            .with_lock(&self.info_path, || Ok(fs::write(&self.info_path, &bytes)?))
    }
}
