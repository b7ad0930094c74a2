//! Catalog document types
//!
//! The serde-persisted shape of `info.json`. The whole document is
//! rewritten on every structural change; there is no incremental
//! metadata log.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One physical shard file of a table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardInfo {
    /// File name within the table directory, e.g. `data3.json`
    pub file: String,

    /// Byte size as last observed on disk (the file is the source of
    /// truth; this field lags until the next recorded write)
    pub size: u64,

    /// Whether this shard is the current insert target.
    /// Exactly one shard per table is active; once rolled past, a
    /// shard's flag stays false forever.
    pub active: bool,
}

impl ShardInfo {
    /// A fresh, empty, active shard
    pub fn new_active(file: String) -> Self {
        Self {
            file,
            size: 0,
            active: true,
        }
    }
}

/// One table: a directory of shard files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    /// Table name, unique within the catalog
    pub name: String,

    /// Absolute path of the table directory
    pub path: PathBuf,

    /// Number of shards allocated so far
    pub shard_count: usize,

    /// Shard descriptors in creation order
    pub shards: Vec<ShardInfo>,
}

impl TableInfo {
    /// The current insert target, if the invariant holds
    pub fn active_shard(&self) -> Option<&ShardInfo> {
        self.shards.iter().find(|s| s.active)
    }
}

/// The catalog document: everything known about one database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogInfo {
    /// Database name (root directory name)
    pub name: String,

    /// Absolute root path of the database
    pub path: PathBuf,

    /// Tables in creation order
    pub tables: Vec<TableInfo>,
}

impl CatalogInfo {
    pub fn new(name: String, path: PathBuf) -> Self {
        Self {
            name,
            path,
            tables: Vec::new(),
        }
    }

    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut TableInfo> {
        self.tables.iter_mut().find(|t| t.name == name)
    }
}
