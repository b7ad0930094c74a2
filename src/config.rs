//! Configuration for flatstore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Default per-shard size threshold in bytes.
///
/// Once an append pushes the active shard past this size, the shard is
/// retired and a fresh one becomes the insert target.
pub const DEFAULT_SHARD_SIZE_LIMIT: u64 = 3_000_000;

/// Default read chunk size for the streaming line reader (in bytes)
pub const DEFAULT_READ_CHUNK_SIZE: usize = 8 * 1024;

/// Main configuration for a flatstore instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for the database.
    /// Internal structure:
    ///   {root_dir}/
    ///     ├── info.json        (catalog document)
    ///     └── {table}/         (one directory per table)
    ///         ├── data1.json   (shard files, newline-delimited records)
    ///         └── data2.json
    pub root_dir: PathBuf,

    /// Table this handle operates on (created on first use)
    pub table: String,

    // -------------------------------------------------------------------------
    // Shard Configuration
    // -------------------------------------------------------------------------
    /// Max size of a shard file before rollover (in bytes)
    pub shard_size_limit: u64,

    /// Chunk size used by the streaming line reader (in bytes)
    pub read_chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("./flatstore_data"),
            table: "default".to_string(),
            shard_size_limit: DEFAULT_SHARD_SIZE_LIMIT,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the database root directory
    pub fn root_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.root_dir = path.into();
        self
    }

    /// Set the table name
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.config.table = name.into();
        self
    }

    /// Set the per-shard size threshold (in bytes)
    pub fn shard_size_limit(mut self, bytes: u64) -> Self {
        self.config.shard_size_limit = bytes;
        self
    }

    /// Set the streaming reader chunk size (in bytes)
    pub fn read_chunk_size(mut self, bytes: usize) -> Self {
        self.config.read_chunk_size = bytes;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
