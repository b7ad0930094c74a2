//! Catalog Module
//!
//! Owns the on-disk metadata describing the database: which tables
//! exist, which shard files each table is made of, and which shard is
//! currently accepting inserts.
//!
//! ## Layout
//! ```text
//! {root}/
//! ├── info.json            catalog document (rewritten in full on change)
//! └── {table}/
//!     ├── data1.json       shard files, newline-delimited records
//!     ├── data2.json
//!     └── ...
//! ```

mod manager;
mod meta;

pub use manager::Catalog;
pub use meta::{CatalogInfo, ShardInfo, TableInfo};

/// File name of the catalog document inside the database root
pub(crate) const CATALOG_FILENAME: &str = "info.json";

/// Shard file name for a 1-based sequence number: `data{N}.json`
pub(crate) fn shard_file_name(seq: usize) -> String {
    format!("data{}.json", seq)
}
