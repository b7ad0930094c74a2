//! Query Module
//!
//! Read strategies over a table's shards. All strategies take a
//! caller-supplied predicate `match(record, auxiliary) -> bool`, iterate
//! shards in catalog order, and take each shard's lock only for the
//! duration of that shard's scan.
//!
//! Strategy selection (see [`GetOptions`]):
//! - no limit                  → full scan, optionally stable-sorted
//! - limit, no sort field      → paginated chunk with a cross-shard skip
//! - limit and sort field      → bounded online top-K
//! - `get_one` / `count` / `get_random` have dedicated entry points

mod engine;
mod topk;

pub use engine::QueryEngine;
pub use topk::TopKBuffer;

use serde_json::Value;

/// Options for `get`
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    /// Field to sort by; enables the sorted strategies
    pub sort_field: Option<String>,

    /// Sort descending instead of ascending
    pub reverse: bool,

    /// Number of leading matches to skip
    pub from: Option<usize>,

    /// Maximum number of matches to return
    pub limit: Option<usize>,

    /// Auxiliary value handed to the predicate as its second argument;
    /// an empty object when absent
    pub query_data: Option<Value>,
}

impl GetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort ascending by `field`
    pub fn sort(mut self, field: impl Into<String>) -> Self {
        self.sort_field = Some(field.into());
        self
    }

    /// Flip the sort direction to descending
    pub fn descending(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// Return the window `[from, from + limit)` of the matches
    pub fn range(mut self, from: usize, limit: usize) -> Self {
        self.from = Some(from);
        self.limit = Some(limit);
        self
    }

    /// Auxiliary data passed to the predicate
    pub fn query_data(mut self, data: Value) -> Self {
        self.query_data = Some(data);
        self
    }
}
