//! # flatstore
//!
//! An embedded, schema-less document store backed by plain append-only
//! files:
//! - Newline-delimited JSON shard files with size-based rollover
//! - Per-file-path locking for safe multi-caller concurrent access
//! - Streaming chunked reads (no whole-file loads, no page cache)
//! - Four read strategies: full scan+sort, paginated chunk, bounded
//!   top-K, random sampling without replacement
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Store                                 │
//! │            (public operation surface, one table)             │
//! └───────────────┬──────────────────────────┬──────────────────┘
//!                 │                          │
//!        ┌────────▼────────┐        ┌────────▼────────┐
//!        │  Query Engine   │        │ Mutation Engine │
//!        │ (4 strategies)  │        │ (insert/update/ │
//!        │                 │        │     delete)     │
//!        └────────┬────────┘        └────────┬────────┘
//!                 │                          │
//!          ┌──────▼──────────────────────────▼──────┐
//!          │   Lock Manager   ·   Line Reader       │
//!          │ (per-path mutex)   (chunked streaming) │
//!          └──────────────────┬─────────────────────┘
//!                             │
//!                     ┌───────▼───────┐
//!                     │    Catalog    │
//!                     │ (info.json +  │
//!                     │   rollover)   │
//!                     └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod config;
pub mod error;
pub mod lock;
pub mod mutation;
pub mod query;
pub mod reader;
pub mod record;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use error::{Result, StoreError};
pub use mutation::InsertOutcome;
pub use query::GetOptions;
pub use record::Record;
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of flatstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
