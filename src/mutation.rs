//! Mutation Engine
//!
//! Insert, update, delete. Appends go to the table's active shard;
//! update and delete stream every shard line-by-line and rewrite a
//! shard in full only when something in it changed.
//!
//! Multi-shard update/delete are not atomic: a failure partway through
//! leaves earlier shards mutated and later shards untouched, with no
//! rollback.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::Result;
use crate::lock::LockManager;
use crate::reader::LineReader;
use crate::record::{decode_line, encode_line, Record};

/// Outcome of a conditional insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// No existing record matched; the data was inserted
    Inserted,
    /// A matching record already existed; nothing was written
    AlreadyExists,
}

/// Write strategies over a table's shards
pub struct MutationEngine<'a> {
    locks: &'a LockManager,
    catalog: &'a Mutex<Catalog>,
    table: &'a str,
    chunk_size: usize,
}

impl<'a> MutationEngine<'a> {
    pub fn new(
        locks: &'a LockManager,
        catalog: &'a Mutex<Catalog>,
        table: &'a str,
        chunk_size: usize,
    ) -> Self {
        Self {
            locks,
            catalog,
            table,
            chunk_size,
        }
    }

    /// Append records as newline-terminated lines to the active shard.
    ///
    /// The append and the size/rollover bookkeeping happen inside one
    /// critical section on the shard file. The active pointer is
    /// resolved immediately before locking; a rollover racing with that
    /// resolution means the append lands in the just-retired shard —
    /// the record stays readable, it just does not start the new shard.
    pub fn insert(&self, records: &[Record]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut payload = String::new();
        for record in records {
            payload.push_str(&encode_line(record)?);
            payload.push('\n');
        }

        let (shard_path, shard_file) = {
            let catalog = self.catalog.lock();
            (
                catalog.active_shard_path(self.table)?,
                catalog.active_shard_file(self.table)?,
            )
        };

        self.locks.with_lock(&shard_path, || {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&shard_path)?;
            file.write_all(payload.as_bytes())?;

            self.catalog.lock().record_write(self.table, &shard_file)
        })
    }

    /// Replace every matching record in place.
    ///
    /// Non-matching lines are copied verbatim; matching lines are
    /// replaced by `update(record, update_data)` at their original
    /// position. A shard is rewritten only if at least one of its lines
    /// changed. Returns true if any shard changed.
    pub fn update<F, U>(
        &self,
        predicate: &F,
        update: &U,
        aux: &Value,
        update_data: &Value,
    ) -> Result<bool>
    where
        F: Fn(&Record, &Value) -> bool,
        U: Fn(&Record, &Value) -> Record,
    {
        self.rewrite_shards(|line, record, rebuilt| {
            if predicate(record, aux) {
                rebuilt.push_str(&encode_line(&update(record, update_data))?);
                rebuilt.push('\n');
                Ok(true)
            } else {
                rebuilt.push_str(line);
                rebuilt.push('\n');
                Ok(false)
            }
        })
    }

    /// Remove every matching record.
    ///
    /// Same streaming rewrite as update, with matching lines omitted
    /// from the rebuilt shard. Returns true if anything was removed.
    pub fn delete<F>(&self, predicate: &F, aux: &Value) -> Result<bool>
    where
        F: Fn(&Record, &Value) -> bool,
    {
        self.rewrite_shards(|line, record, rebuilt| {
            if predicate(record, aux) {
                Ok(true)
            } else {
                rebuilt.push_str(line);
                rebuilt.push('\n');
                Ok(false)
            }
        })
    }

    /// Shared streaming-rewrite loop for update and delete.
    ///
    /// `transform(line, record, rebuilt)` appends the line's replacement
    /// (or nothing) to the rebuilt buffer and reports whether the line
    /// changed. Each shard is processed independently inside its own
    /// critical section: stream, rewrite if dirty, refresh its recorded
    /// size.
    fn rewrite_shards(
        &self,
        mut transform: impl FnMut(&str, &Record, &mut String) -> Result<bool>,
    ) -> Result<bool> {
        let shards = self.catalog.lock().shard_paths(self.table);

        let mut any_changed = false;
        for (shard_path, shard_file) in &shards {
            let changed = self.locks.with_lock(shard_path, || {
                let mut rebuilt = String::new();
                let mut dirty = 0usize;

                for line in LineReader::open(shard_path, self.chunk_size)? {
                    let line = line?;
                    let record = decode_line(&line)?;
                    if transform(&line, &record, &mut rebuilt)? {
                        dirty += 1;
                    }
                }

                if dirty > 0 {
                    overwrite(shard_path, rebuilt.as_bytes())?;
                    debug!(shard = shard_file.as_str(), dirty, "rewrote shard");
                    self.catalog.lock().record_write(self.table, shard_file)?;
                }
                Ok(dirty > 0)
            })?;
            any_changed = any_changed || changed;
        }
        Ok(any_changed)
    }
}

/// Truncate-and-write a shard's full contents
fn overwrite(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    fs::write(path, contents)
}
