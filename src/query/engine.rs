//! Query Engine
//!
//! The read strategies. Every strategy streams shard files through the
//! line reader while holding that shard's lock; locks are released
//! between shards, so a long multi-shard read may interleave with
//! mutations on shards it has not reached yet.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rand::Rng;
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::lock::LockManager;
use crate::reader::LineReader;
use crate::record::{decode_line, field_cmp, Record};

use super::topk::TopKBuffer;

/// Read strategies over an ordered list of shard files
pub struct QueryEngine<'a> {
    locks: &'a LockManager,
    chunk_size: usize,
}

impl<'a> QueryEngine<'a> {
    pub fn new(locks: &'a LockManager, chunk_size: usize) -> Self {
        Self { locks, chunk_size }
    }

    /// Stream one shard under its lock, feeding each matching record to
    /// `visit`. Returns false if `visit` asked to stop the whole scan.
    fn scan_shard<F>(
        &self,
        path: &Path,
        predicate: &F,
        aux: &Value,
        visit: &mut impl FnMut(Record) -> bool,
    ) -> Result<bool>
    where
        F: Fn(&Record, &Value) -> bool,
    {
        self.locks.with_lock(path, || {
            for line in LineReader::open(path, self.chunk_size)? {
                let record = decode_line(&line?)?;
                if predicate(&record, aux) && !visit(record) {
                    return Ok(false);
                }
            }
            Ok(true)
        })
    }

    /// Collect every matching record of one shard (no early exit)
    fn shard_matches<F>(&self, path: &Path, predicate: &F, aux: &Value) -> Result<Vec<Record>>
    where
        F: Fn(&Record, &Value) -> bool,
    {
        let mut matches = Vec::new();
        self.scan_shard(path, predicate, aux, &mut |record| {
            matches.push(record);
            true
        })?;
        Ok(matches)
    }

    /// Full scan: every match across all shards, optionally stable-sorted
    /// by `sort` = (field, reverse). Ties keep cross-shard encounter order.
    pub fn find_all<F>(
        &self,
        shards: &[PathBuf],
        predicate: &F,
        aux: &Value,
        sort: Option<(&str, bool)>,
    ) -> Result<Vec<Record>>
    where
        F: Fn(&Record, &Value) -> bool,
    {
        let mut results = Vec::new();
        for path in shards {
            results.extend(self.shard_matches(path, predicate, aux)?);
        }

        if let Some((field, reverse)) = sort {
            // Stable sort: equal keys stay in encounter order either way
            if reverse {
                results.sort_by(|a, b| field_cmp(b, a, field));
            } else {
                results.sort_by(|a, b| field_cmp(a, b, field));
            }
        }
        Ok(results)
    }

    /// Paginated chunk: one skip counter shared across shard boundaries,
    /// stopping the whole scan once `limit` matches are gathered.
    pub fn find_page<F>(
        &self,
        shards: &[PathBuf],
        predicate: &F,
        aux: &Value,
        from: usize,
        limit: usize,
    ) -> Result<Vec<Record>>
    where
        F: Fn(&Record, &Value) -> bool,
    {
        let mut results = Vec::new();
        if limit == 0 {
            return Ok(results);
        }

        let mut skip = from;
        for path in shards {
            let keep_going = self.scan_shard(path, predicate, aux, &mut |record| {
                if skip > 0 {
                    skip -= 1;
                    return true;
                }
                results.push(record);
                results.len() < limit
            })?;
            if !keep_going {
                break;
            }
        }
        Ok(results)
    }

    /// Bounded top-K: single buffer across all shards, capacity
    /// `from + limit`, final answer the window `[from, from + limit)`.
    pub fn find_top_k<F>(
        &self,
        shards: &[PathBuf],
        predicate: &F,
        aux: &Value,
        field: &str,
        reverse: bool,
        from: usize,
        limit: usize,
    ) -> Result<Vec<Record>>
    where
        F: Fn(&Record, &Value) -> bool,
    {
        let capacity = from.saturating_add(limit);
        let mut buffer = TopKBuffer::new(field, reverse, capacity);
        for path in shards {
            self.scan_shard(path, predicate, aux, &mut |record| {
                buffer.insert(record);
                true
            })?;
        }
        Ok(buffer.into_page(from, limit))
    }

    /// First match in shard order then line order; short-circuits
    /// remaining lines and shards immediately on the first hit.
    pub fn find_one<F>(
        &self,
        shards: &[PathBuf],
        predicate: &F,
        aux: &Value,
    ) -> Result<Option<Record>>
    where
        F: Fn(&Record, &Value) -> bool,
    {
        let mut found = None;
        for path in shards {
            let keep_going = self.scan_shard(path, predicate, aux, &mut |record| {
                found = Some(record);
                false
            })?;
            if !keep_going {
                break;
            }
        }
        Ok(found)
    }

    /// Number of matches across all shards (no short-circuit)
    pub fn count<F>(&self, shards: &[PathBuf], predicate: &F, aux: &Value) -> Result<usize>
    where
        F: Fn(&Record, &Value) -> bool,
    {
        let mut count = 0usize;
        for path in shards {
            self.scan_shard(path, predicate, aux, &mut |_| {
                count += 1;
                true
            })?;
        }
        Ok(count)
    }

    /// Random sampling without replacement.
    ///
    /// Keeps a pool of candidate shards, each with a reservation set of
    /// match indices already returned. Each round draws a shard
    /// uniformly at random, fully re-scans it, and draws one unreserved
    /// match uniformly at random; shards with no unreserved matches
    /// leave the pool for the remainder of the call.
    pub fn sample<F>(
        &self,
        shards: &[PathBuf],
        predicate: &F,
        aux: &Value,
        limit: usize,
    ) -> Result<Vec<Record>>
    where
        F: Fn(&Record, &Value) -> bool,
    {
        if limit == 0 {
            return Err(StoreError::Config(
                "sample limit must be a positive number".to_string(),
            ));
        }

        struct PoolShard {
            path: PathBuf,
            reserved: HashSet<usize>,
        }

        let mut rng = rand::thread_rng();
        let mut pool: Vec<PoolShard> = shards
            .iter()
            .map(|path| PoolShard {
                path: path.clone(),
                reserved: HashSet::new(),
            })
            .collect();

        let mut results = Vec::new();
        while results.len() < limit && !pool.is_empty() {
            let pick = rng.gen_range(0..pool.len());

            let matches = self.shard_matches(&pool[pick].path, predicate, aux)?;
            let available: Vec<usize> = (0..matches.len())
                .filter(|i| !pool[pick].reserved.contains(i))
                .collect();

            match available.as_slice() {
                [] => {
                    // Matchless or fully drained for this call
                    pool.swap_remove(pick);
                }
                _ => {
                    let index = available[rng.gen_range(0..available.len())];
                    pool[pick].reserved.insert(index);
                    results.push(matches[index].clone());
                }
            }
        }
        Ok(results)
    }
}
