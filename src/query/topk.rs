//! Bounded top-K buffer
//!
//! Sorted container with capacity eviction, used by the combined
//! sort+paginate strategy. Holds at most `from + limit` records at any
//! point, so a sorted page never materializes the full result set.

use std::cmp::Ordering;

use crate::record::{field_cmp, Record};

/// Records kept sorted by one field via ordered insertion.
///
/// A newcomer is inserted before the first element the comparator
/// places it strictly ahead of; equal keys therefore keep the
/// earlier-encountered element first. When the buffer grows past its
/// capacity, the worst (last) element is dropped.
pub struct TopKBuffer {
    items: Vec<Record>,
    field: String,
    reverse: bool,
    capacity: usize,
}

impl TopKBuffer {
    pub fn new(field: impl Into<String>, reverse: bool, capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity.min(1024)),
            field: field.into(),
            reverse,
            capacity,
        }
    }

    fn cmp(&self, a: &Record, b: &Record) -> Ordering {
        let ord = field_cmp(a, b, &self.field);
        if self.reverse {
            ord.reverse()
        } else {
            ord
        }
    }

    /// Insert one record, evicting the last element if over capacity
    pub fn insert(&mut self, record: Record) {
        if self.capacity == 0 {
            return;
        }

        let pos = self
            .items
            .iter()
            .position(|existing| self.cmp(&record, existing) == Ordering::Less)
            .unwrap_or(self.items.len());
        self.items.insert(pos, record);

        if self.items.len() > self.capacity {
            self.items.pop();
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consume the buffer and return the window `[from, from + limit)`
    pub fn into_page(self, from: usize, limit: usize) -> Vec<Record> {
        let end = from.saturating_add(limit).min(self.items.len());
        if from >= end {
            return Vec::new();
        }
        let mut items = self.items;
        items.truncate(end);
        items.split_off(from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use serde_json::json;

    fn rec(id: u64, score: i64) -> Record {
        match json!({"id": id, "score": score}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn ids(records: &[Record]) -> Vec<u64> {
        records.iter().map(|r| r["id"].as_u64().unwrap()).collect()
    }

    #[test]
    fn test_insert_keeps_ascending_order() {
        let mut buffer = TopKBuffer::new("score", false, 10);
        buffer.insert(rec(1, 30));
        buffer.insert(rec(2, 10));
        buffer.insert(rec(3, 20));

        assert_eq!(ids(&buffer.into_page(0, 10)), vec![2, 3, 1]);
    }

    #[test]
    fn test_capacity_evicts_last() {
        let mut buffer = TopKBuffer::new("score", false, 2);
        buffer.insert(rec(1, 30));
        buffer.insert(rec(2, 10));
        buffer.insert(rec(3, 20));

        // 30 was the worst and fell off the end
        assert_eq!(ids(&buffer.into_page(0, 2)), vec![2, 3]);
    }

    #[test]
    fn test_equal_keys_keep_encounter_order() {
        let mut buffer = TopKBuffer::new("score", false, 10);
        buffer.insert(rec(1, 5));
        buffer.insert(rec(2, 5));
        buffer.insert(rec(3, 5));

        assert_eq!(ids(&buffer.into_page(0, 10)), vec![1, 2, 3]);
    }

    #[test]
    fn test_reverse_orders_descending() {
        let mut buffer = TopKBuffer::new("score", true, 10);
        buffer.insert(rec(1, 10));
        buffer.insert(rec(2, 30));
        buffer.insert(rec(3, 20));

        assert_eq!(ids(&buffer.into_page(0, 10)), vec![2, 3, 1]);
    }

    #[test]
    fn test_into_page_windows() {
        let mut buffer = TopKBuffer::new("score", false, 6);
        for (id, score) in [(1, 1), (2, 2), (3, 3), (4, 4), (5, 5), (6, 6)] {
            buffer.insert(rec(id, score));
        }

        assert_eq!(ids(&buffer.into_page(2, 2)), vec![3, 4]);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let mut buffer = TopKBuffer::new("score", false, 4);
        buffer.insert(rec(1, 1));

        assert!(buffer.into_page(5, 3).is_empty());
    }

    #[test]
    fn test_zero_capacity_stays_empty() {
        let mut buffer = TopKBuffer::new("score", false, 0);
        buffer.insert(rec(1, 1));
        assert!(buffer.is_empty());
    }
}
