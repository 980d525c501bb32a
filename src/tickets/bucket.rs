//! Attribute-value buckets of ticket IDs.

use crate::types::TicketId;
use std::collections::HashMap;

/// Maps an attribute value to the ordered list of ticket IDs holding it.
///
/// Buckets keep insertion order. An ID is never pushed twice into the same
/// bucket, and a bucket is dropped as soon as it becomes empty.
#[derive(Debug, Default)]
pub struct BucketIndex {
    buckets: HashMap<String, Vec<TicketId>>,
}

impl BucketIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` under `key`. Returns false if it was already there.
    pub fn insert(&mut self, key: &str, id: &TicketId) -> bool {
        let bucket = self.buckets.entry(key.to_string()).or_default();
        if bucket.contains(id) {
            return false;
        }
        bucket.push(id.clone());
        true
    }

    /// Remove `id` from the bucket under `key`. Returns false if absent.
    pub fn remove(&mut self, key: &str, id: &TicketId) -> bool {
        let Some(bucket) = self.buckets.get_mut(key) else {
            return false;
        };
        let Some(pos) = bucket.iter().position(|existing| existing == id) else {
            return false;
        };
        bucket.remove(pos);
        if bucket.is_empty() {
            self.buckets.remove(key);
        }
        true
    }

    /// IDs under `key`, in insertion order.
    pub fn get(&self, key: &str) -> &[TicketId] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of buckets holding `id`, and whether one of them is `key`.
    pub(crate) fn membership(&self, key: &str, id: &TicketId) -> (usize, bool) {
        let mut count = 0;
        let mut under_key = false;
        for (bucket_key, ids) in &self.buckets {
            let hits = ids.iter().filter(|existing| *existing == id).count();
            count += hits;
            if hits > 0 && bucket_key == key {
                under_key = true;
            }
        }
        (count, under_key)
    }

    /// Total IDs across all buckets.
    pub fn entry_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Number of non-empty buckets.
    pub fn key_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}
