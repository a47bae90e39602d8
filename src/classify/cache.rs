//! Bounded memo of content id → classification. Eviction is strictly FIFO
//! (insertion order); a cache hit does not refresh an entry's position. The
//! cache outlives session resets on purpose — content identity does not
//! change when the session does, and the whole point is avoiding repeat
//! external calls.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;

use crate::category::CategoryId;

pub const DEFAULT_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CachedClassification {
    pub category: CategoryId,
    pub confidence: f32,
}

#[derive(Debug)]
pub struct ClassificationCache {
    entries: HashMap<String, CachedClassification>,
    order: VecDeque<String>,
    capacity: usize,
}

impl ClassificationCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, content_id: &str) -> Option<CachedClassification> {
        self.entries.get(content_id).copied()
    }

    /// Insert, evicting the oldest inserted entry once over capacity.
    /// Re-inserting an existing id updates the value without touching its
    /// position in the eviction order.
    pub fn insert(&mut self, content_id: &str, value: CachedClassification) {
        if self.entries.insert(content_id.to_string(), value).is_some() {
            return;
        }
        self.order.push_back(content_id.to_string());
        while self.entries.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            } else {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ClassificationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(conf: f32) -> CachedClassification {
        CachedClassification {
            category: CategoryId::Other,
            confidence: conf,
        }
    }

    #[test]
    fn size_never_exceeds_capacity() {
        let mut cache = ClassificationCache::new(3);
        for i in 0..10 {
            cache.insert(&format!("id{i}"), entry(0.5));
            assert!(cache.len() <= 3);
        }
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn eviction_is_fifo_not_lru() {
        let mut cache = ClassificationCache::new(2);
        cache.insert("a", entry(0.1));
        cache.insert("b", entry(0.2));
        // Touch "a"; FIFO must still evict it first.
        assert!(cache.get("a").is_some());
        cache.insert("c", entry(0.3));

        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn reinsert_updates_value_in_place() {
        let mut cache = ClassificationCache::new(2);
        cache.insert("a", entry(0.1));
        cache.insert("a", entry(0.9));
        assert_eq!(cache.len(), 1);
        assert!((cache.get("a").unwrap().confidence - 0.9).abs() < 1e-6);
    }
}
