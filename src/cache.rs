//! Bounded in-memory caches
//!
//! Process-local, rebuildable caches used to avoid repeat store round-trips.
//! Eviction discards the oldest half when the configured maximum is exceeded;
//! an approximation rather than strict LRU, acceptable because these caches
//! are never the system of record.

use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;

/// An insertion-ordered set that trims its oldest half past capacity
#[derive(Debug)]
pub struct BoundedSet<T: Eq + Hash + Clone> {
    items: HashSet<T>,
    order: VecDeque<T>,
    max_items: usize,
}

impl<T: Eq + Hash + Clone> BoundedSet<T> {
    /// Creates a bounded set with the given maximum size
    ///
    /// A maximum of zero disables caching entirely: nothing is retained and
    /// `contains` always reports false.
    pub fn new(max_items: usize) -> Self {
        Self {
            items: HashSet::new(),
            order: VecDeque::new(),
            max_items,
        }
    }

    /// Returns true if the value is currently cached
    pub fn contains(&self, value: &T) -> bool {
        self.items.contains(value)
    }

    /// Inserts a value, returning true if it was not already present
    pub fn insert(&mut self, value: T) -> bool {
        if self.max_items == 0 {
            return true;
        }
        if !self.items.insert(value.clone()) {
            return false;
        }
        self.order.push_back(value);
        if self.items.len() > self.max_items {
            self.evict_oldest_half();
        }
        true
    }

    /// Number of cached values
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn evict_oldest_half(&mut self) {
        let keep_from = self.order.len() / 2;
        for evicted in self.order.drain(..keep_from) {
            self.items.remove(&evicted);
        }
    }
}

/// An insertion-ordered map that trims its oldest half past capacity
///
/// Used to memoize per-domain filter verdicts, which recur heavily across a
/// crawl.
#[derive(Debug)]
pub struct BoundedMap<K: Eq + Hash + Clone, V> {
    entries: HashMap<K, V>,
    order: VecDeque<K>,
    max_entries: usize,
}

impl<K: Eq + Hash + Clone, V> BoundedMap<K, V> {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            max_entries,
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Inserts an entry, evicting the oldest half if the cap is exceeded
    pub fn insert(&mut self, key: K, value: V) {
        if self.max_entries == 0 {
            return;
        }
        if self.entries.insert(key.clone(), value).is_none() {
            self.order.push_back(key);
        }
        if self.entries.len() > self.max_entries {
            let keep_from = self.order.len() / 2;
            for evicted in self.order.drain(..keep_from) {
                self.entries.remove(&evicted);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
