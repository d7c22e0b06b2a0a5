//! Recency Order Module
//!
//! Keeps cache keys ordered from most to least recently used.

use std::collections::{BTreeMap, HashMap};

// == Recency Order ==
/// Ordered sequence of keys used purely to choose eviction victims.
///
/// Every key carries a monotonically increasing stamp. The head (most
/// recently used) is the highest stamp and the tail is the lowest, so
/// promotion and tail eviction are both logarithmic instead of scanning.
#[derive(Debug, Default)]
pub struct RecencyOrder {
    /// stamp -> key, ascending stamp = least recent first
    by_stamp: BTreeMap<u64, String>,
    /// key -> current stamp
    stamps: HashMap<String, u64>,
    /// next stamp to hand out
    clock: u64,
}

impl RecencyOrder {
    pub fn new() -> Self {
        Self::default()
    }

    // == Push Front ==
    /// Places `key` at the head, moving it there if already present.
    pub fn push_front(&mut self, key: &str) {
        let stamp = self.clock;
        self.clock += 1;

        match self.stamps.get_mut(key) {
            Some(old) => {
                let owned = self.by_stamp.remove(old).unwrap_or_else(|| key.to_string());
                *old = stamp;
                self.by_stamp.insert(stamp, owned);
            }
            None => {
                self.stamps.insert(key.to_string(), stamp);
                self.by_stamp.insert(stamp, key.to_string());
            }
        }
    }

    /// Moves an existing key to the head. Unknown keys are ignored.
    pub fn promote(&mut self, key: &str) -> bool {
        if self.stamps.contains_key(key) {
            self.push_front(key);
            true
        } else {
            false
        }
    }

    // == Remove ==
    pub fn remove(&mut self, key: &str) -> bool {
        match self.stamps.remove(key) {
            Some(stamp) => {
                self.by_stamp.remove(&stamp);
                true
            }
            None => false,
        }
    }

    // == Pop Tail ==
    /// Removes and returns the least recently used key.
    pub fn pop_back(&mut self) -> Option<String> {
        let (_, key) = self.by_stamp.pop_first()?;
        self.stamps.remove(&key);
        Some(key)
    }

    /// Keys from head (most recent) to tail.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.by_stamp.values().rev().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.stamps.contains_key(key)
    }
}
