//! LRU Tracker Module
//!
//! Implements Least Recently Used ordering for cache eviction.

use std::collections::HashMap;
use std::hash::Hash;

/// Neighbours of a key in the recency list.
#[derive(Debug, Clone)]
struct Links<K> {
    /// Next older key (towards the eviction end)
    older: Option<K>,
    /// Next newer key (towards the most recently used end)
    newer: Option<K>,
}

// == LRU Tracker ==
/// Tracks access order for LRU eviction.
///
/// The list is intrusive: every tracked key stores the keys of its older and
/// newer neighbours, so touching, removing and evicting are all O(1).
///
/// - `oldest` = least recently used (next eviction candidate)
/// - `newest` = most recently used
#[derive(Debug)]
pub struct LruTracker<K> {
    links: HashMap<K, Links<K>>,
    oldest: Option<K>,
    newest: Option<K>,
}

impl<K> Default for LruTracker<K> {
    fn default() -> Self {
        Self {
            links: HashMap::new(),
            oldest: None,
            newest: None,
        }
    }
}

impl<K: Clone + Eq + Hash> LruTracker<K> {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used, inserting it if it is new.
    pub fn touch(&mut self, key: K) {
        if self.newest.as_ref() == Some(&key) {
            return;
        }
        self.unlink(&key);
        self.push_newest(key);
    }

    // == Remove ==
    /// Removes a key from the tracker. Unknown keys are ignored.
    pub fn remove(&mut self, key: &K) -> bool {
        self.unlink(key)
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<K> {
        let key = self.oldest.clone()?;
        self.unlink(&key);
        Some(key)
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&K> {
        self.oldest.as_ref()
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.links.contains_key(key)
    }

    /// Iterates keys from least to most recently used.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            tracker: self,
            cursor: self.oldest.as_ref(),
        }
    }

    fn push_newest(&mut self, key: K) {
        match &self.newest {
            Some(prev_newest) => {
                if let Some(links) = self.links.get_mut(prev_newest) {
                    links.newer = Some(key.clone());
                }
            }
            None => self.oldest = Some(key.clone()),
        }

        let older = self.newest.replace(key.clone());
        self.links.insert(key, Links { older, newer: None });
    }

    fn unlink(&mut self, key: &K) -> bool {
        let Some(Links { older, newer }) = self.links.remove(key) else {
            return false;
        };

        match &older {
            Some(older_key) => {
                if let Some(links) = self.links.get_mut(older_key) {
                    links.newer = newer.clone();
                }
            }
            None => self.oldest = newer.clone(),
        }

        match &newer {
            Some(newer_key) => {
                if let Some(links) = self.links.get_mut(newer_key) {
                    links.older = older;
                }
            }
            None => self.newest = older,
        }

        true
    }
}

/// Iterator over tracked keys, oldest first.
pub struct Iter<'a, K> {
    tracker: &'a LruTracker<K>,
    cursor: Option<&'a K>,
}

impl<'a, K: Clone + Eq + Hash> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        let key = self.cursor?;
        self.cursor = self
            .tracker
            .links
            .get(key)
            .and_then(|links| links.newer.as_ref());
        Some(key)
    }
}
