// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Slot tables backing map and set fields.
//!
//! Entries live in numbered slots. Removing an entry leaves a tombstone
//! until [`SlotMap::compact`] runs, so slot enumeration must skip invalid
//! indices. Bulk writers push entries without indexing and rebuild the
//! key index once with [`SlotMap::rehash`].

use crate::reflect::FieldValue;
use std::collections::HashMap;

/// Key/value slot table.
#[derive(Debug, Clone, Default)]
pub struct SlotMap {
    slots: Vec<Option<(FieldValue, FieldValue)>>,
    index: HashMap<String, usize>,
}

impl SlotMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One past the highest slot index, tombstones included.
    pub fn max_index(&self) -> usize {
        self.slots.len()
    }

    pub fn is_valid_index(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Some(_)))
    }

    /// Entry stored at a live slot.
    pub fn entry_at(&self, index: usize) -> Option<(&FieldValue, &FieldValue)> {
        self.slots
            .get(index)
            .and_then(|s| s.as_ref())
            .map(|(k, v)| (k, v))
    }

    /// Live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldValue, &FieldValue)> {
        self.slots.iter().filter_map(|s| s.as_ref().map(|(k, v)| (k, v)))
    }

    pub fn get(&self, key: &FieldValue) -> Option<&FieldValue> {
        let index = *self.index.get(&key.canonical_key())?;
        self.slots[index].as_ref().map(|(_, v)| v)
    }

    /// Insert or replace; returns the previous value for the key.
    pub fn insert(&mut self, key: FieldValue, value: FieldValue) -> Option<FieldValue> {
        let canonical = key.canonical_key();
        if let Some(&index) = self.index.get(&canonical) {
            if let Some((_, existing)) = self.slots[index].as_mut() {
                return Some(std::mem::replace(existing, value));
            }
        }
        self.slots.push(Some((key, value)));
        self.index.insert(canonical, self.slots.len() - 1);
        None
    }

    /// Remove a key, leaving a tombstone in its slot.
    pub fn remove(&mut self, key: &FieldValue) -> Option<FieldValue> {
        let index = self.index.remove(&key.canonical_key())?;
        self.slots[index].take().map(|(_, v)| v)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
    }

    /// Append an entry without touching the index. Call [`rehash`](Self::rehash)
    /// before the next lookup.
    pub fn push_unindexed(&mut self, key: FieldValue, value: FieldValue) -> usize {
        self.slots.push(Some((key, value)));
        self.slots.len() - 1
    }

    /// Rebuild the key index. When two live slots share a key the later one
    /// wins and the earlier slot becomes a tombstone. Returns the number of
    /// slots tombstoned.
    pub fn rehash(&mut self) -> usize {
        self.index.clear();
        let mut displaced = 0;
        for i in 0..self.slots.len() {
            let Some((key, _)) = &self.slots[i] else {
                continue;
            };
            if let Some(previous) = self.index.insert(key.canonical_key(), i) {
                self.slots[previous] = None;
                displaced += 1;
            }
        }
        displaced
    }

    /// Remove tombstones and re-index.
    pub fn compact(&mut self) {
        self.slots.retain(|s| s.is_some());
        self.rehash();
    }
}

impl PartialEq for SlotMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

/// Element slot table.
#[derive(Debug, Clone, Default)]
pub struct SlotSet {
    slots: Vec<Option<FieldValue>>,
    index: HashMap<String, usize>,
}

impl SlotSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_index(&self) -> usize {
        self.slots.len()
    }

    pub fn is_valid_index(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Some(_)))
    }

    /// Live elements in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldValue> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    pub fn contains(&self, element: &FieldValue) -> bool {
        self.index.contains_key(&element.canonical_key())
    }

    /// Insert an element; returns `false` if it was already present.
    pub fn insert(&mut self, element: FieldValue) -> bool {
        let canonical = element.canonical_key();
        if self.index.contains_key(&canonical) {
            return false;
        }
        self.slots.push(Some(element));
        self.index.insert(canonical, self.slots.len() - 1);
        true
    }

    /// Remove an element, leaving a tombstone in its slot.
    pub fn remove(&mut self, element: &FieldValue) -> bool {
        match self.index.remove(&element.canonical_key()) {
            Some(index) => self.slots[index].take().is_some(),
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
    }

    pub fn push_unindexed(&mut self, element: FieldValue) -> usize {
        self.slots.push(Some(element));
        self.slots.len() - 1
    }

    /// Rebuild the index; duplicates keep the later slot.
    pub fn rehash(&mut self) -> usize {
        self.index.clear();
        let mut displaced = 0;
        for i in 0..self.slots.len() {
            let Some(element) = &self.slots[i] else {
                continue;
            };
            if let Some(previous) = self.index.insert(element.canonical_key(), i) {
                self.slots[previous] = None;
                displaced += 1;
            }
        }
        displaced
    }

    pub fn compact(&mut self) {
        self.slots.retain(|s| s.is_some());
        self.rehash();
    }
}

impl PartialEq for SlotSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|e| other.contains(e))
    }
}
