// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Cached lookup of the registered subtypes of a record type.
//!
//! A polymorphic field declares a base type; discovery needs every
//! registered record type deriving from it. The first query for a base
//! scans the whole registry. Later queries are served from the cache until
//! [`SubtypeIndex::invalidate`] is called or the registry reports a new
//! [`generation`](crate::reflect::TypeRegistry::generation).

use crate::reflect::TypeRegistry;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Scan and hit counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SubtypeStats {
    pub scans: u64,
    pub hits: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    generation: Option<u64>,
    entries: HashMap<String, Arc<[String]>>,
}

/// Per-base cache of descendant type names.
///
/// Shareable behind an `Arc`; lookups take a read lock on the fast path.
#[derive(Debug, Default)]
pub struct SubtypeIndex {
    inner: RwLock<CacheState>,
    stats: RwLock<SubtypeStats>,
}

impl SubtypeIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every registered type deriving from `base` (excluding `base`), in
    /// registry order.
    pub fn find_subtypes(&self, registry: &dyn TypeRegistry, base: &str) -> Arc<[String]> {
        let generation = registry.generation();

        if let Some(hit) = self.try_peek(generation, base) {
            self.stats.write().hits += 1;
            return hit;
        }

        let mut state = self.inner.write();
        if state.generation != Some(generation) {
            if state.generation.is_some() {
                log::debug!(
                    "subtype cache reset: registry generation {:?} -> {}",
                    state.generation,
                    generation
                );
            }
            state.entries.clear();
            state.generation = Some(generation);
        }
        if let Some(hit) = state.entries.get(base) {
            self.stats.write().hits += 1;
            return Arc::clone(hit);
        }

        let found: Arc<[String]> = registry
            .record_types()
            .filter(|record| record.name() != base && registry.is_descendant_of(record.name(), base))
            .map(|record| record.name().to_string())
            .collect();
        self.stats.write().scans += 1;
        log::debug!("scanned {} subtypes of {}", found.len(), base);

        state.entries.insert(base.to_string(), Arc::clone(&found));
        found
    }

    /// Drop every cached entry.
    pub fn invalidate(&self) {
        let mut state = self.inner.write();
        state.entries.clear();
        state.generation = None;
    }

    /// Number of registry scans performed so far.
    pub fn scan_count(&self) -> u64 {
        self.stats.read().scans
    }

    #[must_use]
    pub fn stats(&self) -> SubtypeStats {
        *self.stats.read()
    }

    fn try_peek(&self, generation: u64, base: &str) -> Option<Arc<[String]>> {
        let state = self.inner.read();
        if state.generation != Some(generation) {
            return None;
        }
        state.entries.get(base).map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{FieldKind, InMemoryRegistry, RecordTypeBuilder};

    fn registry() -> InMemoryRegistry {
        let mut registry = InMemoryRegistry::new();
        for (name, parent) in [
            ("Effect", None),
            ("Burn", Some("Effect")),
            ("Stats", None),
            ("Heal", Some("Effect")),
            ("GreaterHeal", Some("Heal")),
        ] {
            let mut builder = RecordTypeBuilder::new(name).field(
                format!("{}_value", name.to_lowercase()),
                FieldKind::Int32,
            );
            if let Some(parent) = parent {
                builder = builder.parent(parent);
            }
            registry.register_record(builder.build()).expect("register");
        }
        registry
    }

    #[test]
    fn test_finds_transitive_subtypes_in_registry_order() {
        let registry = registry();
        let index = SubtypeIndex::new();
        let found = index.find_subtypes(&registry, "Effect");
        assert_eq!(&*found, &["Burn", "Heal", "GreaterHeal"]);
        assert!(index.find_subtypes(&registry, "Stats").is_empty());
        assert!(index.find_subtypes(&registry, "Missing").is_empty());
    }

    #[test]
    fn test_second_query_does_not_rescan() {
        let registry = registry();
        let index = SubtypeIndex::new();
        let first = index.find_subtypes(&registry, "Effect");
        let second = index.find_subtypes(&registry, "Effect");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(index.scan_count(), 1);
        assert_eq!(index.stats().hits, 1);
    }

    #[test]
    fn test_invalidate_forces_rescan() {
        let registry = registry();
        let index = SubtypeIndex::new();
        index.find_subtypes(&registry, "Effect");
        index.invalidate();
        index.find_subtypes(&registry, "Effect");
        assert_eq!(index.scan_count(), 2);
    }

    #[test]
    fn test_registry_change_drops_stale_entries() {
        let mut registry = registry();
        let index = SubtypeIndex::new();
        assert_eq!(index.find_subtypes(&registry, "Effect").len(), 3);

        registry
            .register_record(RecordTypeBuilder::new("Freeze").parent("Effect").build())
            .expect("register Freeze");
        let found = index.find_subtypes(&registry, "Effect");
        assert_eq!(found.last().map(String::as_str), Some("Freeze"));
        assert_eq!(index.scan_count(), 2);
    }
}
