// 🗄️ Mapping Cache - Current classification snapshot
// Whole-table replacement only; readers keep whatever snapshot they cloned

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::mapping::MappingTable;

/// Shared holder of the last successfully fetched mapping table
///
/// Cloning shares the same underlying snapshot (one cache per session).
#[derive(Clone, Default)]
pub struct MappingCache {
    table: Arc<RwLock<Arc<MappingTable>>>,
    generation: Arc<AtomicU64>,
}

impl MappingCache {
    /// Empty cache (all sections empty, generation 0)
    pub fn new() -> Self {
        MappingCache::default()
    }

    /// Cache seeded with a table
    pub fn with_table(table: MappingTable) -> Self {
        let cache = MappingCache::new();
        cache.replace(table);
        cache
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<MappingTable> {
        let guard = self.table.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Current snapshot together with the generation it belongs to
    pub fn versioned_snapshot(&self) -> (u64, Arc<MappingTable>) {
        let guard = self.table.read().unwrap_or_else(PoisonError::into_inner);
        (self.generation.load(Ordering::Acquire), Arc::clone(&*guard))
    }

    /// Number of replacements so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Swap in a new table atomically and return the new generation
    pub fn replace(&self, table: MappingTable) -> u64 {
        let mut guard = self.table.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(table);
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Every known event type
    pub fn all_event_types(&self) -> BTreeSet<String> {
        self.snapshot().global_mappings.keys().cloned().collect()
    }

    /// Every known event subtype, across all event types
    pub fn all_event_subtypes(&self) -> BTreeSet<String> {
        self.snapshot()
            .global_mappings
            .values()
            .flat_map(|by_subtype| by_subtype.keys().cloned())
            .collect()
    }
}

impl std::fmt::Debug for MappingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("MappingCache")
            .field("generation", &self.generation())
            .field("event_types", &snapshot.global_mappings.len())
            .field("categories", &snapshot.event_category_details.len())
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
