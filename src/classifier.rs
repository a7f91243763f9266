// 🏷️ Event Classifier - One shared instance per session
// Combines cache + refresher + translator behind the calls UI code makes
//
// Consumers hold it by reference; nothing here is global. Results are
// computed from the snapshot current at call time, so callers re-run
// lookups after a refresh.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::task::JoinHandle;

use crate::cache::MappingCache;
use crate::errors::MappingFetchError;
use crate::fetch::MappingFetcher;
use crate::labels::{self, Translator};
use crate::mapping::{
    AccountingEventDetail, ActionDataEntry, ClassificationResult, EventCategoryDetails,
    EventDescriptor, MappingTable,
};
use crate::notify::Notifier;
use crate::refresher::Refresher;
use crate::resolver::{self, FallbackLabel};

pub struct EventClassifier {
    cache: MappingCache,
    refresher: Arc<Refresher>,
    translator: Arc<dyn Translator>,
    /// Localized category details, keyed by the cache generation they came from
    localized: RwLock<Option<(u64, Arc<EventCategoryDetails>)>>,
}

impl EventClassifier {
    pub fn new(
        fetcher: Arc<dyn MappingFetcher>,
        notifier: Arc<dyn Notifier>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self::with_cache(MappingCache::new(), fetcher, notifier, translator)
    }

    /// Build around an existing cache (e.g. one seeded from disk)
    pub fn with_cache(
        cache: MappingCache,
        fetcher: Arc<dyn MappingFetcher>,
        notifier: Arc<dyn Notifier>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        let refresher = Refresher::new(cache.clone(), fetcher, notifier, Arc::clone(&translator));

        EventClassifier {
            cache,
            refresher,
            translator,
            localized: RwLock::new(None),
        }
    }

    pub fn cache(&self) -> &MappingCache {
        &self.cache
    }

    pub fn snapshot(&self) -> Arc<MappingTable> {
        self.cache.snapshot()
    }

    // ========================================================================
    // REFRESH
    // ========================================================================

    /// Initial background fetch; only the first call spawns anything
    pub fn start(&self) -> Option<JoinHandle<Result<(), MappingFetchError>>> {
        self.refresher.start()
    }

    /// Manual refresh (e.g. "retry" button)
    pub async fn refresh(&self) -> Result<(), MappingFetchError> {
        self.refresher.refresh().await
    }

    // ========================================================================
    // CLASSIFICATION
    // ========================================================================

    /// Canonical type key of an event, if mapped
    pub fn event_type(&self, descriptor: &EventDescriptor) -> Option<String> {
        resolver::resolve_canonical_type(descriptor, &self.cache.snapshot())
    }

    /// Display-ready classification with localized labels
    ///
    /// With `show_fallback_label` off, unmapped events are labelled with the
    /// generic unknown label instead of their raw subtype/type.
    pub fn event_type_data(&self, descriptor: &EventDescriptor, show_fallback_label: bool) -> ClassificationResult {
        let translator = self.translator.as_ref();
        let fallback = FallbackLabel {
            show: show_fallback_label,
            unknown_label: labels::unknown_label(translator),
        };

        let mut result = resolver::resolve_category_detail(descriptor, &self.cache.snapshot(), &fallback);
        if result.is_fallback() {
            tracing::trace!(
                event_type = %descriptor.event_type,
                event_subtype = %descriptor.event_subtype,
                "No mapping for event"
            );
        } else {
            result.label = labels::category_label(translator, &result.label);
        }
        result
    }

    /// Icon and localized label for an accounting event type
    pub fn accounting_event_data(&self, key: &str) -> AccountingEventDetail {
        let mut detail = resolver::resolve_accounting_event_detail(key, &self.cache.snapshot());
        detail.label = labels::accounting_event_label(self.translator.as_ref(), key);
        detail
    }

    // ========================================================================
    // PROJECTIONS
    // ========================================================================

    pub fn event_types(&self) -> BTreeSet<String> {
        self.cache.all_event_types()
    }

    pub fn event_subtypes(&self) -> BTreeSet<String> {
        self.cache.all_event_subtypes()
    }

    pub fn event_types_data(&self) -> Vec<ActionDataEntry> {
        labels::event_types_data(self.translator.as_ref(), &self.cache.all_event_types())
    }

    pub fn event_subtypes_data(&self) -> Vec<ActionDataEntry> {
        labels::event_subtypes_data(self.translator.as_ref(), &self.cache.all_event_subtypes())
    }

    pub fn accounting_events_data(&self) -> Vec<ActionDataEntry> {
        labels::accounting_events_data(self.translator.as_ref(), &self.cache.snapshot().accounting_events_icons)
    }

    /// Category details with localized labels, recomputed once per snapshot
    pub fn category_details(&self) -> Arc<EventCategoryDetails> {
        let (generation, snapshot) = self.cache.versioned_snapshot();

        if let Some((cached_generation, details)) =
            self.localized.read().unwrap_or_else(PoisonError::into_inner).as_ref()
        {
            if *cached_generation == generation {
                return Arc::clone(details);
            }
        }

        let details = Arc::new(labels::localized_category_details(
            self.translator.as_ref(),
            &snapshot.event_category_details,
        ));

        let mut slot = self.localized.write().unwrap_or_else(PoisonError::into_inner);
        // Never overwrite a newer projection with an older one
        if slot.as_ref().map_or(true, |(cached, _)| *cached <= generation) {
            *slot = Some((generation, Arc::clone(&details)));
        }
        details
    }
}

// ============================================================================
// TESTS
// ============================================================================
