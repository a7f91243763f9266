// Event Classifier - Core Library
// Maps raw history events to display categories; used by the CLI, the API server, and UI code

pub mod mapping;
pub mod resolver;
pub mod labels;
pub mod cache;
pub mod errors;
pub mod fetch;
pub mod notify;
pub mod refresher;
pub mod classifier;
pub mod config;
pub mod logging;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use mapping::{
    AccountingEventDetail, ActionDataEntry, CategoryDisplay, ClassificationResult, Direction,
    EntryType, EventCategoryDetail, EventDescriptor, ExitMapping, MappingTable,
    DEFAULT_COUNTERPARTY,
};
pub use resolver::{
    fallback_record, resolve_accounting_event_detail, resolve_canonical_type,
    resolve_category_detail, FallbackLabel, FALLBACK_COLOR, UNKNOWN_ICON, UNKNOWN_LABEL,
};
pub use labels::{
    to_capital_case, to_sentence_case, to_snake_case, Catalog, NoTranslations, Translator,
};
pub use cache::MappingCache;
pub use errors::MappingFetchError;
pub use fetch::{FileMappingFetcher, HttpMappingFetcher, MappingFetcher, TYPE_MAPPINGS_PATH};
pub use notify::{Notification, NotificationAction, NotificationLog, Notifier, TracingNotifier};
pub use refresher::Refresher;
pub use classifier::EventClassifier;
pub use config::ClassifierConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
