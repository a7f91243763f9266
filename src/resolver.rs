// 🧭 Resolver - Event tuple → display category
// Pure functions over a mapping snapshot: no I/O, no mutation, never fails
//
// Precedence:
//   entry-type override → global mapping → category detail
//   → counterparty override → "default" counterparty → fixed fallback record

use crate::labels::to_capital_case;
use crate::mapping::{
    AccountingEventDetail, ClassificationResult, Direction, EventDescriptor, MappingTable,
    DEFAULT_COUNTERPARTY,
};

/// Icon shown for anything the table does not know about
pub const UNKNOWN_ICON: &str = "question-line";

/// Color of the fallback record
pub const FALLBACK_COLOR: &str = "error";

/// Generic label used when no better label is available
pub const UNKNOWN_LABEL: &str = "Unknown";

// ============================================================================
// FALLBACK LABEL OPTIONS
// ============================================================================

/// How the fallback record picks its label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackLabel {
    /// Prefer the raw subtype/type over the generic label
    pub show: bool,

    /// Generic label (already localized by the caller, if needed)
    pub unknown_label: String,
}

impl FallbackLabel {
    pub fn shown() -> Self {
        FallbackLabel {
            show: true,
            unknown_label: UNKNOWN_LABEL.to_string(),
        }
    }

    pub fn suppressed() -> Self {
        FallbackLabel {
            show: false,
            unknown_label: UNKNOWN_LABEL.to_string(),
        }
    }

    pub fn with_unknown_label(mut self, unknown_label: impl Into<String>) -> Self {
        self.unknown_label = unknown_label.into();
        self
    }
}

impl Default for FallbackLabel {
    fn default() -> Self {
        Self::shown()
    }
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// Canonical type key for an event, if the table maps it
///
/// For withdrawal entries the entry-type mapping (split by exit flag) wins over
/// the global mapping. An empty key counts as a miss.
pub fn resolve_canonical_type(descriptor: &EventDescriptor, table: &MappingTable) -> Option<String> {
    let by_entry_type = descriptor
        .entry_type
        .filter(|entry_type| entry_type.distinguishes_exit())
        .and_then(|entry_type| table.entry_type_mappings.get(entry_type.as_str()))
        .and_then(|by_event_type| by_event_type.get(&descriptor.event_type))
        .and_then(|by_subtype| by_subtype.get(&descriptor.event_subtype))
        .and_then(|exit_mapping| exit_mapping.pick(descriptor.is_exit))
        .filter(|key| !key.is_empty());

    if let Some(key) = by_entry_type {
        return Some(key.to_string());
    }

    table
        .global_mappings
        .get(&descriptor.event_type)
        .and_then(|by_subtype| by_subtype.get(&descriptor.event_subtype))
        .filter(|key| !key.is_empty())
        .cloned()
}

/// Fixed low-information record for events the table cannot classify
pub fn fallback_record(descriptor: &EventDescriptor, fallback: &FallbackLabel) -> ClassificationResult {
    let label = if fallback.show {
        [descriptor.event_subtype.as_str(), descriptor.event_type.as_str()]
            .into_iter()
            .find(|candidate| !candidate.is_empty())
            .unwrap_or(fallback.unknown_label.as_str())
    } else {
        fallback.unknown_label.as_str()
    };

    ClassificationResult {
        identifier: String::new(),
        label: label.to_string(),
        icon: UNKNOWN_ICON.to_string(),
        color: Some(FALLBACK_COLOR.to_string()),
        direction: Direction::Neutral,
    }
}

/// Display category for an event
///
/// Direction always comes from the category, never from a counterparty
/// override. A canonical key with no category detail yields the fallback record.
pub fn resolve_category_detail(
    descriptor: &EventDescriptor,
    table: &MappingTable,
    fallback: &FallbackLabel,
) -> ClassificationResult {
    let Some(canonical) = resolve_canonical_type(descriptor, table) else {
        return fallback_record(descriptor, fallback);
    };

    let Some(category) = table.event_category_details.get(&canonical) else {
        return fallback_record(descriptor, fallback);
    };

    let counterparty = descriptor.counterparty_key();
    let Some(display) = category.display_for(counterparty) else {
        return fallback_record(descriptor, fallback);
    };

    let identifier = if counterparty != DEFAULT_COUNTERPARTY {
        counterparty.to_string()
    } else {
        canonical
    };

    ClassificationResult {
        identifier,
        label: display.label.clone(),
        icon: display.icon.clone(),
        color: display.color.clone(),
        direction: category.direction,
    }
}

/// Icon and label for an accounting (profit/loss) event type
pub fn resolve_accounting_event_detail(key: &str, table: &MappingTable) -> AccountingEventDetail {
    let icon = table
        .accounting_events_icons
        .get(key)
        .cloned()
        .unwrap_or_else(|| UNKNOWN_ICON.to_string());

    AccountingEventDetail {
        identifier: key.to_string(),
        icon,
        label: to_capital_case(key),
    }
}

// ============================================================================
// TESTS
// ============================================================================
