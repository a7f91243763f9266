// 🗺️ Mapping Table - Backend-provided classification data
// Immutable snapshot: replaced wholesale on every successful refresh, never merged

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::MappingFetchError;

/// Counterparty key used when an event has no counterparty
pub const DEFAULT_COUNTERPARTY: &str = "default";

// ============================================================================
// DIRECTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Value coming into the tracked accounts
    In,

    /// Value leaving the tracked accounts
    Out,

    /// Neither (fees, informational events, unknown)
    Neutral,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
            Direction::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ENTRY TYPE
// ============================================================================

/// Structural shape of a history event, as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    #[serde(rename = "history event")]
    HistoryEvent,
    #[serde(rename = "evm event")]
    EvmEvent,
    #[serde(rename = "eth withdrawal event")]
    EthWithdrawalEvent,
    #[serde(rename = "eth block event")]
    EthBlockEvent,
    #[serde(rename = "eth deposit event")]
    EthDepositEvent,
    #[serde(rename = "asset movement event")]
    AssetMovementEvent,
    #[serde(rename = "evm swap event")]
    EvmSwapEvent,
    #[serde(rename = "swap event")]
    SwapEvent,
}

impl EntryType {
    pub const ALL: [EntryType; 8] = [
        EntryType::HistoryEvent,
        EntryType::EvmEvent,
        EntryType::EthWithdrawalEvent,
        EntryType::EthBlockEvent,
        EntryType::EthDepositEvent,
        EntryType::AssetMovementEvent,
        EntryType::EvmSwapEvent,
        EntryType::SwapEvent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::HistoryEvent => "history event",
            EntryType::EvmEvent => "evm event",
            EntryType::EthWithdrawalEvent => "eth withdrawal event",
            EntryType::EthBlockEvent => "eth block event",
            EntryType::EthDepositEvent => "eth deposit event",
            EntryType::AssetMovementEvent => "asset movement event",
            EntryType::EvmSwapEvent => "evm swap event",
            EntryType::SwapEvent => "swap event",
        }
    }

    /// Whether classification depends on the exit flag for this entry type
    pub fn distinguishes_exit(&self) -> bool {
        matches!(self, EntryType::EthWithdrawalEvent)
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', " ");
        EntryType::ALL
            .into_iter()
            .find(|entry| entry.as_str() == normalized)
            .ok_or_else(|| format!("Unknown entry type: {}", s))
    }
}

// ============================================================================
// TABLE PARTS
// ============================================================================

/// Display data for one (category, counterparty) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDisplay {
    pub label: String,
    pub icon: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Per-category metadata: a fixed direction plus display data per counterparty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCategoryDetail {
    pub direction: Direction,

    /// Counterparty identifier (or "default") → display data
    #[serde(default, alias = "counterpartyMappings")]
    pub counterparty_mappings: HashMap<String, CategoryDisplay>,
}

impl EventCategoryDetail {
    /// Display data for a counterparty, falling back to the "default" entry
    pub fn display_for(&self, counterparty: &str) -> Option<&CategoryDisplay> {
        self.counterparty_mappings
            .get(counterparty)
            .or_else(|| self.counterparty_mappings.get(DEFAULT_COUNTERPARTY))
    }
}

/// Canonical keys for withdrawal-like entry types, split by exit flag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitMapping {
    #[serde(default, alias = "isExit", skip_serializing_if = "Option::is_none")]
    pub is_exit: Option<String>,

    #[serde(default, alias = "notExit", skip_serializing_if = "Option::is_none")]
    pub not_exit: Option<String>,
}

impl ExitMapping {
    pub fn pick(&self, is_exit: bool) -> Option<&str> {
        let key = if is_exit { &self.is_exit } else { &self.not_exit };
        key.as_deref()
    }
}

pub type GlobalMappings = HashMap<String, HashMap<String, String>>;
pub type EntryTypeMappings = HashMap<String, HashMap<String, HashMap<String, ExitMapping>>>;
pub type EventCategoryDetails = HashMap<String, EventCategoryDetail>;
pub type AccountingEventsIcons = HashMap<String, String>;

// ============================================================================
// MAPPING TABLE
// ============================================================================

/// Complete classification table as served by the backend
///
/// Wire field names are snake_case; the camelCase names used by the web
/// frontend are accepted as aliases. Missing sections deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingTable {
    /// event type → event subtype → canonical type key
    #[serde(default, alias = "globalMappings")]
    pub global_mappings: GlobalMappings,

    /// entry type → event type → event subtype → exit flag → canonical type key
    #[serde(default, alias = "entryTypeMappings")]
    pub entry_type_mappings: EntryTypeMappings,

    /// canonical type key → direction + counterparty display data
    #[serde(default, alias = "eventCategoryDetails")]
    pub event_category_details: EventCategoryDetails,

    /// accounting event type → icon
    #[serde(default, alias = "accountingEventsIcons")]
    pub accounting_events_icons: AccountingEventsIcons,
}

impl MappingTable {
    pub fn is_empty(&self) -> bool {
        self.global_mappings.is_empty()
            && self.entry_type_mappings.is_empty()
            && self.event_category_details.is_empty()
            && self.accounting_events_icons.is_empty()
    }

    /// Number of (event type, subtype) pairs with a canonical key
    pub fn mapping_count(&self) -> usize {
        self.global_mappings.values().map(|by_subtype| by_subtype.len()).sum()
    }

    /// Parse a table from JSON, accepting either a bare table or the
    /// backend's `{ "result": ..., "message": ... }` envelope
    ///
    /// An envelope with a null result fails with the backend's message.
    pub fn from_json(content: &str) -> Result<Self, MappingFetchError> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        if value.get("result").is_none() {
            return Ok(serde_json::from_value(value)?);
        }

        serde_json::from_value::<BackendResponse<MappingTable>>(value)?.into_result()
    }
}

/// Backend response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct BackendResponse<T> {
    pub result: Option<T>,
    #[serde(default)]
    pub message: String,
}

impl<T> BackendResponse<T> {
    pub fn into_result(self) -> Result<T, MappingFetchError> {
        self.result.ok_or(MappingFetchError::Backend(self.message))
    }
}

// ============================================================================
// EVENT DESCRIPTOR & RESULTS
// ============================================================================

/// Raw event tuple to classify (built per call, never stored)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDescriptor {
    pub event_type: String,
    pub event_subtype: String,
    #[serde(default)]
    pub counterparty: Option<String>,
    #[serde(default)]
    pub entry_type: Option<EntryType>,
    #[serde(default)]
    pub is_exit: bool,
}

impl EventDescriptor {
    pub fn new(event_type: impl Into<String>, event_subtype: impl Into<String>) -> Self {
        EventDescriptor {
            event_type: event_type.into(),
            event_subtype: event_subtype.into(),
            counterparty: None,
            entry_type: None,
            is_exit: false,
        }
    }

    pub fn with_counterparty(mut self, counterparty: impl Into<String>) -> Self {
        self.counterparty = Some(counterparty.into());
        self
    }

    pub fn with_entry_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = Some(entry_type);
        self
    }

    pub fn exiting(mut self, is_exit: bool) -> Self {
        self.is_exit = is_exit;
        self
    }

    /// Counterparty key used for display lookups ("default" when absent or blank)
    pub fn counterparty_key(&self) -> &str {
        match self.counterparty.as_deref() {
            Some(counterparty) if !counterparty.is_empty() => counterparty,
            _ => DEFAULT_COUNTERPARTY,
        }
    }
}

/// Display-ready classification of one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Counterparty when it has its own override, else the canonical type key;
    /// empty for the fallback record
    pub identifier: String,
    pub label: String,
    pub icon: String,
    pub color: Option<String>,
    pub direction: Direction,
}

impl ClassificationResult {
    pub fn is_fallback(&self) -> bool {
        self.identifier.is_empty()
    }
}

/// Display data for an accounting (profit/loss) event type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingEventDetail {
    pub identifier: String,
    pub icon: String,
    pub label: String,
}

/// Identifier + label pair for selection lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDataEntry {
    pub identifier: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

// ============================================================================
// TESTS
// ============================================================================
