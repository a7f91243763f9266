// 🔤 Labels - Translation lookup with mechanical fallbacks
// A missing translation is never an error: the raw identifier is reformatted instead

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::mapping::{AccountingEventsIcons, ActionDataEntry, EventCategoryDetails};
use crate::resolver::UNKNOWN_LABEL;

// ============================================================================
// TRANSLATION KEYS
// ============================================================================

pub const EVENT_TYPE_PREFIX: &str = "backend_mappings.events.history_event_type";
pub const EVENT_SUBTYPE_PREFIX: &str = "backend_mappings.events.history_event_subtype";
pub const CATEGORY_PREFIX: &str = "backend_mappings.events.type";
pub const ACCOUNTING_PREFIX: &str = "backend_mappings.profit_loss_event_type";
pub const UNKNOWN_KEY: &str = "backend_mappings.events.type.unknown";

pub const FETCH_ERROR_TITLE_KEY: &str = "actions.history_events.fetch_mapping.error.title";
pub const FETCH_ERROR_DESCRIPTION_KEY: &str = "actions.history_events.fetch_mapping.error.description";
pub const FETCH_AGAIN_KEY: &str = "actions.history_events.fetch_mapping.actions.fetch_again";

// ============================================================================
// TRANSLATOR
// ============================================================================

/// Localization collaborator
pub trait Translator: Send + Sync {
    /// Whether a translation exists for the key
    fn exists(&self, key: &str) -> bool;

    /// Translate a key, substituting `{name}` placeholders from params
    fn translate(&self, key: &str, params: &[(&str, &str)]) -> String;
}

/// Translate when the key exists, otherwise compute a fallback
pub fn translate_or(
    translator: &dyn Translator,
    key: &str,
    params: &[(&str, &str)],
    fallback: impl FnOnce() -> String,
) -> String {
    if translator.exists(key) {
        translator.translate(key, params)
    } else {
        fallback()
    }
}

/// Translator with no entries; every label takes the mechanical fallback
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTranslations;

impl Translator for NoTranslations {
    fn exists(&self, _key: &str) -> bool {
        false
    }

    fn translate(&self, key: &str, _params: &[(&str, &str)]) -> String {
        key.to_string()
    }
}

/// Flat key → message catalog, loaded from a nested locale JSON file
///
/// `{ "backend_mappings": { "events": { "type": { "swap": "Swap" } } } }`
/// becomes `backend_mappings.events.type.swap → Swap`.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    messages: HashMap<String, String>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            messages: HashMap::new(),
        }
    }

    /// Load a locale file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read translations file: {:?}", path.as_ref()))?;

        Catalog::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content).context("Failed to parse translations JSON")?;

        let mut catalog = Catalog::new();
        catalog.flatten_into(String::new(), &value);
        Ok(catalog)
    }

    fn flatten_into(&mut self, prefix: String, value: &Value) {
        match value {
            Value::Object(entries) => {
                for (key, child) in entries {
                    let path = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", prefix, key)
                    };
                    self.flatten_into(path, child);
                }
            }
            Value::String(message) => {
                self.messages.insert(prefix, message.clone());
            }
            // Non-string leaves are not messages
            _ => {}
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.messages.insert(key.into(), message.into());
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Translator for Catalog {
    fn exists(&self, key: &str) -> bool {
        self.messages.contains_key(key)
    }

    fn translate(&self, key: &str, params: &[(&str, &str)]) -> String {
        let Some(message) = self.messages.get(key) else {
            return key.to_string();
        };

        params.iter().fold(message.clone(), |acc, (name, value)| {
            acc.replace(&format!("{{{}}}", name), value)
        })
    }
}

// ============================================================================
// CASE CONVERSION
// ============================================================================

/// Split an identifier into lowercase words on `_`, `-`, whitespace and
/// lower→upper camel boundaries
fn words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut previous_lower = false;

    for ch in input.chars() {
        if ch == '_' || ch == '-' || ch.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            previous_lower = false;
            continue;
        }

        if ch.is_uppercase() && previous_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }

        previous_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.extend(ch.to_lowercase());
    }

    if !current.is_empty() {
        words.push(current);
    }

    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `trade_spend` → `Trade spend`
pub fn to_sentence_case(input: &str) -> String {
    let words = words(input);
    match words.split_first() {
        Some((first, rest)) => {
            let mut parts = vec![capitalize(first)];
            parts.extend(rest.iter().cloned());
            parts.join(" ")
        }
        None => String::new(),
    }
}

/// `asset_movement` → `Asset Movement`
pub fn to_capital_case(input: &str) -> String {
    words(input)
        .iter()
        .map(|word| capitalize(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `Deposit asset` → `deposit_asset`
pub fn to_snake_case(input: &str) -> String {
    words(input).join("_")
}

// ============================================================================
// LABEL LOOKUPS
// ============================================================================

/// Label for an event type (`history_event_type` keys use spaces, not underscores)
pub fn event_type_label(translator: &dyn Translator, identifier: &str) -> String {
    let key = format!("{}.{}", EVENT_TYPE_PREFIX, identifier.replace('_', " "));
    translate_or(translator, &key, &[], || to_sentence_case(identifier))
}

pub fn event_subtype_label(translator: &dyn Translator, identifier: &str) -> String {
    let key = format!("{}.{}", EVENT_SUBTYPE_PREFIX, to_snake_case(identifier));
    translate_or(translator, &key, &[], || to_sentence_case(identifier))
}

/// Localized form of a category label coming from the backend
pub fn category_label(translator: &dyn Translator, label: &str) -> String {
    let key = format!("{}.{}", CATEGORY_PREFIX, to_snake_case(label));
    translate_or(translator, &key, &[], || to_sentence_case(label))
}

pub fn accounting_event_label(translator: &dyn Translator, identifier: &str) -> String {
    let key = format!("{}.{}", ACCOUNTING_PREFIX, to_snake_case(identifier));
    translate_or(translator, &key, &[], || to_capital_case(identifier))
}

pub fn unknown_label(translator: &dyn Translator) -> String {
    translate_or(translator, UNKNOWN_KEY, &[], || UNKNOWN_LABEL.to_string())
}

// ============================================================================
// PROJECTIONS
// ============================================================================

pub fn event_types_data<'a>(
    translator: &dyn Translator,
    event_types: impl IntoIterator<Item = &'a String>,
) -> Vec<ActionDataEntry> {
    event_types
        .into_iter()
        .map(|identifier| ActionDataEntry {
            identifier: identifier.clone(),
            label: event_type_label(translator, identifier),
            icon: None,
        })
        .collect()
}

pub fn event_subtypes_data<'a>(
    translator: &dyn Translator,
    event_subtypes: impl IntoIterator<Item = &'a String>,
) -> Vec<ActionDataEntry> {
    event_subtypes
        .into_iter()
        .map(|identifier| ActionDataEntry {
            identifier: identifier.clone(),
            label: event_subtype_label(translator, identifier),
            icon: None,
        })
        .collect()
}

/// Copy of the category details with every counterparty label localized
pub fn localized_category_details(
    translator: &dyn Translator,
    details: &EventCategoryDetails,
) -> EventCategoryDetails {
    let mut localized = details.clone();
    for detail in localized.values_mut() {
        for display in detail.counterparty_mappings.values_mut() {
            display.label = category_label(translator, &display.label);
        }
    }
    localized
}

/// Accounting event types with icons and localized labels, sorted by identifier
pub fn accounting_events_data(
    translator: &dyn Translator,
    icons: &AccountingEventsIcons,
) -> Vec<ActionDataEntry> {
    let mut entries: Vec<ActionDataEntry> = icons
        .iter()
        .map(|(identifier, icon)| ActionDataEntry {
            identifier: identifier.clone(),
            label: accounting_event_label(translator, identifier),
            icon: Some(icon.clone()),
        })
        .collect();

    entries.sort_by(|a, b| a.identifier.cmp(&b.identifier));
    entries
}

// ============================================================================
// TESTS
// ============================================================================
