//! Cleaning and deduplication of extracted records
//!
//! The normalizer is idempotent: running it over its own output changes
//! nothing.

use crate::model::{Record, Value};
use crate::url::resolve_against;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use url::Url;

/// Field name fragments that mark a value as a URL
const URL_FIELD_HINTS: &[&str] = &["url", "link", "href", "src", "image", "img", "photo"];

/// Field name fragments that mark a value as a price
const PRICE_FIELD_HINTS: &[&str] = &["price", "cost", "amount", "fee", "rate"];

const ZERO_WIDTH: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}'];

/// Cleans text, resolves URLs, canonicalises prices and drops duplicates
#[derive(Debug, Clone, Default)]
pub struct DataNormalizer {
    base_url: Option<Url>,
}

impl DataNormalizer {
    /// Creates a normalizer resolving relative URLs against `base_url`
    ///
    /// An unparseable base leaves relative URLs untouched.
    pub fn new(base_url: Option<&str>) -> Self {
        Self {
            base_url: base_url.and_then(|url| Url::parse(url).ok()),
        }
    }

    /// Normalises every record, dropping empty ones and, if asked, duplicates
    ///
    /// Order is preserved; of several identical records the first is kept.
    pub fn normalize(&self, records: Vec<Record>, dedupe: bool) -> Vec<Record> {
        let input = records.len();

        let mut normalized: Vec<Record> = records
            .into_iter()
            .map(|record| self.normalize_record(record))
            .filter(|record| !record.has_no_signal())
            .collect();

        if dedupe {
            let mut seen = HashSet::new();
            normalized.retain(|record| seen.insert(record_digest(record)));
        }

        tracing::debug!("Normalized {} records into {}", input, normalized.len());
        normalized
    }

    fn normalize_record(&self, record: Record) -> Record {
        record
            .iter()
            .map(|(name, value)| (name.to_string(), self.normalize_value(name, value)))
            .collect()
    }

    fn normalize_value(&self, field: &str, value: &Value) -> Value {
        match value {
            Value::Null => Value::Null,
            Value::Text(text) => Value::Text(self.normalize_text(field, text)),
            Value::List(items) => Value::List(
                items
                    .iter()
                    .flatten()
                    .map(|text| Some(self.normalize_text(field, text)))
                    .collect(),
            ),
        }
    }

    fn normalize_text(&self, field: &str, text: &str) -> String {
        let mut value = clean_text(text);
        if value.is_empty() {
            return value;
        }

        let field = field.to_lowercase();
        if URL_FIELD_HINTS.iter().any(|hint| field.contains(hint)) {
            value = resolve_against(&value, self.base_url.as_ref());
        }
        if PRICE_FIELD_HINTS.iter().any(|hint| field.contains(hint)) {
            value.retain(|c| !c.is_whitespace());
        }
        value
    }
}

/// Strips zero-width characters, straightens curly quotes and collapses
/// whitespace runs into single spaces
pub fn clean_text(text: &str) -> String {
    let straightened: String = text
        .chars()
        .filter(|c| !ZERO_WIDTH.contains(c))
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        })
        .collect();

    straightened.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// SHA-256 over the record's fields in key order, hex-encoded
pub fn record_digest(record: &Record) -> String {
    let mut pairs: Vec<(&str, &Value)> = record.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let mut hasher = Sha256::new();
    for (name, value) in pairs {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        match value {
            Value::Null => hasher.update([0u8]),
            Value::Text(text) => {
                hasher.update([1u8]);
                hasher.update(text.as_bytes());
            }
            Value::List(items) => {
                hasher.update([2u8]);
                for item in items {
                    match item {
                        Some(text) => {
                            hasher.update([1u8]);
                            hasher.update(text.as_bytes());
                        }
                        None => hasher.update([0u8]),
                    }
                    hasher.update([0x1F]);
                }
            }
        }
        hasher.update([0x1E]);
    }

    hex::encode(hasher.finalize())
}
