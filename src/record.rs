//! Canonical record shape shared by every source.
//!
//! Each source normalizer maps its raw JSON item onto [`Record`]; a run's
//! records are collected, in API response order, into a [`ResultSet`].

use crate::config::DedupPolicy;
use regex::{Captures, Regex};
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::OnceLock;

/// CSV header, in column order.
pub const CANONICAL_COLUMNS: &[&str] = &["Title", "Publication", "Year", "Abstract", "URL"];

/// One normalized bibliographic entry.
///
/// Missing source fields are empty strings, never errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Title")]
    pub title: String,
    /// Journal / container / publication name
    #[serde(rename = "Publication")]
    pub publication: String,
    /// Four-digit year, or empty
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "Abstract")]
    pub abstract_text: String,
    #[serde(rename = "URL")]
    pub url: String,
}

/// Ordered records from one query run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    records: Vec<Record>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Append one fetched page, preserving order.
    pub fn extend_page(&mut self, page: Vec<Record>) {
        self.records.extend(page);
    }

    /// Apply a deduplication policy in place.
    ///
    /// Returns the number of records removed. Records without a URL are
    /// never considered duplicates.
    pub fn dedup(&mut self, policy: DedupPolicy) -> usize {
        let before = self.records.len();
        match policy {
            DedupPolicy::None => {}
            DedupPolicy::ByUrl => {
                let mut seen: HashSet<String> = HashSet::new();
                self.records
                    .retain(|r| r.url.is_empty() || seen.insert(r.url.clone()));
            }
        }
        before - self.records.len()
    }
}

impl From<Vec<Record>> for ResultSet {
    fn from(records: Vec<Record>) -> Self {
        Self { records }
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// First four characters of a date-like string, if they form a year.
pub fn year_prefix(date: &str) -> String {
    let prefix: String = date.trim().chars().take(4).collect();
    if prefix.len() == 4 && prefix.chars().all(|c| c.is_ascii_digit()) {
        prefix
    } else {
        String::new()
    }
}

/// Tags that separate words when removed
const BLOCK_TAGS: &[&str] = &[
    "p", "br", "div", "li", "h1", "h2", "h3", "h4", "title", "sec", "list-item",
];

/// Strip HTML/JATS tags and collapse whitespace.
///
/// Inline tags are removed outright; block tags leave a space behind.
pub fn strip_markup(text: &str) -> String {
    static TAGS: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = r"<\s*/?\s*([A-Za-z][\w:.-]*)[^>]*>";
    let stripped = match TAGS.get_or_init(|| Regex::new(pattern).ok()) {
        Some(re) => re
            .replace_all(text, |caps: &Captures| {
                let name = caps[1].to_ascii_lowercase();
                let local = name.rsplit(':').next().unwrap_or_default();
                if BLOCK_TAGS.contains(&local) {
                    " "
                } else {
                    ""
                }
            })
            .into_owned(),
        None => text.to_string(),
    };
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Field deserializer that falls back to the default on a shape mismatch.
///
/// Keeps one oddly typed field from failing the whole record.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// List deserializer that keeps every element, defaulting malformed ones.
///
/// A non-array value yields an empty list.
pub(crate) fn lenient_vec<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .map(|item| serde_json::from_value(item).unwrap_or_default())
        .collect())
}
