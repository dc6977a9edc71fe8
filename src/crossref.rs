//! Crossref works search.
//!
//! One GET per run against `/works?query=..&rows=..`; the `message.items[]`
//! array is flattened into [`Record`]s.

use crate::config::{FetchLimits, QuerySpec};
use crate::error::{ExportError, Result};
use crate::record::{lenient, lenient_vec, strip_markup, year_prefix, Record, ResultSet};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

/// Crossref API client
pub struct CrossrefClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl CrossrefClient {
    /// Create a new CrossrefClient
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Works endpoint, normally [`crate::config::CROSSREF_API_URL`]
    /// * `limits` - Supplies the per-request timeout
    pub fn new(endpoint: Url, limits: &FetchLimits) -> Result<Self> {
        Ok(Self {
            client: limits.http_client()?,
            endpoint,
        })
    }

    /// Run the query and return every item of the single response page.
    pub async fn fetch(&self, query: &QuerySpec) -> Result<ResultSet> {
        let rows = query.page_size.to_string();

        info!(source = "crossref", term = %query.term, rows = query.page_size, "Querying Crossref");

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("query", query.term.as_str()), ("rows", rows.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ExportError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let items = parse_response(&body)?;
        debug!(count = items.len(), "Crossref items received");

        let records: Vec<Record> = items.into_iter().map(normalize_item).collect();
        info!(source = "crossref", count = records.len(), "Crossref query complete");

        Ok(ResultSet::from(records))
    }
}

// === Crossref API Response Types ===

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CrossrefResponse {
    #[serde(deserialize_with = "lenient")]
    status: Option<String>,
    /// Work list on success, error details otherwise
    message: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CrossrefMessage {
    #[serde(deserialize_with = "lenient_vec")]
    items: Vec<CrossrefItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CrossrefItem {
    #[serde(deserialize_with = "lenient")]
    title: TextField,
    #[serde(rename = "container-title", deserialize_with = "lenient")]
    container_title: TextField,
    #[serde(deserialize_with = "lenient")]
    issued: Option<CrossrefDate>,
    #[serde(deserialize_with = "lenient")]
    published: Option<CrossrefDate>,
    #[serde(rename = "abstract", deserialize_with = "lenient")]
    abstract_text: Option<String>,
    #[serde(rename = "URL", deserialize_with = "lenient")]
    url: Option<String>,
}

/// Crossref wraps most text fields in single-element arrays
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextField {
    List(Vec<String>),
    Single(String),
}

impl Default for TextField {
    fn default() -> Self {
        TextField::List(Vec::new())
    }
}

impl TextField {
    fn first(self) -> String {
        match self {
            TextField::List(values) => values.into_iter().next().unwrap_or_default(),
            TextField::Single(value) => value,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CrossrefDate {
    #[serde(rename = "date-parts", deserialize_with = "lenient")]
    date_parts: Vec<Vec<Option<DatePart>>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DatePart {
    Number(i64),
    Text(String),
}

impl CrossrefDate {
    /// `{"date-parts": [[2019, 5, 1]]}` -> "2019"
    fn year(&self) -> Option<String> {
        let raw = match self.date_parts.first()?.first()?.as_ref()? {
            DatePart::Number(n) => n.to_string(),
            DatePart::Text(s) => s.clone(),
        };
        let year = year_prefix(&raw);
        (!year.is_empty()).then_some(year)
    }
}

/// Failure details: a string or a list of `{ "message": .. }` entries
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CrossrefErrorMessage {
    Text(String),
    Entries(Vec<CrossrefErrorEntry>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CrossrefErrorEntry {
    #[serde(rename = "type", deserialize_with = "lenient")]
    kind: Option<String>,
    #[serde(deserialize_with = "lenient")]
    message: Option<String>,
}

/// Extract `message.items[]`, rejecting error-shaped envelopes.
fn parse_response(body: &str) -> Result<Vec<CrossrefItem>> {
    let data: Value = serde_json::from_str(body)
        .map_err(|e| ExportError::Parse(format!("Failed to parse Crossref response: {}", e)))?;

    if !data.is_object() {
        return Err(ExportError::Parse(
            "Crossref response is not a JSON object".to_string(),
        ));
    }

    let response: CrossrefResponse = serde_json::from_value(data)?;

    if let Some(status) = response.status.as_deref() {
        if status != "ok" {
            return Err(ExportError::Api(format!(
                "Crossref returned status '{}': {}",
                status,
                error_message(response.message)
            )));
        }
    }

    let message: CrossrefMessage = serde_json::from_value(response.message).unwrap_or_default();
    Ok(message.items)
}

fn error_message(message: Value) -> String {
    match serde_json::from_value::<CrossrefErrorMessage>(message.clone()) {
        Ok(CrossrefErrorMessage::Text(text)) => text,
        Ok(CrossrefErrorMessage::Entries(entries)) => entries
            .into_iter()
            .filter_map(|e| e.message.or(e.kind))
            .collect::<Vec<_>>()
            .join("; "),
        Err(_) if message.is_null() => "no message".to_string(),
        Err(_) => message.to_string(),
    }
}

/// Map one Crossref work item onto the canonical record.
fn normalize_item(item: CrossrefItem) -> Record {
    let year = item
        .issued
        .as_ref()
        .and_then(CrossrefDate::year)
        .or_else(|| item.published.as_ref().and_then(CrossrefDate::year))
        .unwrap_or_default();

    Record {
        title: item.title.first(),
        publication: item.container_title.first(),
        year,
        abstract_text: item
            .abstract_text
            .map(|s| strip_markup(&s))
            .unwrap_or_default(),
        url: item.url.unwrap_or_default(),
    }
}
