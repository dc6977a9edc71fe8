//! Springer Nature Open Access search.
//!
//! Paginated: `s` is a 1-based start offset advanced by the page size.
//! The loop ends on the first empty page, once the record cap is reached,
//! or when the page limit is hit, whichever comes first.

use crate::config::{FetchLimits, QuerySpec};
use crate::error::{ExportError, Result};
use crate::record::{lenient, lenient_vec, strip_markup, year_prefix, Record, ResultSet};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

/// Why the pagination loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A page came back with zero records
    EmptyPage,
    /// Accumulated records reached `max_records`
    RecordCap,
    /// `max_pages` requests were issued
    PageLimit,
}

/// Result of a paginated fetch.
#[derive(Debug, Clone)]
pub struct FetchReport {
    pub records: ResultSet,
    /// Number of pages requested, including the final empty one
    pub pages_requested: usize,
    pub stop: StopReason,
}

/// Springer Nature Open Access API client
pub struct SpringerClient {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    max_pages: usize,
}

impl SpringerClient {
    /// Create a new SpringerClient
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Open Access JSON endpoint
    /// * `api_key` - Springer Nature API key, sent as `api_key`
    /// * `limits` - Page limit and per-request timeout
    pub fn new(endpoint: Url, api_key: &str, limits: &FetchLimits) -> Result<Self> {
        Ok(Self {
            client: limits.http_client()?,
            endpoint,
            api_key: api_key.to_string(),
            max_pages: limits.max_pages,
        })
    }

    /// Fetch pages until one is empty or the caps are reached.
    ///
    /// The last page is kept whole, so the result may exceed `max_records`
    /// by up to one page.
    pub async fn fetch(&self, query: &QuerySpec) -> Result<FetchReport> {
        let mut records = ResultSet::new();
        let mut start = 1usize;
        let mut pages_requested = 0usize;

        info!(
            source = "springer",
            term = %query.term,
            page_size = query.page_size,
            max_records = query.max_records,
            "Querying Springer Nature"
        );

        let stop = loop {
            if pages_requested >= self.max_pages {
                warn!(
                    pages = pages_requested,
                    total = records.len(),
                    "Page limit reached, stopping pagination"
                );
                break StopReason::PageLimit;
            }

            let page = self.fetch_page(query, start).await?;
            pages_requested += 1;

            if page.is_empty() {
                debug!(start = start, "Empty page, stopping pagination");
                break StopReason::EmptyPage;
            }

            info!(page = pages_requested, start = start, count = page.len(), "Fetched page");
            records.extend_page(page);

            if records.len() >= query.max_records {
                debug!(total = records.len(), "Record cap reached");
                break StopReason::RecordCap;
            }

            start += query.page_size;
        };

        info!(
            source = "springer",
            total = records.len(),
            pages = pages_requested,
            stop = ?stop,
            "Springer query complete"
        );

        Ok(FetchReport {
            records,
            pages_requested,
            stop,
        })
    }

    /// Fetch and normalize one page starting at `start`.
    ///
    /// A body carrying `error_description` is requested once more before
    /// giving up.
    async fn fetch_page(&self, query: &QuerySpec, start: usize) -> Result<Vec<Record>> {
        let mut page = self.request_page(query, start).await?;

        if page.error_description.is_some() {
            warn!(start = start, "Error marker in response, retrying once");
            page = self.request_page(query, start).await?;
        }

        if let Some(message) = page.error_message() {
            return Err(ExportError::Api(format!("Springer Nature: {}", message)));
        }

        Ok(page.records.into_iter().map(normalize_record).collect())
    }

    async fn request_page(&self, query: &QuerySpec, start: usize) -> Result<SpringerResponse> {
        let page_size = query.page_size.to_string();
        let start = start.to_string();

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("q", query.term.as_str()),
                ("p", page_size.as_str()),
                ("s", start.as_str()),
            ])
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

        let data: Value = serde_json::from_str(&body).map_err(|e| {
            ExportError::Parse(format!("Failed to parse Springer Nature response: {}", e))
        })?;

        if !data.is_object() {
            return Err(ExportError::Parse(
                "Springer Nature response is not a JSON object".to_string(),
            ));
        }

        Ok(serde_json::from_value(data)?)
    }
}

// === Springer Nature API Response Types ===

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SpringerResponse {
    #[serde(deserialize_with = "lenient_vec")]
    records: Vec<SpringerRecord>,
    error: Option<ErrorMarker>,
    error_description: Option<ErrorMarker>,
}

impl SpringerResponse {
    /// Text of an `error_description` / `error` marker, if present
    fn error_message(&self) -> Option<String> {
        self.error_description
            .as_ref()
            .or(self.error.as_ref())
            .map(ErrorMarker::message)
    }
}

/// Either a bare string or `{"error": .., "error_description": ..}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorMarker {
    Text(String),
    Detail(ErrorDetail),
    Other(Value),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorDetail {
    #[serde(deserialize_with = "lenient")]
    error: Option<String>,
    #[serde(deserialize_with = "lenient")]
    error_description: Option<String>,
}

impl ErrorMarker {
    fn message(&self) -> String {
        match self {
            ErrorMarker::Text(text) => text.clone(),
            ErrorMarker::Detail(detail) => detail
                .error_description
                .clone()
                .or_else(|| detail.error.clone())
                .unwrap_or_else(|| "unknown error".to_string()),
            ErrorMarker::Other(value) => value.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SpringerRecord {
    #[serde(deserialize_with = "lenient")]
    title: Option<String>,
    #[serde(deserialize_with = "lenient")]
    publication_name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    journal_title: Option<String>,
    #[serde(deserialize_with = "lenient")]
    publication_date: Option<String>,
    #[serde(deserialize_with = "lenient")]
    online_publication_date: Option<String>,
    #[serde(rename = "abstract", deserialize_with = "lenient")]
    abstract_text: Option<SpringerAbstract>,
    #[serde(deserialize_with = "lenient")]
    url: Option<SpringerUrl>,
}

/// Abstract is either plain text or `{"h1": .., "p": ..}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SpringerAbstract {
    Text(String),
    Sections {
        #[serde(default, deserialize_with = "lenient")]
        p: Option<Paragraphs>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Paragraphs {
    One(String),
    Many(Vec<String>),
}

impl SpringerAbstract {
    fn into_text(self) -> String {
        match self {
            SpringerAbstract::Text(text) => strip_markup(&text),
            SpringerAbstract::Sections { p: Some(Paragraphs::One(text)) } => strip_markup(&text),
            SpringerAbstract::Sections { p: Some(Paragraphs::Many(paragraphs)) } => {
                strip_markup(&paragraphs.join(" "))
            }
            SpringerAbstract::Sections { p: None } => String::new(),
        }
    }
}

/// `url` is a list of `{format, platform, value}`, occasionally a plain string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SpringerUrl {
    Plain(String),
    Links(Vec<SpringerLink>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SpringerLink {
    #[serde(deserialize_with = "lenient")]
    format: Option<String>,
    #[serde(deserialize_with = "lenient")]
    value: Option<String>,
}

impl SpringerUrl {
    /// Prefer the HTML link, else the first link with a value.
    fn into_link(self) -> String {
        match self {
            SpringerUrl::Plain(url) => url,
            SpringerUrl::Links(links) => {
                let html = links
                    .iter()
                    .position(|link| link.format.as_deref() == Some("html") && link.value.is_some());
                let link = match html {
                    Some(index) => links.into_iter().nth(index).and_then(|link| link.value),
                    None => links.into_iter().find_map(|link| link.value),
                };
                link.unwrap_or_default()
            }
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Map one Springer record onto the canonical record.
fn normalize_record(item: SpringerRecord) -> Record {
    let publication = non_empty(item.publication_name)
        .or_else(|| non_empty(item.journal_title))
        .unwrap_or_default();

    let year = [item.publication_date, item.online_publication_date]
        .into_iter()
        .flatten()
        .map(|date| year_prefix(&date))
        .find(|y| !y.is_empty())
        .unwrap_or_default();

    Record {
        title: non_empty(item.title).unwrap_or_default(),
        publication,
        year,
        abstract_text: item
            .abstract_text
            .map(SpringerAbstract::into_text)
            .unwrap_or_default(),
        url: item.url.map(SpringerUrl::into_link).unwrap_or_default(),
    }
}
