//! HTTP backend for the catalog REST API.
//!
//! Every response wraps its payload in a `{"data": ...}` envelope; list
//! responses add `meta.pagination.nextPage` while more pages remain.

use crate::backend::CatalogClient;
use crate::error::{Error, Result};
use crate::types::Collection;
use serde_json::{Value, json};
use std::time::Duration;
use ureq::http::Response;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of records requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Upper bound on pages followed while listing.
const MAX_PAGES: u32 = 1000;

/// Connection settings for [`HttpCatalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// API base URL, e.g. `https://api.example.com/api/v2/architecture`
    pub base_url: String,
    /// Bearer token
    pub token: Option<String>,
    /// Global per-request timeout
    pub timeout: Duration,
    /// Records per page when listing
    pub page_size: u32,
}

impl HttpConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

/// Catalog backend speaking the REST API.
///
/// # Example
///
/// ```no_run
/// use catalog::backend::CatalogClient;
/// use catalog::backend::http::{HttpCatalog, HttpConfig};
/// use catalog::Collection;
///
/// let backend = HttpCatalog::new(HttpConfig::new("https://catalog.example.com/api/v2").token("t0k3n"));
/// let domains = backend.list(Collection::ApplicationDomains, &[("name", "orders")]).unwrap();
/// println!("Found {} domains", domains.len());
/// ```
pub struct HttpCatalog {
    agent: ureq::Agent,
    config: HttpConfig,
}

impl HttpCatalog {
    /// Create a backend for the given connection settings.
    #[must_use]
    pub fn new(config: HttpConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent, config }
    }

    fn collection_url(&self, collection: Collection) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            collection.path()
        )
    }

    fn record_url(&self, collection: Collection, id: &str) -> String {
        format!("{}/{id}", self.collection_url(collection))
    }

    fn state_url(&self, collection: Collection, id: &str) -> String {
        format!("{}/state", self.record_url(collection, id))
    }

    fn authorize<B>(&self, request: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        let request = request
            .header("Accept", "application/json")
            .header("User-Agent", "catalog-sync");
        match &self.config.token {
            Some(token) => request.header("Authorization", format!("Bearer {token}")),
            None => request,
        }
    }
}

/// Turn a response into its JSON body, mapping non-2xx statuses to errors.
fn read_body(mut response: Response<ureq::Body>) -> Result<Option<Value>> {
    let status = response.status();
    let text = response.body_mut().read_to_string()?;

    if !status.is_success() {
        let message = if text.trim().is_empty() {
            status.canonical_reason().unwrap_or("request failed").to_string()
        } else {
            text
        };
        return Err(Error::http(status.as_u16(), message));
    }

    if text.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&text)?))
}

/// Unwrap the `data` member of an envelope.
fn data(envelope: Option<Value>) -> Result<Value> {
    match envelope {
        Some(Value::Object(mut fields)) => fields
            .remove("data")
            .ok_or_else(|| Error::InvalidResponse("missing 'data' member".to_string())),
        Some(other) => Err(Error::InvalidResponse(format!(
            "expected an object, got {other}"
        ))),
        None => Err(Error::InvalidResponse("empty response body".to_string())),
    }
}

fn next_page(envelope: &Value) -> Option<u32> {
    envelope
        .pointer("/meta/pagination/nextPage")
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}

impl CatalogClient for HttpCatalog {
    fn list(&self, collection: Collection, filters: &[(&str, &str)]) -> Result<Vec<Value>> {
        let url = self.collection_url(collection);
        let page_size = self.config.page_size.to_string();
        let mut records = Vec::new();
        let mut page = 1;

        loop {
            let mut request = self
                .authorize(self.agent.get(&url))
                .query("pageSize", &page_size)
                .query("pageNumber", page.to_string());
            for (field, value) in filters {
                request = request.query(*field, *value);
            }

            log::trace!("GET {url} page {page}");
            let envelope = read_body(request.call()?)?
                .ok_or_else(|| Error::InvalidResponse("empty list response".to_string()))?;

            match envelope.get("data") {
                Some(Value::Array(items)) => records.extend(items.iter().cloned()),
                _ => {
                    return Err(Error::InvalidResponse(format!(
                        "{collection}: expected 'data' to be an array"
                    )));
                }
            }

            match next_page(&envelope) {
                Some(next) if next > page && next <= MAX_PAGES => page = next,
                _ => break,
            }
        }

        Ok(records)
    }

    fn get(&self, collection: Collection, id: &str) -> Result<Value> {
        let url = self.record_url(collection, id);
        log::trace!("GET {url}");
        let response = self.authorize(self.agent.get(&url)).call()?;
        data(read_body(response)?)
    }

    fn create(&self, collection: Collection, body: &Value) -> Result<Value> {
        let url = self.collection_url(collection);
        log::trace!("POST {url}");
        let response = self.authorize(self.agent.post(&url)).send_json(body)?;
        data(read_body(response)?)
    }

    fn update(&self, collection: Collection, id: &str, body: &Value) -> Result<Value> {
        let url = self.record_url(collection, id);
        log::trace!("PATCH {url}");
        let response = self.authorize(self.agent.patch(&url)).send_json(body)?;
        data(read_body(response)?)
    }

    fn change_state(&self, collection: Collection, id: &str, state_id: &str) -> Result<()> {
        let url = self.state_url(collection, id);
        log::trace!("PUT {url}");
        let response = self
            .authorize(self.agent.put(&url))
            .send_json(json!({ "stateId": state_id }))?;
        read_body(response)?;
        Ok(())
    }
}
