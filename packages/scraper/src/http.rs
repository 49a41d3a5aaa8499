//! HTTP access to a Socrata-compatible portal.
//!
//! The retrieval loop only sees the [`PageSource`] trait: one call, one page.
//! [`SocrataClient`] is the real implementation. Requests are anonymous and
//! are not retried.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;
use serde_json::Value;

use crate::error::{Result, ScraperError};
use crate::types::{DatasetRef, Record};

/// User agent string identifying this scraper.
const USER_AGENT: &str = concat!("crimedata-scraper/", env!("CARGO_PKG_VERSION"));

/// Query string parameter carrying a full SoQL statement.
const SOQL_QUERY_PARAM: &str = "$query";

/// One page request: the full SoQL statement and where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub soql: String,
    pub limit: u64,
    pub offset: u64,
}

/// Something that can answer a single page request for one dataset.
pub trait PageSource {
    /// The dataset this source reads from.
    fn dataset(&self) -> &DatasetRef;

    /// Issue exactly one request and return its records in response order.
    fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Record>>;
}

impl<S: PageSource + ?Sized> PageSource for &S {
    fn dataset(&self) -> &DatasetRef {
        (**self).dataset()
    }

    fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Record>> {
        (**self).fetch_page(request)
    }
}

/// Create a configured HTTP client.
///
/// # Returns
/// A `reqwest::blocking::Client` with the given timeout and our user agent.
pub fn create_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Build the JSON resource URL of a dataset.
///
/// A bare domain is served over https; an endpoint with a scheme is used as is.
///
/// # Examples
/// ```
/// use crimedata_scraper::http::resource_url;
///
/// assert_eq!(
///     resource_url("data.cityofnewyork.us", "5uac-w243"),
///     "https://data.cityofnewyork.us/resource/5uac-w243.json"
/// );
/// assert_eq!(
///     resource_url("http://127.0.0.1:8080/", "abcd-1234"),
///     "http://127.0.0.1:8080/resource/abcd-1234.json"
/// );
/// ```
pub fn resource_url(endpoint: &str, dataset_id: &str) -> String {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.contains("://") {
        format!("{endpoint}/resource/{dataset_id}.json")
    } else {
        format!("https://{endpoint}/resource/{dataset_id}.json")
    }
}

/// Anonymous Socrata client bound to one dataset.
pub struct SocrataClient {
    http: Client,
    dataset: DatasetRef,
    resource: Url,
}

impl SocrataClient {
    /// Create a client for `dataset` using an existing HTTP client.
    pub fn new(http: Client, dataset: DatasetRef) -> Result<Self> {
        let url = resource_url(&dataset.endpoint, &dataset.dataset_id);
        let resource = Url::parse(&url).map_err(|e| ScraperError::InvalidEndpoint {
            url: url.clone(),
            message: e.to_string(),
        })?;
        Ok(Self {
            http,
            dataset,
            resource,
        })
    }

    fn page_url(&self, soql: &str) -> Url {
        let mut url = self.resource.clone();
        url.query_pairs_mut().append_pair(SOQL_QUERY_PARAM, soql);
        url
    }

    fn download_error(&self, offset: u64, source: reqwest::Error) -> ScraperError {
        ScraperError::PageDownload {
            dataset_id: self.dataset.dataset_id.clone(),
            offset,
            source,
        }
    }
}

impl PageSource for SocrataClient {
    fn dataset(&self) -> &DatasetRef {
        &self.dataset
    }

    fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Record>> {
        let url = self.page_url(&request.soql);
        tracing::debug!(url = %url, offset = request.offset, "Requesting page");

        let response = self
            .http
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| self.download_error(request.offset, e))?;
        let body = response
            .text()
            .map_err(|e| self.download_error(request.offset, e))?;

        parse_page_body(&body).map_err(|message| ScraperError::InvalidResponse {
            dataset_id: self.dataset.dataset_id.clone(),
            offset: request.offset,
            message,
        })
    }
}

/// Parse a response body into records.
///
/// The body must be a JSON array of objects.
pub fn parse_page_body(body: &str) -> std::result::Result<Vec<Record>, String> {
    let value: Value = serde_json::from_str(body).map_err(|e| e.to_string())?;
    let Value::Array(rows) = value else {
        return Err("expected a JSON array of records".to_string());
    };

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| match row {
            Value::Object(object) => Ok(Record::from_json_object(object)),
            _ => Err(format!("row {i} is not a JSON object")),
        })
        .collect()
}
