//! Error types for the scraper.
//!
//! A single `ScraperError` covers configuration, transport and output
//! failures. Date parsing never produces an error; bad values become null.

use thiserror::Error;

/// Main error type for the scraper library.
#[derive(Debug, Error)]
pub enum ScraperError {
    /// Missing or invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file is not valid YAML or does not match the expected shape.
    #[error("YAML parsing failed: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// HTTP client could not be built or a request failed outside a page fetch.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid endpoint URL.
    #[error("Invalid endpoint URL '{url}': {message}")]
    InvalidEndpoint { url: String, message: String },

    /// Failed to download one page of a dataset.
    #[error("Failed to download page of {dataset_id} at offset {offset}: {source}")]
    PageDownload {
        dataset_id: String,
        offset: u64,
        #[source]
        source: reqwest::Error,
    },

    /// The portal answered, but the body is not a JSON array of records.
    #[error("Invalid response for {dataset_id} at offset {offset}: {message}")]
    InvalidResponse {
        dataset_id: String,
        offset: u64,
        message: String,
    },

    /// CSV serialization failed.
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for scraper operations.
pub type Result<T> = std::result::Result<T, ScraperError>;
