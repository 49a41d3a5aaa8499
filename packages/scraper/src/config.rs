//! Configuration file loading, defaults and path composition.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, ScraperError};
use crate::retrieval::RetrievalOptions;
use crate::types::DatasetRef;

/// Configuration file read when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.yml";

/// Number of records requested per page.
pub const DEFAULT_PAGE_SIZE: u64 = 10_000;

/// Delay between consecutive page requests, in seconds.
pub const DEFAULT_THROTTLE_SECS: u64 = 5;

/// HTTP timeout in seconds.
///
/// A full page of 10,000 records can take a while to render on the portal side.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Full configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub local_data: LocalData,
    pub crime_data: CrimeData,
    #[serde(default)]
    pub retrieval: RetrievalSettings,
}

/// Where output files are written.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalData {
    pub dir: String,
    pub raw_dir: String,
    pub current_year_file: String,
    /// Reserved for the historical dataset, which is not fetched.
    #[serde(default)]
    pub historical_file: Option<String>,
}

/// Which remote datasets to query.
#[derive(Debug, Clone, Deserialize)]
pub struct CrimeData {
    pub url: String,
    pub current_year_id: String,
    /// Reserved for the historical dataset, which is not fetched.
    #[serde(default)]
    pub historical_id: Option<String>,
}

/// Optional tuning of the retrieval loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub page_size: u64,
    pub throttle_secs: u64,
    pub max_pages: Option<u64>,
    pub max_records: Option<u64>,
    pub timeout_secs: u64,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            throttle_secs: DEFAULT_THROTTLE_SECS,
            max_pages: None,
            max_records: None,
            timeout_secs: HTTP_TIMEOUT_SECS,
        }
    }
}

impl RetrievalSettings {
    /// Options for the retrieval loop.
    pub fn options(&self) -> RetrievalOptions {
        RetrievalOptions {
            page_size: self.page_size,
            throttle: Duration::from_secs(self.throttle_secs),
            max_pages: self.max_pages,
            max_records: self.max_records,
        }
    }

    /// Per-request HTTP timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Directory the raw CSV files are written to (`dir/raw_dir`).
    pub fn raw_data_path(&self) -> PathBuf {
        Path::new(&self.local_data.dir).join(&self.local_data.raw_dir)
    }

    /// Full path of the current-year CSV file.
    pub fn current_year_output_path(&self) -> PathBuf {
        self.raw_data_path().join(&self.local_data.current_year_file)
    }

    /// Endpoint and identifier of the current-year dataset.
    pub fn current_year_dataset(&self) -> DatasetRef {
        DatasetRef::new(&self.crime_data.url, &self.crime_data.current_year_id)
    }

    /// Check required values are usable.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("local_data.dir", &self.local_data.dir),
            ("local_data.raw_dir", &self.local_data.raw_dir),
            ("local_data.current_year_file", &self.local_data.current_year_file),
            ("crime_data.url", &self.crime_data.url),
            ("crime_data.current_year_id", &self.crime_data.current_year_id),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ScraperError::Config(format!("{key} must not be empty")));
            }
        }

        if self.retrieval.page_size == 0 {
            return Err(ScraperError::Config(
                "retrieval.page_size must be greater than zero".into(),
            ));
        }
        if self.retrieval.timeout_secs == 0 {
            return Err(ScraperError::Config(
                "retrieval.timeout_secs must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

/// Parse and validate a configuration document.
///
/// # Examples
/// ```
/// use crimedata_scraper::config::parse_config;
///
/// let yaml = "
/// local_data:
///   dir: data
///   raw_dir: raw
///   current_year_file: felonies.csv
/// crime_data:
///   url: data.cityofnewyork.us
///   current_year_id: 5uac-w243
/// ";
/// let config = parse_config(yaml).unwrap();
/// assert_eq!(config.retrieval.page_size, 10_000);
/// ```
pub fn parse_config(yaml: &str) -> Result<Config> {
    let config: Config = serde_yaml_ng::from_str(yaml)?;
    config.validate()?;
    Ok(config)
}

/// Read and validate the configuration file at `path`.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| {
        ScraperError::Config(format!(
            "cannot read configuration file {}: {e}",
            path.display()
        ))
    })?;
    let config = parse_config(&content)?;
    tracing::debug!(path = %path.display(), "Loaded configuration");
    Ok(config)
}
