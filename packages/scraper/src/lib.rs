//! Crime data scraper - fetch felony complaints from a Socrata open-data portal.
//!
//! Records are pulled page by page with SoQL `LIMIT`/`OFFSET` clauses until
//! the portal returns an empty page, then written to one CSV file.
//!
//! # Example
//!
//! ```
//! use crimedata_scraper::crime::felony_query;
//!
//! let query = felony_query();
//! assert_eq!(
//!     query.paginated(10_000, 20_000),
//!     "SELECT * WHERE law_cat_cd = 'FELONY' LIMIT 10000 OFFSET 20000"
//! );
//! ```
//!
//! # Architecture
//!
//! - [`config`]: YAML configuration, defaults and output paths
//! - [`types`]: Records, pages, record sets and date normalization
//! - [`error`]: Error types and Result alias
//! - [`query`]: SoQL query composition
//! - [`http`]: The `PageSource` seam and the Socrata HTTP client
//! - [`retrieval`]: The paginated retrieval loop
//! - [`crime`]: The felony query
//! - [`output`]: CSV writing
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod crime;
pub mod error;
pub mod http;
pub mod output;
pub mod query;
pub mod retrieval;
pub mod types;

// Re-export main functions
pub use crime::fetch_felonies;
pub use retrieval::{retrieve, Pages, RetrievalOptions};

// Re-export commonly used items
pub use config::{load_config, Config};
pub use error::{Result, ScraperError};
pub use http::{PageRequest, PageSource, SocrataClient};
pub use types::{DatasetRef, FieldValue, Page, Record, RecordSet, RunStats};
