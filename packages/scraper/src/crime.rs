//! Felony complaint queries.

use crate::error::Result;
use crate::http::PageSource;
use crate::query::SoqlQuery;
use crate::retrieval::{retrieve, retrieve_with_progress, RetrievalOptions};
use crate::types::{Page, RecordSet, RunStats};

/// Column holding the offense level of a complaint.
pub const LAW_CATEGORY_COLUMN: &str = "law_cat_cd";

/// Offense level selected by [`felony_query`].
pub const FELONY: &str = "FELONY";

/// Query selecting every felony complaint.
///
/// # Examples
/// ```
/// use crimedata_scraper::crime::felony_query;
///
/// assert_eq!(felony_query().base(), "SELECT * WHERE law_cat_cd = 'FELONY'");
/// ```
pub fn felony_query() -> SoqlQuery {
    SoqlQuery::where_equals(LAW_CATEGORY_COLUMN, FELONY)
}

/// Fetch all felony records from `source`.
pub fn fetch_felonies<S: PageSource>(source: S, options: &RetrievalOptions) -> Result<RecordSet> {
    retrieve(source, &felony_query(), options)
}

/// Fetch all felony records from `source`, reporting each page to `on_page`.
pub fn fetch_felonies_with_progress<S, F>(
    source: S,
    options: &RetrievalOptions,
    on_page: F,
) -> Result<(RecordSet, RunStats)>
where
    S: PageSource,
    F: FnMut(&Page, usize),
{
    retrieve_with_progress(source, &felony_query(), options, on_page)
}
