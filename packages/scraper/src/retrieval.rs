//! Offset/limit retrieval loop.
//!
//! [`Pages`] requests one page per `next()` call and ends at the first empty
//! page. [`retrieve`] drains it into a [`RecordSet`] and normalizes dates.

use std::thread;
use std::time::{Duration, Instant};

use crate::config::{DEFAULT_PAGE_SIZE, DEFAULT_THROTTLE_SECS};
use crate::error::Result;
use crate::http::{PageRequest, PageSource};
use crate::query::SoqlQuery;
use crate::types::{Page, RecordSet, RunStats};

/// Tuning of a retrieval run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalOptions {
    /// Records requested per page. Must be positive.
    pub page_size: u64,
    /// Fixed pause before every request after the first.
    pub throttle: Duration,
    /// Stop after this many requests even if pages are still full.
    pub max_pages: Option<u64>,
    /// Stop once this many records have been collected.
    pub max_records: Option<u64>,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            throttle: Duration::from_secs(DEFAULT_THROTTLE_SECS),
            max_pages: None,
            max_records: None,
        }
    }
}

impl RetrievalOptions {
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u64) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn with_max_records(mut self, max_records: u64) -> Self {
        self.max_records = Some(max_records);
        self
    }
}

/// Lazy sequence of non-empty pages.
///
/// Yields `Ok(page)` for each non-empty page in request order. The sequence
/// ends after an empty page, a reached cap, or the first error.
pub struct Pages<S> {
    source: S,
    query: SoqlQuery,
    options: RetrievalOptions,
    offset: u64,
    requests: u64,
    records: u64,
    finished: bool,
}

impl<S: PageSource> Pages<S> {
    pub fn new(source: S, query: SoqlQuery, options: RetrievalOptions) -> Self {
        debug_assert!(options.page_size > 0, "page_size must be positive");
        Self {
            source,
            query,
            options,
            offset: 0,
            requests: 0,
            records: 0,
            finished: false,
        }
    }

    /// Requests issued so far, including the final empty one.
    pub fn requests(&self) -> u64 {
        self.requests
    }

    /// Offset the next request would use.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn cap_reached(&self) -> bool {
        if let Some(max_pages) = self.options.max_pages {
            if self.requests >= max_pages {
                tracing::warn!(max_pages, "Page cap reached, stopping retrieval");
                return true;
            }
        }
        if let Some(max_records) = self.options.max_records {
            if self.records >= max_records {
                tracing::warn!(max_records, "Record cap reached, stopping retrieval");
                return true;
            }
        }
        false
    }
}

impl<S: PageSource> Iterator for Pages<S> {
    type Item = Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.cap_reached() {
            self.finished = true;
            return None;
        }

        if self.requests > 0 && !self.options.throttle.is_zero() {
            thread::sleep(self.options.throttle);
        }

        let request = PageRequest {
            soql: self.query.paginated(self.options.page_size, self.offset),
            limit: self.options.page_size,
            offset: self.offset,
        };
        self.requests += 1;

        let mut records = match self.source.fetch_page(&request) {
            Ok(records) => records,
            Err(e) => {
                self.finished = true;
                return Some(Err(e));
            }
        };

        if records.is_empty() {
            tracing::info!(offset = request.offset, "Done.");
            self.finished = true;
            return None;
        }

        if let Some(max_records) = self.options.max_records {
            let room = max_records.saturating_sub(self.records);
            records.truncate(usize::try_from(room).unwrap_or(usize::MAX));
        }

        self.records += records.len() as u64;
        self.offset += self.options.page_size;
        tracing::info!(
            offset = request.offset,
            rows = records.len(),
            total = self.records,
            "..."
        );

        Some(Ok(Page {
            offset: request.offset,
            records,
        }))
    }
}

/// Fetch every page of `query`, calling `on_page` after each non-empty page.
///
/// The callback receives the page and the number of records collected so far.
pub fn retrieve_with_progress<S, F>(
    source: S,
    query: &SoqlQuery,
    options: &RetrievalOptions,
    mut on_page: F,
) -> Result<(RecordSet, RunStats)>
where
    S: PageSource,
    F: FnMut(&Page, usize),
{
    let started = Instant::now();
    let dataset = source.dataset().clone();

    let mut pages = Pages::new(source, query.clone(), options.clone());
    let mut records = RecordSet::new();
    for page in pages.by_ref() {
        let page = page?;
        on_page(&page, records.len() + page.len());
        records.extend(page.records);
    }

    let stats = RunStats {
        elapsed: started.elapsed(),
        rows: records.len(),
        columns: records.columns().len(),
        requests: pages.requests(),
    };

    tracing::info!(
        endpoint = %dataset.endpoint,
        dataset_id = %dataset.dataset_id,
        elapsed_secs = stats.elapsed.as_secs_f64(),
        rows = stats.rows,
        columns = stats.columns,
        requests = stats.requests,
        "Query summary"
    );

    let nulled = records.normalize_dates();
    if nulled > 0 {
        tracing::debug!(nulled, "Date values that did not parse were set to null");
    }

    Ok((records, stats))
}

/// Fetch every page of `query` and return all records with run statistics.
pub fn retrieve_with_stats<S: PageSource>(
    source: S,
    query: &SoqlQuery,
    options: &RetrievalOptions,
) -> Result<(RecordSet, RunStats)> {
    retrieve_with_progress(source, query, options, |_, _| {})
}

/// Fetch every page of `query` and return all records in arrival order.
pub fn retrieve<S: PageSource>(
    source: S,
    query: &SoqlQuery,
    options: &RetrievalOptions,
) -> Result<RecordSet> {
    retrieve_with_stats(source, query, options).map(|(records, _)| records)
}
