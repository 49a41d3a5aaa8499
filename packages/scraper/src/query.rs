//! SoQL query composition.
//!
//! A query is a fixed base expression; each page request appends its own
//! `LIMIT`/`OFFSET` clause without touching the base.

use std::fmt;

/// Base SoQL expression shared by every page request of one retrieval.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoqlQuery {
    base: String,
}

impl SoqlQuery {
    /// Wrap a SoQL expression. An empty expression means no filter.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim().to_string(),
        }
    }

    /// Query selecting all rows where `column` equals the string `value`.
    ///
    /// Single quotes in `value` are doubled, as SoQL string literals require.
    ///
    /// # Examples
    /// ```
    /// use crimedata_scraper::query::SoqlQuery;
    ///
    /// let query = SoqlQuery::where_equals("law_cat_cd", "FELONY");
    /// assert_eq!(query.base(), "SELECT * WHERE law_cat_cd = 'FELONY'");
    /// ```
    pub fn where_equals(column: &str, value: &str) -> Self {
        let literal = value.replace('\'', "''");
        Self::new(format!("SELECT * WHERE {column} = '{literal}'"))
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Base expression followed by the pagination clause.
    ///
    /// # Examples
    /// ```
    /// use crimedata_scraper::query::SoqlQuery;
    ///
    /// let query = SoqlQuery::new("SELECT *");
    /// assert_eq!(query.paginated(100, 200), "SELECT * LIMIT 100 OFFSET 200");
    /// ```
    pub fn paginated(&self, limit: u64, offset: u64) -> String {
        if self.base.is_empty() {
            format!("LIMIT {limit} OFFSET {offset}")
        } else {
            format!("{} LIMIT {limit} OFFSET {offset}", self.base)
        }
    }
}

impl fmt::Display for SoqlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginated_keeps_base() {
        let query = SoqlQuery::where_equals("law_cat_cd", "FELONY");
        assert_eq!(
            query.paginated(10_000, 0),
            "SELECT * WHERE law_cat_cd = 'FELONY' LIMIT 10000 OFFSET 0"
        );
        assert_eq!(
            query.paginated(10_000, 20_000),
            "SELECT * WHERE law_cat_cd = 'FELONY' LIMIT 10000 OFFSET 20000"
        );
        assert_eq!(query.base(), "SELECT * WHERE law_cat_cd = 'FELONY'");
    }

    #[test]
    fn test_empty_base() {
        let query = SoqlQuery::new("  ");
        assert_eq!(query.paginated(5, 10), "LIMIT 5 OFFSET 10");
    }

    #[test]
    fn test_where_equals_escapes_quotes() {
        let query = SoqlQuery::where_equals("boro_nm", "O'HARE");
        assert_eq!(query.base(), "SELECT * WHERE boro_nm = 'O''HARE'");
    }
}
