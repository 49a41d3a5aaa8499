//! Core data types for the scraper.
//!
//! Records are schema-free: a record is an ordered mapping from column name
//! to value, and the column set of a result is whatever the portal returned.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Map, Value};

/// Column that is reinterpreted as a timestamp after retrieval.
pub const DATE_COLUMN: &str = "date";

/// Output format for timestamp values.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Output format for a timestamp column whose values are all midnight.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Date-time layouts tried, in order, when normalizing a date column.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Date-only layouts, interpreted as midnight.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d", "%m/%d/%Y"];

/// Identifies one remote table: portal endpoint plus dataset identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRef {
    pub endpoint: String,
    pub dataset_id: String,
}

impl DatasetRef {
    pub fn new(endpoint: impl Into<String>, dataset_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            dataset_id: dataset_id.into(),
        }
    }
}

impl fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.endpoint, self.dataset_id)
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Timestamp(NaiveDateTime),
    Null,
}

impl FieldValue {
    /// Convert a JSON value from the portal.
    ///
    /// Strings are kept as text and null stays null. Anything else (numbers,
    /// booleans, location objects) is kept as its compact JSON text.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::String(s) => Self::Text(s),
            other => Self::Text(other.to_string()),
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Reinterpret this value as a timestamp, or null when it does not parse.
    #[must_use]
    pub fn to_timestamp(&self) -> Self {
        match self {
            Self::Text(s) => parse_timestamp(s).map_or(Self::Null, Self::Timestamp),
            Self::Timestamp(ts) => Self::Timestamp(*ts),
            Self::Null => Self::Null,
        }
    }

    /// Text for a CSV cell. Null is the empty string.
    pub fn to_csv_field(&self) -> String {
        self.to_csv_field_as(false)
    }

    /// Text for a CSV cell, writing timestamps without a time when `date_only`.
    pub fn to_csv_field_as(&self, date_only: bool) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Timestamp(ts) if date_only => ts.format(DATE_FORMAT).to_string(),
            Self::Timestamp(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
            Self::Null => String::new(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Parse a timestamp as the portal or a user might write it.
///
/// Accepts Socrata floating timestamps (`2024-03-01T13:45:00.000`), RFC 3339
/// with an offset (converted to UTC), and plain dates.
///
/// # Examples
/// ```
/// use crimedata_scraper::types::parse_timestamp;
///
/// assert!(parse_timestamp("2024-03-01T13:45:00.000").is_some());
/// assert!(parse_timestamp("2024-03-01").is_some());
/// assert!(parse_timestamp("not a date").is_none());
/// ```
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, format) {
            return Some(ts);
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.naive_utc());
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
        .map(|date| date.and_time(NaiveTime::MIN))
}

/// One record: ordered column name to value mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON object, keeping the object's key order.
    pub fn from_json_object(object: Map<String, Value>) -> Self {
        // Object keys are already unique
        let fields = object
            .into_iter()
            .map(|(column, value)| (column, FieldValue::from_json(value)))
            .collect();
        Self { fields }
    }

    /// Set a column, replacing an existing value in place.
    pub fn insert(&mut self, column: impl Into<String>, value: FieldValue) {
        let column = column.into();
        match self.fields.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    /// Column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(c, _)| c.as_str())
    }

    /// Column and value pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (column, value) in iter {
            record.insert(column, value);
        }
        record
    }
}

/// Records returned by one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Offset the page was requested at.
    pub offset: u64,
    pub records: Vec<Record>,
}

impl Page {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Accumulated records of every non-empty page, in arrival order.
///
/// The column list is the union of all record columns in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    columns: Vec<String>,
    known_columns: HashSet<String>,
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append records, extending the column list with any new names.
    pub fn extend(&mut self, records: impl IntoIterator<Item = Record>) {
        for record in records {
            for column in record.columns() {
                if !self.known_columns.contains(column) {
                    self.known_columns.insert(column.to_string());
                    self.columns.push(column.to_string());
                }
            }
            self.records.push(record);
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.known_columns.contains(column)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Reinterpret the `date` column as timestamps.
    ///
    /// Only applies when some record has a `date` column. Every record then
    /// gets a `date` value: a timestamp when it parses, null otherwise.
    /// Returns the number of values that became null.
    pub fn normalize_dates(&mut self) -> usize {
        if !self.has_column(DATE_COLUMN) {
            return 0;
        }

        let mut nulled = 0;
        for record in &mut self.records {
            let normalized = record
                .get(DATE_COLUMN)
                .map_or(FieldValue::Null, FieldValue::to_timestamp);
            if normalized.is_null() {
                nulled += 1;
            }
            record.insert(DATE_COLUMN, normalized);
        }
        nulled
    }
}

/// Summary of one retrieval run, for logging only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunStats {
    pub elapsed: Duration,
    pub rows: usize,
    pub columns: usize,
    pub requests: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_field_value_from_json() {
        assert_eq!(FieldValue::from_json(json!("abc")), FieldValue::from("abc"));
        assert_eq!(FieldValue::from_json(json!(null)), FieldValue::Null);
        assert_eq!(FieldValue::from_json(json!(42)), FieldValue::from("42"));
        assert_eq!(
            FieldValue::from_json(json!({"type": "Point"})),
            FieldValue::from(r#"{"type":"Point"}"#)
        );
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(
            parse_timestamp("2024-03-01T13:45:00.000"),
            Some(ts("2024-03-01 13:45:00"))
        );
        assert_eq!(
            parse_timestamp("2024-03-01 13:45:00"),
            Some(ts("2024-03-01 13:45:00"))
        );
        assert_eq!(
            parse_timestamp("2024-03-01T13:45:00+01:00"),
            Some(ts("2024-03-01 12:45:00"))
        );
        assert_eq!(parse_timestamp("2024-03-01"), Some(ts("2024-03-01 00:00:00")));
        assert_eq!(parse_timestamp("03/01/2024"), Some(ts("2024-03-01 00:00:00")));
    }

    #[test]
    fn test_parse_timestamp_without_seconds() {
        assert_eq!(
            parse_timestamp("2024-03-01T13:45"),
            Some(ts("2024-03-01 13:45:00"))
        );
        assert_eq!(
            parse_timestamp("2024-03-01 13:45"),
            Some(ts("2024-03-01 13:45:00"))
        );
    }

    #[test]
    fn test_parse_timestamp_slashed_date() {
        assert_eq!(parse_timestamp("2024/03/01"), Some(ts("2024-03-01 00:00:00")));
    }

    #[test]
    fn test_parse_timestamp_compact_date() {
        assert_eq!(parse_timestamp("20240301"), Some(ts("2024-03-01 00:00:00")));
    }

    #[test]
    fn test_parse_timestamp_utc_suffix() {
        assert_eq!(
            parse_timestamp("2024-03-01T13:45:00Z"),
            Some(ts("2024-03-01 13:45:00"))
        );
    }

    #[test]
    fn test_parse_timestamp_invalid() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-01"), None);
    }

    #[test]
    fn test_record_keeps_json_key_order() {
        let object = json!({"zeta": "1", "alpha": "2", "mid": null});
        let Value::Object(map) = object else {
            unreachable!()
        };
        let record = Record::from_json_object(map);

        assert_eq!(record.columns().collect::<Vec<_>>(), ["zeta", "alpha", "mid"]);
        assert_eq!(record.get("mid"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_record_insert_replaces_in_place() {
        let mut record: Record = [("a", FieldValue::from("1")), ("b", FieldValue::from("2"))]
            .into_iter()
            .collect();
        record.insert("a", FieldValue::Null);

        assert_eq!(record.columns().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(record.get("a"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_record_set_column_union() {
        let mut set = RecordSet::new();
        set.extend([
            [("id", FieldValue::from("1")), ("law_cat_cd", FieldValue::from("FELONY"))]
                .into_iter()
                .collect::<Record>(),
            [("id", FieldValue::from("2")), ("boro", FieldValue::from("BRONX"))]
                .into_iter()
                .collect(),
        ]);

        assert_eq!(set.columns(), ["id", "law_cat_cd", "boro"]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_normalize_dates() {
        let mut set = RecordSet::new();
        set.extend([
            [("id", FieldValue::from("1")), ("date", FieldValue::from("2024-01-05T00:00:00.000"))]
                .into_iter()
                .collect::<Record>(),
            [("id", FieldValue::from("2")), ("date", FieldValue::from("garbage"))]
                .into_iter()
                .collect(),
            [("id", FieldValue::from("3"))].into_iter().collect(),
        ]);

        let nulled = set.normalize_dates();

        assert_eq!(nulled, 2);
        let records = set.records();
        assert_eq!(
            records[0].get("date"),
            Some(&FieldValue::Timestamp(ts("2024-01-05 00:00:00")))
        );
        assert_eq!(records[1].get("date"), Some(&FieldValue::Null));
        assert_eq!(records[2].get("date"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_normalize_dates_without_date_column() {
        let mut set = RecordSet::new();
        set.extend([[("cmplnt_fr_dt", FieldValue::from("2024-01-05"))]
            .into_iter()
            .collect::<Record>()]);

        assert_eq!(set.normalize_dates(), 0);
        assert_eq!(
            set.records()[0].get("cmplnt_fr_dt"),
            Some(&FieldValue::from("2024-01-05"))
        );
    }

    #[test]
    fn test_csv_field() {
        assert_eq!(FieldValue::Null.to_csv_field(), "");
        assert_eq!(
            FieldValue::Timestamp(ts("2024-01-05 10:30:00")).to_csv_field(),
            "2024-01-05 10:30:00"
        );
        assert_eq!(
            FieldValue::Timestamp(ts("2024-01-05 00:00:00")).to_csv_field_as(true),
            "2024-01-05"
        );
    }

    #[test]
    fn test_record_set_repeated_columns_listed_once() {
        let mut set = RecordSet::new();
        for i in 0..3 {
            set.extend([[
                ("id", FieldValue::Text(i.to_string())),
                ("boro", FieldValue::from("BRONX")),
            ]
            .into_iter()
            .collect::<Record>()]);
        }

        assert_eq!(set.columns(), ["id", "boro"]);
        assert!(set.has_column("boro"));
        assert!(!set.has_column("date"));
    }
}
