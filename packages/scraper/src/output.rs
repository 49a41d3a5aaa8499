//! CSV output.

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::NaiveTime;

use crate::error::Result;
use crate::types::{FieldValue, RecordSet};

/// Write `records` as CSV to any writer.
///
/// The header lists the record set's columns in order. There is no index
/// column. Missing and null values are empty cells. An empty record set
/// writes nothing, since no columns are known.
///
/// A column whose timestamps all fall on midnight is written as plain dates.
pub fn write_csv_to<W: Write>(records: &RecordSet, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let columns = records.columns();

    if !columns.is_empty() {
        csv_writer.write_record(columns)?;
    }

    let positions: HashMap<&str, usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| (column.as_str(), i))
        .collect();
    let date_only = date_only_columns(records, &positions);

    let mut row = vec![String::new(); columns.len()];
    for record in records.records() {
        row.iter_mut().for_each(String::clear);
        for (column, value) in record.iter() {
            if let Some(&i) = positions.get(column) {
                row[i] = value.to_csv_field_as(date_only[i]);
            }
        }
        csv_writer.write_record(&row)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// For each column, whether every timestamp in it has a zero time of day.
fn date_only_columns(records: &RecordSet, positions: &HashMap<&str, usize>) -> Vec<bool> {
    let mut has_timestamp = vec![false; positions.len()];
    let mut all_midnight = vec![true; positions.len()];

    for record in records.records() {
        for (column, value) in record.iter() {
            if let (FieldValue::Timestamp(ts), Some(&i)) = (value, positions.get(column)) {
                has_timestamp[i] = true;
                all_midnight[i] &= ts.time() == NaiveTime::MIN;
            }
        }
    }

    has_timestamp
        .into_iter()
        .zip(all_midnight)
        .map(|(has, midnight)| has && midnight)
        .collect()
}

/// Write `records` as CSV to `path`, replacing any existing file.
pub fn write_csv(records: &RecordSet, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_csv_to(records, file)?;
    tracing::info!(path = %path.display(), rows = records.len(), "Wrote CSV");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;
    use crate::types::Record;

    fn sample_records() -> RecordSet {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        let mut set = RecordSet::new();
        set.extend([
            [
                ("id", FieldValue::from("1")),
                ("law_cat_cd", FieldValue::from("FELONY")),
                ("date", FieldValue::Timestamp(date)),
            ]
            .into_iter()
            .collect::<Record>(),
            [
                ("id", FieldValue::from("2")),
                ("law_cat_cd", FieldValue::from("FELONY")),
                ("date", FieldValue::Null),
            ]
            .into_iter()
            .collect(),
            [
                ("id", FieldValue::from("3")),
                ("law_cat_cd", FieldValue::from("FELONY, ATTEMPTED")),
            ]
            .into_iter()
            .collect(),
        ]);
        set
    }

    #[test]
    fn test_write_csv_to_buffer() {
        let mut buffer = Vec::new();
        write_csv_to(&sample_records(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert_eq!(
            text,
            "id,law_cat_cd,date\n\
             1,FELONY,2024-01-05\n\
             2,FELONY,\n\
             3,\"FELONY, ATTEMPTED\",\n"
        );
    }

    #[test]
    fn test_write_csv_keeps_time_when_any_is_not_midnight() {
        let mut records = sample_records();
        let afternoon = NaiveDate::from_ymd_opt(2024, 1, 6)
            .and_then(|d| d.and_hms_opt(14, 30, 0))
            .unwrap();
        records.extend([[
            ("id", FieldValue::from("4")),
            ("date", FieldValue::Timestamp(afternoon)),
        ]
        .into_iter()
        .collect::<Record>()]);

        let mut buffer = Vec::new();
        write_csv_to(&records, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.contains("1,FELONY,2024-01-05 00:00:00\n"));
        assert!(text.ends_with("4,,2024-01-06 14:30:00\n"));
    }

    #[test]
    fn test_write_csv_places_values_by_column() {
        let mut records = RecordSet::new();
        records.extend([
            [("a", FieldValue::from("1")), ("b", FieldValue::from("2"))]
                .into_iter()
                .collect::<Record>(),
            [("b", FieldValue::from("3")), ("c", FieldValue::from("4"))]
                .into_iter()
                .collect(),
        ]);

        let mut buffer = Vec::new();
        write_csv_to(&records, &mut buffer).unwrap();

        assert_eq!(String::from_utf8(buffer).unwrap(), "a,b,c\n1,2,\n,3,4\n");
    }

    #[test]
    fn test_write_csv_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("felonies.csv");
        fs::write(&path, "stale content\n").unwrap();

        write_csv(&sample_records(), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "id,law_cat_cd,date");
        assert!(lines[1].starts_with("1,"));
    }

    #[test]
    fn test_write_empty_record_set() {
        let mut buffer = Vec::new();
        write_csv_to(&RecordSet::new(), &mut buffer).unwrap();
        assert!(buffer.is_empty());
    }
}
