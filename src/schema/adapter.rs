//! Parsing and validation of uploaded wire records

use crate::error::AnalysisError;
use crate::schema::wire::{CompactRecord, WireRow};

/// Adapter for reading wire records from JSON text
pub struct WireAdapter;

impl WireAdapter {
    /// Parse a single JSON record
    pub fn parse_record(json: &str) -> Result<CompactRecord, AnalysisError> {
        let record: CompactRecord = serde_json::from_str(json)?;
        Ok(record)
    }

    /// Parse a JSON array of records
    pub fn parse_array(json: &str) -> Result<Vec<CompactRecord>, AnalysisError> {
        let records: Vec<CompactRecord> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse NDJSON (one record per line)
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<CompactRecord>, AnalysisError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<CompactRecord>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Err(AnalysisError::Parse(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Check every row of a record, collecting all problems
    ///
    /// Unlike normalization this does not stop at the first bad row.
    pub fn validate_record(record: &CompactRecord) -> Vec<ValidationResult> {
        record
            .events
            .iter()
            .enumerate()
            .filter_map(|(index, value)| {
                let resolved = WireRow::parse(index, value)
                    .and_then(|row| row.absolute_time(index, record.base_time));
                match resolved {
                    Ok(_) => None,
                    Err(AnalysisError::MalformedEvent { index, reason }) => {
                        Some(ValidationResult { index, reason })
                    }
                    Err(other) => Some(ValidationResult {
                        index,
                        reason: other.to_string(),
                    }),
                }
            })
            .collect()
    }
}

/// A malformed row found during validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub index: usize,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record() {
        let record =
            WireAdapter::parse_record(r#"{"base_time": 10, "events": [[0, "i", "a.py", 1]]}"#)
                .unwrap();
        assert_eq!(record.base_time, 10);
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(matches!(
            WireAdapter::parse_record("not json"),
            Err(AnalysisError::Json(_))
        ));
        assert!(WireAdapter::parse_record(r#"{"events": 5}"#).is_err());
    }

    #[test]
    fn test_parse_array() {
        let records = WireAdapter::parse_array(
            r#"[{"base_time": 1, "events": []}, {"base_time": 2, "events": [[0, "s", "a", 0]]}]"#,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].len(), 1);
    }

    #[test]
    fn test_parse_ndjson_skips_blank_lines() {
        let input = "{\"base_time\": 1, \"events\": []}\n\n{\"base_time\": 2, \"events\": []}\n";
        let records = WireAdapter::parse_ndjson(input).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].base_time, 2);
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let input = "{\"base_time\": 1, \"events\": []}\n{oops}\n";
        let err = WireAdapter::parse_ndjson(input).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_validate_collects_all_rows() {
        let record = WireAdapter::parse_record(
            r#"{"base_time": 0, "events": [
                [0, "i", "a.py", 1],
                [1, "i", "a.py"],
                [2, "i", "a.py", 1],
                {"type": "insert"}
            ]}"#,
        )
        .unwrap();

        let problems = WireAdapter::validate_record(&record);
        assert_eq!(problems.len(), 2);
        assert_eq!(problems[0].index, 1);
        assert_eq!(problems[1].index, 3);
        assert!(problems[1].reason.contains("timestamp"));
    }

    #[test]
    fn test_validate_rejects_oversized_values() {
        let record = WireAdapter::parse_record(
            r#"{"base_time": 0, "events": [
                [0, "i", "a.py", 9223372036854775807],
                {"timestamp": -9223372036854775808, "type": "insert"},
                [5, "i", "a.py", 1]
            ]}"#,
        )
        .unwrap();

        let problems = WireAdapter::validate_record(&record);
        assert_eq!(problems.len(), 2);
        assert!(problems[0].reason.contains("char_count"));
        assert!(problems[1].reason.contains("range"));
    }
}
