//! Event normalization
//!
//! Converts a compact wire record into an [`EventLog`] of typed events with
//! absolute timestamps and basename-only filenames.

use crate::error::AnalysisError;
use crate::schema::{CompactRecord, WireRow};
use crate::types::{EditEvent, EventLog};

/// Normalizer for uploaded wire records
pub struct EventNormalizer;

impl EventNormalizer {
    /// Normalize every row of a record
    ///
    /// Rows are not re-sorted. The first malformed row aborts normalization;
    /// an empty record yields an empty log.
    pub fn normalize(record: &CompactRecord) -> Result<EventLog, AnalysisError> {
        let events = record
            .events
            .iter()
            .enumerate()
            .map(|(index, value)| {
                let row = WireRow::parse(index, value)?;
                let timestamp_ms = row.absolute_time(index, record.base_time)?;
                Ok(to_event(row, timestamp_ms))
            })
            .collect::<Result<Vec<_>, AnalysisError>>()?;

        tracing::debug!(events = events.len(), "normalized wire record");
        Ok(EventLog::new(events))
    }
}

fn to_event(row: WireRow, timestamp_ms: i64) -> EditEvent {
    match row {
        WireRow::Compact {
            kind,
            file,
            char_count,
            ..
        }
        | WireRow::Legacy {
            kind,
            file,
            char_count,
            ..
        } => EditEvent::new(timestamp_ms, kind, basename(&file), char_count),
    }
}

/// Final path segment, accepting both separators
pub fn basename(path: &str) -> &str {
    path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EditKind;
    use serde_json::json;

    #[test]
    fn test_absolute_timestamps() {
        let record = CompactRecord::new(1_700_000_000_000)
            .with_event(0, "i", "main.py", 5)
            .with_event(1500, "d", "main.py", 2)
            .with_event(3000, "s", "main.py", 0);

        let log = EventNormalizer::normalize(&record).unwrap();
        let times: Vec<i64> = log.iter().map(|e| e.timestamp_ms).collect();
        assert_eq!(
            times,
            vec![1_700_000_000_000, 1_700_000_001_500, 1_700_000_003_000]
        );
        assert_eq!(log.events()[1].kind, EditKind::Delete);
        assert_eq!(log.events()[2].kind, EditKind::Save);
    }

    #[test]
    fn test_filenames_reduced_to_basename() {
        let record = CompactRecord::new(0)
            .with_event(0, "i", "/home/student/project/src/main.py", 1)
            .with_event(1, "i", "C:\\work\\util.py", 1)
            .with_event(2, "i", "plain.py", 1);

        let log = EventNormalizer::normalize(&record).unwrap();
        let files: Vec<&str> = log.iter().map(|e| e.file.as_str()).collect();
        assert_eq!(files, vec!["main.py", "util.py", "plain.py"]);
    }

    #[test]
    fn test_unknown_code_defaults_to_insert() {
        let record = CompactRecord::new(0).with_event(0, "z", "a.py", 9);
        let log = EventNormalizer::normalize(&record).unwrap();
        assert_eq!(log.events()[0].kind, EditKind::Insert);
    }

    #[test]
    fn test_order_is_preserved() {
        let record = CompactRecord::new(0)
            .with_event(5000, "i", "a.py", 1)
            .with_event(1000, "i", "a.py", 1);
        let log = EventNormalizer::normalize(&record).unwrap();
        assert_eq!(log.first_timestamp(), Some(5000));
        assert_eq!(log.last_timestamp(), Some(1000));
    }

    #[test]
    fn test_empty_record() {
        let log = EventNormalizer::normalize(&CompactRecord::new(42)).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn test_mixed_shapes() {
        let mut record = CompactRecord::new(10_000).with_event(0, "i", "a.py", 3);
        record.events.push(json!({
            "timestamp": 10_500,
            "type": "delete",
            "file": "pkg/a.py",
            "char_count": 1
        }));

        let log = EventNormalizer::normalize(&record).unwrap();
        assert_eq!(log.events()[1], EditEvent::new(10_500, EditKind::Delete, "a.py", 1));
    }

    #[test]
    fn test_malformed_row_aborts() {
        let mut record = CompactRecord::new(0).with_event(0, "i", "a.py", 3);
        record.events.push(json!([1, "i"]));
        record.events.push(json!([2, "i", "a.py", 3]));

        let err = EventNormalizer::normalize(&record).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedEvent { index: 1, .. }));
    }

    #[test]
    fn test_out_of_range_timestamp_aborts() {
        let mut record = CompactRecord::new(0).with_event(0, "i", "a.py", 3);
        record.events.push(json!({"timestamp": i64::MIN, "type": "insert"}));
        let err = EventNormalizer::normalize(&record).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedEvent { index: 1, .. }));

        let record = CompactRecord::new(i64::MAX).with_event(0, "i", "a.py", 3);
        assert!(EventNormalizer::normalize(&record).is_err());
    }
}
