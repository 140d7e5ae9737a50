//! Report encoder
//!
//! Wraps an [`AnalysisResult`] in the authenticity report envelope together
//! with producer metadata, provenance, and the descriptive summaries.

use crate::error::AnalysisError;
use crate::messages::MessageRenderer;
use crate::summary::ActivitySummarizer;
use crate::types::{
    AnalysisResult, AuthenticityReport, EventLog, ReportProducer, ReportProvenance,
};
use crate::{ENGINE_VERSION, PRODUCER_NAME};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Current report envelope version
pub const REPORT_VERSION: &str = "1.0.0";

/// Authenticity report encoder
#[derive(Debug, Clone)]
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Build the report for an analysed log
    pub fn encode(
        &self,
        log: &EventLog,
        analysis: AnalysisResult,
        renderer: &dyn MessageRenderer,
    ) -> AuthenticityReport {
        let producer = ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: ENGINE_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        let provenance = ReportProvenance {
            first_event_utc: log.first_timestamp().and_then(to_rfc3339),
            last_event_utc: log.last_timestamp().and_then(to_rfc3339),
            computed_at_utc: Utc::now().to_rfc3339(),
            event_count: log.len() as u32,
        };

        AuthenticityReport {
            report_version: REPORT_VERSION.to_string(),
            producer,
            provenance,
            summary: ActivitySummarizer::summarize(log),
            sessions: ActivitySummarizer::sessions(log),
            files: ActivitySummarizer::files(log, &analysis.file_risks),
            timeline: ActivitySummarizer::timeline(log, renderer),
            analysis,
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json(
        &self,
        log: &EventLog,
        analysis: AnalysisResult,
        renderer: &dyn MessageRenderer,
    ) -> Result<String, AnalysisError> {
        let report = self.encode(log, analysis, renderer);
        serde_json::to_string_pretty(&report).map_err(AnalysisError::encoding)
    }
}

/// Epoch milliseconds as RFC 3339, `None` when out of range
fn to_rfc3339(ms: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(ms).map(|t| t.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Catalogue;
    use crate::pipeline::analyze_log;
    use crate::types::{EditEvent, EditKind};

    fn sample_log() -> EventLog {
        EventLog::new(vec![
            EditEvent::new(1_705_327_200_000, EditKind::Insert, "main.py", 12),
            EditEvent::new(1_705_327_260_000, EditKind::Delete, "main.py", 2),
            EditEvent::new(1_705_327_900_000, EditKind::Insert, "util.py", 40),
        ])
    }

    #[test]
    fn test_envelope_metadata() {
        let log = sample_log();
        let encoder = ReportEncoder::with_instance_id("test-instance".to_string());
        let report = encoder.encode(&log, analyze_log(&log), &Catalogue);

        assert_eq!(report.report_version, REPORT_VERSION);
        assert_eq!(report.producer.name, PRODUCER_NAME);
        assert_eq!(report.producer.version, ENGINE_VERSION);
        assert_eq!(report.producer.instance_id, "test-instance");
        assert_eq!(
            report.provenance.first_event_utc.as_deref(),
            Some("2024-01-15T14:00:00+00:00")
        );
        assert_eq!(report.provenance.event_count, 3);
        assert_eq!(report.summary.total_events, 3);
        assert_eq!(report.sessions.len(), 2);
        assert_eq!(report.timeline.len(), 2);

        let files: Vec<&str> = report.files.keys().map(String::as_str).collect();
        assert_eq!(files, vec!["main.py", "util.py"]);
        assert_eq!(report.files["main.py"].chars_removed, 2);
        assert_eq!(report.files["main.py"].development_time_minutes, 1.0);
        assert_eq!(
            report.files["util.py"].risk,
            report.analysis.file_risks.get("util.py").map(|r| r.risk)
        );
    }

    #[test]
    fn test_unique_instance_ids() {
        assert_ne!(ReportEncoder::new().instance_id(), ReportEncoder::new().instance_id());
    }

    #[test]
    fn test_empty_log_omits_event_times() {
        let log = EventLog::default();
        let json = ReportEncoder::new()
            .encode_to_json(&log, analyze_log(&log), &Catalogue)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(value["provenance"].get("first_event_utc").is_none());
        assert!(value["provenance"]["computed_at_utc"].is_string());
        assert_eq!(value["analysis"]["flags"].as_array().map(Vec::len), Some(3));
        assert_eq!(value["sessions"], serde_json::json!([]));
        assert_eq!(value["files"], serde_json::json!({}));
    }
}
