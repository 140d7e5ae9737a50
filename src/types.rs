//! Core types for the typescope pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: normalized edit events, feature scores, per-file risk, work
//! patterns, flags, and the final analysis/report output.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of editor activity captured by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditKind {
    Insert,
    Delete,
    Save,
}

impl EditKind {
    /// Map a compact kind code (`i`, `d`, `s`). Unknown codes are treated as inserts.
    pub fn from_code(code: &str) -> Self {
        match code {
            "d" => EditKind::Delete,
            "s" => EditKind::Save,
            _ => EditKind::Insert,
        }
    }

    /// Map a legacy kind name (`insert`, `delete`, `save`). Unknown names are treated as inserts.
    pub fn from_name(name: &str) -> Self {
        match name {
            "delete" => EditKind::Delete,
            "save" => EditKind::Save,
            _ => EditKind::Insert,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EditKind::Insert => "insert",
            EditKind::Delete => "delete",
            EditKind::Save => "save",
        }
    }
}

/// A single normalized editor event with an absolute timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditEvent {
    /// Absolute timestamp (ms)
    pub timestamp_ms: i64,
    pub kind: EditKind,
    /// File basename (directories stripped)
    pub file: String,
    /// Characters inserted or deleted; meaningless for saves
    pub char_count: u64,
}

impl EditEvent {
    pub fn new(timestamp_ms: i64, kind: EditKind, file: impl Into<String>, char_count: u64) -> Self {
        Self {
            timestamp_ms,
            kind,
            file: file.into(),
            char_count,
        }
    }

    pub fn is_insert(&self) -> bool {
        self.kind == EditKind::Insert
    }

    pub fn is_delete(&self) -> bool {
        self.kind == EditKind::Delete
    }
}

/// Ordered sequence of edit events
///
/// Events are kept in the order supplied by the capture client. Ordering is
/// assumed, not enforced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<EditEvent>,
}

impl EventLog {
    pub fn new(events: Vec<EditEvent>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[EditEvent] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EditEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<i64> {
        self.events.first().map(|e| e.timestamp_ms)
    }

    pub fn last_timestamp(&self) -> Option<i64> {
        self.events.last().map(|e| e.timestamp_ms)
    }

    /// Insert events in log order
    pub fn inserts(&self) -> impl Iterator<Item = &EditEvent> {
        self.events.iter().filter(|e| e.is_insert())
    }

    /// Delete events in log order
    pub fn deletes(&self) -> impl Iterator<Item = &EditEvent> {
        self.events.iter().filter(|e| e.is_delete())
    }
}

impl From<Vec<EditEvent>> for EventLog {
    fn from(events: Vec<EditEvent>) -> Self {
        Self::new(events)
    }
}

/// Per-file risk classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Raise the level by one step, saturating at `High`
    pub fn escalate(self) -> Self {
        match self {
            RiskLevel::Low => RiskLevel::Medium,
            RiskLevel::Medium | RiskLevel::High => RiskLevel::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

/// Risk assessment for a single file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRisk {
    pub risk: RiskLevel,
    /// Human-readable issues, in the order the rules fired
    pub issues: Vec<String>,
    /// Total inserted characters
    pub total_chars: u64,
    /// Number of large-paste inserts
    pub paste_count: u32,
    /// Deletes per insert (rounded to 3 decimals)
    pub edit_ratio: f64,
    pub insert_count: u32,
    pub delete_count: u32,
}

/// Flag severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// Human-readable warning attached to an analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    pub severity: Severity,
    pub category: String,
    pub message: String,
}

/// A 30-second window whose typing speed exceeded the burst threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousBurst {
    /// Window start relative to the first event (minutes)
    pub time_offset: f64,
    pub cpm: u64,
    pub chars: u64,
}

/// Windowed typing-speed analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VelocityReport {
    pub average_cpm: f64,
    pub max_cpm: f64,
    /// Speed score (0-10)
    pub score: f64,
    pub suspicious_bursts: Vec<SuspiciousBurst>,
}

/// Output of the six feature extractors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureScores {
    /// Incremental development score (0-10)
    pub incremental_score: f64,
    /// Typing rhythm variance score (0-10)
    pub typing_variance: f64,
    /// Error correction score (0-10)
    pub error_correction_ratio: f64,
    /// Raw count of rapid large pastes
    pub paste_burst_count: u32,
    /// Work session score (0-10)
    pub session_consistency: f64,
    pub velocity: VelocityReport,
}

/// Aggregate work-pattern statistics used as flag context
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkPatterns {
    pub total_duration_minutes: f64,
    pub active_coding_minutes: f64,
    /// Inter-event gaps longer than the break threshold (minutes)
    pub breaks: Vec<f64>,
    pub breaks_count: u32,
    pub total_chars_inserted: u64,
    pub total_chars_deleted: u64,
    /// Share of inserted characters that came from large pastes (0-100)
    pub paste_percentage: f64,
    pub large_pastes_count: u32,
}

/// Complete engine output for one event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub incremental_score: f64,
    pub typing_variance: f64,
    pub error_correction_ratio: f64,
    pub paste_burst_count: u32,
    pub session_consistency: f64,
    pub velocity: VelocityReport,
    pub velocity_score: f64,
    /// Composite authenticity score (0-10)
    pub overall_score: f64,
    pub file_risks: BTreeMap<String, FileRisk>,
    pub work_patterns: WorkPatterns,
    pub flags: Vec<Flag>,
}

// ============================================================================
// Summaries
// ============================================================================

/// Descriptive statistics of an event log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub total_events: u32,
    pub duration_minutes: f64,
    pub files: Vec<String>,
    pub activity_periods: u32,
    pub insert_events: u32,
    pub delete_events: u32,
    pub save_events: u32,
    pub large_paste_events: u32,
    pub chars_added: u64,
    pub chars_removed: u64,
}

/// One contiguous work session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkSessionSummary {
    pub start_offset_minutes: f64,
    pub duration_minutes: f64,
    pub event_count: u32,
    pub chars_added: u64,
    pub chars_removed: u64,
    pub files: Vec<String>,
    pub large_paste_count: u32,
    pub average_chars_per_insert: f64,
}

/// Per-file activity joined with that file's risk assessment
///
/// Files that only saw deletes or saves have no assessment, so `risk` is
/// `None` and the risk-derived fields are empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSummary {
    pub total_events: u32,
    pub chars_added: u64,
    pub chars_removed: u64,
    pub save_count: u32,
    pub development_time_minutes: f64,
    pub risk: Option<RiskLevel>,
    pub issues: Vec<String>,
    pub edit_ratio: f64,
    pub paste_count: u32,
}

/// One 10-minute slice of the activity timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub time_offset_minutes: f64,
    pub event_count: u32,
    pub chars_added: u64,
    pub deletions: u32,
    pub large_paste_count: u32,
    pub large_paste_chars: u64,
    pub files: Vec<String>,
    pub suspicious: bool,
    pub description: String,
}

// ============================================================================
// Report envelope
// ============================================================================

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Where and when the analysed activity was observed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProvenance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_event_utc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_event_utc: Option<String>,
    pub computed_at_utc: String,
    pub event_count: u32,
}

/// Full report handed to persistence, export, and prompt layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticityReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub provenance: ReportProvenance,
    pub summary: EventSummary,
    pub sessions: Vec<WorkSessionSummary>,
    pub files: BTreeMap<String, FileSummary>,
    pub timeline: Vec<TimelineEntry>,
    pub analysis: AnalysisResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes() {
        assert_eq!(EditKind::from_code("i"), EditKind::Insert);
        assert_eq!(EditKind::from_code("d"), EditKind::Delete);
        assert_eq!(EditKind::from_code("s"), EditKind::Save);
        // Unknown codes fall back to insert
        assert_eq!(EditKind::from_code("x"), EditKind::Insert);
        assert_eq!(EditKind::from_name("delete"), EditKind::Delete);
        assert_eq!(EditKind::from_name("paste"), EditKind::Insert);
    }

    #[test]
    fn test_risk_escalation() {
        assert_eq!(RiskLevel::Low.escalate(), RiskLevel::Medium);
        assert_eq!(RiskLevel::Medium.escalate(), RiskLevel::High);
        assert_eq!(RiskLevel::High.escalate(), RiskLevel::High);
    }

    #[test]
    fn test_enum_serialization() {
        let flag = Flag {
            severity: Severity::None,
            category: "Assessment".to_string(),
            message: "ok".to_string(),
        };
        let json = serde_json::to_value(&flag).unwrap();
        assert_eq!(json["severity"], "none");

        let json = serde_json::to_value(RiskLevel::High).unwrap();
        assert_eq!(json, "high");

        let event = EditEvent::new(5, EditKind::Delete, "main.py", 3);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "delete");
    }

    #[test]
    fn test_event_log_accessors() {
        let log = EventLog::new(vec![
            EditEvent::new(100, EditKind::Insert, "a.py", 5),
            EditEvent::new(200, EditKind::Delete, "a.py", 1),
            EditEvent::new(300, EditKind::Save, "a.py", 0),
        ]);
        assert_eq!(log.len(), 3);
        assert_eq!(log.first_timestamp(), Some(100));
        assert_eq!(log.last_timestamp(), Some(300));
        assert_eq!(log.inserts().count(), 1);
        assert_eq!(log.deletes().count(), 1);
        assert!(EventLog::default().first_timestamp().is_none());
    }
}
