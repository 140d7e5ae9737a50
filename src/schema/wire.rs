//! Compact wire record definition
//!
//! The capture client uploads a delta-encoded record:
//!
//! ```text
//! { "base_time": 1700000000000,
//!   "events": [[delta_ms, kind_code, filename, char_count], ...] }
//! ```
//!
//! Older clients sent one object per event instead
//! (`{"timestamp", "type", "file", "char_count"}` with absolute timestamps).
//! Both row shapes are accepted here and resolved into [`WireRow`].

use crate::error::AnalysisError;
use crate::types::EditKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current wire schema identifier
pub const WIRE_SCHEMA: &str = "editor.compact_events.v1";

/// Filename used when a legacy row carries none
pub const UNKNOWN_FILE: &str = "unknown";

/// Largest accepted absolute timestamp magnitude (ms), the JavaScript `Date` range
pub const MAX_TIMESTAMP_MS: i64 = 8_640_000_000_000_000;

/// Largest accepted per-event character count
pub const MAX_CHAR_COUNT: u64 = u32::MAX as u64;

/// Delta-encoded event upload
///
/// Rows are kept as raw JSON values so that a malformed row can be reported
/// with its index instead of failing the whole document parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompactRecord {
    /// Absolute time (ms) that compact deltas are relative to
    #[serde(default)]
    pub base_time: i64,
    /// Event rows, compact arrays or legacy objects
    #[serde(default)]
    pub events: Vec<Value>,
}

impl CompactRecord {
    pub fn new(base_time: i64) -> Self {
        Self {
            base_time,
            events: Vec::new(),
        }
    }

    /// Append a compact row
    pub fn with_event(mut self, delta_ms: i64, code: &str, file: &str, char_count: u64) -> Self {
        self.events
            .push(serde_json::json!([delta_ms, code, file, char_count]));
        self
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// A single row resolved to one shape, not yet normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireRow {
    /// `[delta_ms, kind_code, filename, char_count]`
    Compact {
        delta_ms: i64,
        kind: EditKind,
        file: String,
        char_count: u64,
    },
    /// `{timestamp, type, file?, char_count?}`
    Legacy {
        timestamp: i64,
        kind: EditKind,
        file: String,
        char_count: u64,
    },
}

impl WireRow {
    /// Resolve a raw row; `index` is only used for error reporting
    pub fn parse(index: usize, value: &Value) -> Result<Self, AnalysisError> {
        match value {
            Value::Array(fields) => parse_compact(index, fields),
            Value::Object(_) => parse_legacy(index, value),
            other => Err(AnalysisError::malformed(
                index,
                format!("expected array or object, found {}", value_type_name(other)),
            )),
        }
    }

    /// Absolute timestamp given the record's base time
    ///
    /// Times outside `±MAX_TIMESTAMP_MS` are rejected so that any two event
    /// times can be subtracted without overflow.
    pub fn absolute_time(&self, index: usize, base_time: i64) -> Result<i64, AnalysisError> {
        let time = match self {
            WireRow::Compact { delta_ms, .. } => base_time.checked_add(*delta_ms),
            WireRow::Legacy { timestamp, .. } => Some(*timestamp),
        };
        time.filter(|t| t.abs() <= MAX_TIMESTAMP_MS).ok_or_else(|| {
            AnalysisError::malformed(index, "timestamp is outside the supported range")
        })
    }
}

fn parse_compact(index: usize, fields: &[Value]) -> Result<WireRow, AnalysisError> {
    if fields.len() != 4 {
        return Err(AnalysisError::malformed(
            index,
            format!("expected 4 fields, found {}", fields.len()),
        ));
    }

    let delta_ms = integer(&fields[0])
        .ok_or_else(|| AnalysisError::malformed(index, "delta_ms is not an integer"))?;
    let code = fields[1]
        .as_str()
        .ok_or_else(|| AnalysisError::malformed(index, "kind code is not a string"))?;
    let file = fields[2]
        .as_str()
        .ok_or_else(|| AnalysisError::malformed(index, "filename is not a string"))?;
    let char_count = char_count(index, &fields[3])?;

    Ok(WireRow::Compact {
        delta_ms,
        kind: EditKind::from_code(code),
        file: file.to_string(),
        char_count,
    })
}

fn parse_legacy(index: usize, value: &Value) -> Result<WireRow, AnalysisError> {
    let timestamp = match value.get("timestamp") {
        Some(v) => integer(v)
            .ok_or_else(|| AnalysisError::malformed(index, "timestamp is not an integer"))?,
        None => return Err(AnalysisError::malformed(index, "missing field `timestamp`")),
    };
    let kind = match value.get("type") {
        Some(v) => v
            .as_str()
            .map(EditKind::from_name)
            .ok_or_else(|| AnalysisError::malformed(index, "type is not a string"))?,
        None => return Err(AnalysisError::malformed(index, "missing field `type`")),
    };
    let file = match value.get("file") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => UNKNOWN_FILE.to_string(),
        Some(_) => return Err(AnalysisError::malformed(index, "file is not a string")),
    };
    let char_count = match value.get("char_count") {
        Some(Value::Null) | None => 0,
        Some(v) => char_count(index, v)?,
    };

    Ok(WireRow::Legacy {
        timestamp,
        kind,
        file,
        char_count,
    })
}

fn char_count(index: usize, value: &Value) -> Result<u64, AnalysisError> {
    match integer(value) {
        Some(n) if n >= 0 && n as u64 <= MAX_CHAR_COUNT => Ok(n as u64),
        Some(n) if n >= 0 => Err(AnalysisError::malformed(
            index,
            format!("char_count exceeds {MAX_CHAR_COUNT}, found {n}"),
        )),
        Some(n) => Err(AnalysisError::malformed(
            index,
            format!("char_count must be non-negative, found {n}"),
        )),
        None => Err(AnalysisError::malformed(index, "char_count is not an integer")),
    }
}

/// Accept JSON integers, and floats with no fractional part (JS clients emit `1000.0`)
fn integer(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    value
        .as_f64()
        .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| f as i64)
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
