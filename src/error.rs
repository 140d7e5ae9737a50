//! Error types for typescope

use std::time::Duration;
use thiserror::Error;

/// Errors that abort an analysis run
///
/// A run either produces a complete `AnalysisResult` or one of these; partial
/// results are never returned.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Malformed event at index {index}: {reason}")]
    MalformedEvent { index: usize, reason: String },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse payload: {0}")]
    Parse(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Analysis exceeded deadline of {0:?}")]
    Timeout(Duration),

    #[error("Analysis worker failed: {0}")]
    Worker(String),
}

impl AnalysisError {
    pub(crate) fn malformed(index: usize, reason: impl Into<String>) -> Self {
        AnalysisError::MalformedEvent {
            index,
            reason: reason.into(),
        }
    }

    /// Output serialization failure, kept apart from input JSON errors
    pub(crate) fn encoding(err: serde_json::Error) -> Self {
        AnalysisError::Encoding(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_serialization_failure_is_encoding_error() {
        let unkeyable = BTreeMap::from([(vec![1u8], 1u8)]);
        let err = serde_json::to_string(&unkeyable)
            .map_err(AnalysisError::encoding)
            .unwrap_err();

        assert!(matches!(err, AnalysisError::Encoding(_)));
        assert!(err.to_string().starts_with("Encoding error:"));
    }
}
