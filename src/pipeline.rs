//! Analysis pipeline orchestration
//!
//! This module provides the public API for authorship analysis. It runs the
//! full pipeline from an uploaded wire record to an [`AnalysisResult`] or a
//! complete [`AuthenticityReport`].

use crate::encoder::ReportEncoder;
use crate::error::AnalysisError;
use crate::features::FeatureExtractor;
use crate::flags::{FlagGenerator, FlagInputs};
use crate::messages::{Catalogue, MessageRenderer};
use crate::normalizer::EventNormalizer;
use crate::patterns::WorkPatternSummarizer;
use crate::risk::FileRiskAnalyzer;
use crate::schema::{CompactRecord, WireAdapter};
use crate::scoring::ScoreAggregator;
use crate::types::{AnalysisResult, AuthenticityReport, EventLog};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Analyze one wire record (stateless, one-shot).
///
/// # Example
/// ```ignore
/// let result = analyze(&record)?;
/// println!("{}", result.overall_score);
/// ```
pub fn analyze(record: &CompactRecord) -> Result<AnalysisResult, AnalysisError> {
    // Stage 1: Normalize rows into absolute-time events
    let log = EventNormalizer::normalize(record)?;

    // Stages 2-5: Features, risk, patterns, flags, score
    Ok(analyze_log(&log))
}

/// Analyze a wire record given as JSON text
pub fn analyze_json(json: &str) -> Result<AnalysisResult, AnalysisError> {
    let record = WireAdapter::parse_record(json)?;
    analyze(&record)
}

/// Analyze an already normalized log with the built-in message catalogue
pub fn analyze_log(log: &EventLog) -> AnalysisResult {
    analyze_log_with(log, &Catalogue)
}

/// Analyze a normalized log, rendering text through `renderer`
pub fn analyze_log_with(log: &EventLog, renderer: &dyn MessageRenderer) -> AnalysisResult {
    let features = FeatureExtractor::extract(log);
    let file_risks = FileRiskAnalyzer::analyze(log, renderer);
    let patterns = WorkPatternSummarizer::summarize(log);

    // Flags and score depend on every stage above
    let flags = FlagGenerator::generate(
        FlagInputs {
            log,
            features: &features,
            patterns: &patterns,
            file_risks: &file_risks,
        },
        renderer,
    );
    let overall_score = ScoreAggregator::overall(&features);

    tracing::info!(
        events = log.len(),
        overall_score,
        flags = flags.len(),
        "analysis complete"
    );

    AnalysisResult {
        incremental_score: features.incremental_score,
        typing_variance: features.typing_variance,
        error_correction_ratio: features.error_correction_ratio,
        paste_burst_count: features.paste_burst_count,
        session_consistency: features.session_consistency,
        velocity_score: features.velocity.score,
        velocity: features.velocity,
        overall_score,
        file_risks,
        work_patterns: patterns,
        flags,
    }
}

/// Analyze on a worker thread, failing with [`AnalysisError::Timeout`]
/// if no result arrives within `deadline`.
///
/// A timed-out worker is abandoned, not cancelled; its result is discarded.
pub fn analyze_with_deadline(
    record: CompactRecord,
    deadline: Duration,
) -> Result<AnalysisResult, AnalysisError> {
    run_with_deadline(deadline, move || analyze(&record))
}

fn run_with_deadline<T, F>(deadline: Duration, job: F) -> Result<T, AnalysisError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AnalysisError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("typescope-analysis".to_string())
        .spawn(move || {
            // Receiver may be gone after a timeout
            let _ = tx.send(job());
        })
        .map_err(|e| AnalysisError::Worker(e.to_string()))?;

    match rx.recv_timeout(deadline) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            tracing::warn!(?deadline, "analysis deadline exceeded");
            Err(AnalysisError::Timeout(deadline))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(AnalysisError::Worker(
            "worker exited without a result".to_string(),
        )),
    }
}

/// Processor producing full authenticity reports.
///
/// Use this when reports should carry a stable producer instance ID or
/// when runs must be bounded by a wall-clock deadline.
#[derive(Debug, Clone, Default)]
pub struct AnalysisProcessor {
    encoder: ReportEncoder,
    deadline: Option<Duration>,
}

impl AnalysisProcessor {
    /// Create a new processor with a fresh instance ID and no deadline
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound every run by a wall-clock deadline
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Use a specific producer instance ID
    pub fn with_instance_id(mut self, instance_id: String) -> Self {
        self.encoder = ReportEncoder::with_instance_id(instance_id);
        self
    }

    pub fn instance_id(&self) -> &str {
        self.encoder.instance_id()
    }

    /// Process a wire record JSON and return report JSON
    pub fn process(&self, json: &str) -> Result<String, AnalysisError> {
        let record = WireAdapter::parse_record(json)?;
        let report = self.process_record(record)?;
        serde_json::to_string_pretty(&report).map_err(AnalysisError::encoding)
    }

    /// Process a record into a typed report
    pub fn process_record(&self, record: CompactRecord) -> Result<AuthenticityReport, AnalysisError> {
        let encoder = self.encoder.clone();
        let job = move || -> Result<AuthenticityReport, AnalysisError> {
            let log = EventNormalizer::normalize(&record)?;
            let analysis = analyze_log(&log);
            Ok(encoder.encode(&log, analysis, &Catalogue))
        };

        match self.deadline {
            Some(deadline) => run_with_deadline(deadline, job),
            None => job(),
        }
    }
}
