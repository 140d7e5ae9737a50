//! Flag generation
//!
//! Turns feature scores, work patterns, and file risk into at most three
//! ranked, human-readable flags. Wording comes from the message catalogue.

use crate::messages::{MessageArg, MessageArgs, MessageRenderer};
use crate::types::{EventLog, FeatureScores, FileRisk, Flag, RiskLevel, Severity, WorkPatterns};
use std::collections::BTreeMap;

/// Maximum number of flags attached to one analysis
pub const MAX_FLAGS: usize = 3;

const CRITICAL: u8 = 10;
const FILE_CRITICAL: u8 = 9;
const WARNING: u8 = 5;

struct Candidate {
    priority: u8,
    severity: Severity,
    category: &'static str,
    key: &'static str,
    args: MessageArgs,
}

impl Candidate {
    fn new(priority: u8, severity: Severity, category: &'static str, key: &'static str) -> Self {
        Self {
            priority,
            severity,
            category,
            key,
            args: MessageArgs::new(),
        }
    }

    fn arg(mut self, name: &str, value: impl Into<MessageArg>) -> Self {
        self.args = self.args.with(name, value);
        self
    }
}

/// Everything the generator reads
#[derive(Debug, Clone, Copy)]
pub struct FlagInputs<'a> {
    pub log: &'a EventLog,
    pub features: &'a FeatureScores,
    pub patterns: &'a WorkPatterns,
    pub file_risks: &'a BTreeMap<String, FileRisk>,
}

pub struct FlagGenerator;

impl FlagGenerator {
    /// Rank candidate flags and keep the top [`MAX_FLAGS`]
    ///
    /// Ties keep their listed order. When nothing triggers, a single
    /// `Severity::None` assessment flag is returned.
    pub fn generate(inputs: FlagInputs<'_>, renderer: &dyn MessageRenderer) -> Vec<Flag> {
        let mut candidates = candidates(&inputs);
        tracing::debug!(candidates = candidates.len(), "flag candidates");

        if candidates.is_empty() {
            return vec![Flag {
                severity: Severity::None,
                category: "Assessment".to_string(),
                message: renderer.render_or_fallback("no_suspicious", &MessageArgs::new()),
            }];
        }

        candidates.sort_by(|a, b| b.priority.cmp(&a.priority));
        candidates
            .into_iter()
            .take(MAX_FLAGS)
            .map(|c| Flag {
                severity: c.severity,
                category: c.category.to_string(),
                message: renderer.render_or_fallback(c.key, &c.args),
            })
            .collect()
    }
}

fn candidates(inputs: &FlagInputs<'_>) -> Vec<Candidate> {
    let features = inputs.features;
    let patterns = inputs.patterns;
    let chars = patterns.total_chars_inserted;
    let mut out = Vec::new();

    if patterns.paste_percentage > 70.0 && chars > 500 {
        out.push(
            Candidate::new(CRITICAL, Severity::High, "Code Origin", "paste_percentage")
                .arg("paste_percentage", patterns.paste_percentage),
        );
    }
    if patterns.active_coding_minutes < 10.0 && chars > 500 {
        out.push(
            Candidate::new(CRITICAL, Severity::High, "Time Analysis", "completed_quickly")
                .arg("active_time", patterns.active_coding_minutes),
        );
    }
    if features.velocity.average_cpm > 150.0 {
        out.push(
            Candidate::new(CRITICAL, Severity::High, "Typing Speed", "high_typing_speed")
                .arg("average_cpm", features.velocity.average_cpm),
        );
    }

    if let Some((file, risk)) = first_high_risk_file(inputs) {
        out.push(
            Candidate::new(FILE_CRITICAL, Severity::High, "File Analysis", "file_risks")
                .arg("file", file)
                .arg("issues", risk.issues.join("; ")),
        );
    }

    if features.incremental_score < 4.0 {
        out.push(
            Candidate::new(WARNING, Severity::Medium, "Development Pattern", "chunks_appeared")
                .arg("incremental_score", features.incremental_score),
        );
    }
    if features.typing_variance < 3.0 {
        out.push(
            Candidate::new(WARNING, Severity::Medium, "Typing Behavior", "robotic_typing")
                .arg("typing_variance", features.typing_variance),
        );
    }
    if features.error_correction_ratio < 2.0 && chars > 200 {
        out.push(
            Candidate::new(WARNING, Severity::Medium, "Error Correction", "few_corrections")
                .arg("error_correction_ratio", features.error_correction_ratio),
        );
    }
    if features.session_consistency < 4.0 {
        out.push(
            Candidate::new(WARNING, Severity::Medium, "Work Sessions", "few_sessions")
                .arg("session_consistency", features.session_consistency),
        );
    }

    out
}

/// High-risk file that appears earliest in the log
fn first_high_risk_file<'a>(inputs: &FlagInputs<'a>) -> Option<(&'a str, &'a FileRisk)> {
    let FlagInputs { log, file_risks, .. } = *inputs;
    log.iter().find_map(|event| {
        file_risks
            .get(&event.file)
            .filter(|risk| risk.risk == RiskLevel::High)
            .map(|risk| (event.file.as_str(), risk))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Catalogue;
    use crate::types::{EditEvent, EditKind, VelocityReport};
    use pretty_assertions::assert_eq;

    fn healthy_features() -> FeatureScores {
        FeatureScores {
            incremental_score: 9.0,
            typing_variance: 7.0,
            error_correction_ratio: 8.0,
            paste_burst_count: 0,
            session_consistency: 8.0,
            velocity: VelocityReport {
                average_cpm: 60.0,
                max_cpm: 90.0,
                score: 10.0,
                suspicious_bursts: vec![],
            },
        }
    }

    fn healthy_patterns() -> WorkPatterns {
        WorkPatterns {
            total_duration_minutes: 90.0,
            active_coding_minutes: 60.0,
            total_chars_inserted: 1200,
            total_chars_deleted: 300,
            paste_percentage: 5.0,
            ..Default::default()
        }
    }

    fn risk(level: RiskLevel, issues: &[&str]) -> FileRisk {
        FileRisk {
            risk: level,
            issues: issues.iter().map(|s| s.to_string()).collect(),
            total_chars: 500,
            paste_count: 3,
            edit_ratio: 0.0,
            insert_count: 4,
            delete_count: 0,
        }
    }

    fn generate(
        log: &EventLog,
        features: &FeatureScores,
        patterns: &WorkPatterns,
        file_risks: &BTreeMap<String, FileRisk>,
    ) -> Vec<Flag> {
        FlagGenerator::generate(
            FlagInputs {
                log,
                features,
                patterns,
                file_risks,
            },
            &Catalogue,
        )
    }

    #[test]
    fn test_clean_work_gets_assessment_flag() {
        let flags = generate(
            &EventLog::default(),
            &healthy_features(),
            &healthy_patterns(),
            &BTreeMap::new(),
        );
        assert_eq!(
            flags,
            vec![Flag {
                severity: Severity::None,
                category: "Assessment".to_string(),
                message: "No suspicious patterns detected - work appears authentic".to_string(),
            }]
        );
    }

    #[test]
    fn test_critical_flags_rank_first_and_cap_at_three() {
        let mut features = healthy_features();
        features.incremental_score = 1.0;
        features.typing_variance = 0.5;
        features.velocity.average_cpm = 420.0;
        let patterns = WorkPatterns {
            active_coding_minutes: 3.5,
            total_chars_inserted: 2000,
            paste_percentage: 90.0,
            ..Default::default()
        };

        let flags = generate(&EventLog::default(), &features, &patterns, &BTreeMap::new());
        let categories: Vec<&str> = flags.iter().map(|f| f.category.as_str()).collect();
        assert_eq!(categories, vec!["Code Origin", "Time Analysis", "Typing Speed"]);
        assert!(flags.iter().all(|f| f.severity == Severity::High));
        assert_eq!(flags[0].message, "90% of code pasted in blocks rather than typed gradually");
        assert_eq!(flags[1].message, "Entire submission completed in 3.5 minutes");
        assert_eq!(flags[2].message, "420 chars/min typing speed (human: 40-80 chars/min)");
    }

    #[test]
    fn test_file_flag_outranks_warnings() {
        let mut features = healthy_features();
        features.session_consistency = 0.0;
        features.typing_variance = 2.0;

        let log = EventLog::new(vec![
            EditEvent::new(0, EditKind::Insert, "z_first.py", 500),
            EditEvent::new(1, EditKind::Insert, "a_second.py", 500),
        ]);
        let mut risks = BTreeMap::new();
        risks.insert("a_second.py".to_string(), risk(RiskLevel::High, &["other"]));
        risks.insert(
            "z_first.py".to_string(),
            risk(RiskLevel::High, &["3 large pastes (75%)", "entire file in 0.5 minutes"]),
        );

        let flags = generate(&log, &features, &healthy_patterns(), &risks);
        assert_eq!(flags.len(), 3);
        assert_eq!(flags[0].category, "File Analysis");
        assert_eq!(
            flags[0].message,
            "z_first.py: 3 large pastes (75%); entire file in 0.5 minutes"
        );
        assert_eq!(flags[1].category, "Typing Behavior");
        assert_eq!(flags[1].message, "Robotic typing patterns (variance: 2.0/10)");
        assert_eq!(flags[2].category, "Work Sessions");
        assert_eq!(flags[2].severity, Severity::Medium);
    }

    #[test]
    fn test_medium_risk_files_are_not_flagged() {
        let log = EventLog::new(vec![EditEvent::new(0, EditKind::Insert, "a.py", 5)]);
        let mut risks = BTreeMap::new();
        risks.insert("a.py".to_string(), risk(RiskLevel::Medium, &["2 large pastes"]));

        let flags = generate(&log, &healthy_features(), &healthy_patterns(), &risks);
        assert_eq!(flags[0].severity, Severity::None);
    }

    #[test]
    fn test_volume_gates() {
        let mut features = healthy_features();
        features.error_correction_ratio = 0.0;
        let patterns = WorkPatterns {
            active_coding_minutes: 1.0,
            total_chars_inserted: 150,
            paste_percentage: 100.0,
            ..Default::default()
        };

        // Too little code for the paste, time, or correction rules to apply
        let flags = generate(&EventLog::default(), &features, &patterns, &BTreeMap::new());
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].category, "Assessment");
    }

    #[test]
    fn test_generation_is_deterministic() {
        let mut features = healthy_features();
        features.incremental_score = 3.0;
        features.session_consistency = 3.0;
        let a = generate(&EventLog::default(), &features, &healthy_patterns(), &BTreeMap::new());
        let b = generate(&EventLog::default(), &features, &healthy_patterns(), &BTreeMap::new());
        assert_eq!(a, b);
        assert_eq!(a[0].message, "Code appeared in chunks (score: 3.0/10)");
    }
}
