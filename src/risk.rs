//! Per-file risk analysis

use crate::features::is_large_paste;
use crate::messages::{MessageArgs, MessageRenderer};
use crate::types::{EditEvent, EditKind, EventLog, FileRisk, RiskLevel};
use std::collections::BTreeMap;

/// Share of large-paste inserts above which a file is high risk
pub const HIGH_PASTE_RATIO: f64 = 0.5;

/// Share of large-paste inserts above which a file is medium risk
pub const MEDIUM_PASTE_RATIO: f64 = 0.3;

/// Deletes per insert below which a file has suspiciously few edits
pub const LOW_EDIT_RATIO: f64 = 0.05;

/// Minimum inserts before the low-edit rule applies
const LOW_EDIT_MIN_INSERTS: usize = 10;

/// Files written faster than this (minutes) are suspicious...
const QUICK_FILE_MINUTES: f64 = 2.0;

/// ...when they hold more than this many inserted characters
const QUICK_FILE_CHARS: u64 = 200;

#[derive(Default)]
struct FileTally<'a> {
    inserts: Vec<&'a EditEvent>,
    deletes: usize,
    total_chars: u64,
}

/// Classifies each edited file as low, medium, or high risk
pub struct FileRiskAnalyzer;

impl FileRiskAnalyzer {
    /// Assess every file that received at least one insert
    pub fn analyze(log: &EventLog, renderer: &dyn MessageRenderer) -> BTreeMap<String, FileRisk> {
        let mut tallies: BTreeMap<&str, FileTally<'_>> = BTreeMap::new();
        for event in log.iter() {
            let tally = tallies.entry(event.file.as_str()).or_default();
            match event.kind {
                EditKind::Insert => {
                    tally.inserts.push(event);
                    tally.total_chars += event.char_count;
                }
                EditKind::Delete => tally.deletes += 1,
                EditKind::Save => {}
            }
        }

        let risks: BTreeMap<String, FileRisk> = tallies
            .into_iter()
            .filter(|(_, tally)| !tally.inserts.is_empty())
            .map(|(file, tally)| (file.to_string(), assess(&tally, renderer)))
            .collect();

        tracing::debug!(
            files = risks.len(),
            high = risks.values().filter(|r| r.risk == RiskLevel::High).count(),
            "assessed file risk"
        );
        risks
    }
}

fn assess(tally: &FileTally<'_>, renderer: &dyn MessageRenderer) -> FileRisk {
    let insert_count = tally.inserts.len();
    let paste_count = tally.inserts.iter().filter(|e| is_large_paste(e)).count();
    let paste_ratio = paste_count as f64 / insert_count as f64;
    let edit_ratio = tally.deletes as f64 / insert_count as f64;

    let mut risk = RiskLevel::Low;
    let mut issues = Vec::new();

    if paste_ratio > HIGH_PASTE_RATIO {
        risk = RiskLevel::High;
        issues.push(renderer.render_or_fallback(
            "large_pastes_count_ratio",
            &MessageArgs::new()
                .with("count", paste_count as u64)
                .with("ratio", paste_ratio * 100.0),
        ));
    } else if paste_ratio > MEDIUM_PASTE_RATIO {
        risk = RiskLevel::Medium;
        issues.push(renderer.render_or_fallback(
            "large_pastes_count",
            &MessageArgs::new().with("count", paste_count as u64),
        ));
    }

    if edit_ratio < LOW_EDIT_RATIO && insert_count > LOW_EDIT_MIN_INSERTS {
        risk = risk.escalate();
        issues.push(renderer.render_or_fallback(
            "very_few_edits",
            &MessageArgs::new().with("edit_ratio", edit_ratio * 100.0),
        ));
    }

    // First and last insert in log order; unsorted input can go negative
    let duration_minutes = match (tally.inserts.first(), tally.inserts.last()) {
        (Some(first), Some(last)) => (last.timestamp_ms - first.timestamp_ms) as f64 / 60_000.0,
        _ => 0.0,
    };
    if duration_minutes < QUICK_FILE_MINUTES && tally.total_chars > QUICK_FILE_CHARS {
        risk = RiskLevel::High;
        issues.push(renderer.render_or_fallback(
            "entire_file_quick",
            &MessageArgs::new().with("duration", duration_minutes),
        ));
    }

    FileRisk {
        risk,
        issues,
        total_chars: tally.total_chars,
        paste_count: paste_count as u32,
        edit_ratio: (edit_ratio * 1000.0).round() / 1000.0,
        insert_count: insert_count as u32,
        delete_count: tally.deletes as u32,
    }
}
