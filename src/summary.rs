//! Descriptive summaries of an event log
//!
//! These views are not scored. They back the report envelope and the CLI
//! `summary` command: overall counts, per-session and per-file breakdowns,
//! and a 10-minute timeline narrative.

use crate::features::{is_large_paste, round1, session_count, split_sessions};
use crate::messages::{MessageArgs, MessageRenderer};
use crate::types::{
    EditEvent, EditKind, EventLog, EventSummary, FileRisk, FileSummary, TimelineEntry,
    WorkSessionSummary,
};
use std::collections::{BTreeMap, BTreeSet};

/// Timeline window length (ms)
pub const NARRATIVE_WINDOW_MS: i64 = 10 * 60 * 1_000;

/// Windows with more large pastes than this are marked suspicious
const SUSPICIOUS_WINDOW_PASTES: u32 = 2;

fn minutes(ms: i64) -> f64 {
    ms as f64 / 60_000.0
}

#[derive(Default)]
struct Tally {
    events: u32,
    inserts: u32,
    deletes: u32,
    saves: u32,
    chars_added: u64,
    chars_removed: u64,
    large_pastes: u32,
    large_paste_chars: u64,
}

impl Tally {
    fn of<'a>(events: impl IntoIterator<Item = &'a EditEvent>) -> Self {
        events.into_iter().fold(Tally::default(), |mut t, e| {
            t.events += 1;
            match e.kind {
                EditKind::Insert => {
                    t.inserts += 1;
                    t.chars_added += e.char_count;
                    if is_large_paste(e) {
                        t.large_pastes += 1;
                        t.large_paste_chars += e.char_count;
                    }
                }
                EditKind::Delete => {
                    t.deletes += 1;
                    t.chars_removed += e.char_count;
                }
                EditKind::Save => t.saves += 1,
            }
            t
        })
    }
}

fn sorted_files<'a>(events: impl IntoIterator<Item = &'a EditEvent>) -> Vec<String> {
    events
        .into_iter()
        .map(|e| e.file.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

pub struct ActivitySummarizer;

impl ActivitySummarizer {
    /// Overall counts for the log
    pub fn summarize(log: &EventLog) -> EventSummary {
        let tally = Tally::of(log.iter());
        let duration = match (log.first_timestamp(), log.last_timestamp()) {
            (Some(first), Some(last)) => round1(minutes(last - first)),
            _ => 0.0,
        };

        EventSummary {
            total_events: tally.events,
            duration_minutes: duration,
            files: sorted_files(log.iter()),
            activity_periods: session_count(log),
            insert_events: tally.inserts,
            delete_events: tally.deletes,
            save_events: tally.saves,
            large_paste_events: tally.large_pastes,
            chars_added: tally.chars_added,
            chars_removed: tally.chars_removed,
        }
    }

    /// One entry per work session, split the same way session scoring is
    pub fn sessions(log: &EventLog) -> Vec<WorkSessionSummary> {
        let Some(origin) = log.first_timestamp() else {
            return Vec::new();
        };

        split_sessions(log)
            .into_iter()
            .filter_map(|session| {
                let (first, last) = (session.first()?, session.last()?);
                let tally = Tally::of(session);
                let average = if tally.inserts > 0 {
                    round1(tally.chars_added as f64 / f64::from(tally.inserts))
                } else {
                    0.0
                };

                Some(WorkSessionSummary {
                    start_offset_minutes: round1(minutes(first.timestamp_ms - origin)),
                    duration_minutes: round1(minutes(last.timestamp_ms - first.timestamp_ms)),
                    event_count: tally.events,
                    chars_added: tally.chars_added,
                    chars_removed: tally.chars_removed,
                    files: sorted_files(session),
                    large_paste_count: tally.large_pastes,
                    average_chars_per_insert: average,
                })
            })
            .collect()
    }

    /// Per-file counts and development time, joined with each file's risk
    ///
    /// Development time runs from the file's first to its last event in log
    /// order.
    pub fn files(
        log: &EventLog,
        risks: &BTreeMap<String, FileRisk>,
    ) -> BTreeMap<String, FileSummary> {
        let mut by_file: BTreeMap<&str, Vec<&EditEvent>> = BTreeMap::new();
        for event in log.iter() {
            by_file.entry(event.file.as_str()).or_default().push(event);
        }

        by_file
            .into_iter()
            .map(|(file, events)| {
                let tally = Tally::of(events.iter().copied());
                let development = match (events.first(), events.last()) {
                    (Some(first), Some(last)) => {
                        round1(minutes(last.timestamp_ms - first.timestamp_ms))
                    }
                    _ => 0.0,
                };
                let risk = risks.get(file);

                let summary = FileSummary {
                    total_events: tally.events,
                    chars_added: tally.chars_added,
                    chars_removed: tally.chars_removed,
                    save_count: tally.saves,
                    development_time_minutes: development,
                    risk: risk.map(|r| r.risk),
                    issues: risk.map(|r| r.issues.clone()).unwrap_or_default(),
                    edit_ratio: risk.map_or(0.0, |r| r.edit_ratio),
                    paste_count: risk.map_or(0, |r| r.paste_count),
                };
                (file.to_string(), summary)
            })
            .collect()
    }

    /// Non-empty 10-minute windows starting at the first event
    ///
    /// Windows cover `[first, last)`, so a log whose events share one
    /// timestamp has no timeline.
    pub fn timeline(log: &EventLog, renderer: &dyn MessageRenderer) -> Vec<TimelineEntry> {
        let (Some(first), Some(last)) = (log.first_timestamp(), log.last_timestamp()) else {
            return Vec::new();
        };
        let span = last - first;
        if span <= 0 {
            return Vec::new();
        }
        let window_count = (span + NARRATIVE_WINDOW_MS - 1) / NARRATIVE_WINDOW_MS;

        let mut windows: BTreeMap<i64, Vec<&EditEvent>> = BTreeMap::new();
        for event in log.iter() {
            let offset = event.timestamp_ms - first;
            if offset < 0 {
                continue;
            }
            let index = offset / NARRATIVE_WINDOW_MS;
            if index < window_count {
                windows.entry(index).or_default().push(event);
            }
        }

        windows
            .into_iter()
            .map(|(index, events)| {
                let elapsed = minutes(index * NARRATIVE_WINDOW_MS);
                let tally = Tally::of(events.iter().copied());
                let files = sorted_files(events.iter().copied());

                let args = MessageArgs::new()
                    .with("elapsed", elapsed)
                    .with("chars_added", tally.chars_added)
                    .with("deletions", tally.deletes)
                    .with("files", files.join(", "));
                let description = if tally.large_pastes > 0 {
                    renderer.render_or_fallback(
                        "timeline_window_pastes",
                        &args
                            .with("paste_count", tally.large_pastes)
                            .with("paste_chars", tally.large_paste_chars),
                    )
                } else {
                    renderer.render_or_fallback("timeline_window", &args)
                };

                TimelineEntry {
                    time_offset_minutes: round1(elapsed),
                    event_count: tally.events,
                    chars_added: tally.chars_added,
                    deletions: tally.deletes,
                    large_paste_count: tally.large_pastes,
                    large_paste_chars: tally.large_paste_chars,
                    files,
                    suspicious: tally.large_pastes > SUSPICIOUS_WINDOW_PASTES,
                    description,
                }
            })
            .collect()
    }
}
