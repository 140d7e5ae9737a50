//! Work-pattern summary used as context for flag generation

use crate::features::{is_large_paste, round1};
use crate::types::{EventLog, WorkPatterns};

/// Gaps longer than this (ms) count as breaks (10 minutes)
pub const BREAK_GAP_MS: i64 = 10 * 60 * 1_000;

pub struct WorkPatternSummarizer;

impl WorkPatternSummarizer {
    /// Summarize duration, breaks, and paste share. An empty log yields zeros.
    pub fn summarize(log: &EventLog) -> WorkPatterns {
        let (Some(first), Some(last)) = (log.first_timestamp(), log.last_timestamp()) else {
            return WorkPatterns::default();
        };

        let total_duration = (last - first) as f64 / 60_000.0;

        let breaks: Vec<f64> = log
            .events()
            .windows(2)
            .map(|pair| pair[1].timestamp_ms - pair[0].timestamp_ms)
            .filter(|gap| *gap > BREAK_GAP_MS)
            .map(|gap| gap as f64 / 60_000.0)
            .collect();
        let active = total_duration - breaks.iter().sum::<f64>();

        let (inserted, pasted, large_pastes) =
            log.inserts()
                .fold((0u64, 0u64, 0u32), |(inserted, pasted, count), e| {
                    if is_large_paste(e) {
                        (inserted + e.char_count, pasted + e.char_count, count + 1)
                    } else {
                        (inserted + e.char_count, pasted, count)
                    }
                });
        let deleted: u64 = log.deletes().map(|e| e.char_count).sum();

        let paste_percentage = if inserted > 0 {
            pasted as f64 / inserted as f64 * 100.0
        } else {
            0.0
        };

        WorkPatterns {
            total_duration_minutes: round1(total_duration),
            active_coding_minutes: round1(active),
            breaks_count: breaks.len() as u32,
            breaks,
            total_chars_inserted: inserted,
            total_chars_deleted: deleted,
            paste_percentage: round1(paste_percentage),
            large_pastes_count: large_pastes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EditEvent, EditKind};
    use pretty_assertions::assert_eq;

    fn ev(t: i64, kind: EditKind, chars: u64) -> EditEvent {
        EditEvent::new(t, kind, "main.py", chars)
    }

    #[test]
    fn test_empty_log() {
        assert_eq!(WorkPatternSummarizer::summarize(&EventLog::default()), WorkPatterns::default());
    }

    #[test]
    fn test_breaks_reduce_active_time() {
        let log = EventLog::new(vec![
            ev(0, EditKind::Insert, 10),
            ev(5 * 60_000, EditKind::Insert, 10),
            ev(20 * 60_000, EditKind::Delete, 4),
            ev(22 * 60_000, EditKind::Save, 0),
        ]);
        let patterns = WorkPatternSummarizer::summarize(&log);

        assert_eq!(patterns.total_duration_minutes, 22.0);
        assert_eq!(patterns.breaks, vec![15.0]);
        assert_eq!(patterns.breaks_count, 1);
        assert_eq!(patterns.active_coding_minutes, 7.0);
        assert_eq!(patterns.total_chars_inserted, 20);
        assert_eq!(patterns.total_chars_deleted, 4);
    }

    #[test]
    fn test_duration_uses_absolute_times() {
        // Log starting well after the epoch still measures first-to-last
        let log = EventLog::new(vec![
            ev(1_700_000_000_000, EditKind::Insert, 1),
            ev(1_700_000_090_000, EditKind::Insert, 1),
        ]);
        assert_eq!(WorkPatternSummarizer::summarize(&log).total_duration_minutes, 1.5);
    }

    #[test]
    fn test_paste_percentage_by_volume() {
        let log = EventLog::new(vec![
            ev(0, EditKind::Insert, 300),
            ev(1_000, EditKind::Insert, 50),
            ev(2_000, EditKind::Insert, 50),
        ]);
        let patterns = WorkPatternSummarizer::summarize(&log);
        assert_eq!(patterns.paste_percentage, 75.0);
        assert_eq!(patterns.large_pastes_count, 1);
    }

    #[test]
    fn test_no_inserts_means_no_paste_percentage() {
        let log = EventLog::new(vec![ev(0, EditKind::Delete, 5), ev(1, EditKind::Save, 0)]);
        let patterns = WorkPatternSummarizer::summarize(&log);
        assert_eq!(patterns.paste_percentage, 0.0);
        assert_eq!(patterns.total_chars_inserted, 0);
    }
}
