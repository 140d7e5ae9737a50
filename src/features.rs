//! Feature extraction
//!
//! Six independent scores computed from a normalized [`EventLog`]. Every
//! function is pure and defines its own neutral value for degenerate input
//! (no inserts, zero denominators, too few events).

use crate::types::{EditEvent, EventLog, FeatureScores, SuspiciousBurst, VelocityReport};
use std::collections::BTreeMap;

/// Inserts strictly larger than this many characters count as large pastes
pub const LARGE_PASTE_CHARS: u64 = 100;

/// Consecutive large pastes closer than this (ms) form a burst
pub const PASTE_BURST_GAP_MS: i64 = 2_000;

/// Gaps longer than this (ms) start a new work session (5 minutes)
pub const SESSION_GAP_MS: i64 = 5 * 60 * 1_000;

/// Velocity window length (ms)
pub const VELOCITY_WINDOW_MS: i64 = 30_000;

/// Windows above this many chars/minute are reported as suspicious bursts
pub const BURST_CPM: u64 = 200;

/// Delete:insert ratio treated as fully human
const FULL_CORRECTION_RATIO: f64 = 0.3;

/// Feature extractor for edit logs
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Compute all six feature scores
    pub fn extract(log: &EventLog) -> FeatureScores {
        let scores = FeatureScores {
            incremental_score: incremental_score(log),
            typing_variance: typing_variance(log),
            error_correction_ratio: error_correction_ratio(log),
            paste_burst_count: paste_burst_count(log),
            session_consistency: session_consistency(log),
            velocity: velocity_analysis(log),
        };

        tracing::debug!(
            incremental = scores.incremental_score,
            variance = scores.typing_variance,
            correction = scores.error_correction_ratio,
            bursts = scores.paste_burst_count,
            sessions = scores.session_consistency,
            velocity = scores.velocity.score,
            "extracted features"
        );
        scores
    }
}

/// Whether an event is an insert above the large-paste threshold
pub fn is_large_paste(event: &EditEvent) -> bool {
    event.is_insert() && event.char_count > LARGE_PASTE_CHARS
}

/// Round to one decimal place (half away from zero)
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Incremental development score (0-10)
///
/// Share of inserted characters that did *not* arrive in large pastes.
/// Character volume is used, so one huge paste dominates.
pub fn incremental_score(log: &EventLog) -> f64 {
    let (total, large) = log.inserts().fold((0u64, 0u64), |(total, large), e| {
        let pasted = if is_large_paste(e) { e.char_count } else { 0 };
        (total + e.char_count, large + pasted)
    });

    if total == 0 {
        return 0.0;
    }

    round1((1.0 - large as f64 / total as f64) * 10.0)
}

/// Typing rhythm variance score (0-10)
///
/// Coefficient of variation of the gaps between non-empty inserts. Regular
/// rhythm scores near zero, even when slow.
pub fn typing_variance(log: &EventLog) -> f64 {
    let times: Vec<i64> = log
        .inserts()
        .filter(|e| e.char_count > 0)
        .map(|e| e.timestamp_ms)
        .collect();

    if times.len() < 2 {
        return 0.0;
    }

    let gaps: Vec<f64> = times
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|gap| *gap > 0)
        .map(|gap| gap as f64)
        .collect();

    if gaps.len() < 2 {
        return 0.0;
    }

    let n = gaps.len() as f64;
    let mean = gaps.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return 0.0;
    }

    let variance = gaps.iter().map(|g| (g - mean).powi(2)).sum::<f64>() / n;
    let cv = variance.sqrt() / mean;

    round1((cv / 2.0).min(1.0) * 10.0)
}

/// Error correction score (0-10)
///
/// Delete events per insert event, saturating at a 0.3 ratio.
pub fn error_correction_ratio(log: &EventLog) -> f64 {
    let inserts = log.inserts().count();
    if inserts == 0 {
        return 0.0;
    }

    let ratio = log.deletes().count() as f64 / inserts as f64;
    round1((ratio / FULL_CORRECTION_RATIO).min(1.0) * 10.0)
}

/// Number of large pastes arriving within the burst gap of the previous one
///
/// The carry holds the previous qualifying paste time; the first paste has
/// nothing to compare against and never counts.
pub fn paste_burst_count(log: &EventLog) -> u32 {
    let (bursts, _) = log
        .inserts()
        .filter(|e| is_large_paste(e))
        .fold((0u32, None::<i64>), |(bursts, previous), e| {
            let rapid = previous.is_some_and(|prev| e.timestamp_ms - prev < PASTE_BURST_GAP_MS);
            (bursts + u32::from(rapid), Some(e.timestamp_ms))
        });
    bursts
}

/// Windowed typing-speed analysis
///
/// Windows are anchored at the first event and cover `[first, last)`. Only
/// windows with inserted characters contribute to the average.
pub fn velocity_analysis(log: &EventLog) -> VelocityReport {
    let (Some(start), Some(end)) = (log.first_timestamp(), log.last_timestamp()) else {
        return VelocityReport::default();
    };
    if log.len() < 2 || log.inserts().next().is_none() {
        return VelocityReport::default();
    }

    let window_count = if end > start {
        (end - start + VELOCITY_WINDOW_MS - 1) / VELOCITY_WINDOW_MS
    } else {
        0
    };

    let mut windows: BTreeMap<i64, u64> = BTreeMap::new();
    for event in log.inserts() {
        let offset = event.timestamp_ms - start;
        if offset < 0 {
            continue;
        }
        let index = offset / VELOCITY_WINDOW_MS;
        if index < window_count {
            *windows.entry(index).or_insert(0) += event.char_count;
        }
    }

    let mut velocities = Vec::new();
    let mut suspicious_bursts = Vec::new();
    for (index, chars) in windows {
        if chars == 0 {
            continue;
        }
        // 30-second window, doubled to per-minute
        let cpm = chars * 2;
        velocities.push(cpm);
        if cpm > BURST_CPM {
            suspicious_bursts.push(SuspiciousBurst {
                time_offset: (index * VELOCITY_WINDOW_MS) as f64 / 60_000.0,
                cpm,
                chars,
            });
        }
    }

    let (average_cpm, max_cpm) = if velocities.is_empty() {
        (0.0, 0.0)
    } else {
        let sum: u64 = velocities.iter().sum();
        let max = velocities.iter().copied().max().unwrap_or(0);
        (round1(sum as f64 / velocities.len() as f64), max as f64)
    };

    VelocityReport {
        average_cpm,
        max_cpm,
        score: velocity_score(average_cpm),
        suspicious_bursts,
    }
}

/// Piecewise mapping from average chars/minute to a 0-10 score
///
/// The 150-200 band bottoms out at 1.0 before the cliff to 0.0 above 200.
pub fn velocity_score(cpm: f64) -> f64 {
    let score = if cpm <= 80.0 {
        10.0
    } else if cpm <= 150.0 {
        10.0 - (cpm - 80.0) / 70.0 * 5.0
    } else if cpm <= 200.0 {
        5.0 - (cpm - 150.0) / 50.0 * 4.0
    } else {
        0.0
    };
    round1(score)
}

/// Split the log into work sessions at gaps longer than [`SESSION_GAP_MS`]
pub fn split_sessions(log: &EventLog) -> Vec<&[EditEvent]> {
    let events = log.events();
    let Some(first) = events.first() else {
        return Vec::new();
    };

    let (mut starts, _) = events.iter().enumerate().skip(1).fold(
        (vec![0usize], first.timestamp_ms),
        |(mut starts, last), (index, e)| {
            if e.timestamp_ms - last > SESSION_GAP_MS {
                starts.push(index);
            }
            (starts, e.timestamp_ms)
        },
    );
    starts.push(events.len());

    starts.windows(2).map(|w| &events[w[0]..w[1]]).collect()
}

/// Number of work sessions in the log (0 when empty)
pub fn session_count(log: &EventLog) -> u32 {
    split_sessions(log).len() as u32
}

/// Work session score (0-10), a fixed lookup on the session count
pub fn session_consistency(log: &EventLog) -> f64 {
    match session_count(log) {
        0 | 1 => 0.0,
        2 => 3.0,
        3 => 6.0,
        4 => 8.0,
        _ => 10.0,
    }
}
