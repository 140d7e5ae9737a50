//! Composite authenticity score

use crate::features::round1;
use crate::types::FeatureScores;

const INCREMENTAL_WEIGHT: f64 = 0.25;
const VARIANCE_WEIGHT: f64 = 0.20;
const CORRECTION_WEIGHT: f64 = 0.20;
const SESSION_WEIGHT: f64 = 0.20;
const VELOCITY_WEIGHT: f64 = 0.15;

/// Any critical metric at or below this caps the score at [`CRITICAL_CAP`]
const CRITICAL_FLOOR: f64 = 2.0;
const CRITICAL_CAP: f64 = 3.0;

/// Average speed above which the score is capped at [`EXTREME_SPEED_CAP`]
const EXTREME_SPEED_CPM: f64 = 500.0;
const EXTREME_SPEED_CAP: f64 = 1.0;

pub struct ScoreAggregator;

impl ScoreAggregator {
    /// Weighted score with penalties applied in a fixed order
    ///
    /// Multiplicative penalties compound. The result is clamped to be
    /// non-negative and rounded to one decimal.
    pub fn overall(features: &FeatureScores) -> f64 {
        let velocity = &features.velocity;

        let mut score = features.incremental_score * INCREMENTAL_WEIGHT
            + features.typing_variance * VARIANCE_WEIGHT
            + features.error_correction_ratio * CORRECTION_WEIGHT
            + features.session_consistency * SESSION_WEIGHT
            + velocity.score * VELOCITY_WEIGHT;

        if features.incremental_score <= CRITICAL_FLOOR
            || features.typing_variance <= CRITICAL_FLOOR
            || velocity.score <= CRITICAL_FLOOR
        {
            score = score.min(CRITICAL_CAP);
        }

        if velocity.average_cpm > EXTREME_SPEED_CPM {
            score = score.min(EXTREME_SPEED_CAP);
        }

        score *= match features.paste_burst_count {
            n if n > 5 => 0.3,
            n if n > 2 => 0.6,
            _ => 1.0,
        };

        if features.session_consistency <= 1.0 {
            score *= 0.7;
        }

        round1(score.max(0.0))
    }
}
