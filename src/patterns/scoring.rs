//! Four-factor relevance scoring for mined patterns.
//!
//! Implements a weighted sum of frequency, cross-project spread, recency and
//! consistency. Every factor, and the final score, lies in `[0, 1]`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MineError, Result};

use super::aggregate::PatternOccurrence;

/// Days for the recency factor to halve.
pub const RECENCY_HALF_LIFE_DAYS: f64 = 14.0;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Weights for the scoring factors. They must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Weight for raw occurrence count (default: 0.30).
    pub frequency: f64,
    /// Weight for the share of projects using the pattern (default: 0.30).
    pub cross_project: f64,
    /// Weight for how recently the pattern was seen (default: 0.20).
    pub recency: f64,
    /// Weight for the share of sessions using the pattern (default: 0.20).
    pub consistency: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            frequency: 0.30,
            cross_project: 0.30,
            recency: 0.20,
            consistency: 0.20,
        }
    }
}

impl ScoringWeights {
    pub const fn new(frequency: f64, cross_project: f64, recency: f64, consistency: f64) -> Self {
        Self {
            frequency,
            cross_project,
            recency,
            consistency,
        }
    }

    /// Reject negative or non-finite weights and sums other than 1.0.
    pub fn validate(&self) -> Result<()> {
        let parts = [
            ("frequency", self.frequency),
            ("cross_project", self.cross_project),
            ("recency", self.recency),
            ("consistency", self.consistency),
        ];
        for (name, value) in parts {
            if !value.is_finite() || value < 0.0 {
                return Err(MineError::InvalidWeights(format!(
                    "{name} weight must be a non-negative number, got {value}"
                )));
            }
        }
        let sum: f64 = parts.iter().map(|(_, value)| value).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(MineError::InvalidWeights(format!(
                "weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}

/// Individual factor values before weighting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub frequency: f64,
    pub cross_project: f64,
    pub recency: f64,
    pub consistency: f64,
}

/// Final score together with the factors that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternScore {
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    /// Most recent contributing session timestamp, if any session had one.
    pub last_seen: Option<DateTime<Utc>>,
}

/// `log2(count + 1) / 10`, clamped to `[0, 1]`.
pub fn frequency_score(total_count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let count = total_count as f64;
    ((count + 1.0).log2() / 10.0).clamp(0.0, 1.0)
}

/// Exponential decay with a 14-day half-life. `None` scores 0; future
/// timestamps count as zero days old.
pub fn recency_score(last_seen: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(last_seen) = last_seen else {
        return 0.0;
    };
    #[allow(clippy::cast_precision_loss)]
    let days = ((now - last_seen).num_seconds().max(0) as f64) / 86_400.0;
    (-std::f64::consts::LN_2 * days / RECENCY_HALF_LIFE_DAYS)
        .exp()
        .clamp(0.0, 1.0)
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let value = part as f64 / whole as f64;
    value.clamp(0.0, 1.0)
}

/// Score one occurrence.
///
/// `session_timestamps` maps session id to its latest timestamp; only the
/// sessions in `occurrence.session_ids` are considered for recency.
///
/// # Errors
///
/// Returns [`MineError::InvalidWeights`] when `weights` fail validation.
pub fn score_pattern(
    occurrence: &PatternOccurrence,
    total_projects: usize,
    total_sessions: usize,
    session_timestamps: &HashMap<String, DateTime<Utc>>,
    now: DateTime<Utc>,
    weights: Option<&ScoringWeights>,
) -> Result<PatternScore> {
    let weights = weights.copied().unwrap_or_default();
    weights.validate()?;

    let last_seen = occurrence
        .session_ids
        .iter()
        .filter_map(|id| session_timestamps.get(id))
        .max()
        .copied();

    let breakdown = ScoreBreakdown {
        frequency: frequency_score(occurrence.total_count),
        cross_project: ratio(occurrence.project_count, total_projects),
        recency: recency_score(last_seen, now),
        consistency: ratio(occurrence.session_count, total_sessions),
    };

    let score = weights.frequency.mul_add(
        breakdown.frequency,
        weights.cross_project.mul_add(
            breakdown.cross_project,
            weights
                .recency
                .mul_add(breakdown.recency, weights.consistency * breakdown.consistency),
        ),
    );

    Ok(PatternScore {
        score: score.clamp(0.0, 1.0),
        breakdown,
        last_seen,
    })
}
