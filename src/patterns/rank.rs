//! Turn aggregated occurrences into ranked skill candidates.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

use super::aggregate::PatternAggregator;
use super::keys::{
    PatternKind, generate_candidate_description, generate_candidate_name, parse_pattern_key,
};
use super::scoring::{ScoreBreakdown, ScoringWeights, score_pattern};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingOptions {
    /// Occurrences with a lower `total_count` are not candidates.
    pub min_occurrences: usize,
    /// Maximum candidates returned.
    pub limit: usize,
    pub weights: ScoringWeights,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            min_occurrences: 2,
            limit: 20,
            weights: ScoringWeights::default(),
        }
    }
}

/// Where and when a pattern was observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateEvidence {
    pub projects: Vec<String>,
    pub sessions: Vec<String>,
    pub occurrence_count: usize,
    pub examples: Vec<String>,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: PatternKind,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    pub evidence: CandidateEvidence,
    pub name: String,
    pub description: String,
}

/// Score and rank every occurrence meeting `options.min_occurrences`.
///
/// Sorted by score descending, ties broken by key, truncated to
/// `options.limit`.
///
/// # Errors
///
/// Fails on invalid weights or a malformed key in the aggregator.
pub fn rank_candidates(
    aggregator: &PatternAggregator,
    now: DateTime<Utc>,
    options: &RankingOptions,
) -> Result<Vec<RankedCandidate>> {
    options.weights.validate()?;

    let timestamps = aggregator.session_timestamps();
    let mut candidates = Vec::new();

    for (key, occurrence) in aggregator.occurrences() {
        if occurrence.total_count < options.min_occurrences {
            continue;
        }
        let parsed = parse_pattern_key(key)?;
        let scored = score_pattern(
            occurrence,
            aggregator.total_projects(),
            aggregator.total_sessions(),
            timestamps,
            now,
            Some(&options.weights),
        )?;
        let first_seen = occurrence
            .session_ids
            .iter()
            .filter_map(|id| timestamps.get(id))
            .min()
            .copied();

        candidates.push(RankedCandidate {
            key: key.clone(),
            label: parsed.label(),
            kind: parsed.kind,
            score: scored.score,
            breakdown: scored.breakdown,
            evidence: CandidateEvidence {
                projects: occurrence.project_slugs.iter().cloned().collect(),
                sessions: occurrence.session_ids.iter().cloned().collect(),
                occurrence_count: occurrence.total_count,
                examples: aggregator.examples_for(key),
                first_seen,
                last_seen: scored.last_seen,
            },
            name: generate_candidate_name(&parsed),
            description: generate_candidate_description(&parsed),
        });
    }

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
    });
    candidates.truncate(options.limit);

    debug!(
        occurrences = aggregator.occurrences().len(),
        candidates = candidates.len(),
        "ranked pattern candidates"
    );
    Ok(candidates)
}
