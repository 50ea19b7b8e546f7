//! Tool-sequence pattern mining
//!
//! Extraction runs per session, aggregation merges sessions into corpus-wide
//! occurrences, and ranking scores those occurrences into skill candidates.

pub mod aggregate;
pub mod extract;
pub mod keys;
pub mod rank;
pub mod scoring;

pub use aggregate::{PatternAggregator, PatternOccurrence};
pub use extract::{
    BashCategory, SessionPatterns, classify_bash_command, extract_ngrams,
    extract_session_patterns,
};
pub use keys::{
    ParsedPatternKey, PatternKind, generate_candidate_description, generate_candidate_name,
    parse_pattern_key,
};
pub use rank::{CandidateEvidence, RankedCandidate, RankingOptions, rank_candidates};
pub use scoring::{PatternScore, ScoreBreakdown, ScoringWeights, score_pattern};
