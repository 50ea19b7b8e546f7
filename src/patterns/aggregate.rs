//! Corpus-wide pattern aggregation
//!
//! Merging is commutative and associative: feeding the same set of
//! [`SessionPatterns`] in any order yields identical occurrences. All sets are
//! ordered so evidence output is stable.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::extract::{MAX_EXAMPLES, SessionPatterns};
use super::keys::{bash_key, ngram_key};

/// Statistics for one canonical pattern key across the corpus.
///
/// `session_count == session_ids.len()`, `project_count ==
/// project_slugs.len()` and `total_count == per_session_counts.values().sum()`
/// hold after every merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternOccurrence {
    pub total_count: usize,
    pub session_count: usize,
    pub project_count: usize,
    pub session_ids: BTreeSet<String>,
    pub project_slugs: BTreeSet<String>,
    pub per_session_counts: BTreeMap<String, usize>,
}

impl PatternOccurrence {
    fn record(&mut self, session_id: &str, project_slug: &str, count: usize) {
        self.total_count += count;
        *self
            .per_session_counts
            .entry(session_id.to_string())
            .or_insert(0) += count;
        self.session_ids.insert(session_id.to_string());
        self.project_slugs.insert(project_slug.to_string());
        self.session_count = self.session_ids.len();
        self.project_count = self.project_slugs.len();
    }
}

/// Accumulates [`SessionPatterns`] into [`PatternOccurrence`]s.
#[derive(Debug, Default)]
pub struct PatternAggregator {
    occurrences: HashMap<String, PatternOccurrence>,
    sessions: BTreeSet<String>,
    projects: BTreeSet<String>,
    session_timestamps: HashMap<String, DateTime<Utc>>,
    examples: HashMap<String, BTreeSet<String>>,
}

impl PatternAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one session's tallies. The session is counted as observed even
    /// when it contributed no patterns.
    pub fn add_session_patterns(&mut self, patterns: SessionPatterns) {
        let SessionPatterns {
            session_id,
            project_slug,
            tool_bigrams,
            tool_trigrams,
            bash_patterns,
            examples,
            timestamp,
        } = patterns;

        self.sessions.insert(session_id.clone());
        self.projects.insert(project_slug.clone());
        if let Some(ts) = timestamp {
            self.session_timestamps
                .entry(session_id.clone())
                .and_modify(|existing| *existing = (*existing).max(ts))
                .or_insert(ts);
        }

        let ngrams = tool_bigrams.into_iter().chain(tool_trigrams);
        for (tools, count) in ngrams {
            if let Some(key) = ngram_key(&tools) {
                self.record(key, &session_id, &project_slug, count);
            }
        }
        for (category, count) in bash_patterns {
            self.record(bash_key(category), &session_id, &project_slug, count);
        }

        for (key, found) in examples {
            let slot = self.examples.entry(key).or_default();
            slot.extend(found);
            // Keep the smallest few so the result ignores arrival order.
            while slot.len() > MAX_EXAMPLES {
                slot.pop_last();
            }
        }

        trace!(session = %session_id, keys = self.occurrences.len(), "merged session patterns");
    }

    fn record(&mut self, key: String, session_id: &str, project_slug: &str, count: usize) {
        if count == 0 {
            return;
        }
        self.occurrences
            .entry(key)
            .or_default()
            .record(session_id, project_slug, count);
    }

    pub fn occurrences(&self) -> &HashMap<String, PatternOccurrence> {
        &self.occurrences
    }

    pub fn get(&self, key: &str) -> Option<&PatternOccurrence> {
        self.occurrences.get(key)
    }

    /// Every session seen, including ones with no patterns.
    pub fn total_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Every project seen, including ones with no patterns.
    pub fn total_projects(&self) -> usize {
        self.projects.len()
    }

    /// Most recent timestamp per session, for sessions that had one.
    pub fn session_timestamps(&self) -> &HashMap<String, DateTime<Utc>> {
        &self.session_timestamps
    }

    /// Up to [`MAX_EXAMPLES`] example invocations for `key`, sorted.
    pub fn examples_for(&self, key: &str) -> Vec<String> {
        self.examples
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}
