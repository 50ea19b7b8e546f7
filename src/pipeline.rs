//! End-to-end pattern mining over parsed sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::patterns::{
    PatternAggregator, RankedCandidate, RankingOptions, extract_session_patterns, rank_candidates,
};
use crate::sessions::SessionLog;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningReport {
    pub candidates: Vec<RankedCandidate>,
    pub total_sessions: usize,
    pub total_projects: usize,
    /// Occurrences before the `min_occurrences` filter.
    pub distinct_patterns: usize,
}

/// Extract every session and sub-agent session, aggregate, and rank.
pub fn mine_patterns(
    sessions: &[SessionLog],
    now: DateTime<Utc>,
    options: &RankingOptions,
) -> Result<MiningReport> {
    let mut aggregator = PatternAggregator::new();
    for session in sessions {
        aggregator.add_session_patterns(extract_session_patterns(session));
        for subagent in &session.subagents {
            aggregator.add_session_patterns(extract_session_patterns(subagent));
        }
    }

    let candidates = rank_candidates(&aggregator, now, options)?;
    info!(
        sessions = aggregator.total_sessions(),
        projects = aggregator.total_projects(),
        candidates = candidates.len(),
        "mined tool patterns"
    );

    Ok(MiningReport {
        candidates,
        total_sessions: aggregator.total_sessions(),
        total_projects: aggregator.total_projects(),
        distinct_patterns: aggregator.occurrences().len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::SessionEntry;
    use serde_json::json;

    fn tool(name: &str) -> SessionEntry {
        SessionEntry::ToolUse {
            name: name.into(),
            input: json!({}),
            timestamp: None,
        }
    }

    #[test]
    fn subagents_count_as_their_own_sessions() {
        let mut parent = SessionLog::new("s1", "proj")
            .with_entries(vec![tool("Read"), tool("Edit"), tool("Read"), tool("Edit")]);
        parent.subagents.push(
            SessionLog::new("s1/agent-a", "proj").with_entries(vec![tool("Read"), tool("Edit")]),
        );

        let report = mine_patterns(&[parent], Utc::now(), &RankingOptions::default()).unwrap();
        assert_eq!(report.total_sessions, 2);
        assert_eq!(report.total_projects, 1);

        let top = &report.candidates[0];
        assert_eq!(top.key, "tool:bigram:Read->Edit");
        assert_eq!(top.evidence.occurrence_count, 3);
        assert_eq!(top.evidence.sessions, vec!["s1", "s1/agent-a"]);
    }

    #[test]
    fn odd_tool_names_do_not_abort_mining() {
        let clean = SessionLog::new("s1", "proj")
            .with_entries(vec![tool("Read"), tool("Edit"), tool("Read"), tool("Edit")]);
        let odd = SessionLog::new("s2", "proj").with_entries(vec![
            tool("x->y"),
            tool("Edit"),
            tool("x->y"),
            tool("Edit"),
        ]);

        let report =
            mine_patterns(&[clean, odd], Utc::now(), &RankingOptions::default()).unwrap();
        assert_eq!(report.total_sessions, 2);
        assert!(
            report
                .candidates
                .iter()
                .any(|c| c.key == "tool:bigram:Read->Edit")
        );
        assert!(report.candidates.iter().all(|c| !c.key.contains("x->y")));
    }

    #[test]
    fn no_sessions_no_candidates() {
        let report = mine_patterns(&[], Utc::now(), &RankingOptions::default()).unwrap();
        assert!(report.candidates.is_empty());
        assert_eq!(report.total_sessions, 0);
    }
}
