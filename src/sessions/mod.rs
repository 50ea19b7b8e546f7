//! Session log model
//!
//! Typed view of agent session transcripts. Only two entry kinds matter to
//! mining: tool invocations (for workflow patterns) and user prompts (for
//! prompt clustering). Everything else is `Other`; lines that cannot be
//! parsed surface as `Skipped` instead of failing the read.

pub mod reader;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clustering::CollectedPrompt;

pub use reader::{discover_sessions, parse_line, read_session_file};

/// One typed entry from a session transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEntry {
    /// A tool invocation issued by the assistant.
    ToolUse {
        name: String,
        input: Value,
        timestamp: Option<DateTime<Utc>>,
    },
    /// Free text typed by the user.
    UserPrompt {
        text: String,
        timestamp: Option<DateTime<Utc>>,
    },
    /// A line that could not be interpreted.
    Skipped { line: usize, reason: String },
    /// Anything else (assistant text, tool results, summaries).
    Other,
}

impl SessionEntry {
    pub const fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::ToolUse { timestamp, .. } | Self::UserPrompt { timestamp, .. } => *timestamp,
            Self::Skipped { .. } | Self::Other => None,
        }
    }
}

/// A parsed session, with any sub-agent sessions it spawned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionLog {
    pub session_id: String,
    pub project_slug: String,
    pub entries: Vec<SessionEntry>,
    #[serde(default)]
    pub subagents: Vec<SessionLog>,
}

impl SessionLog {
    pub fn new(session_id: impl Into<String>, project_slug: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            project_slug: project_slug.into(),
            entries: Vec::new(),
            subagents: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_entries(mut self, entries: Vec<SessionEntry>) -> Self {
        self.entries = entries;
        self
    }

    /// Tool names in invocation order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                SessionEntry::ToolUse { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Most recent timestamp of any entry, if the transcript has one.
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.entries.iter().filter_map(SessionEntry::timestamp).max()
    }

    pub fn skipped_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry, SessionEntry::Skipped { .. }))
            .count()
    }
}

/// Extract clustering input from a session's user prompts.
///
/// Empty prompts and harness-injected markup (text starting with `<`, such as
/// `<command-name>` wrappers) are dropped. Sub-agent prompts are written by
/// the parent agent, not the user, so they are not collected.
pub fn collect_prompts(session: &SessionLog) -> Vec<CollectedPrompt> {
    session
        .entries
        .iter()
        .filter_map(|entry| match entry {
            SessionEntry::UserPrompt { text, timestamp } => {
                let trimmed = text.trim();
                if trimmed.is_empty() || trimmed.starts_with('<') {
                    return None;
                }
                Some(CollectedPrompt {
                    text: trimmed.to_string(),
                    session_id: session.session_id.clone(),
                    timestamp: *timestamp,
                    project_slug: session.project_slug.clone(),
                })
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prompt(text: &str) -> SessionEntry {
        SessionEntry::UserPrompt {
            text: text.to_string(),
            timestamp: None,
        }
    }

    fn tool(name: &str) -> SessionEntry {
        SessionEntry::ToolUse {
            name: name.to_string(),
            input: json!({}),
            timestamp: None,
        }
    }

    #[test]
    fn tool_names_preserve_order() {
        let log = SessionLog::new("s1", "proj").with_entries(vec![
            tool("Read"),
            prompt("hello"),
            tool("Edit"),
            SessionEntry::Other,
            tool("Bash"),
        ]);
        assert_eq!(log.tool_names(), vec!["Read", "Edit", "Bash"]);
    }

    #[test]
    fn collect_prompts_drops_markup_and_blank() {
        let log = SessionLog::new("s1", "proj").with_entries(vec![
            prompt("  fix the auth middleware  "),
            prompt("   "),
            prompt("<command-name>/clear</command-name>"),
            tool("Read"),
        ]);
        let prompts = collect_prompts(&log);
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].text, "fix the auth middleware");
        assert_eq!(prompts[0].project_slug, "proj");
        assert_eq!(prompts[0].session_id, "s1");
    }

    #[test]
    fn latest_timestamp_ignores_missing() {
        let early = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let late = DateTime::parse_from_rfc3339("2026-02-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let log = SessionLog::new("s1", "proj").with_entries(vec![
            SessionEntry::UserPrompt {
                text: "a".into(),
                timestamp: Some(late),
            },
            tool("Read"),
            SessionEntry::UserPrompt {
                text: "b".into(),
                timestamp: Some(early),
            },
        ]);
        assert_eq!(log.latest_timestamp(), Some(late));
        assert_eq!(SessionLog::new("s2", "proj").latest_timestamp(), None);
    }
}
