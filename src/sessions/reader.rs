//! JSONL transcript reader
//!
//! Reads the common agent transcript layout:
//!
//! ```text
//! <root>/<project-slug>/<session-id>.jsonl
//! <root>/<project-slug>/<session-id>/subagents/<agent-id>.jsonl
//! ```
//!
//! Each line is one JSON record. Assistant records carry `tool_use` content
//! blocks; user records carry either a plain string or `text` blocks.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{MineError, Result};
use crate::utils::fs::file_stem_string;

use super::{SessionEntry, SessionLog};

/// Discover and read every session under `root`, one directory per project.
///
/// Unreadable session files are logged and skipped.
pub fn discover_sessions(root: &Path) -> Result<Vec<SessionLog>> {
    if !root.is_dir() {
        return Err(MineError::NotFound(format!(
            "sessions directory {}",
            root.display()
        )));
    }

    let mut sessions = Vec::new();
    for project in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let project = project.map_err(|err| MineError::SessionRead(err.to_string()))?;
        if !project.file_type().is_dir() {
            continue;
        }
        let slug = project.file_name().to_string_lossy().into_owned();
        sessions.extend(read_project(project.path(), &slug)?);
    }

    debug!(root = %root.display(), sessions = sessions.len(), "discovered sessions");
    Ok(sessions)
}

fn read_project(dir: &Path, slug: &str) -> Result<Vec<SessionLog>> {
    let mut sessions = Vec::new();
    for entry in jsonl_files(dir)? {
        match read_session_file(&entry, slug) {
            Ok(mut log) => {
                let subagent_dir = dir.join(&log.session_id).join("subagents");
                log.subagents = read_subagents(&subagent_dir, slug, &log.session_id)?;
                sessions.push(log);
            }
            Err(err) => warn!(path = %entry.display(), "skipping session: {err}"),
        }
    }
    Ok(sessions)
}

fn read_subagents(dir: &Path, slug: &str, parent_id: &str) -> Result<Vec<SessionLog>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut logs = Vec::new();
    for path in jsonl_files(dir)? {
        match read_session_file(&path, slug) {
            Ok(mut log) => {
                log.session_id = format!("{parent_id}/{}", log.session_id);
                logs.push(log);
            }
            Err(err) => warn!(path = %path.display(), "skipping subagent session: {err}"),
        }
    }
    Ok(logs)
}

fn jsonl_files(dir: &Path) -> Result<Vec<std::path::PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| MineError::SessionRead(err.to_string()))?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "jsonl") {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

/// Read one transcript file. The session id is the file stem.
pub fn read_session_file(path: &Path, project_slug: &str) -> Result<SessionLog> {
    let file = File::open(path)
        .map_err(|err| MineError::SessionRead(format!("open {}: {err}", path.display())))?;
    let mut log = SessionLog::new(file_stem_string(path), project_slug);

    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line_no = idx + 1;
        match line {
            Ok(line) => log.entries.extend(parse_line(&line, line_no)),
            Err(err) => log.entries.push(SessionEntry::Skipped {
                line: line_no,
                reason: err.to_string(),
            }),
        }
    }

    let skipped = log.skipped_count();
    if skipped > 0 {
        debug!(session = %log.session_id, skipped, "transcript had unparseable lines");
    }
    Ok(log)
}

/// Parse one transcript line into zero or more entries.
///
/// Blank lines yield nothing. A line that is not a JSON object, or has no
/// `type`, yields a single `Skipped` entry.
pub fn parse_line(line: &str, line_no: usize) -> Vec<SessionEntry> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let record: Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(err) => return vec![skipped(line_no, format!("invalid JSON: {err}"))],
    };
    let Some(object) = record.as_object() else {
        return vec![skipped(line_no, "expected a JSON object")];
    };

    let timestamp = object
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(parse_timestamp);
    let content = object.get("message").and_then(|message| message.get("content"));

    match object.get("type").and_then(Value::as_str) {
        Some("user") => {
            if object.get("isMeta").and_then(Value::as_bool) == Some(true) {
                return vec![SessionEntry::Other];
            }
            user_entry(content, timestamp).into_iter().collect()
        }
        Some("assistant") => {
            let entries = tool_entries(content, timestamp, line_no);
            if entries.is_empty() {
                vec![SessionEntry::Other]
            } else {
                entries
            }
        }
        Some(_) => vec![SessionEntry::Other],
        None => vec![skipped(line_no, "missing entry type")],
    }
}

fn user_entry(content: Option<&Value>, timestamp: Option<DateTime<Utc>>) -> Option<SessionEntry> {
    let text = match content? {
        Value::String(text) => text.clone(),
        Value::Array(blocks) => blocks
            .iter()
            .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|block| block.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => return Some(SessionEntry::Other),
    };

    if text.trim().is_empty() {
        // Tool results arrive as user records with no text blocks.
        return Some(SessionEntry::Other);
    }
    Some(SessionEntry::UserPrompt { text, timestamp })
}

fn tool_entries(
    content: Option<&Value>,
    timestamp: Option<DateTime<Utc>>,
    line_no: usize,
) -> Vec<SessionEntry> {
    let Some(blocks) = content.and_then(Value::as_array) else {
        return Vec::new();
    };

    blocks
        .iter()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("tool_use"))
        .map(|block| match block.get("name").and_then(Value::as_str) {
            Some(name) if !name.trim().is_empty() => SessionEntry::ToolUse {
                name: name.to_string(),
                input: block.get("input").cloned().unwrap_or(Value::Null),
                timestamp,
            },
            _ => skipped(line_no, "tool_use block without a name"),
        })
        .collect()
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

fn skipped(line: usize, reason: impl Into<String>) -> SessionEntry {
    SessionEntry::Skipped {
        line,
        reason: reason.into(),
    }
}
