//! On-disk transcript trees for tests.
//!
//! Lines are written in the same JSONL shape the session reader consumes.

use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tempfile::TempDir;

/// Temporary `<root>/<project>/<session>.jsonl` tree.
pub struct SessionFixture {
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl SessionFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().join("sessions");
        std::fs::create_dir_all(&root).expect("Failed to create sessions root");
        Self { temp_dir, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scratch path outside the sessions root, e.g. for a cache or config file.
    pub fn scratch_path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    pub fn write_session(&self, project: &str, session_id: &str, lines: &[String]) -> PathBuf {
        let path = self.root.join(project).join(format!("{session_id}.jsonl"));
        write_lines(&path, lines);
        path
    }

    pub fn write_subagent(
        &self,
        project: &str,
        parent_id: &str,
        agent_id: &str,
        lines: &[String],
    ) -> PathBuf {
        let path = self
            .root
            .join(project)
            .join(parent_id)
            .join("subagents")
            .join(format!("{agent_id}.jsonl"));
        write_lines(&path, lines);
        path
    }
}

impl Default for SessionFixture {
    fn default() -> Self {
        Self::new()
    }
}

fn write_lines(path: &Path, lines: &[String]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
    }
    let mut body = lines.join("\n");
    body.push('\n');
    std::fs::write(path, body).expect("Failed to write transcript");
}

/// Assistant record with one `tool_use` block.
pub fn tool_line(name: &str, input: Value, timestamp: &str) -> String {
    json!({
        "type": "assistant",
        "timestamp": timestamp,
        "message": { "content": [{ "type": "tool_use", "name": name, "input": input }] }
    })
    .to_string()
}

pub fn bash_line(command: &str, timestamp: &str) -> String {
    tool_line("Bash", json!({ "command": command }), timestamp)
}

/// User record with plain string content.
pub fn prompt_line(text: &str, timestamp: &str) -> String {
    json!({
        "type": "user",
        "timestamp": timestamp,
        "message": { "role": "user", "content": text }
    })
    .to_string()
}
