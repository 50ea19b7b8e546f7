use chrono::{TimeZone, Utc};
use serde_json::json;

use skillmine::patterns::{PatternKind, RankingOptions};
use skillmine::pipeline::mine_patterns;
use skillmine::sessions::{collect_prompts, discover_sessions};
use skillmine::test_utils::fixtures::{SessionFixture, bash_line, prompt_line, tool_line};
use skillmine::test_utils::logging::TestLogger;

fn edit_cycle(ts: &str) -> Vec<String> {
    vec![
        prompt_line("tighten the retry loop", ts),
        tool_line("Grep", json!({ "pattern": "retry" }), ts),
        tool_line("Read", json!({ "file_path": "src/net.rs" }), ts),
        tool_line("Edit", json!({ "file_path": "src/net.rs" }), ts),
        bash_line("cargo test net::", ts),
    ]
}

#[test]
fn mines_fixture_tree_with_subagents() {
    let log = TestLogger::new("mines_fixture_tree_with_subagents");
    let fixture = SessionFixture::new();
    fixture.write_session("svc-a", "s1", &edit_cycle("2026-02-01T09:00:00Z"));
    fixture.write_session("svc-b", "s2", &edit_cycle("2026-02-10T09:00:00Z"));
    fixture.write_subagent(
        "svc-b",
        "s2",
        "agent-1",
        &[
            tool_line("Read", json!({ "file_path": "README.md" }), "2026-02-10T09:05:00Z"),
            tool_line("Edit", json!({ "file_path": "README.md" }), "2026-02-10T09:06:00Z"),
        ],
    );

    let sessions = discover_sessions(fixture.root()).unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[1].subagents.len(), 1);
    assert_eq!(sessions[1].subagents[0].session_id, "s2/agent-1");
    log.log_step("discovered sessions");

    let now = Utc.with_ymd_and_hms(2026, 2, 15, 0, 0, 0).unwrap();
    let report = mine_patterns(&sessions, now, &RankingOptions::default()).unwrap();
    log.log_actual(&report.candidates.len());

    assert_eq!(report.total_sessions, 3);
    assert_eq!(report.total_projects, 2);

    let read_edit = report
        .candidates
        .iter()
        .find(|c| c.key == "tool:bigram:Read->Edit")
        .unwrap();
    assert_eq!(read_edit.kind, PatternKind::ToolBigram);
    assert_eq!(read_edit.evidence.occurrence_count, 3);
    assert_eq!(read_edit.evidence.projects, vec!["svc-a", "svc-b"]);
    assert_eq!(
        read_edit.evidence.last_seen,
        Some(Utc.with_ymd_and_hms(2026, 2, 10, 9, 6, 0).unwrap())
    );
    assert_eq!(read_edit.name, "read-edit-workflow");

    // Every candidate is sorted by score, ties by key.
    for pair in report.candidates.windows(2) {
        assert!(
            pair[0].score > pair[1].score
                || ((pair[0].score - pair[1].score).abs() < f64::EPSILON
                    && pair[0].key < pair[1].key)
        );
    }
    log.pass();
}

#[test]
fn malformed_lines_do_not_abort_reading() {
    let fixture = SessionFixture::new();
    fixture.write_session(
        "proj",
        "s1",
        &[
            "not json".to_string(),
            prompt_line("add a health check endpoint", "2026-02-01T09:00:00Z"),
            "{\"no_type\": true}".to_string(),
            prompt_line("<command-name>/compact</command-name>", "2026-02-01T09:01:00Z"),
        ],
    );

    let sessions = discover_sessions(fixture.root()).unwrap();
    assert_eq!(sessions[0].skipped_count(), 2);

    let prompts = collect_prompts(&sessions[0]);
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].text, "add a health check endpoint");
    assert_eq!(prompts[0].project_slug, "proj");
    assert_eq!(prompts[0].session_id, "s1");
}
