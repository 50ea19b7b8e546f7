//! Per-session pattern extraction
//!
//! Turns a session's ordered tool invocations into bigram/trigram tallies and
//! buckets every shell command into one of eight categories. Nothing here can
//! fail: unusual input becomes `BashCategory::Other` or is ignored.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sessions::{SessionEntry, SessionLog};
use crate::utils::format::truncate_string;

use super::keys::{bash_key, ngram_key};

/// Evidence strings kept per pattern per session.
pub const MAX_EXAMPLES: usize = 3;

const EXAMPLE_ARG_CHARS: usize = 60;

/// Category of a shell command, decided from its first token and subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BashCategory {
    VersionControl,
    TestRunner,
    Build,
    PackageManagement,
    FileOperation,
    Search,
    InlineScript,
    Other,
}

impl BashCategory {
    pub const ALL: [Self; 8] = [
        Self::VersionControl,
        Self::TestRunner,
        Self::Build,
        Self::PackageManagement,
        Self::FileOperation,
        Self::Search,
        Self::InlineScript,
        Self::Other,
    ];

    /// Kebab-case name used in pattern keys.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::VersionControl => "version-control",
            Self::TestRunner => "test-runner",
            Self::Build => "build",
            Self::PackageManagement => "package-management",
            Self::FileOperation => "file-operation",
            Self::Search => "search",
            Self::InlineScript => "inline-script",
            Self::Other => "other",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.as_str() == slug)
    }
}

impl fmt::Display for BashCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-session tallies, produced once and handed to the aggregator by value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionPatterns {
    pub session_id: String,
    pub project_slug: String,
    pub tool_bigrams: HashMap<Vec<String>, usize>,
    pub tool_trigrams: HashMap<Vec<String>, usize>,
    pub bash_patterns: HashMap<BashCategory, usize>,
    /// Up to [`MAX_EXAMPLES`] example invocations per canonical pattern key.
    #[serde(default)]
    pub examples: HashMap<String, Vec<String>>,
    /// Most recent entry timestamp in the session.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl SessionPatterns {
    pub fn new(session_id: impl Into<String>, project_slug: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            project_slug: project_slug.into(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tool_bigrams.is_empty() && self.tool_trigrams.is_empty() && self.bash_patterns.is_empty()
    }
}

/// Tally every contiguous length-`n` window of `tools`.
///
/// Sequences shorter than `n` (and `n == 0`) contribute nothing.
pub fn extract_ngrams<S: AsRef<str>>(tools: &[S], n: usize) -> HashMap<Vec<String>, usize> {
    let mut counts = HashMap::new();
    if n == 0 || tools.len() < n {
        return counts;
    }
    for window in tools.windows(n) {
        let gram: Vec<String> = window.iter().map(|t| t.as_ref().to_string()).collect();
        *counts.entry(gram).or_insert(0) += 1;
    }
    counts
}

/// Build [`SessionPatterns`] for one session (not its sub-agents).
pub fn extract_session_patterns(session: &SessionLog) -> SessionPatterns {
    let mut patterns = SessionPatterns::new(&session.session_id, &session.project_slug);
    patterns.timestamp = session.latest_timestamp();

    let tool_uses: Vec<(&str, &Value)> = session
        .entries
        .iter()
        .filter_map(|entry| match entry {
            SessionEntry::ToolUse { name, input, .. } => Some((name.as_str(), input)),
            _ => None,
        })
        .collect();
    let names: Vec<&str> = tool_uses.iter().map(|(name, _)| *name).collect();

    patterns.tool_bigrams = extract_ngrams(&names, 2);
    patterns.tool_trigrams = extract_ngrams(&names, 3);

    for n in [2, 3] {
        for window in tool_uses.windows(n) {
            let tools: Vec<String> = window.iter().map(|(name, _)| (*name).to_string()).collect();
            if let Some(key) = ngram_key(&tools) {
                let example = window
                    .iter()
                    .map(|(name, input)| describe_invocation(name, input))
                    .collect::<Vec<_>>()
                    .join(" → ");
                push_example(&mut patterns.examples, key, example);
            }
        }
    }

    for (name, input) in &tool_uses {
        if !name.eq_ignore_ascii_case("bash") {
            continue;
        }
        let Some(command) = input.get("command").and_then(Value::as_str) else {
            continue;
        };
        let category = classify_bash_command(command);
        *patterns.bash_patterns.entry(category).or_insert(0) += 1;
        push_example(
            &mut patterns.examples,
            bash_key(category),
            truncate_string(command.trim(), EXAMPLE_ARG_CHARS * 2),
        );
    }

    patterns
}

fn push_example(examples: &mut HashMap<String, Vec<String>>, key: String, example: String) {
    let slot = examples.entry(key).or_default();
    if slot.len() < MAX_EXAMPLES && !slot.contains(&example) {
        slot.push(example);
    }
}

/// Short one-line rendering of a tool call: name plus its most telling argument.
fn describe_invocation(name: &str, input: &Value) -> String {
    const ARG_FIELDS: [&str; 6] = ["file_path", "path", "pattern", "command", "url", "query"];

    ARG_FIELDS
        .iter()
        .find_map(|field| input.get(*field).and_then(Value::as_str))
        .map_or_else(
            || name.to_string(),
            |arg| format!("{name}({})", truncate_string(arg.trim(), EXAMPLE_ARG_CHARS)),
        )
}

// =============================================================================
// Shell command classification
// =============================================================================

/// Classify a shell command by its first segment.
///
/// `git add . && cargo test` is `version-control`: only the text before the
/// first unquoted `&&`, `||`, `;` or `|` is considered.
pub fn classify_bash_command(cmd: &str) -> BashCategory {
    let segment = first_segment(cmd);
    let tokens = tokenize_command(segment);
    let tokens = strip_wrappers(&tokens);
    classify_tokens(tokens)
}

fn classify_tokens(tokens: &[String]) -> BashCategory {
    let Some(first) = tokens.first() else {
        return BashCategory::Other;
    };
    let program = program_name(first);
    let sub = tokens.get(1).map(|s| s.to_lowercase());
    let sub = sub.as_deref();

    match program.as_str() {
        "git" | "gh" | "hg" | "svn" | "jj" => BashCategory::VersionControl,

        "pytest" | "jest" | "vitest" | "mocha" | "rspec" | "phpunit" | "ctest" | "tox"
        | "nextest" | "playwright" | "cypress" => BashCategory::TestRunner,

        "cargo" => match sub {
            Some("test" | "nextest" | "bench") => BashCategory::TestRunner,
            Some("build" | "check" | "clippy" | "run" | "doc" | "fmt") => BashCategory::Build,
            Some("add" | "install" | "remove" | "rm" | "update" | "uninstall" | "fetch") => {
                BashCategory::PackageManagement
            }
            _ => BashCategory::Other,
        },

        "go" => match sub {
            Some("test") => BashCategory::TestRunner,
            Some("build" | "run" | "vet" | "generate") => BashCategory::Build,
            Some("get" | "mod" | "install") => BashCategory::PackageManagement,
            _ => BashCategory::Other,
        },

        "npm" | "yarn" | "pnpm" | "bun" => classify_js_package_manager(&tokens[1..]),

        "npx" | "bunx" | "pnpx" => match tokens.get(1) {
            Some(_) => classify_tokens(&tokens[1..]),
            None => BashCategory::Other,
        },

        "uv" | "poetry" | "pipenv" => match sub {
            Some("run") => classify_tokens(&tokens[2..]),
            Some(_) => BashCategory::PackageManagement,
            None => BashCategory::Other,
        },

        "python" | "python3" | "python2" | "py" => classify_python(&tokens[1..]),

        "node" | "deno" | "ruby" | "perl" | "php" => {
            if has_any(&tokens[1..], &["-e", "--eval", "-p", "--print", "eval"])
                || has_heredoc(&tokens[1..])
            {
                BashCategory::InlineScript
            } else if program == "deno" && sub == Some("test") {
                BashCategory::TestRunner
            } else {
                BashCategory::Other
            }
        }

        "bash" | "sh" | "zsh" => {
            if has_any(&tokens[1..], &["-c"]) || has_heredoc(&tokens[1..]) {
                BashCategory::InlineScript
            } else {
                BashCategory::Other
            }
        }

        "make" | "gradle" | "gradlew" | "mvn" | "bazel" | "dotnet" => match sub {
            Some("test" | "check" | "verify") => BashCategory::TestRunner,
            _ => BashCategory::Build,
        },

        "cmake" | "ninja" | "tsc" | "webpack" | "vite" | "rollup" | "esbuild" | "gcc" | "g++"
        | "clang" | "clang++" | "rustc" | "javac" => BashCategory::Build,

        "docker" | "podman" => match sub {
            Some("build") => BashCategory::Build,
            _ => BashCategory::Other,
        },

        "pip" | "pip3" | "conda" | "brew" | "apt" | "apt-get" | "yum" | "dnf" | "apk" | "gem"
        | "bundle" | "composer" | "rustup" => BashCategory::PackageManagement,

        "ls" | "cat" | "head" | "tail" | "cp" | "mv" | "rm" | "mkdir" | "rmdir" | "touch"
        | "chmod" | "chown" | "ln" | "wc" | "tree" | "stat" | "du" | "df" | "pwd" | "cd"
        | "sed" | "tar" | "zip" | "unzip" | "diff" | "less" | "file" | "realpath" | "readlink" => {
            BashCategory::FileOperation
        }

        "grep" | "egrep" | "rg" | "ag" | "ack" | "find" | "fd" | "locate" | "which"
        | "whereis" => BashCategory::Search,

        _ => BashCategory::Other,
    }
}

fn classify_js_package_manager(args: &[String]) -> BashCategory {
    let Some(sub) = args.first().map(|s| s.to_lowercase()) else {
        return BashCategory::Other;
    };
    // `npm run <script>` and the yarn/pnpm shorthand `yarn <script>`.
    let script = if sub == "run" {
        args.get(1).map(|s| s.to_lowercase())
    } else {
        Some(sub.clone())
    };

    match sub.as_str() {
        "install" | "i" | "ci" | "add" | "remove" | "uninstall" | "update" | "upgrade" => {
            return BashCategory::PackageManagement;
        }
        "test" | "t" => return BashCategory::TestRunner,
        "x" | "exec" | "dlx" if args.len() > 1 => return classify_tokens(&args[1..]),
        _ => {}
    }

    match script.as_deref() {
        Some(s) if s == "test" || s.starts_with("test:") => BashCategory::TestRunner,
        Some(s) if s == "build" || s.starts_with("build:") => BashCategory::Build,
        _ => BashCategory::Other,
    }
}

fn classify_python(args: &[String]) -> BashCategory {
    if has_any(args, &["-c"]) || has_heredoc(args) || args.first().is_some_and(|a| a == "-") {
        return BashCategory::InlineScript;
    }
    if let Some(pos) = args.iter().position(|a| a == "-m") {
        return match args.get(pos + 1).map(String::as_str) {
            Some("pytest" | "unittest" | "nose2") => BashCategory::TestRunner,
            Some("pip") => BashCategory::PackageManagement,
            Some("build" | "compileall") => BashCategory::Build,
            _ => BashCategory::Other,
        };
    }
    BashCategory::Other
}

fn has_any(args: &[String], flags: &[&str]) -> bool {
    args.iter().any(|arg| flags.contains(&arg.as_str()))
}

fn has_heredoc(args: &[String]) -> bool {
    args.iter().any(|arg| arg.starts_with("<<"))
}

/// Lower-cased basename of the executable token.
fn program_name(token: &str) -> String {
    let token = token.trim_start_matches('(');
    token
        .rsplit('/')
        .next()
        .unwrap_or(token)
        .to_lowercase()
}

/// Drop leading `VAR=value` assignments and transparent wrappers.
fn strip_wrappers(tokens: &[String]) -> &[String] {
    let mut start = 0;
    while let Some(token) = tokens.get(start) {
        let is_assignment = token.split_once('=').is_some_and(|(name, _)| {
            !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
        let is_wrapper = matches!(
            token.as_str(),
            "sudo" | "time" | "env" | "nohup" | "command" | "exec"
        );
        if is_assignment || is_wrapper {
            start += 1;
        } else {
            break;
        }
    }
    &tokens[start..]
}

/// Text before the first unquoted `&&`, `||`, `;`, `|` or newline.
fn first_segment(cmd: &str) -> &str {
    let mut in_quote: Option<char> = None;
    let mut escape = false;

    for (idx, c) in cmd.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match (c, in_quote) {
            ('\\', _) => escape = true,
            (q, Some(open)) if q == open => in_quote = None,
            (_, Some(_)) => {}
            ('"' | '\'', None) => in_quote = Some(c),
            (';' | '|' | '\n', None) => return &cmd[..idx],
            ('&', None) if cmd[idx..].starts_with("&&") => return &cmd[..idx],
            _ => {}
        }
    }
    cmd
}

/// Tokenize a shell command string, respecting quotes and escapes.
fn tokenize_command(cmd: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quote = None;
    let mut escape = false;

    for c in cmd.chars() {
        if escape {
            current.push(c);
            escape = false;
        } else if c == '\\' {
            escape = true;
        } else if let Some(q) = in_quote {
            if c == q {
                in_quote = None;
            } else {
                current.push(c);
            }
        } else if c == '"' || c == '\'' {
            in_quote = Some(c);
        } else if c.is_whitespace() {
            if !current.is_empty() {
                args.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        args.push(current);
    }
    args
}
