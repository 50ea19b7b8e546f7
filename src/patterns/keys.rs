//! Canonical pattern keys
//!
//! Every aggregated pattern is identified by one of three key shapes:
//!
//! ```text
//! tool:bigram:Read->Edit
//! tool:trigram:Grep->Read->Edit
//! bash:version-control
//! ```
//!
//! [`parse_pattern_key`] is the exact inverse of the constructors here. Keys
//! are produced internally, so any other shape is a contract violation and is
//! reported as [`MineError::InvalidPatternKey`].

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{MineError, Result};

use super::extract::BashCategory;

const TOOL_SEPARATOR: &str = "->";

/// Which family a pattern key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternKind {
    ToolBigram,
    ToolTrigram,
    Bash,
}

impl PatternKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ToolBigram => "tool-bigram",
            Self::ToolTrigram => "tool-trigram",
            Self::Bash => "bash",
        }
    }
}

/// A pattern key split back into its parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedPatternKey {
    #[serde(rename = "type")]
    pub kind: PatternKind,
    /// Tool chain for tool patterns; empty for bash patterns.
    pub tools: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<BashCategory>,
    /// Everything after the type prefix (`Read->Edit`, `version-control`).
    pub raw: String,
}

impl ParsedPatternKey {
    /// Display label: `Read → Edit` for tool chains, the category otherwise.
    pub fn label(&self) -> String {
        match self.kind {
            PatternKind::Bash => self.raw.clone(),
            PatternKind::ToolBigram | PatternKind::ToolTrigram => self.tools.join(" → "),
        }
    }
}

/// Canonical key for a tool n-gram. Only bigrams and trigrams have keys.
///
/// Tool names come straight from transcripts; a blank name or one containing
/// the `->` separator has no invertible key and yields `None`.
pub fn ngram_key(tools: &[String]) -> Option<String> {
    let family = match tools.len() {
        2 => "bigram",
        3 => "trigram",
        _ => return None,
    };
    if tools
        .iter()
        .any(|tool| tool.trim().is_empty() || tool.contains(TOOL_SEPARATOR))
    {
        return None;
    }
    Some(format!("tool:{family}:{}", tools.iter().join(TOOL_SEPARATOR)))
}

/// Canonical key for a shell command category.
pub fn bash_key(category: BashCategory) -> String {
    format!("bash:{category}")
}

/// Parse a canonical key.
///
/// # Errors
///
/// Returns [`MineError::InvalidPatternKey`] for an unknown prefix, a tool
/// chain of the wrong length, an empty tool name, or an unknown category.
pub fn parse_pattern_key(key: &str) -> Result<ParsedPatternKey> {
    let invalid = |reason: &str| MineError::InvalidPatternKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    if let Some(raw) = key.strip_prefix("bash:") {
        let category =
            BashCategory::from_slug(raw).ok_or_else(|| invalid("unknown bash category"))?;
        return Ok(ParsedPatternKey {
            kind: PatternKind::Bash,
            tools: Vec::new(),
            category: Some(category),
            raw: raw.to_string(),
        });
    }

    let Some(rest) = key.strip_prefix("tool:") else {
        return Err(invalid("expected `tool:` or `bash:` prefix"));
    };
    let (family, raw) = rest
        .split_once(':')
        .ok_or_else(|| invalid("missing n-gram family"))?;
    let (kind, arity) = match family {
        "bigram" => (PatternKind::ToolBigram, 2),
        "trigram" => (PatternKind::ToolTrigram, 3),
        _ => return Err(invalid("n-gram family must be `bigram` or `trigram`")),
    };

    let tools: Vec<String> = raw.split(TOOL_SEPARATOR).map(str::to_string).collect();
    if tools.len() != arity {
        return Err(invalid(&format!(
            "{} expects {arity} tools, found {}",
            kind.as_str(),
            tools.len()
        )));
    }
    if tools.iter().any(|tool| tool.trim().is_empty()) {
        return Err(invalid("empty tool name"));
    }

    Ok(ParsedPatternKey {
        kind,
        tools,
        category: None,
        raw: raw.to_string(),
    })
}

/// Deterministic candidate name derived only from the parsed key.
///
/// `Read->Edit` becomes `read-edit-workflow`; `bash:build` becomes
/// `build-patterns`.
pub fn generate_candidate_name(parsed: &ParsedPatternKey) -> String {
    match parsed.kind {
        PatternKind::Bash => format!("{}-patterns", parsed.raw),
        PatternKind::ToolBigram | PatternKind::ToolTrigram => {
            let chain = parsed.tools.iter().map(|tool| slugify(tool)).join("-");
            format!("{chain}-workflow")
        }
    }
}

/// One-sentence description to go with [`generate_candidate_name`].
pub fn generate_candidate_description(parsed: &ParsedPatternKey) -> String {
    match (parsed.kind, parsed.category) {
        (PatternKind::Bash, Some(category)) => format!(
            "Recurring {} shell commands",
            category.as_str().replace('-', " ")
        ),
        (PatternKind::Bash, None) => format!("Recurring {} shell commands", parsed.raw),
        (PatternKind::ToolBigram | PatternKind::ToolTrigram, _) => format!(
            "Repeated {}-step tool sequence: {}",
            parsed.tools.len(),
            parsed.tools.join(", then ")
        ),
    }
}

/// Lower-case, with runs of non-alphanumerics collapsed to single hyphens.
fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .join("-")
}
