//! Error handling for skillmine.
//!
//! This module provides:
//! - [`MineError`]: The main error enum for all skillmine operations
//! - [`ErrorCode`]: Standardized error codes for machine parsing
//! - [`StructuredError`]: Serializable error type for robot output

mod codes;

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use codes::ErrorCode;

/// Main error type for skillmine operations.
#[derive(Error, Debug)]
pub enum MineError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid pattern key '{key}': {reason}")]
    InvalidPatternKey { key: String, reason: String },

    #[error("Invalid scoring weights: {0}")]
    InvalidWeights(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Unknown embedding backend: {0}")]
    UnknownBackend(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing required config: {0}")]
    MissingConfig(String),

    #[error("Session read error: {0}")]
    SessionRead(String),

    #[error("Cache write error: {0}")]
    CacheWrite(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl MineError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::SerializationError,
            Self::InvalidPatternKey { .. } => ErrorCode::PatternKeyInvalid,
            Self::InvalidWeights(_) => ErrorCode::WeightsInvalid,
            Self::Embedding(_) => ErrorCode::EmbeddingFailed,
            Self::UnknownBackend(_) => ErrorCode::EmbeddingBackendUnknown,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::MissingConfig(_) => ErrorCode::ConfigMissingRequired,
            Self::SessionRead(_) => ErrorCode::StorageReadError,
            Self::CacheWrite(_) => ErrorCode::StorageWriteError,
            Self::NotFound(_) => ErrorCode::NotFound,
        }
    }

    /// Get context information for this error as JSON.
    #[must_use]
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::InvalidPatternKey { key, reason } => {
                Some(serde_json::json!({ "key": key, "reason": reason }))
            }
            Self::UnknownBackend(backend) => Some(serde_json::json!({ "backend": backend })),
            Self::MissingConfig(key) => Some(serde_json::json!({ "config_key": key })),
            _ => None,
        }
    }

    /// Convert this error to a structured error.
    #[must_use]
    pub fn to_structured(&self) -> StructuredError {
        StructuredError::from_mine_error(self)
    }
}

/// A structured error with machine-readable code, suggestion, and context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// The error code (e.g., "PATTERN_KEY_INVALID")
    pub code: ErrorCode,

    /// The numeric error code (e.g., 101)
    pub numeric_code: u16,

    /// Human-readable error message
    pub message: String,

    /// Actionable suggestion for recovery
    pub suggestion: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    pub recoverable: bool,

    /// Error category (e.g., "pattern", "config")
    pub category: String,
}

impl StructuredError {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            numeric_code: code.numeric(),
            suggestion: code.suggestion().to_string(),
            context: None,
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn from_mine_error(err: &MineError) -> Self {
        let mut structured = Self::new(err.code(), err.to_string());
        structured.context = err.context();
        structured
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<&MineError> for StructuredError {
    fn from(err: &MineError) -> Self {
        Self::from_mine_error(err)
    }
}

/// Result type alias using MineError.
pub type Result<T> = std::result::Result<T, MineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = MineError::InvalidPatternKey {
            key: "tool:quad:A".into(),
            reason: "unknown shape".into(),
        };
        assert_eq!(err.code(), ErrorCode::PatternKeyInvalid);
        assert_eq!(
            MineError::Config("bad".into()).code(),
            ErrorCode::ConfigInvalid
        );
        assert_eq!(
            MineError::Embedding("boom".into()).code(),
            ErrorCode::EmbeddingFailed
        );
    }

    #[test]
    fn test_structured_error_carries_context() {
        let err = MineError::InvalidPatternKey {
            key: "nope".into(),
            reason: "missing prefix".into(),
        };
        let structured = err.to_structured();

        assert_eq!(structured.numeric_code, 101);
        assert_eq!(structured.category, "pattern");
        assert!(!structured.recoverable);
        let ctx = structured.context.unwrap();
        assert_eq!(ctx.get("key").unwrap(), "nope");
    }

    #[test]
    fn test_structured_error_serialization() {
        let err = StructuredError::new(ErrorCode::WeightsInvalid, "weights sum to 1.2");
        let json = serde_json::to_string(&err).unwrap();

        assert!(json.contains("WEIGHTS_INVALID"));
        assert!(json.contains("\"numeric_code\":102"));
        assert!(!json.contains("context"));
    }

    #[test]
    fn test_structured_error_display() {
        let err = StructuredError::new(ErrorCode::EmbeddingFailed, "provider timed out");
        let display = format!("{err}");
        assert!(display.contains("E201"));
        assert!(display.contains("provider timed out"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err: MineError = io.into();
        assert_eq!(err.code(), ErrorCode::IoError);
    }
}
