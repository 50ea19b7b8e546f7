//! Standardized error codes for machine-parseable output.
//!
//! Error codes follow a numeric taxonomy:
//! - 1xx: Pattern errors
//! - 2xx: Embedding errors
//! - 3xx: Config errors
//! - 6xx: Storage errors
//! - 9xx: Internal errors

use serde::{Deserialize, Serialize};

/// Standardized error codes for robot mode output.
///
/// Each variant maps to a numeric code (e.g., `PatternKeyInvalid` -> E101).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================
    // Pattern errors (1xx)
    // ========================================
    /// E101: Pattern key does not match any canonical shape
    PatternKeyInvalid,
    /// E102: Scoring weights are negative or do not sum to 1.0
    WeightsInvalid,

    // ========================================
    // Embedding errors (2xx)
    // ========================================
    /// E201: Embedding provider failed or returned a malformed batch
    EmbeddingFailed,
    /// E202: Requested embedding backend does not exist
    EmbeddingBackendUnknown,

    // ========================================
    // Config errors (3xx)
    // ========================================
    /// E302: Config file has invalid syntax or values
    ConfigInvalid,
    /// E304: Required config value is missing
    ConfigMissingRequired,

    // ========================================
    // Storage errors (6xx)
    // ========================================
    /// E601: Failed to read session logs
    StorageReadError,
    /// E602: Failed to write the embedding cache
    StorageWriteError,
    /// E605: Serialization/deserialization failed
    SerializationError,

    // ========================================
    // Internal errors (9xx)
    // ========================================
    /// E905: Generic not found (catch-all)
    NotFound,
    /// E906: IO operation failed
    IoError,
}

impl ErrorCode {
    /// Get the numeric error code (e.g., `PatternKeyInvalid` -> 101).
    #[must_use]
    pub const fn numeric(&self) -> u16 {
        match self {
            Self::PatternKeyInvalid => 101,
            Self::WeightsInvalid => 102,

            Self::EmbeddingFailed => 201,
            Self::EmbeddingBackendUnknown => 202,

            Self::ConfigInvalid => 302,
            Self::ConfigMissingRequired => 304,

            Self::StorageReadError => 601,
            Self::StorageWriteError => 602,
            Self::SerializationError => 605,

            Self::NotFound => 905,
            Self::IoError => 906,
        }
    }

    /// Get the error code as a formatted string (e.g., "E101").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("E{}", self.numeric())
    }

    /// Get the default suggestion for this error code.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::PatternKeyInvalid => "Pattern keys look like `tool:bigram:A->B`, `tool:trigram:A->B->C` or `bash:<category>`",
            Self::WeightsInvalid => "Scoring weights must be non-negative and sum to 1.0. Check the [mining] section of your config",
            Self::EmbeddingFailed => "The embedding backend failed. Cached batches were kept; rerun to resume from the cache",
            Self::EmbeddingBackendUnknown => "Set embedding.backend to a supported backend (hash)",
            Self::ConfigInvalid => "Check TOML syntax in the config file and SKILLMINE_* environment variables",
            Self::ConfigMissingRequired => "Set the required value in config.toml or pass it on the command line",
            Self::StorageReadError => "Check that the sessions directory exists and is readable",
            Self::StorageWriteError => "Check disk space and write permissions on the cache directory",
            Self::SerializationError => "The data format may be corrupted. Check input data for validity",
            Self::NotFound => "The requested resource was not found. Check the path or identifier",
            Self::IoError => "File operation failed. Check path exists and permissions are correct",
        }
    }

    /// Check if this error is potentially recoverable by the user.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::WeightsInvalid
            | Self::EmbeddingFailed
            | Self::EmbeddingBackendUnknown
            | Self::ConfigInvalid
            | Self::ConfigMissingRequired
            | Self::StorageReadError
            | Self::StorageWriteError
            | Self::NotFound
            | Self::IoError => true,

            // Keys are produced internally; a bad one is a bug.
            Self::PatternKeyInvalid | Self::SerializationError => false,
        }
    }

    /// Get the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.numeric() / 100 {
            1 => "pattern",
            2 => "embedding",
            3 => "config",
            6 => "storage",
            9 => "internal",
            _ => "unknown",
        }
    }

    /// Iterate over all error codes.
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::PatternKeyInvalid,
            Self::WeightsInvalid,
            Self::EmbeddingFailed,
            Self::EmbeddingBackendUnknown,
            Self::ConfigInvalid,
            Self::ConfigMissingRequired,
            Self::StorageReadError,
            Self::StorageWriteError,
            Self::SerializationError,
            Self::NotFound,
            Self::IoError,
        ]
        .into_iter()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_numeric() {
        assert_eq!(ErrorCode::PatternKeyInvalid.numeric(), 101);
        assert_eq!(ErrorCode::EmbeddingFailed.numeric(), 201);
        assert_eq!(ErrorCode::ConfigInvalid.numeric(), 302);
        assert_eq!(ErrorCode::StorageWriteError.numeric(), 602);
        assert_eq!(ErrorCode::IoError.numeric(), 906);
    }

    #[test]
    fn test_error_code_string() {
        assert_eq!(ErrorCode::WeightsInvalid.code_string(), "E102");
        assert_eq!(format!("{}", ErrorCode::NotFound), "E905");
    }

    #[test]
    fn test_all_codes_have_suggestions() {
        for code in ErrorCode::all() {
            assert!(!code.suggestion().is_empty(), "{code:?} has no suggestion");
        }
    }

    #[test]
    fn test_all_codes_have_known_categories() {
        for code in ErrorCode::all() {
            assert_ne!(code.category(), "unknown", "{code:?} has no category");
        }
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::PatternKeyInvalid).unwrap();
        assert_eq!(json, "\"PATTERN_KEY_INVALID\"");
    }

    #[test]
    fn test_recoverable_categorization() {
        assert!(ErrorCode::EmbeddingFailed.is_recoverable());
        assert!(!ErrorCode::PatternKeyInvalid.is_recoverable());
    }
}
