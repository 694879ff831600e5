use thiserror::Error;

use crate::language::Language;

/// Stable error code for the recoverable "parser returned null" failure
/// recorded inside an unsuccessful [`crate::ParseResult`].
pub const CODE_PARSE_FAILED: &str = "PARSE_FAILED";

/// Stable error code for a caught per-node extractor failure recorded as a
/// recoverable [`crate::ParseError`].
pub const CODE_EXTRACTION_FAILED: &str = "EXTRACTION_FAILED";

/// An error that aborts a `parse_file` call before a result is produced.
///
/// Recoverable per-node issues never surface here — they are attached to
/// [`crate::ParseResult::errors`] instead. Every variant carries the source
/// path and maps to a stable code via [`ExtractError::code`] for upstream
/// retry/back-pressure logic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The file extension maps to no supported language.
    #[error("unsupported file extension for {path}")]
    LanguageNotSupported {
        /// The rejected input path.
        path: String,
    },

    /// The input exceeds the configured size cap.
    #[error("{path} is {size} bytes, exceeding the {limit}-byte limit")]
    FileTooLarge {
        /// The rejected input path.
        path: String,
        /// Actual input size in bytes.
        size: usize,
        /// Configured cap in bytes.
        limit: usize,
    },

    /// Parsing and extraction exceeded the per-file deadline.
    #[error("parsing {path} exceeded the {timeout_ms} ms budget")]
    ParseTimeout {
        /// The input path.
        path: String,
        /// The configured budget in milliseconds.
        timeout_ms: u64,
    },

    /// The grammar for a supported language could not be installed on a
    /// parser.
    #[error("failed to load the {language} grammar: {message}")]
    GrammarLoad {
        /// The language whose grammar failed to load.
        language: Language,
        /// The underlying tree-sitter error text.
        message: String,
    },
}

impl ExtractError {
    /// The stable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            ExtractError::LanguageNotSupported { .. } => "LANGUAGE_NOT_SUPPORTED",
            ExtractError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            ExtractError::ParseTimeout { .. } => "PARSE_TIMEOUT",
            ExtractError::GrammarLoad { .. } => "GRAMMAR_LOAD_FAILED",
        }
    }

    /// Whether the caller may retry the same input and reasonably expect a
    /// different outcome. Only timeouts qualify — usually retried with a
    /// larger budget.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExtractError::ParseTimeout { .. })
    }
}
