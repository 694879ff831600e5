//! Extraction orchestrator — the crate's only public operation.
//!
//! `parse_file` validates the input, sets up the bounded time budget, lends
//! a parser from the registry, runs the four per-language passes, stamps
//! metrics and emits one structured summary record per call.

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::ExtractorConfig;
use crate::error::{CODE_EXTRACTION_FAILED, CODE_PARSE_FAILED, ExtractError};
use crate::extract::{ExtractCtx, extractor_for};
use crate::language::Language;
use crate::model::{ParseError, ParseResult};
use crate::{registry, walker};

/// Polyglot source-file extractor.
///
/// Construction is cheap; one instance can serve any number of concurrent
/// `parse_file` calls — the only shared state is the process-wide grammar
/// cache and each thread's own parser set.
pub struct SourceExtractor {
    config: ExtractorConfig,
}

impl Default for SourceExtractor {
    fn default() -> Self {
        SourceExtractor::new(ExtractorConfig::default())
    }
}

impl SourceExtractor {
    /// Create an extractor with the given options.
    pub fn new(config: ExtractorConfig) -> Self {
        SourceExtractor { config }
    }

    /// The options this extractor was built with.
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Parse one source file and extract its entities, imports, exports and
    /// call sites.
    ///
    /// # Errors
    /// - [`ExtractError::FileTooLarge`] when `source` exceeds the size cap.
    /// - [`ExtractError::LanguageNotSupported`] when the extension is
    ///   unknown (checked before the bytes are ever touched).
    /// - [`ExtractError::ParseTimeout`] when the per-file budget expires;
    ///   no partial result is returned.
    /// - [`ExtractError::GrammarLoad`] when a grammar cannot be installed.
    ///
    /// A grammar that produces no tree is NOT an `Err`: it yields
    /// `success = false` with a single non-recoverable [`ParseError`], so
    /// callers can distinguish malformed inputs from infrastructure
    /// failures.
    pub fn parse_file(&self, source: &[u8], path: &str) -> Result<ParseResult, ExtractError> {
        let started = Instant::now();

        let size = source.len();
        if size > self.config.max_file_size_bytes {
            let err = ExtractError::FileTooLarge {
                path: path.to_owned(),
                size,
                limit: self.config.max_file_size_bytes,
            };
            warn!(path, code = err.code(), size, "rejected oversized input");
            return Err(err);
        }

        let Some(language) = Language::from_path(path) else {
            let err = ExtractError::LanguageNotSupported {
                path: path.to_owned(),
            };
            warn!(path, code = err.code(), "rejected unsupported extension");
            return Err(err);
        };

        let deadline = started + Duration::from_millis(self.config.parse_timeout_ms);

        let tree = registry::with_parser(language, |parser| {
            walker::parse_with_deadline(parser, source, deadline)
        })
        .inspect_err(|err| {
            warn!(path, code = err.code(), language = %language, "grammar load failed");
        })?;

        let Some(tree) = tree else {
            if Instant::now() >= deadline {
                let err = ExtractError::ParseTimeout {
                    path: path.to_owned(),
                    timeout_ms: self.config.parse_timeout_ms,
                };
                warn!(path, code = err.code(), "parse exceeded the time budget");
                return Err(err);
            }
            warn!(path, code = CODE_PARSE_FAILED, language = %language, "parser returned no tree");
            let mut result = ParseResult::failed(
                path,
                language,
                ParseError::fatal("Failed to parse file: parser returned null"),
            );
            result.parse_time_ms = started.elapsed().as_millis() as u64;
            self.emit_summary(&result, size, "parse_failed");
            return Ok(result);
        };

        let root = tree.root_node();
        let mut errors = if root.has_error() {
            walker::collect_syntax_errors(root)
        } else {
            Vec::new()
        };

        let ctx = ExtractCtx {
            source,
            path,
            include_anonymous: self.config.include_anonymous,
            extract_documentation: self.config.extract_documentation,
        };
        let extractor = extractor_for(language);

        let entities =
            self.run_pass(path, "entities", deadline, &mut errors, || {
                extractor.entities(root, &ctx)
            })?;
        let imports =
            self.run_pass(path, "imports", deadline, &mut errors, || {
                extractor.imports(root, &ctx)
            })?;
        let exports =
            self.run_pass(path, "exports", deadline, &mut errors, || {
                extractor.exports(root, &ctx)
            })?;
        let calls = self.run_pass(path, "calls", deadline, &mut errors, || {
            extractor.calls(root, &ctx)
        })?;

        let result = ParseResult {
            path: path.to_owned(),
            language,
            entities,
            imports,
            exports,
            calls,
            parse_time_ms: started.elapsed().as_millis() as u64,
            errors,
            success: true,
        };
        self.emit_summary(&result, size, "success");
        Ok(result)
    }

    /// Run one extraction pass under the deadline. A pass that panics on
    /// this file is recorded as a recoverable error and yields an empty
    /// stream; the remaining passes still run.
    fn run_pass<T>(
        &self,
        path: &str,
        stream: &'static str,
        deadline: Instant,
        errors: &mut Vec<ParseError>,
        pass: impl FnOnce() -> Vec<T>,
    ) -> Result<Vec<T>, ExtractError> {
        if Instant::now() >= deadline {
            let err = ExtractError::ParseTimeout {
                path: path.to_owned(),
                timeout_ms: self.config.parse_timeout_ms,
            };
            warn!(path, code = err.code(), stream, "budget expired before pass");
            return Err(err);
        }
        match panic::catch_unwind(AssertUnwindSafe(pass)) {
            Ok(values) => Ok(values),
            Err(_) => {
                warn!(
                    path,
                    code = CODE_EXTRACTION_FAILED,
                    stream,
                    "extractor pass failed; continuing with remaining passes"
                );
                errors.push(ParseError::recoverable_unlocated(format!(
                    "{stream} extraction failed"
                )));
                Ok(Vec::new())
            }
        }
    }

    /// One structured record per `parse_file` for the observability
    /// pipeline.
    fn emit_summary(&self, result: &ParseResult, size: usize, outcome: &'static str) {
        info!(
            path = %result.path,
            language = %result.language,
            bytes = size,
            entities = result.entities.len(),
            imports = result.imports.len(),
            exports = result.exports.len(),
            calls = result.calls.len(),
            errors = result.errors.len(),
            duration_ms = result.parse_time_ms,
            outcome,
            "file extraction finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> SourceExtractor {
        SourceExtractor::default()
    }

    #[test]
    fn test_empty_file_succeeds_with_empty_streams() {
        let result = extractor().parse_file(b"", "empty.ts").unwrap();
        assert!(result.success);
        assert!(result.entities.is_empty());
        assert!(result.imports.is_empty());
        assert!(result.exports.is_empty());
        assert!(result.calls.is_empty());
        assert!(result.errors.is_empty());
        assert_eq!(result.language, Language::TypeScript);
        assert_eq!(result.path, "empty.ts");
    }

    #[test]
    fn test_unsupported_extension_is_rejected() {
        let err = extractor().parse_file(b"fn main() {}", "main.zig").unwrap_err();
        assert_eq!(err.code(), "LANGUAGE_NOT_SUPPORTED");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_size_cap_boundary() {
        let config = ExtractorConfig {
            max_file_size_bytes: 32,
            ..ExtractorConfig::default()
        };
        let extractor = SourceExtractor::new(config);

        // Exactly at the limit: accepted.
        let at_limit = vec![b' '; 32];
        assert!(extractor.parse_file(&at_limit, "ok.ts").is_ok());

        // One byte over: rejected.
        let over = vec![b' '; 33];
        let err = extractor.parse_file(&over, "big.ts").unwrap_err();
        match err {
            ExtractError::FileTooLarge { size, limit, .. } => {
                assert_eq!(size, 33);
                assert_eq!(limit, 32);
            }
            other => panic!("expected FileTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_budget_times_out() {
        let config = ExtractorConfig {
            parse_timeout_ms: 0,
            ..ExtractorConfig::default()
        };
        let extractor = SourceExtractor::new(config);
        let src = "const x = 1;\n".repeat(1000);
        let err = extractor.parse_file(src.as_bytes(), "slow.ts").unwrap_err();
        assert_eq!(err.code(), "PARSE_TIMEOUT");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_comment_only_file_has_empty_streams() {
        let result = extractor()
            .parse_file(b"// just a comment\n/* and another */\n", "c.ts")
            .unwrap();
        assert!(result.success);
        assert!(result.entities.is_empty());
        assert!(result.imports.is_empty());
        assert!(result.calls.is_empty());
    }

    #[test]
    fn test_syntax_errors_do_not_abort_extraction() {
        let src = b"function broken( {\nexport function ok() {}\n";
        let result = extractor().parse_file(src, "mixed.ts").unwrap();
        assert!(result.success);
        assert!(!result.errors.is_empty());
        assert!(result.errors.iter().all(|e| e.recoverable));
        assert!(
            result.entities.iter().any(|e| e.name == "ok"),
            "valid sibling subtrees still extract: {:?}",
            result.entities
        );
    }

    #[test]
    fn test_idempotence_modulo_timing() {
        let src = b"export const f = (a: number) => { g(a); };\n";
        let mut first = extractor().parse_file(src, "same.ts").unwrap();
        let mut second = extractor().parse_file(src, "same.ts").unwrap();
        first.parse_time_ms = 0;
        second.parse_time_ms = 0;
        assert_eq!(first, second);
    }

    #[test]
    fn test_uppercase_extension_is_supported() {
        let result = extractor().parse_file(b"x = 1\n", "MOD.PY").unwrap();
        assert_eq!(result.language, Language::Python);
    }
}
