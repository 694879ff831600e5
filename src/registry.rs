//! Language registry: extension lookup plus the parser lifecycle.
//!
//! Grammars are process-global and immutable after their lazy load (see
//! [`Language::grammar`]). Parsers are NOT shareable — tree-sitter parsers
//! carry mutable scratch state — so each thread keeps its own set, one per
//! language, initialised on first use. Lending a parser to a closure gives
//! the scoped acquire/release discipline the orchestrator needs: the handle
//! is released on every exit path, including unwinds.

use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tree_sitter::Parser;

use crate::error::ExtractError;
use crate::language::Language;

// Thread-local Parser instances — one per worker thread and language, zero
// lock contention. Each Parser is initialised once per thread with the
// appropriate grammar.
thread_local! {
    static PARSERS: RefCell<HashMap<Language, Parser>> = RefCell::new(HashMap::new());
}

/// True iff the extension maps to a supported language. Case-insensitive.
pub fn is_supported(extension: &str) -> bool {
    Language::from_extension(extension).is_some()
}

/// The language for an extension, or `None` if unsupported.
pub fn language_of(extension: &str) -> Option<Language> {
    Language::from_extension(extension)
}

/// Lend this thread's parser for `language` to `f`.
///
/// The parser is created (and its grammar installed) on the thread's first
/// request for that language, then reused for every later call on the same
/// thread. The handle never escapes the closure, so two concurrent
/// extractions can never share one parser's mutable state.
///
/// # Errors
/// [`ExtractError::GrammarLoad`] if the grammar cannot be installed on a
/// fresh parser (version-incompatible grammar build).
pub fn with_parser<R>(
    language: Language,
    f: impl FnOnce(&mut Parser) -> R,
) -> Result<R, ExtractError> {
    PARSERS.with(|cell| {
        let mut parsers = cell.borrow_mut();
        let parser = match parsers.entry(language) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let mut parser = Parser::new();
                parser
                    .set_language(language.grammar())
                    .map_err(|err| ExtractError::GrammarLoad {
                        language,
                        message: err.to_string(),
                    })?;
                entry.insert(parser)
            }
        };
        Ok(f(parser))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported_matches_the_extension_table() {
        for ext in [
            "ts", "tsx", "js", "mjs", "cjs", "jsx", "py", "java", "go", "rs", "c", "h", "cpp",
            "cc", "cxx", "hpp", "hxx", "rb",
        ] {
            assert!(is_supported(ext), "{ext} should be supported");
        }
        for ext in ["zig", "kt", "swift", "", "md"] {
            assert!(!is_supported(ext), "{ext} should not be supported");
        }
    }

    #[test]
    fn test_language_of_is_case_insensitive() {
        assert_eq!(language_of("RS"), Some(Language::Rust));
        assert_eq!(language_of("Java"), Some(Language::Java));
        assert_eq!(language_of("nope"), None);
    }

    #[test]
    fn test_with_parser_parses_and_reuses_the_handle() {
        let src = b"const x = 1;\n";
        let first = with_parser(Language::TypeScript, |p| {
            p.parse(src, None).map(|t| t.root_node().kind().to_owned())
        })
        .unwrap();
        assert_eq!(first.as_deref(), Some("program"));

        // Second borrow on the same thread reuses the cached parser.
        let second = with_parser(Language::TypeScript, |p| p.parse(src, None).is_some()).unwrap();
        assert!(second);
    }

    #[test]
    fn test_each_thread_gets_its_own_parser() {
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    let parsed = with_parser(Language::Python, |p| {
                        p.parse(b"def f():\n    pass\n", None).is_some()
                    })
                    .unwrap();
                    assert!(parsed);
                });
            }
        });
    }
}
