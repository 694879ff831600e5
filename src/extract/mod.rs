//! Per-language extractors.
//!
//! Each language family implements [`Extractor`]: four procedures that walk
//! the same tree independently and emit their streams in source order.
//! Dispatch is a match on [`Language`] to a static instance — no boxing, no
//! registration at runtime.

pub(crate) mod helpers;

mod c_family;
mod go;
mod java;
mod python;
mod ruby;
mod rust_lang;
mod typescript;

use tree_sitter::Node;

use crate::language::Language;
use crate::model::{CallInfo, CodeEntity, ExportInfo, ImportInfo};

/// Per-call context shared by the four extraction passes.
pub(crate) struct ExtractCtx<'a> {
    /// Raw UTF-8 source bytes, borrowed read-only.
    pub source: &'a [u8],
    /// The logical file path, echoed into every entity.
    pub path: &'a str,
    /// Emit nameless declarations as `<anonymous>` instead of skipping.
    pub include_anonymous: bool,
    /// Populate `documentation` metadata.
    pub extract_documentation: bool,
}

/// The four extraction procedures of one language family.
///
/// Implementations walk pre-order, copy every surfaced string out of tree
/// memory, and thread caller context as an explicit parameter — never
/// through shared state.
pub(crate) trait Extractor: Sync {
    fn entities(&self, root: Node<'_>, ctx: &ExtractCtx<'_>) -> Vec<CodeEntity>;
    fn imports(&self, root: Node<'_>, ctx: &ExtractCtx<'_>) -> Vec<ImportInfo>;
    /// Only TS/JS has explicit export statements; everyone else inherits the
    /// empty stream.
    fn exports(&self, _root: Node<'_>, _ctx: &ExtractCtx<'_>) -> Vec<ExportInfo> {
        Vec::new()
    }
    fn calls(&self, root: Node<'_>, ctx: &ExtractCtx<'_>) -> Vec<CallInfo>;
}

static TS_JS: typescript::TsJsExtractor = typescript::TsJsExtractor;
static PYTHON: python::PythonExtractor = python::PythonExtractor;
static JAVA: java::JavaExtractor = java::JavaExtractor;
static GO: go::GoExtractor = go::GoExtractor;
static RUST: rust_lang::RustExtractor = rust_lang::RustExtractor;
static C: c_family::CFamilyExtractor = c_family::CFamilyExtractor { cpp: false };
static CPP: c_family::CFamilyExtractor = c_family::CFamilyExtractor { cpp: true };
static RUBY: ruby::RubyExtractor = ruby::RubyExtractor;

/// Select the extractor for a language tag.
pub(crate) fn extractor_for(language: Language) -> &'static dyn Extractor {
    match language {
        Language::TypeScript | Language::Tsx | Language::JavaScript | Language::Jsx => &TS_JS,
        Language::Python => &PYTHON,
        Language::Java => &JAVA,
        Language::Go => &GO,
        Language::Rust => &RUST,
        Language::C => &C,
        Language::Cpp => &CPP,
        Language::Ruby => &RUBY,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared scaffolding for the per-language extractor test modules.

    use tree_sitter::{Parser, Tree};

    use super::ExtractCtx;
    use crate::language::Language;

    pub(crate) fn parse(lang: Language, source: &str) -> Tree {
        let mut parser = Parser::new();
        parser.set_language(lang.grammar()).unwrap();
        parser.parse(source.as_bytes(), None).unwrap()
    }

    pub(crate) fn ctx<'a>(source: &'a str, path: &'a str) -> ExtractCtx<'a> {
        ExtractCtx {
            source: source.as_bytes(),
            path,
            include_anonymous: false,
            extract_documentation: true,
        }
    }
}
