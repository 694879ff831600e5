//! Polyglot source-code extraction core for knowledge-graph ingestion.
//!
//! Takes a source file (bytes plus a logical path) and produces a
//! structured, language-agnostic summary of its code entities, imports,
//! exports and intra-file call sites, ready for a graph-storage layer to
//! turn into nodes and relationships.
//!
//! Eight language families sit behind one output schema: TypeScript/TSX,
//! JavaScript/JSX, Python, Java, Go, Rust, C, C++ and Ruby. Each file is
//! parsed once with tree-sitter under a per-file time budget and size cap;
//! failures map to typed errors with stable codes so upstream retry logic
//! can tell a timeout from a bad input.
//!
//! ```no_run
//! use codegraph_extract::{ExtractorConfig, SourceExtractor};
//!
//! let extractor = SourceExtractor::new(ExtractorConfig::default());
//! let source = b"export function greet(name: string) { console.log(name); }";
//! let result = extractor.parse_file(source, "src/greet.ts")?;
//!
//! assert!(result.success);
//! for entity in &result.entities {
//!     println!("{} {} at line {}", entity.kind, entity.name, entity.line_start);
//! }
//! # Ok::<(), codegraph_extract::ExtractError>(())
//! ```
//!
//! The crate is library-shaped: it opens no files and reads no environment.
//! Callers own file IO and concurrency — `parse_file` is a single-call,
//! possibly blocking operation that is safe to invoke from many threads at
//! once.

pub mod config;
pub mod error;
pub mod language;
pub mod model;
pub mod registry;

mod extract;
mod extractor;
mod walker;

pub use config::ExtractorConfig;
pub use error::{CODE_EXTRACTION_FAILED, CODE_PARSE_FAILED, ExtractError};
pub use extractor::SourceExtractor;
pub use language::Language;
pub use model::{
    CallInfo, CodeEntity, EntityKind, EntityMetadata, ExportInfo, ImportInfo, ParameterInfo,
    ParseError, ParseResult,
};
