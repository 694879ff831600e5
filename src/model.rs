use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::language::Language;

/// The kind of code entity extracted from source code.
///
/// Serialized as the stable lowercase tag the graph ingestion layer keys on
/// (`"type_alias"`, `"method"`, …).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A free function, arrow function, or named function expression.
    Function,
    /// A method defined on a class, trait, struct, or module.
    Method,
    /// A class, struct, union, Go type, or Ruby class/module.
    Class,
    /// A TypeScript/Java interface or Rust trait.
    Interface,
    /// An enum declaration.
    Enum,
    /// A type alias (`type X = …`, `typedef`).
    TypeAlias,
    /// A module-level variable, constant, or static.
    Variable,
    /// A class field, interface property, or property signature.
    Property,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            EntityKind::Function => "function",
            EntityKind::Method => "method",
            EntityKind::Class => "class",
            EntityKind::Interface => "interface",
            EntityKind::Enum => "enum",
            EntityKind::TypeAlias => "type_alias",
            EntityKind::Variable => "variable",
            EntityKind::Property => "property",
        };
        f.write_str(tag)
    }
}

/// A single parameter of a function or method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterInfo {
    /// Parameter identifier. `"<unnamed>"` for anonymous C parameters,
    /// `"..."` for a bare C variadic.
    pub name: String,
    /// Textual type annotation, when the source expresses one.
    #[serde(rename = "type")]
    pub ty: Option<String>,
    /// True iff a default value is syntactically present.
    pub has_default: bool,
    /// True iff the language marks the parameter optional (`x?: T`).
    pub is_optional: bool,
    /// True iff variadic (`...args`, `*args`, `**kwargs`, Go/Java varargs).
    pub is_rest: bool,
}

impl ParameterInfo {
    /// A plain named parameter with no annotations.
    pub fn named(name: impl Into<String>) -> Self {
        ParameterInfo {
            name: name.into(),
            ..ParameterInfo::default()
        }
    }
}

/// Optional, language-independent attributes attached to a [`CodeEntity`].
///
/// Every flag defaults to `false`; every collection defaults to empty. Each
/// language fills the subset its AST expresses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityMetadata {
    /// Declared `async` (TS/JS, Python, Rust).
    #[serde(default)]
    pub is_async: bool,
    /// Declared `static` (TS/JS, Java) or a Ruby singleton method.
    #[serde(default)]
    pub is_static: bool,
    /// Declared `abstract` (TS, Java).
    #[serde(default)]
    pub is_abstract: bool,
    /// A generator function (`function*`).
    #[serde(default)]
    pub is_generator: bool,
    /// Ordered parameter list.
    #[serde(default)]
    pub parameters: Vec<ParameterInfo>,
    /// Printed return type, when the source expresses one.
    pub return_type: Option<String>,
    /// Single parent name: class superclass, or the receiver type for Go
    /// methods.
    pub extends: Option<String>,
    /// Implemented interfaces / additional parents.
    #[serde(default)]
    pub implements: Vec<String>,
    /// Generic parameter names, as written.
    #[serde(default)]
    pub type_parameters: Vec<String>,
    /// Raw text of the attached doc comment, markers included.
    pub documentation: Option<String>,
}

/// A declaration surfaced as a candidate graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeEntity {
    /// The kind of declaration.
    pub kind: EntityKind,
    /// Declared identifier, or `"<anonymous>"` when anonymous entities are
    /// enabled.
    pub name: String,
    /// The file path the entity was extracted from.
    pub path: String,
    /// 1-based first source line of the declaration.
    pub line_start: usize,
    /// 1-based last source line of the declaration (inclusive).
    pub line_end: usize,
    /// 0-based start column.
    pub column_start: usize,
    /// 0-based end column.
    pub column_end: usize,
    /// Visible outside its defining unit per the language's own rules.
    pub is_exported: bool,
    /// Optional language-independent attributes.
    #[serde(default)]
    pub metadata: EntityMetadata,
}

/// An import extracted from a source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportInfo {
    /// The imported module / path / package as written, quotes stripped.
    pub source: String,
    /// True iff the import is relative in its language's sense (leading
    /// `.`/`./`/`../`, Rust `crate`/`self`/`super`, local C `"…"` include).
    pub is_relative: bool,
    /// The ordered names the import binds. `["*"]` for wildcards, empty for
    /// pure side-effect imports.
    #[serde(default)]
    pub imported_names: Vec<String>,
    /// Original name → local alias, when an alias is present.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    /// The single default-bound name (TS/JS only).
    pub default_import: Option<String>,
    /// The name bound to the whole module (TS/JS `* as N`; `"*"` marker for
    /// Rust wildcard imports).
    pub namespace_import: Option<String>,
    /// Type-only form (TS `import type`; Java non-static imports).
    pub is_type_only: bool,
    /// True iff the import binds no names.
    pub is_side_effect: bool,
    /// 1-based line of the import.
    pub line: usize,
}

/// An export statement (TS/JS only; other languages carry visibility on the
/// entity itself).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportInfo {
    /// The exported names. `["default"]` for a default export.
    #[serde(default)]
    pub exported_names: Vec<String>,
    /// Original name → exported alias for `export { a as b }`.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    /// Re-export source module, when present.
    pub source: Option<String>,
    /// `export type { … }` form.
    pub is_type_only: bool,
    /// `export * [as ns] from "…"` form.
    pub is_namespace_export: bool,
    /// 1-based line of the export.
    pub line: usize,
}

/// A syntactic invocation site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallInfo {
    /// Last-segment name being invoked (`foo` in `a.b.foo()`), or a sentinel
    /// such as `[chained]` / `[dynamic]` for non-simple targets.
    pub called_name: String,
    /// The full textual target expression.
    pub called_expression: String,
    /// True iff the call is awaited at its call site (TS/JS, Python).
    pub is_async: bool,
    /// 1-based line of the call.
    pub line: usize,
    /// 0-based column of the call.
    pub column: usize,
    /// Name of the lexically enclosing function/method, when deducible.
    pub caller_name: Option<String>,
}

/// A syntax or extraction failure that did not abort the whole file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    /// Short human-readable description.
    pub message: String,
    /// 1-based line, when the failure has a location.
    pub line: Option<usize>,
    /// 0-based column, when the failure has a location.
    pub column: Option<usize>,
    /// Syntax errors are recoverable; whole-file failures are not.
    pub recoverable: bool,
}

impl ParseError {
    /// A recoverable, located error (syntax error or per-node extraction
    /// failure).
    pub fn recoverable(message: impl Into<String>, line: usize, column: usize) -> Self {
        ParseError {
            message: message.into(),
            line: Some(line),
            column: Some(column),
            recoverable: true,
        }
    }

    /// An unlocated recoverable error.
    pub fn recoverable_unlocated(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
            line: None,
            column: None,
            recoverable: true,
        }
    }

    /// A non-recoverable, whole-file failure.
    pub fn fatal(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
            line: None,
            column: None,
            recoverable: false,
        }
    }
}

/// The result of extracting a single source file.
///
/// All four streams preserve source order. Everything in the result owns its
/// strings — nothing borrows from the parse tree, which is dropped before
/// this struct is returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    /// Echoed input path.
    pub path: String,
    /// The language the file was parsed as.
    pub language: Language,
    /// Declarations, in source order.
    pub entities: Vec<CodeEntity>,
    /// Imports, in source order.
    pub imports: Vec<ImportInfo>,
    /// Exports, in source order (always empty outside TS/JS).
    pub exports: Vec<ExportInfo>,
    /// Call sites, in source order.
    pub calls: Vec<CallInfo>,
    /// Wall-clock duration of the extraction, in milliseconds.
    pub parse_time_ms: u64,
    /// Recoverable (and, on whole-file failure, one fatal) errors.
    pub errors: Vec<ParseError>,
    /// True iff a tree was obtained and extraction completed.
    pub success: bool,
}

impl ParseResult {
    /// An unsuccessful result carrying a single fatal error and empty
    /// streams.
    pub(crate) fn failed(path: &str, language: Language, error: ParseError) -> Self {
        ParseResult {
            path: path.to_owned(),
            language,
            entities: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            calls: Vec::new(),
            parse_time_ms: 0,
            errors: vec![error],
            success: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_serializes_to_snake_case() {
        assert_eq!(
            serde_json::to_string(&EntityKind::TypeAlias).unwrap(),
            "\"type_alias\""
        );
        assert_eq!(
            serde_json::to_string(&EntityKind::Function).unwrap(),
            "\"function\""
        );
    }

    #[test]
    fn test_entity_kind_display_matches_serde_tag() {
        for kind in [
            EntityKind::Function,
            EntityKind::Method,
            EntityKind::Class,
            EntityKind::Interface,
            EntityKind::Enum,
            EntityKind::TypeAlias,
            EntityKind::Variable,
            EntityKind::Property,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    #[test]
    fn test_parse_result_round_trips_through_json() {
        let result = ParseResult {
            path: "a.ts".into(),
            language: Language::TypeScript,
            entities: vec![CodeEntity {
                kind: EntityKind::Class,
                name: "Svc".into(),
                path: "a.ts".into(),
                line_start: 1,
                line_end: 3,
                column_start: 0,
                column_end: 1,
                is_exported: true,
                metadata: EntityMetadata {
                    parameters: vec![ParameterInfo {
                        name: "url".into(),
                        ty: Some("string".into()),
                        ..ParameterInfo::default()
                    }],
                    ..EntityMetadata::default()
                },
            }],
            imports: Vec::new(),
            exports: Vec::new(),
            calls: vec![CallInfo {
                called_name: "call".into(),
                called_expression: "call".into(),
                is_async: true,
                line: 2,
                column: 45,
                caller_name: Some("fetch".into()),
            }],
            parse_time_ms: 3,
            errors: Vec::new(),
            success: true,
        };

        let json = serde_json::to_string(&result).unwrap();
        let back: ParseResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_parameter_named_has_no_annotations() {
        let p = ParameterInfo::named("x");
        assert_eq!(p.name, "x");
        assert!(p.ty.is_none());
        assert!(!p.has_default && !p.is_optional && !p.is_rest);
    }

    #[test]
    fn test_parse_error_constructors() {
        let syn = ParseError::recoverable("Syntax error: unexpected ERROR", 3, 0);
        assert!(syn.recoverable);
        assert_eq!(syn.line, Some(3));

        let fatal = ParseError::fatal("Failed to parse file: parser returned null");
        assert!(!fatal.recoverable);
        assert!(fatal.line.is_none());
    }
}
