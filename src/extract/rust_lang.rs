//! Entity, import and call extraction for Rust sources.
//!
//! Visibility is a `pub` prefix check on the declaration's visibility
//! modifier (`pub`, `pub(crate)`, `pub(super)` all count). `use` trees are
//! expanded recursively so `use a::{b, c as d}` yields one import entry per
//! leaf.

use tree_sitter::Node;

use super::helpers::{
    ANONYMOUS, DocStyle, doc_comment_above, entity_at, find_first_child, has_child_of_kind,
    node_text, owned_text, start_column, start_line,
};
use super::{ExtractCtx, Extractor};
use crate::model::{
    CallInfo, CodeEntity, EntityKind, EntityMetadata, ImportInfo, ParameterInfo,
};

pub(crate) struct RustExtractor;

const DOC_STYLE: DocStyle = DocStyle {
    comment_kinds: &["line_comment", "block_comment"],
    line_prefixes: &["///", "//!"],
    block_prefixes: &["/**", "/*!"],
    skip_kinds: &["attribute_item"],
};

impl Extractor for RustExtractor {
    fn entities(&self, root: Node<'_>, ctx: &ExtractCtx<'_>) -> Vec<CodeEntity> {
        let mut out = Vec::new();
        walk_entities(root, ctx, &mut out);
        out
    }

    fn imports(&self, root: Node<'_>, ctx: &ExtractCtx<'_>) -> Vec<ImportInfo> {
        let mut out = Vec::new();
        walk_imports(root, ctx, &mut out);
        out
    }

    fn calls(&self, root: Node<'_>, ctx: &ExtractCtx<'_>) -> Vec<CallInfo> {
        let mut out = Vec::new();
        walk_calls(root, None, ctx, &mut out);
        out
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

fn walk_entities(node: Node, ctx: &ExtractCtx, out: &mut Vec<CodeEntity>) {
    match node.kind() {
        "function_item" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            let metadata = EntityMetadata {
                is_async: has_async_modifier(node),
                parameters: parameters_of(node, ctx.source),
                return_type: node
                    .child_by_field_name("return_type")
                    .map(|t| owned_text(t, ctx.source)),
                type_parameters: type_parameters_of(node, ctx.source),
                documentation: doc_of(node, ctx),
                ..EntityMetadata::default()
            };
            push_entity(node, EntityKind::Function, name, ctx, metadata, out);
        }
        "struct_item" => emit_named(node, EntityKind::Class, ctx, out),
        "enum_item" => emit_named(node, EntityKind::Enum, ctx, out),
        "trait_item" => emit_named(node, EntityKind::Interface, ctx, out),
        "type_item" => emit_named(node, EntityKind::TypeAlias, ctx, out),
        "const_item" | "static_item" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            let metadata = EntityMetadata {
                return_type: node
                    .child_by_field_name("type")
                    .map(|t| owned_text(t, ctx.source)),
                documentation: doc_of(node, ctx),
                ..EntityMetadata::default()
            };
            push_entity(node, EntityKind::Variable, name, ctx, metadata, out);
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_entities(child, ctx, out);
    }
}

fn emit_named(node: Node, kind: EntityKind, ctx: &ExtractCtx, out: &mut Vec<CodeEntity>) {
    let name = node
        .child_by_field_name("name")
        .map(|n| owned_text(n, ctx.source));
    let metadata = EntityMetadata {
        type_parameters: type_parameters_of(node, ctx.source),
        documentation: doc_of(node, ctx),
        ..EntityMetadata::default()
    };
    push_entity(node, kind, name, ctx, metadata, out);
}

fn push_entity(
    node: Node,
    kind: EntityKind,
    name: Option<String>,
    ctx: &ExtractCtx,
    metadata: EntityMetadata,
    out: &mut Vec<CodeEntity>,
) {
    let name = match name {
        Some(n) => n,
        None if ctx.include_anonymous => ANONYMOUS.to_owned(),
        None => return,
    };
    let exported = is_pub(node, ctx.source);
    out.push(entity_at(node, kind, name, ctx.path, exported, metadata));
}

/// `pub`, `pub(crate)`, `pub(super)`, `pub(in …)` all export.
fn is_pub(node: Node, source: &[u8]) -> bool {
    find_first_child(node, &["visibility_modifier"])
        .is_some_and(|v| node_text(v, source).starts_with("pub"))
}

fn has_async_modifier(func: Node) -> bool {
    find_first_child(func, &["function_modifiers"])
        .is_some_and(|m| has_child_of_kind(m, "async"))
}

/// Parameters; `self` forms keep their textual decorators (`&self`,
/// `&mut self`) as the name, with no type.
fn parameters_of(func: Node, source: &[u8]) -> Vec<ParameterInfo> {
    let Some(params) = func.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut cursor = params.walk();
    for child in params.named_children(&mut cursor) {
        match child.kind() {
            "parameter" => {
                out.push(ParameterInfo {
                    name: child
                        .child_by_field_name("pattern")
                        .map(|p| owned_text(p, source))
                        .unwrap_or_default(),
                    ty: child
                        .child_by_field_name("type")
                        .map(|t| owned_text(t, source)),
                    ..ParameterInfo::default()
                });
            }
            "self_parameter" => {
                out.push(ParameterInfo::named(node_text(child, source)));
            }
            "variadic_parameter" => {
                out.push(ParameterInfo {
                    name: "...".to_owned(),
                    is_rest: true,
                    ..ParameterInfo::default()
                });
            }
            _ => {}
        }
    }
    out
}

/// Generic parameter names as written, lifetimes and bounds included.
fn type_parameters_of(node: Node, source: &[u8]) -> Vec<String> {
    let Some(params) = node.child_by_field_name("type_parameters") else {
        return Vec::new();
    };
    let mut cursor = params.walk();
    params
        .named_children(&mut cursor)
        .map(|p| owned_text(p, source))
        .collect()
}

fn doc_of(node: Node, ctx: &ExtractCtx) -> Option<String> {
    if !ctx.extract_documentation {
        return None;
    }
    doc_comment_above(node, ctx.source, &DOC_STYLE)
}

// ---------------------------------------------------------------------------
// Imports
// ---------------------------------------------------------------------------

fn walk_imports(node: Node, ctx: &ExtractCtx, out: &mut Vec<ImportInfo>) {
    if node.kind() == "use_declaration"
        && let Some(argument) = node.child_by_field_name("argument")
    {
        expand_use(argument, "", start_line(node), ctx, out);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_imports(child, ctx, out);
    }
}

/// Recursive use-tree expansion: `use a::{b, c as d, e::*}` becomes one
/// entry per leaf.
fn expand_use(node: Node, prefix: &str, line: usize, ctx: &ExtractCtx, out: &mut Vec<ImportInfo>) {
    match node.kind() {
        "identifier" | "crate" | "self" | "super" | "metavariable" => {
            let name = owned_text(node, ctx.source);
            let source = join_path(prefix, &name);
            out.push(leaf_import(source, name, None, line));
        }
        "scoped_identifier" => {
            let source = join_path(prefix, node_text(node, ctx.source));
            let name = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source))
                .unwrap_or_default();
            out.push(leaf_import(source, name, None, line));
        }
        "use_as_clause" => {
            let Some(path) = node.child_by_field_name("path") else {
                return;
            };
            let source = join_path(prefix, node_text(path, ctx.source));
            let name = last_segment(node_text(path, ctx.source)).to_owned();
            let alias = node
                .child_by_field_name("alias")
                .map(|a| owned_text(a, ctx.source));
            out.push(leaf_import(source, name, alias, line));
        }
        "use_list" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                expand_use(child, prefix, line, ctx, out);
            }
        }
        "scoped_use_list" => {
            let new_prefix = node
                .child_by_field_name("path")
                .map(|p| join_path(prefix, node_text(p, ctx.source)))
                .unwrap_or_else(|| prefix.to_owned());
            if let Some(list) = node.child_by_field_name("list") {
                expand_use(list, &new_prefix, line, ctx, out);
            }
        }
        "use_wildcard" => {
            let source = node
                .named_child(0)
                .map(|p| join_path(prefix, node_text(p, ctx.source)))
                .unwrap_or_else(|| prefix.to_owned());
            out.push(ImportInfo {
                is_relative: is_relative_path(&source),
                imported_names: vec!["*".to_owned()],
                namespace_import: Some("*".to_owned()),
                is_side_effect: true,
                line,
                source,
                ..ImportInfo::default()
            });
        }
        _ => {}
    }
}

fn leaf_import(source: String, name: String, alias: Option<String>, line: usize) -> ImportInfo {
    let mut info = ImportInfo {
        is_relative: is_relative_path(&source),
        line,
        source,
        ..ImportInfo::default()
    };
    if let Some(alias) = alias {
        info.aliases.insert(name.clone(), alias);
    }
    info.imported_names.push(name);
    info
}

fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_owned()
    } else {
        format!("{prefix}::{segment}")
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// Paths rooted in the current crate/module are relative in this
/// language's sense.
fn is_relative_path(path: &str) -> bool {
    let first = path.split("::").next().unwrap_or(path);
    matches!(first, "crate" | "self" | "super")
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

fn walk_calls(node: Node, caller: Option<&str>, ctx: &ExtractCtx, out: &mut Vec<CallInfo>) {
    let named: Option<String>;
    let next_caller: Option<&str> = match node.kind() {
        "function_item" => {
            named = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            named.as_deref()
        }
        "closure_expression" => None,
        _ => caller,
    };

    if node.kind() == "call_expression" {
        emit_call(node, next_caller, ctx, out);
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_calls(child, next_caller, ctx, out);
    }
}

fn emit_call(node: Node, caller: Option<&str>, ctx: &ExtractCtx, out: &mut Vec<CallInfo>) {
    let Some(func) = node.child_by_field_name("function") else {
        return;
    };
    let (called_name, called_expression) = resolve_target(func, ctx.source);
    out.push(CallInfo {
        called_name,
        called_expression,
        is_async: false,
        line: start_line(node),
        column: start_column(node),
        caller_name: caller.map(str::to_owned),
    });
}

fn resolve_target(func: Node, source: &[u8]) -> (String, String) {
    let full = owned_text(func, source);
    match func.kind() {
        "identifier" => (full.clone(), full),
        // `a::b::c(…)` — the last segment names the call.
        "scoped_identifier" => {
            let name = func
                .child_by_field_name("name")
                .map(|n| owned_text(n, source))
                .unwrap_or_else(|| last_segment(&full).to_owned());
            (name, full)
        }
        // Method call `value.method(…)`.
        "field_expression" => {
            let name = func
                .child_by_field_name("field")
                .map(|f| owned_text(f, source))
                .unwrap_or_else(|| "[dynamic]".to_owned());
            (name, full)
        }
        // Turbofish `f::<T>(…)` — resolve through the function child.
        "generic_function" => match func.child_by_field_name("function") {
            Some(inner) => {
                let (name, _) = resolve_target(inner, source);
                (name, full)
            }
            None => ("[dynamic]".to_owned(), full),
        },
        "call_expression" => ("[chained]".to_owned(), full),
        "parenthesized_expression" => match func.named_child(0) {
            Some(inner) => {
                let (name, _) = resolve_target(inner, source);
                (name, full)
            }
            None => ("[dynamic]".to_owned(), full),
        },
        _ => ("[dynamic]".to_owned(), full),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::test_support::{ctx, parse};
    use crate::language::Language;

    fn entities_of(src: &str) -> Vec<CodeEntity> {
        let tree = parse(Language::Rust, src);
        RustExtractor.entities(tree.root_node(), &ctx(src, "m.rs"))
    }

    fn imports_of(src: &str) -> Vec<ImportInfo> {
        let tree = parse(Language::Rust, src);
        RustExtractor.imports(tree.root_node(), &ctx(src, "m.rs"))
    }

    fn calls_of(src: &str) -> Vec<CallInfo> {
        let tree = parse(Language::Rust, src);
        RustExtractor.calls(tree.root_node(), &ctx(src, "m.rs"))
    }

    // Spec scenario: use with aliasing and wildcard.
    #[test]
    fn test_use_aliasing_and_wildcard() {
        let src = "use std::io::{Read as R, Write};\nuse crate::util::*;\npub fn run() { helper(); }\n";
        let imports = imports_of(src);
        assert_eq!(imports.len(), 3);

        let read = &imports[0];
        assert_eq!(read.source, "std::io::Read");
        assert_eq!(read.imported_names, vec!["Read".to_owned()]);
        assert_eq!(read.aliases.get("Read").map(String::as_str), Some("R"));
        assert!(!read.is_relative);

        let write = &imports[1];
        assert_eq!(write.source, "std::io::Write");
        assert_eq!(write.imported_names, vec!["Write".to_owned()]);

        let glob = &imports[2];
        assert_eq!(glob.source, "crate::util");
        assert!(glob.is_relative);
        assert_eq!(glob.namespace_import.as_deref(), Some("*"));
        assert!(glob.is_side_effect);

        let entities = entities_of(src);
        assert_eq!(entities[0].kind, EntityKind::Function);
        assert_eq!(entities[0].name, "run");
        assert!(entities[0].is_exported);

        let calls = calls_of(src);
        assert_eq!(calls[0].called_name, "helper");
        assert_eq!(calls[0].caller_name.as_deref(), Some("run"));
    }

    #[test]
    fn test_visibility_prefix_rule() {
        let src = "pub fn a() {}\npub(crate) fn b() {}\nfn c() {}\n";
        let entities = entities_of(src);
        assert!(entities.iter().find(|e| e.name == "a").unwrap().is_exported);
        assert!(entities.iter().find(|e| e.name == "b").unwrap().is_exported);
        assert!(!entities.iter().find(|e| e.name == "c").unwrap().is_exported);
    }

    #[test]
    fn test_item_kinds() {
        let src = concat!(
            "pub struct Point;\n",
            "enum Shape { Circle }\n",
            "pub trait Draw {}\n",
            "type Alias = u8;\n",
            "const MAX: usize = 10;\n",
            "static NAME: &str = \"x\";\n",
        );
        let entities = entities_of(src);
        let kind_of = |name: &str| entities.iter().find(|e| e.name == name).unwrap().kind;
        assert_eq!(kind_of("Point"), EntityKind::Class);
        assert_eq!(kind_of("Shape"), EntityKind::Enum);
        assert_eq!(kind_of("Draw"), EntityKind::Interface);
        assert_eq!(kind_of("Alias"), EntityKind::TypeAlias);
        assert_eq!(kind_of("MAX"), EntityKind::Variable);
        assert_eq!(kind_of("NAME"), EntityKind::Variable);

        let max = entities.iter().find(|e| e.name == "MAX").unwrap();
        assert_eq!(max.metadata.return_type.as_deref(), Some("usize"));
    }

    #[test]
    fn test_async_fn_and_self_parameter() {
        let src = "impl S {\n    pub async fn send(&mut self, payload: Vec<u8>) -> Result<(), Error> { Ok(()) }\n}\n";
        let entities = entities_of(src);
        let send = &entities[0];
        assert_eq!(send.kind, EntityKind::Function);
        assert!(send.metadata.is_async);
        assert!(send.is_exported);

        let params = &send.metadata.parameters;
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "&mut self");
        assert!(params[0].ty.is_none());
        assert_eq!(params[1].name, "payload");
        assert_eq!(params[1].ty.as_deref(), Some("Vec<u8>"));
        assert_eq!(
            send.metadata.return_type.as_deref(),
            Some("Result<(), Error>")
        );
    }

    #[test]
    fn test_generics_include_lifetimes() {
        let src = "pub fn parse<'a, T: AsRef<str>>(input: &'a T) {}\n";
        let entities = entities_of(src);
        let tp = &entities[0].metadata.type_parameters;
        assert_eq!(tp.len(), 2);
        assert_eq!(tp[0], "'a");
        assert_eq!(tp[1], "T: AsRef<str>");
    }

    #[test]
    fn test_doc_comments_with_attributes_between() {
        let src = "/// Runs the loop.\n/// Blocking.\n#[inline]\npub fn run() {}\n";
        let entities = entities_of(src);
        assert_eq!(
            entities[0].metadata.documentation.as_deref(),
            Some("/// Runs the loop.\n/// Blocking.")
        );
    }

    #[test]
    fn test_plain_use_forms() {
        let src = "use std::fmt;\nuse serde::Deserialize as De;\nuse super::helper;\n";
        let imports = imports_of(src);

        assert_eq!(imports[0].source, "std::fmt");
        assert_eq!(imports[0].imported_names, vec!["fmt".to_owned()]);

        assert_eq!(imports[1].source, "serde::Deserialize");
        assert_eq!(
            imports[1].aliases.get("Deserialize").map(String::as_str),
            Some("De")
        );

        assert_eq!(imports[2].source, "super::helper");
        assert!(imports[2].is_relative);
    }

    #[test]
    fn test_call_shapes() {
        let src = "fn go() {\n    plain();\n    util::scoped();\n    value.method();\n    parse::<u32>();\n    fetcher()();\n}\n";
        let calls = calls_of(src);
        let names: Vec<&str> = calls.iter().map(|c| c.called_name.as_str()).collect();
        assert!(names.contains(&"plain"));
        assert!(names.contains(&"scoped"));
        assert!(names.contains(&"method"));
        assert!(names.contains(&"parse"));
        assert!(names.contains(&"[chained]"));

        let scoped = calls.iter().find(|c| c.called_name == "scoped").unwrap();
        assert_eq!(scoped.called_expression, "util::scoped");
        assert_eq!(scoped.caller_name.as_deref(), Some("go"));
        assert!(calls.iter().all(|c| !c.is_async), "Rust calls are never awaited-async");
    }

    #[test]
    fn test_closure_clears_caller() {
        let src = "fn go() { let f = || inner(); f(); }\n";
        let calls = calls_of(src);
        let inner = calls.iter().find(|c| c.called_name == "inner").unwrap();
        assert_eq!(inner.caller_name, None);
    }
}
