//! Entity, import and call extraction for Ruby.
//!
//! Ruby has no import statement: `require` / `require_relative` / `load`
//! calls with a literal string argument are lifted into the import stream
//! and excluded from the call stream. Modules surface as classes so the
//! uniform schema holds.

use tree_sitter::Node;

use super::helpers::{
    ANONYMOUS, DocStyle, doc_comment_above, entity_at, node_text, owned_text, start_column,
    start_line, strip_quotes,
};
use super::{ExtractCtx, Extractor};
use crate::model::{
    CallInfo, CodeEntity, EntityKind, EntityMetadata, ImportInfo, ParameterInfo,
};

pub(crate) struct RubyExtractor;

const DOC_STYLE: DocStyle = DocStyle {
    comment_kinds: &["comment"],
    line_prefixes: &["#"],
    block_prefixes: &[],
    skip_kinds: &[],
};

const REQUIRE_METHODS: &[&str] = &["require", "require_relative", "load"];

impl Extractor for RubyExtractor {
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
        "class" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            let metadata = EntityMetadata {
                extends: superclass_of(node, ctx.source),
                documentation: doc_of(node, ctx),
                ..EntityMetadata::default()
            };
            push_entity(node, EntityKind::Class, name, ctx, metadata, out);
        }
        // Modules are namespace-shaped containers; the schema folds them
        // into the class kind.
        "module" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            let metadata = EntityMetadata {
                documentation: doc_of(node, ctx),
                ..EntityMetadata::default()
            };
            push_entity(node, EntityKind::Class, name, ctx, metadata, out);
        }
        "method" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            let metadata = EntityMetadata {
                parameters: parameters_of(node, ctx.source),
                documentation: doc_of(node, ctx),
                ..EntityMetadata::default()
            };
            push_entity(node, EntityKind::Method, name, ctx, metadata, out);
        }
        "singleton_method" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            let metadata = EntityMetadata {
                is_static: true,
                parameters: parameters_of(node, ctx.source),
                documentation: doc_of(node, ctx),
                ..EntityMetadata::default()
            };
            push_entity(node, EntityKind::Method, name, ctx, metadata, out);
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_entities(child, ctx, out);
    }
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
    out.push(entity_at(node, kind, name, ctx.path, true, metadata));
}

fn superclass_of(class_node: Node, source: &[u8]) -> Option<String> {
    let superclass = class_node.child_by_field_name("superclass")?;
    superclass.named_child(0).map(|n| owned_text(n, source))
}

fn parameters_of(method: Node, source: &[u8]) -> Vec<ParameterInfo> {
    let Some(params) = method.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut cursor = params.walk();
    for child in params.named_children(&mut cursor) {
        match child.kind() {
            "identifier" => out.push(ParameterInfo::named(node_text(child, source))),
            "optional_parameter" => {
                out.push(ParameterInfo {
                    name: child
                        .child_by_field_name("name")
                        .map(|n| owned_text(n, source))
                        .unwrap_or_default(),
                    has_default: true,
                    is_optional: true,
                    ..ParameterInfo::default()
                });
            }
            "keyword_parameter" => {
                out.push(ParameterInfo {
                    name: child
                        .child_by_field_name("name")
                        .map(|n| owned_text(n, source))
                        .unwrap_or_default(),
                    has_default: child.child_by_field_name("value").is_some(),
                    ..ParameterInfo::default()
                });
            }
            "splat_parameter" | "hash_splat_parameter" => {
                out.push(ParameterInfo {
                    name: child
                        .child_by_field_name("name")
                        .map(|n| owned_text(n, source))
                        .unwrap_or_else(|| node_text(child, source).to_owned()),
                    is_rest: true,
                    ..ParameterInfo::default()
                });
            }
            "block_parameter" => {
                out.push(ParameterInfo {
                    name: child
                        .child_by_field_name("name")
                        .map(|n| owned_text(n, source))
                        .unwrap_or_default(),
                    ..ParameterInfo::default()
                });
            }
            _ => {}
        }
    }
    out
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
    if let Some((method, source)) = require_call(node, ctx) {
        let is_relative =
            method == "require_relative" || source.starts_with("./") || source.starts_with("../");
        out.push(ImportInfo {
            is_relative,
            is_side_effect: true,
            line: start_line(node),
            source,
            ..ImportInfo::default()
        });
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_imports(child, ctx, out);
    }
}

/// `require "x"` / `require_relative "x"` / `load "x"` with a single string
/// argument, no receiver.
fn require_call<'a>(node: Node<'a>, ctx: &ExtractCtx<'a>) -> Option<(&'a str, String)> {
    if node.kind() != "call" || node.child_by_field_name("receiver").is_some() {
        return None;
    }
    let method = node.child_by_field_name("method")?;
    let method_name = node_text(method, ctx.source);
    if !REQUIRE_METHODS.contains(&method_name) {
        return None;
    }
    let args = node.child_by_field_name("arguments")?;
    let first = args.named_child(0)?;
    if first.kind() != "string" {
        return None;
    }
    Some((
        method_name,
        strip_quotes(node_text(first, ctx.source)).to_owned(),
    ))
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

fn walk_calls(node: Node, caller: Option<&str>, ctx: &ExtractCtx, out: &mut Vec<CallInfo>) {
    let named: Option<String>;
    let next_caller: Option<&str> = match node.kind() {
        "method" | "singleton_method" => {
            named = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            named.as_deref()
        }
        "lambda" => None,
        _ => caller,
    };

    // Requires are imports, not calls.
    if node.kind() == "call" && require_call(node, ctx).is_none() {
        emit_call(node, next_caller, ctx, out);
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_calls(child, next_caller, ctx, out);
    }
}

fn emit_call(node: Node, caller: Option<&str>, ctx: &ExtractCtx, out: &mut Vec<CallInfo>) {
    let Some(method) = node.child_by_field_name("method") else {
        return;
    };
    let called_name = owned_text(method, ctx.source);
    let called_expression = match node.child_by_field_name("receiver") {
        Some(receiver) => format!("{}.{}", node_text(receiver, ctx.source), called_name),
        None => called_name.clone(),
    };
    out.push(CallInfo {
        called_name,
        called_expression,
        is_async: false,
        line: start_line(node),
        column: start_column(node),
        caller_name: caller.map(str::to_owned),
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
