//! Entity, import and call extraction for Go.
//!
//! Go's export rule is purely lexical — an uppercase first letter — and a
//! method's receiver type doubles as its owning type (surfaced through the
//! `extends` metadata slot).

use tree_sitter::Node;

use super::helpers::{
    ANONYMOUS, DocStyle, doc_comment_above, entity_at, find_first_child, node_text, owned_text,
    start_column, start_line, strip_quotes,
};
use super::{ExtractCtx, Extractor};
use crate::model::{
    CallInfo, CodeEntity, EntityKind, EntityMetadata, ImportInfo, ParameterInfo,
};

pub(crate) struct GoExtractor;

const DOC_STYLE: DocStyle = DocStyle {
    comment_kinds: &["comment"],
    line_prefixes: &["//"],
    block_prefixes: &["/*"],
    skip_kinds: &[],
};

impl Extractor for GoExtractor {
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

/// Go's convention: exported iff the first character is uppercase ASCII.
fn is_exported_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

fn walk_entities(node: Node, ctx: &ExtractCtx, out: &mut Vec<CodeEntity>) {
    match node.kind() {
        "function_declaration" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            let metadata = EntityMetadata {
                parameters: parameters_of(node, ctx.source),
                return_type: node
                    .child_by_field_name("result")
                    .map(|r| owned_text(r, ctx.source)),
                type_parameters: type_parameters_of(node, ctx.source),
                documentation: doc_of(node, ctx),
                ..EntityMetadata::default()
            };
            push_entity(node, EntityKind::Function, name, ctx, metadata, out);
        }
        "method_declaration" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            let metadata = EntityMetadata {
                parameters: parameters_of(node, ctx.source),
                return_type: node
                    .child_by_field_name("result")
                    .map(|r| owned_text(r, ctx.source)),
                // The receiver's type is the owning type.
                extends: receiver_type(node, ctx.source),
                documentation: doc_of(node, ctx),
                ..EntityMetadata::default()
            };
            push_entity(node, EntityKind::Method, name, ctx, metadata, out);
        }
        // `type ( A struct{…}; B interface{…} )` — one entity per spec.
        "type_declaration" => {
            let mut cursor = node.walk();
            for spec in node.named_children(&mut cursor) {
                if !matches!(spec.kind(), "type_spec" | "type_alias") {
                    continue;
                }
                let name = spec
                    .child_by_field_name("name")
                    .map(|n| owned_text(n, ctx.source));
                let metadata = EntityMetadata {
                    type_parameters: type_parameters_of(spec, ctx.source),
                    documentation: doc_of(node, ctx),
                    ..EntityMetadata::default()
                };
                push_entity(node, EntityKind::Class, name, ctx, metadata, out);
            }
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
    let exported = is_exported_name(&name);
    out.push(entity_at(node, kind, name, ctx.path, exported, metadata));
}

/// Parameters, expanding shared-type groups (`a, b int`) into one entry per
/// name and marking variadics.
fn parameters_of(func: Node, source: &[u8]) -> Vec<ParameterInfo> {
    let Some(params) = func.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut cursor = params.walk();
    for child in params.named_children(&mut cursor) {
        match child.kind() {
            "parameter_declaration" => expand_parameter(child, false, source, &mut out),
            "variadic_parameter_declaration" => expand_parameter(child, true, source, &mut out),
            _ => {}
        }
    }
    out
}

fn expand_parameter(decl: Node, is_rest: bool, source: &[u8], out: &mut Vec<ParameterInfo>) {
    let ty = decl
        .child_by_field_name("type")
        .map(|t| owned_text(t, source));

    let mut names = Vec::new();
    let mut cursor = decl.walk();
    for child in decl.named_children(&mut cursor) {
        if child.kind() == "identifier" {
            names.push(owned_text(child, source));
        }
    }

    if names.is_empty() {
        // Type-only parameter, e.g. in `func(int, string)`.
        out.push(ParameterInfo {
            name: "<unnamed>".to_owned(),
            ty,
            is_rest,
            ..ParameterInfo::default()
        });
        return;
    }
    for name in names {
        out.push(ParameterInfo {
            name,
            ty: ty.clone(),
            is_rest,
            ..ParameterInfo::default()
        });
    }
}

/// Receiver type text (`*Server` in `func (s *Server) …`).
fn receiver_type(method: Node, source: &[u8]) -> Option<String> {
    let receiver = method.child_by_field_name("receiver")?;
    let param = find_first_child(receiver, &["parameter_declaration"])?;
    param
        .child_by_field_name("type")
        .map(|t| owned_text(t, source))
}

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
    if node.kind() == "import_declaration" {
        collect_import_specs(node, ctx, out);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_imports(child, ctx, out);
    }
}

/// Handles both `import "pkg"` and the grouped `import ( … )` form.
fn collect_import_specs(node: Node, ctx: &ExtractCtx, out: &mut Vec<ImportInfo>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "import_spec" => out.push(import_spec(child, ctx)),
            "import_spec_list" => {
                let mut specs = child.walk();
                for spec in child.named_children(&mut specs) {
                    if spec.kind() == "import_spec" {
                        out.push(import_spec(spec, ctx));
                    }
                }
            }
            _ => {}
        }
    }
}

fn import_spec(spec: Node, ctx: &ExtractCtx) -> ImportInfo {
    let path = spec
        .child_by_field_name("path")
        .map(|p| strip_quotes(node_text(p, ctx.source)).to_owned())
        .unwrap_or_default();
    let package = path.rsplit('/').next().unwrap_or(&path).to_owned();

    let mut info = ImportInfo {
        is_relative: path.starts_with('.'),
        line: start_line(spec),
        ..ImportInfo::default()
    };

    match spec.child_by_field_name("name") {
        // Blank import: side effect only, binds nothing.
        Some(name) if name.kind() == "blank_identifier" => {
            info.is_side_effect = true;
        }
        // Dot import: recorded without an alias.
        Some(name) if name.kind() == "dot" => {
            info.imported_names.push(package);
        }
        Some(name) => {
            let alias = owned_text(name, ctx.source);
            info.aliases.insert(package.clone(), alias);
            info.imported_names.push(package);
        }
        None => info.imported_names.push(package),
    }
    info.source = path;
    info
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

fn walk_calls(node: Node, caller: Option<&str>, ctx: &ExtractCtx, out: &mut Vec<CallInfo>) {
    let named: Option<String>;
    let next_caller: Option<&str> = match node.kind() {
        "function_declaration" | "method_declaration" => {
            named = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            named.as_deref()
        }
        "func_literal" => None,
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
        "selector_expression" => {
            let name = func
                .child_by_field_name("field")
                .map(|f| owned_text(f, source))
                .unwrap_or_else(|| "[dynamic]".to_owned());
            (name, full)
        }
        // Generic instantiation `f[T](…)` and map/slice element calls.
        "index_expression" => ("[index]".to_owned(), full),
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
