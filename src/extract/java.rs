//! Entity, import and call extraction for Java.
//!
//! Java visibility lives in modifiers, not an export flag — every entity
//! carries `is_exported = false` and the modifier-derived flags sit in
//! metadata. Constructor invocations (`new Foo()`) ARE part of the call
//! stream here, unlike TS/JS.

use tree_sitter::Node;

use super::helpers::{
    ANONYMOUS, DocStyle, doc_comment_above, entity_at, find_first_child, has_child_of_kind,
    node_text, owned_text, start_column, start_line,
};
use super::{ExtractCtx, Extractor};
use crate::model::{
    CallInfo, CodeEntity, EntityKind, EntityMetadata, ImportInfo, ParameterInfo,
};

pub(crate) struct JavaExtractor;

const DOC_STYLE: DocStyle = DocStyle {
    comment_kinds: &["block_comment", "comment"],
    line_prefixes: &[],
    block_prefixes: &["/**"],
    skip_kinds: &[],
};

impl Extractor for JavaExtractor {
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
        "class_declaration" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            let mut metadata = modifier_metadata(node);
            metadata.extends = find_first_child(node, &["superclass"])
                .and_then(|s| s.named_child(0))
                .map(|t| owned_text(t, ctx.source));
            metadata.implements = type_list_of(node, "super_interfaces", ctx.source);
            metadata.type_parameters = type_parameters_of(node, ctx.source);
            metadata.documentation = doc_of(node, ctx);
            push_entity(node, EntityKind::Class, name, ctx, metadata, out);
        }
        "interface_declaration" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            let mut metadata = modifier_metadata(node);
            // `interface A extends B, C` — collected as implements for
            // cross-language uniformity.
            metadata.implements = type_list_of(node, "extends_interfaces", ctx.source);
            metadata.type_parameters = type_parameters_of(node, ctx.source);
            metadata.documentation = doc_of(node, ctx);
            push_entity(node, EntityKind::Interface, name, ctx, metadata, out);
        }
        "enum_declaration" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            let mut metadata = modifier_metadata(node);
            metadata.documentation = doc_of(node, ctx);
            push_entity(node, EntityKind::Enum, name, ctx, metadata, out);
        }
        "method_declaration" | "constructor_declaration" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            let mut metadata = modifier_metadata(node);
            metadata.parameters = parameters_of(node, ctx.source);
            metadata.return_type = node
                .child_by_field_name("type")
                .map(|t| owned_text(t, ctx.source));
            metadata.type_parameters = type_parameters_of(node, ctx.source);
            metadata.documentation = doc_of(node, ctx);
            push_entity(node, EntityKind::Method, name, ctx, metadata, out);
        }
        "field_declaration" => {
            let ty = node
                .child_by_field_name("type")
                .map(|t| owned_text(t, ctx.source));
            let base = modifier_metadata(node);
            let mut cursor = node.walk();
            for declarator in node.children(&mut cursor) {
                if declarator.kind() != "variable_declarator" {
                    continue;
                }
                let name = declarator
                    .child_by_field_name("name")
                    .map(|n| owned_text(n, ctx.source));
                let mut metadata = base.clone();
                metadata.return_type = ty.clone();
                metadata.documentation = doc_of(node, ctx);
                push_entity(node, EntityKind::Property, name, ctx, metadata, out);
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
    out.push(entity_at(node, kind, name, ctx.path, false, metadata));
}

/// `static`/`abstract` flags from the `modifiers` child.
fn modifier_metadata(node: Node) -> EntityMetadata {
    let Some(modifiers) = find_first_child(node, &["modifiers"]) else {
        return EntityMetadata::default();
    };
    EntityMetadata {
        is_static: has_child_of_kind(modifiers, "static"),
        is_abstract: has_child_of_kind(modifiers, "abstract"),
        ..EntityMetadata::default()
    }
}

fn parameters_of(method: Node, source: &[u8]) -> Vec<ParameterInfo> {
    let Some(params) = method.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut cursor = params.walk();
    for child in params.named_children(&mut cursor) {
        match child.kind() {
            "formal_parameter" => {
                out.push(ParameterInfo {
                    name: child
                        .child_by_field_name("name")
                        .map(|n| owned_text(n, source))
                        .unwrap_or_default(),
                    ty: child
                        .child_by_field_name("type")
                        .map(|t| owned_text(t, source)),
                    ..ParameterInfo::default()
                });
            }
            // Varargs: `String... names`.
            "spread_parameter" => {
                let name = find_first_child(child, &["variable_declarator"])
                    .and_then(|d| d.child_by_field_name("name"))
                    .map(|n| owned_text(n, source))
                    .unwrap_or_default();
                let ty = child.named_child(0).map(|t| owned_text(t, source));
                out.push(ParameterInfo {
                    name,
                    ty,
                    is_rest: true,
                    ..ParameterInfo::default()
                });
            }
            _ => {}
        }
    }
    out
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

/// Names inside a wrapper like `super_interfaces` / `extends_interfaces`
/// (both hold a `type_list`).
fn type_list_of(node: Node, wrapper_kind: &str, source: &[u8]) -> Vec<String> {
    let Some(wrapper) = find_first_child(node, &[wrapper_kind]) else {
        return Vec::new();
    };
    let Some(list) = find_first_child(wrapper, &["type_list"]) else {
        return Vec::new();
    };
    let mut cursor = list.walk();
    list.named_children(&mut cursor)
        .map(|t| owned_text(t, source))
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
        out.push(import_info(node, ctx));
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_imports(child, ctx, out);
    }
}

fn import_info(node: Node, ctx: &ExtractCtx) -> ImportInfo {
    let path = find_first_child(node, &["scoped_identifier", "identifier"])
        .map(|p| owned_text(p, ctx.source))
        .unwrap_or_default();
    let is_static = has_child_of_kind(node, "static");
    let wildcard = has_child_of_kind(node, "asterisk");

    let imported_names = if wildcard {
        vec!["*".to_owned()]
    } else {
        path.rsplit('.').next().map(str::to_owned).into_iter().collect()
    };

    ImportInfo {
        source: path,
        imported_names,
        // Static imports pull members, plain imports pull types.
        is_type_only: !is_static,
        line: start_line(node),
        ..ImportInfo::default()
    }
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

fn walk_calls(node: Node, caller: Option<&str>, ctx: &ExtractCtx, out: &mut Vec<CallInfo>) {
    let named: Option<String>;
    let next_caller: Option<&str> = match node.kind() {
        "method_declaration" | "constructor_declaration" => {
            named = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            named.as_deref()
        }
        "lambda_expression" => None,
        _ => caller,
    };

    match node.kind() {
        "method_invocation" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source))
                .unwrap_or_else(|| "[dynamic]".to_owned());
            let expression = match node.child_by_field_name("object") {
                Some(object) => format!("{}.{}", node_text(object, ctx.source), name),
                None => name.clone(),
            };
            out.push(CallInfo {
                called_name: name,
                called_expression: expression,
                is_async: false,
                line: start_line(node),
                column: start_column(node),
                caller_name: next_caller.map(str::to_owned),
            });
        }
        "object_creation_expression" => {
            if let Some(ty) = node.child_by_field_name("type") {
                let ty_text = owned_text(ty, ctx.source);
                let simple = ty_text
                    .split('<')
                    .next()
                    .unwrap_or(&ty_text)
                    .rsplit('.')
                    .next()
                    .unwrap_or(&ty_text)
                    .to_owned();
                out.push(CallInfo {
                    called_name: simple,
                    called_expression: format!("new {ty_text}"),
                    is_async: false,
                    line: start_line(node),
                    column: start_column(node),
                    caller_name: next_caller.map(str::to_owned),
                });
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_calls(child, next_caller, ctx, out);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
