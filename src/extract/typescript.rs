//! Entity, import, export and call extraction for the TypeScript family
//! (`.ts`, `.tsx`, `.js`, `.jsx`, `.mjs`, `.cjs`).
//!
//! The TypeScript and TSX grammars share node kinds; the JavaScript grammar
//! is a subset (no interfaces, type aliases, enums, or type annotations), so
//! one walk covers all four dialects — kinds a dialect cannot produce simply
//! never match.

use tree_sitter::Node;

use super::helpers::{
    ANONYMOUS, DocStyle, doc_comment_above, entity_at, find_first_child, has_child_of_kind,
    node_text, owned_text, start_column, start_line, strip_quotes,
};
use super::{ExtractCtx, Extractor};
use crate::model::{
    CallInfo, CodeEntity, EntityKind, EntityMetadata, ExportInfo, ImportInfo, ParameterInfo,
};

pub(crate) struct TsJsExtractor;

const DOC_STYLE: DocStyle = DocStyle {
    comment_kinds: &["comment"],
    line_prefixes: &[],
    block_prefixes: &["/**"],
    skip_kinds: &["decorator"],
};

impl Extractor for TsJsExtractor {
    fn entities(&self, root: Node<'_>, ctx: &ExtractCtx<'_>) -> Vec<CodeEntity> {
        let mut out = Vec::new();
        walk_entities(root, false, ctx, &mut out);
        out
    }

    fn imports(&self, root: Node<'_>, ctx: &ExtractCtx<'_>) -> Vec<ImportInfo> {
        let mut out = Vec::new();
        walk_imports(root, ctx, &mut out);
        out
    }

    fn exports(&self, root: Node<'_>, ctx: &ExtractCtx<'_>) -> Vec<ExportInfo> {
        let mut out = Vec::new();
        walk_exports(root, ctx, &mut out);
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

fn walk_entities(node: Node, exported: bool, ctx: &ExtractCtx, out: &mut Vec<CodeEntity>) {
    match node.kind() {
        "export_statement" => {
            // Process the wrapped declaration with the export flag set and
            // stop recursing into the export statement itself — the exports
            // pass owns it.
            if let Some(decl) = node.child_by_field_name("declaration") {
                walk_entities(decl, true, ctx, out);
            } else if let Some(value) = node.child_by_field_name("value") {
                walk_entities(value, true, ctx, out);
            }
            return;
        }
        "function_declaration" | "generator_function_declaration" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            let mut metadata = function_metadata(node, ctx);
            metadata.is_generator =
                node.kind() == "generator_function_declaration" || has_child_of_kind(node, "*");
            push_entity(node, EntityKind::Function, name, exported, ctx, metadata, out);
        }
        "class_declaration" | "abstract_class_declaration" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            let mut metadata = EntityMetadata {
                is_abstract: node.kind() == "abstract_class_declaration",
                type_parameters: type_parameters_of(node, ctx.source),
                documentation: doc_of(node, ctx),
                ..EntityMetadata::default()
            };
            let (extends, implements) = class_heritage(node, ctx.source);
            metadata.extends = extends;
            metadata.implements = implements;
            push_entity(node, EntityKind::Class, name, exported, ctx, metadata, out);
        }
        "interface_declaration" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            let metadata = EntityMetadata {
                implements: interface_parents(node, ctx.source),
                type_parameters: type_parameters_of(node, ctx.source),
                documentation: doc_of(node, ctx),
                ..EntityMetadata::default()
            };
            push_entity(node, EntityKind::Interface, name, exported, ctx, metadata, out);
        }
        "type_alias_declaration" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            let metadata = EntityMetadata {
                type_parameters: type_parameters_of(node, ctx.source),
                documentation: doc_of(node, ctx),
                ..EntityMetadata::default()
            };
            push_entity(node, EntityKind::TypeAlias, name, exported, ctx, metadata, out);
        }
        "enum_declaration" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            let metadata = EntityMetadata {
                documentation: doc_of(node, ctx),
                ..EntityMetadata::default()
            };
            push_entity(node, EntityKind::Enum, name, exported, ctx, metadata, out);
        }
        "lexical_declaration" | "variable_declaration" => {
            emit_variable_declarators(node, exported, ctx, out);
        }
        "method_definition" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            let mut metadata = function_metadata(node, ctx);
            metadata.is_static = has_child_of_kind(node, "static");
            metadata.is_generator = has_child_of_kind(node, "*");
            push_entity(node, EntityKind::Method, name, exported, ctx, metadata, out);
        }
        "public_field_definition" | "property_signature" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            let metadata = EntityMetadata {
                is_static: has_child_of_kind(node, "static"),
                return_type: node
                    .child_by_field_name("type")
                    .map(|t| annotation_text(t, ctx.source)),
                documentation: doc_of(node, ctx),
                ..EntityMetadata::default()
            };
            push_entity(node, EntityKind::Property, name, exported, ctx, metadata, out);
        }
        "arrow_function" | "function" | "function_expression" => {
            // Declarator-bound function values are emitted by their
            // enclosing declaration; anything else is anonymous.
            if node
                .parent()
                .is_none_or(|p| p.kind() != "variable_declarator")
            {
                let name = node
                    .child_by_field_name("name")
                    .map(|n| owned_text(n, ctx.source));
                let metadata = function_metadata(node, ctx);
                push_entity(node, EntityKind::Function, name, exported, ctx, metadata, out);
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_entities(child, exported, ctx, out);
    }
}

/// Emit one entity per `variable_declarator`: function kind when the value
/// is an arrow function or function expression, variable kind otherwise.
fn emit_variable_declarators(
    decl: Node,
    exported: bool,
    ctx: &ExtractCtx,
    out: &mut Vec<CodeEntity>,
) {
    let mut cursor = decl.walk();
    for declarator in decl.children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let name = declarator
            .child_by_field_name("name")
            .filter(|n| n.kind() == "identifier")
            .map(|n| owned_text(n, ctx.source));
        let value = declarator.child_by_field_name("value");

        if let Some(value) = value
            && is_function_value(value)
        {
            let mut metadata = function_metadata(value, ctx);
            // JSDoc sits above the declaration, not above the value.
            metadata.documentation = doc_of(decl, ctx);
            push_entity(decl, EntityKind::Function, name, exported, ctx, metadata, out);
        } else {
            let metadata = EntityMetadata {
                return_type: declarator
                    .child_by_field_name("type")
                    .map(|t| annotation_text(t, ctx.source)),
                documentation: doc_of(decl, ctx),
                ..EntityMetadata::default()
            };
            push_entity(decl, EntityKind::Variable, name, exported, ctx, metadata, out);
        }
    }
}

fn is_function_value(node: Node) -> bool {
    matches!(
        node.kind(),
        "arrow_function" | "function" | "function_expression"
    )
}

fn push_entity(
    node: Node,
    kind: EntityKind,
    name: Option<String>,
    exported: bool,
    ctx: &ExtractCtx,
    metadata: EntityMetadata,
    out: &mut Vec<CodeEntity>,
) {
    let name = match name {
        Some(n) => n,
        None if ctx.include_anonymous => ANONYMOUS.to_owned(),
        None => return,
    };
    out.push(entity_at(node, kind, name, ctx.path, exported, metadata));
}

/// Flags, parameters, return type, generics and doc for any function-like
/// node (declaration, method, arrow, function expression).
fn function_metadata(node: Node, ctx: &ExtractCtx) -> EntityMetadata {
    EntityMetadata {
        is_async: has_child_of_kind(node, "async"),
        parameters: parameters_of(node, ctx.source),
        return_type: node
            .child_by_field_name("return_type")
            .map(|t| annotation_text(t, ctx.source)),
        type_parameters: type_parameters_of(node, ctx.source),
        documentation: doc_of(node, ctx),
        ..EntityMetadata::default()
    }
}

fn parameters_of(func: Node, source: &[u8]) -> Vec<ParameterInfo> {
    let Some(params) = func.child_by_field_name("parameters") else {
        // Single-identifier arrow shorthand: `x => x + 1`.
        if func.kind() == "arrow_function"
            && let Some(p) = func.child_by_field_name("parameter")
        {
            return vec![ParameterInfo::named(node_text(p, source))];
        }
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut cursor = params.walk();
    for child in params.named_children(&mut cursor) {
        match child.kind() {
            "required_parameter" | "optional_parameter" => {
                let pattern = child.child_by_field_name("pattern");
                let is_rest = pattern.is_some_and(|p| p.kind() == "rest_pattern");
                let name = pattern
                    .map(|p| node_text(p, source).trim_start_matches('.').to_owned())
                    .unwrap_or_default();
                out.push(ParameterInfo {
                    name,
                    ty: child
                        .child_by_field_name("type")
                        .map(|t| annotation_text(t, source)),
                    has_default: child.child_by_field_name("value").is_some(),
                    is_optional: child.kind() == "optional_parameter",
                    is_rest,
                });
            }
            "identifier" => out.push(ParameterInfo::named(node_text(child, source))),
            "assignment_pattern" => {
                let name = child
                    .child_by_field_name("left")
                    .map(|n| owned_text(n, source))
                    .unwrap_or_default();
                out.push(ParameterInfo {
                    name,
                    has_default: true,
                    ..ParameterInfo::default()
                });
            }
            "rest_pattern" => out.push(ParameterInfo {
                name: node_text(child, source).trim_start_matches('.').to_owned(),
                is_rest: true,
                ..ParameterInfo::default()
            }),
            "object_pattern" | "array_pattern" => {
                out.push(ParameterInfo::named(node_text(child, source)));
            }
            _ => {}
        }
    }
    out
}

/// Text of a `type_annotation` with the leading `:` removed.
fn annotation_text(node: Node, source: &[u8]) -> String {
    node_text(node, source)
        .trim_start_matches(':')
        .trim()
        .to_owned()
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

/// `extends` parent and `implements` list from a `class_heritage` node.
///
/// The TS grammar nests `extends_clause`/`implements_clause`; the JS grammar
/// puts the parent expression directly under `class_heritage`.
fn class_heritage(class_node: Node, source: &[u8]) -> (Option<String>, Vec<String>) {
    let Some(heritage) = find_first_child(class_node, &["class_heritage"]) else {
        return (None, Vec::new());
    };

    let mut extends = None;
    let mut implements = Vec::new();
    let mut cursor = heritage.walk();
    for child in heritage.named_children(&mut cursor) {
        match child.kind() {
            "extends_clause" => {
                extends = child
                    .child_by_field_name("value")
                    .or_else(|| child.named_child(0))
                    .map(|n| owned_text(n, source));
            }
            "implements_clause" => {
                let mut inner = child.walk();
                implements.extend(
                    child
                        .named_children(&mut inner)
                        .map(|n| owned_text(n, source)),
                );
            }
            _ if extends.is_none() => extends = Some(owned_text(child, source)),
            _ => {}
        }
    }
    (extends, implements)
}

/// Interface parents (`interface A extends B, C`), collected as
/// `implements` for cross-language uniformity.
fn interface_parents(iface: Node, source: &[u8]) -> Vec<String> {
    let Some(clause) = find_first_child(iface, &["extends_type_clause"]) else {
        return Vec::new();
    };
    let mut cursor = clause.walk();
    clause
        .named_children(&mut cursor)
        .map(|n| owned_text(n, source))
        .collect()
}

/// JSDoc attached to the declaration, or to its enclosing export statement.
fn doc_of(node: Node, ctx: &ExtractCtx) -> Option<String> {
    if !ctx.extract_documentation {
        return None;
    }
    doc_comment_above(node, ctx.source, &DOC_STYLE).or_else(|| {
        let parent = node.parent()?;
        if parent.kind() == "export_statement" {
            doc_comment_above(parent, ctx.source, &DOC_STYLE)
        } else {
            None
        }
    })
}

// ---------------------------------------------------------------------------
// Imports
// ---------------------------------------------------------------------------

fn walk_imports(node: Node, ctx: &ExtractCtx, out: &mut Vec<ImportInfo>) {
    if node.kind() == "import_statement" {
        out.push(import_info(node, ctx));
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_imports(child, ctx, out);
    }
}

fn import_info(node: Node, ctx: &ExtractCtx) -> ImportInfo {
    let source_text = node
        .child_by_field_name("source")
        .map(|s| strip_quotes(node_text(s, ctx.source)).to_owned())
        .unwrap_or_default();

    let mut info = ImportInfo {
        is_relative: source_text.starts_with('.'),
        is_type_only: has_child_of_kind(node, "type"),
        line: start_line(node),
        source: source_text,
        ..ImportInfo::default()
    };

    let Some(clause) = find_first_child(node, &["import_clause"]) else {
        info.is_side_effect = true;
        return info;
    };

    let mut cursor = clause.walk();
    for child in clause.named_children(&mut cursor) {
        match child.kind() {
            "identifier" => info.default_import = Some(owned_text(child, ctx.source)),
            "namespace_import" => {
                info.namespace_import = find_first_child(child, &["identifier"])
                    .map(|n| owned_text(n, ctx.source));
            }
            "named_imports" => {
                let mut specs = child.walk();
                for spec in child.named_children(&mut specs) {
                    if spec.kind() != "import_specifier" {
                        continue;
                    }
                    let Some(name_node) = spec.child_by_field_name("name") else {
                        continue;
                    };
                    let name = owned_text(name_node, ctx.source);
                    if let Some(alias) = spec.child_by_field_name("alias") {
                        info.aliases
                            .insert(name.clone(), owned_text(alias, ctx.source));
                    }
                    info.imported_names.push(name);
                }
            }
            _ => {}
        }
    }

    if info.default_import.is_none()
        && info.namespace_import.is_none()
        && info.imported_names.is_empty()
    {
        info.is_side_effect = true;
    }
    info
}

// ---------------------------------------------------------------------------
// Exports
// ---------------------------------------------------------------------------

fn walk_exports(node: Node, ctx: &ExtractCtx, out: &mut Vec<ExportInfo>) {
    if node.kind() == "export_statement" {
        out.push(export_info(node, ctx));
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_exports(child, ctx, out);
    }
}

fn export_info(node: Node, ctx: &ExtractCtx) -> ExportInfo {
    let mut info = ExportInfo {
        source: node
            .child_by_field_name("source")
            .map(|s| strip_quotes(node_text(s, ctx.source)).to_owned()),
        is_type_only: has_child_of_kind(node, "type"),
        line: start_line(node),
        ..ExportInfo::default()
    };

    // `export default …` emits the single name "default".
    if has_child_of_kind(node, "default") {
        info.exported_names.push("default".to_owned());
        return info;
    }

    // `export * from "…"` / `export * as ns from "…"`.
    if has_child_of_kind(node, "*") {
        info.is_namespace_export = true;
        return info;
    }
    if let Some(ns) = find_first_child(node, &["namespace_export"]) {
        info.is_namespace_export = true;
        if let Some(name) = find_first_child(ns, &["identifier", "module_export_name"]) {
            info.exported_names.push(owned_text(name, ctx.source));
        }
        return info;
    }

    // `export { a, b as c } [from "…"]`.
    if let Some(clause) = find_first_child(node, &["export_clause"]) {
        let mut cursor = clause.walk();
        for spec in clause.named_children(&mut cursor) {
            if spec.kind() != "export_specifier" {
                continue;
            }
            let Some(name_node) = spec.child_by_field_name("name") else {
                continue;
            };
            let name = owned_text(name_node, ctx.source);
            if let Some(alias) = spec.child_by_field_name("alias") {
                info.aliases
                    .insert(name.clone(), owned_text(alias, ctx.source));
            }
            info.exported_names.push(name);
        }
        return info;
    }

    // `export <declaration>` — surface the declared name(s).
    if let Some(decl) = node.child_by_field_name("declaration") {
        if let Some(name) = decl.child_by_field_name("name") {
            info.exported_names.push(owned_text(name, ctx.source));
        } else if matches!(decl.kind(), "lexical_declaration" | "variable_declaration") {
            let mut cursor = decl.walk();
            for declarator in decl.children(&mut cursor) {
                if declarator.kind() == "variable_declarator"
                    && let Some(name) = declarator.child_by_field_name("name")
                    && name.kind() == "identifier"
                {
                    info.exported_names.push(owned_text(name, ctx.source));
                }
            }
        }
    }
    info
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

fn walk_calls(node: Node, caller: Option<&str>, ctx: &ExtractCtx, out: &mut Vec<CallInfo>) {
    let named: Option<String>;
    let next_caller: Option<&str> = match node.kind() {
        "function_declaration" | "generator_function_declaration" | "method_definition" => {
            named = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            named.as_deref()
        }
        // Entering any function value rebinds the context: the declarator
        // binder one level up, a function expression's own name, or nothing
        // (anonymous contexts clear the caller).
        "arrow_function" | "function" | "function_expression" => {
            named = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source))
                .or_else(|| declarator_binder(node, ctx));
            named.as_deref()
        }
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

/// The `const name = (…) => …` binder, exactly one parent level up.
fn declarator_binder(func: Node, ctx: &ExtractCtx) -> Option<String> {
    let parent = func.parent()?;
    if parent.kind() != "variable_declarator" {
        return None;
    }
    parent
        .child_by_field_name("name")
        .filter(|n| n.kind() == "identifier")
        .map(|n| owned_text(n, ctx.source))
}

fn emit_call(node: Node, caller: Option<&str>, ctx: &ExtractCtx, out: &mut Vec<CallInfo>) {
    let Some(func) = node.child_by_field_name("function") else {
        return;
    };
    let (called_name, called_expression) = resolve_target(func, ctx.source);
    let is_async = node
        .parent()
        .is_some_and(|p| p.kind() == "await_expression");
    out.push(CallInfo {
        called_name,
        called_expression,
        is_async,
        line: start_line(node),
        column: start_column(node),
        caller_name: caller.map(str::to_owned),
    });
}

fn resolve_target(func: Node, source: &[u8]) -> (String, String) {
    let full = owned_text(func, source);
    match func.kind() {
        "identifier" | "super" | "this" | "import" => (full.clone(), full),
        "member_expression" => {
            let name = func
                .child_by_field_name("property")
                .map(|p| owned_text(p, source))
                .unwrap_or_else(|| "[dynamic]".to_owned());
            (name, full)
        }
        "subscript_expression" => {
            let name = func
                .child_by_field_name("index")
                .filter(|i| i.kind() == "string")
                .map(|i| strip_quotes(node_text(i, source)).to_owned())
                .unwrap_or_else(|| "[dynamic]".to_owned());
            (name, full)
        }
        "call_expression" => ("[chained]".to_owned(), full),
        "parenthesized_expression" | "non_null_expression" => match func.named_child(0) {
            Some(inner) => {
                let (name, _) = resolve_target(inner, source);
                (name, full)
            }
            None => ("[dynamic]".to_owned(), full),
        },
        "as_expression" => ("[type_asserted]".to_owned(), full),
        "type_assertion" => ("[type_assertion]".to_owned(), full),
        _ => ("[dynamic]".to_owned(), full),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
