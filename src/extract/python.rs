//! Entity, import and call extraction for Python.
//!
//! Python has no export syntax: everything at module scope is visible, so
//! every entity carries `is_exported = true` and the export stream stays
//! empty. Documentation comes from docstrings, not comments.

use tree_sitter::Node;

use super::helpers::{
    ANONYMOUS, entity_at, has_child_of_kind, node_text, owned_text, start_column, start_line,
};
use super::{ExtractCtx, Extractor};
use crate::model::{
    CallInfo, CodeEntity, EntityKind, EntityMetadata, ImportInfo, ParameterInfo,
};

pub(crate) struct PythonExtractor;

impl Extractor for PythonExtractor {
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
        // Decorators wrap the definition; unwrap transparently.
        "decorated_definition" => {
            if let Some(def) = node.child_by_field_name("definition") {
                walk_entities(def, ctx, out);
            }
            return;
        }
        "function_definition" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            let metadata = EntityMetadata {
                is_async: has_child_of_kind(node, "async"),
                parameters: parameters_of(node, ctx.source),
                return_type: node
                    .child_by_field_name("return_type")
                    .map(|t| owned_text(t, ctx.source)),
                type_parameters: type_parameters_of(node, ctx.source),
                documentation: docstring_of(node, ctx),
                ..EntityMetadata::default()
            };
            push_entity(node, EntityKind::Function, name, ctx, metadata, out);
        }
        "class_definition" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            let (extends, implements) = superclasses_of(node, ctx.source);
            let metadata = EntityMetadata {
                extends,
                implements,
                type_parameters: type_parameters_of(node, ctx.source),
                documentation: docstring_of(node, ctx),
                ..EntityMetadata::default()
            };
            push_entity(node, EntityKind::Class, name, ctx, metadata, out);
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

fn parameters_of(def: Node, source: &[u8]) -> Vec<ParameterInfo> {
    let Some(params) = def.child_by_field_name("parameters") else {
        return Vec::new();
    };

    let mut out: Vec<ParameterInfo> = Vec::new();
    let mut cursor = params.walk();
    for child in params.named_children(&mut cursor) {
        match child.kind() {
            "identifier" => out.push(ParameterInfo::named(node_text(child, source))),
            "typed_parameter" => {
                let inner = child.named_child(0);
                let is_rest = inner.is_some_and(|n| {
                    matches!(n.kind(), "list_splat_pattern" | "dictionary_splat_pattern")
                });
                let name = inner
                    .map(|n| node_text(n, source).trim_start_matches('*').to_owned())
                    .unwrap_or_default();
                out.push(ParameterInfo {
                    name,
                    ty: child
                        .child_by_field_name("type")
                        .map(|t| owned_text(t, source)),
                    is_rest,
                    ..ParameterInfo::default()
                });
            }
            "default_parameter" | "typed_default_parameter" => {
                let name = child
                    .child_by_field_name("name")
                    .map(|n| node_text(n, source).trim_start_matches('*').to_owned())
                    .unwrap_or_default();
                out.push(ParameterInfo {
                    name,
                    ty: child
                        .child_by_field_name("type")
                        .map(|t| owned_text(t, source)),
                    has_default: true,
                    ..ParameterInfo::default()
                });
            }
            "list_splat_pattern" | "dictionary_splat_pattern" => {
                out.push(ParameterInfo {
                    name: node_text(child, source).trim_start_matches('*').to_owned(),
                    is_rest: true,
                    ..ParameterInfo::default()
                });
            }
            _ => {}
        }
    }

    // `self`/`cls` receivers are an implementation detail, not parameters.
    if out
        .first()
        .is_some_and(|p| p.name == "self" || p.name == "cls")
    {
        out.remove(0);
    }
    out
}

fn type_parameters_of(def: Node, source: &[u8]) -> Vec<String> {
    let Some(params) = def.child_by_field_name("type_parameters") else {
        return Vec::new();
    };
    let mut cursor = params.walk();
    params
        .named_children(&mut cursor)
        .map(|p| owned_text(p, source))
        .collect()
}

/// First base class becomes `extends`; any further bases are collected as
/// `implements`. Keyword arguments (`metaclass=…`) are not bases.
fn superclasses_of(class_def: Node, source: &[u8]) -> (Option<String>, Vec<String>) {
    let Some(args) = class_def.child_by_field_name("superclasses") else {
        return (None, Vec::new());
    };
    let mut bases = Vec::new();
    let mut cursor = args.walk();
    for child in args.named_children(&mut cursor) {
        if child.kind() != "keyword_argument" {
            bases.push(owned_text(child, source));
        }
    }
    let extends = if bases.is_empty() {
        None
    } else {
        Some(bases.remove(0))
    };
    (extends, bases)
}

/// The first string-literal statement of the body, searching through leading
/// `pass` statements. Raw source form, quotes included.
fn docstring_of(def: Node, ctx: &ExtractCtx) -> Option<String> {
    if !ctx.extract_documentation {
        return None;
    }
    let body = def.child_by_field_name("body")?;
    let mut cursor = body.walk();
    for stmt in body.named_children(&mut cursor) {
        match stmt.kind() {
            "pass_statement" => continue,
            "expression_statement" => {
                let first = stmt.named_child(0)?;
                if matches!(first.kind(), "string" | "concatenated_string") {
                    return Some(owned_text(first, ctx.source));
                }
                return None;
            }
            _ => return None,
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Imports
// ---------------------------------------------------------------------------

fn walk_imports(node: Node, ctx: &ExtractCtx, out: &mut Vec<ImportInfo>) {
    match node.kind() {
        "import_statement" => plain_imports(node, ctx, out),
        "import_from_statement" => out.push(from_import(node, ctx)),
        _ => {}
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_imports(child, ctx, out);
    }
}

/// `import a.b, c as d` — one entry per imported module.
fn plain_imports(node: Node, ctx: &ExtractCtx, out: &mut Vec<ImportInfo>) {
    let line = start_line(node);
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "dotted_name" => {
                let name = owned_text(child, ctx.source);
                out.push(ImportInfo {
                    source: name.clone(),
                    imported_names: vec![name],
                    line,
                    ..ImportInfo::default()
                });
            }
            "aliased_import" => {
                let Some(name_node) = child.child_by_field_name("name") else {
                    continue;
                };
                let name = owned_text(name_node, ctx.source);
                let mut info = ImportInfo {
                    source: name.clone(),
                    imported_names: vec![name.clone()],
                    line,
                    ..ImportInfo::default()
                };
                if let Some(alias) = child.child_by_field_name("alias") {
                    info.aliases.insert(name, owned_text(alias, ctx.source));
                }
                out.push(info);
            }
            _ => {}
        }
    }
}

/// `from x import y [as z]`, `from . import y`, `from x import *`.
fn from_import(node: Node, ctx: &ExtractCtx) -> ImportInfo {
    let module = node.child_by_field_name("module_name");
    let source_text = module
        .map(|m| owned_text(m, ctx.source))
        .unwrap_or_default();

    let mut info = ImportInfo {
        is_relative: source_text.starts_with('.'),
        line: start_line(node),
        source: source_text,
        ..ImportInfo::default()
    };

    let module_id = module.map(|m| m.id());
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if Some(child.id()) == module_id {
            continue;
        }
        match child.kind() {
            "wildcard_import" => {
                info.imported_names.push("*".to_owned());
            }
            "dotted_name" => info.imported_names.push(owned_text(child, ctx.source)),
            "aliased_import" => {
                let Some(name_node) = child.child_by_field_name("name") else {
                    continue;
                };
                let name = owned_text(name_node, ctx.source);
                if let Some(alias) = child.child_by_field_name("alias") {
                    info.aliases
                        .insert(name.clone(), owned_text(alias, ctx.source));
                }
                info.imported_names.push(name);
            }
            _ => {}
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
        "function_definition" => {
            named = node
                .child_by_field_name("name")
                .map(|n| owned_text(n, ctx.source));
            named.as_deref()
        }
        // Lambdas are anonymous contexts.
        "lambda" => None,
        _ => caller,
    };

    if node.kind() == "call" {
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
    let is_async = node.parent().is_some_and(|p| p.kind() == "await");
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
        "identifier" => (full.clone(), full),
        "attribute" => {
            let name = func
                .child_by_field_name("attribute")
                .map(|a| owned_text(a, source))
                .unwrap_or_else(|| "[dynamic]".to_owned());
            (name, full)
        }
        "subscript" => ("[indexed]".to_owned(), full),
        "call" => ("[chained]".to_owned(), full),
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
        let tree = parse(Language::Python, src);
        PythonExtractor.entities(tree.root_node(), &ctx(src, "mod.py"))
    }

    fn imports_of(src: &str) -> Vec<ImportInfo> {
        let tree = parse(Language::Python, src);
        PythonExtractor.imports(tree.root_node(), &ctx(src, "mod.py"))
    }

    fn calls_of(src: &str) -> Vec<CallInfo> {
        let tree = parse(Language::Python, src);
        PythonExtractor.calls(tree.root_node(), &ctx(src, "mod.py"))
    }

    // Test 1: relative from-import with alias (spec scenario shape)
    #[test]
    fn test_relative_from_import_with_alias() {
        let src = "from ..util import helper as h\ndef run(x, *args):\n    return h(x)\n";
        let imports = imports_of(src);
        assert_eq!(imports.len(), 1);
        let import = &imports[0];
        assert_eq!(import.source, "..util");
        assert!(import.is_relative);
        assert_eq!(import.imported_names, vec!["helper".to_owned()]);
        assert_eq!(import.aliases.get("helper").map(String::as_str), Some("h"));
        assert_eq!(import.line, 1);

        let entities = entities_of(src);
        assert_eq!(entities.len(), 1);
        let run = &entities[0];
        assert_eq!(run.kind, EntityKind::Function);
        assert_eq!(run.name, "run");
        assert!(run.is_exported);
        assert_eq!(run.metadata.parameters.len(), 2);
        assert_eq!(run.metadata.parameters[0].name, "x");
        assert_eq!(run.metadata.parameters[1].name, "args");
        assert!(run.metadata.parameters[1].is_rest);

        let calls = calls_of(src);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].called_name, "h");
        assert_eq!(calls[0].called_expression, "h");
        assert_eq!(calls[0].caller_name.as_deref(), Some("run"));
        assert_eq!(calls[0].line, 3);
        assert!(!calls[0].is_async);
    }

    #[test]
    fn test_async_function_and_awaited_call() {
        let src = "async def main():\n    await fetch()\n    fire()\n";
        let entities = entities_of(src);
        assert!(entities[0].metadata.is_async);

        let calls = calls_of(src);
        let fetch = calls.iter().find(|c| c.called_name == "fetch").unwrap();
        assert!(fetch.is_async);
        let fire = calls.iter().find(|c| c.called_name == "fire").unwrap();
        assert!(!fire.is_async);
    }

    #[test]
    fn test_decorated_definition_unwraps() {
        let src = "@app.route('/x')\ndef handler():\n    pass\n";
        let entities = entities_of(src);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "handler");
        assert_eq!(entities[0].kind, EntityKind::Function);
    }

    #[test]
    fn test_class_with_bases_and_methods() {
        let src = "class Handler(Base, Mixin):\n    def serve(self, req):\n        dispatch(req)\n";
        let entities = entities_of(src);
        let class = &entities[0];
        assert_eq!(class.kind, EntityKind::Class);
        assert_eq!(class.metadata.extends.as_deref(), Some("Base"));
        assert_eq!(class.metadata.implements, vec!["Mixin".to_owned()]);

        // Methods keep the function kind; `self` is suppressed.
        let serve = &entities[1];
        assert_eq!(serve.kind, EntityKind::Function);
        assert_eq!(serve.metadata.parameters.len(), 1);
        assert_eq!(serve.metadata.parameters[0].name, "req");

        let calls = calls_of(src);
        assert_eq!(calls[0].caller_name.as_deref(), Some("serve"));
    }

    #[test]
    fn test_parameter_shapes() {
        let src = "def f(a, b: int, c=1, d: int = 2, *args, **kwargs):\n    pass\n";
        let entities = entities_of(src);
        let params = &entities[0].metadata.parameters;
        assert_eq!(params.len(), 6);

        assert_eq!(params[0].name, "a");

        assert_eq!(params[1].name, "b");
        assert_eq!(params[1].ty.as_deref(), Some("int"));

        assert!(params[2].has_default);

        assert_eq!(params[3].name, "d");
        assert_eq!(params[3].ty.as_deref(), Some("int"));
        assert!(params[3].has_default);

        assert_eq!(params[4].name, "args");
        assert!(params[4].is_rest);

        assert_eq!(params[5].name, "kwargs");
        assert!(params[5].is_rest);
    }

    #[test]
    fn test_docstring_extraction() {
        let src = "def documented():\n    \"\"\"Does the thing.\"\"\"\n    return 1\n";
        let entities = entities_of(src);
        assert_eq!(
            entities[0].metadata.documentation.as_deref(),
            Some("\"\"\"Does the thing.\"\"\"")
        );
    }

    #[test]
    fn test_docstring_searches_past_pass() {
        let src = "def padded():\n    pass\n    \"late docstring\"\n";
        let entities = entities_of(src);
        assert_eq!(
            entities[0].metadata.documentation.as_deref(),
            Some("\"late docstring\"")
        );
    }

    #[test]
    fn test_non_string_first_statement_means_no_docstring() {
        let src = "def plain():\n    x = 1\n    \"not a docstring\"\n";
        let entities = entities_of(src);
        assert_eq!(entities[0].metadata.documentation, None);
    }

    #[test]
    fn test_plain_and_aliased_imports() {
        let src = "import os.path\nimport numpy as np\n";
        let imports = imports_of(src);
        assert_eq!(imports.len(), 2);

        assert_eq!(imports[0].source, "os.path");
        assert_eq!(imports[0].imported_names, vec!["os.path".to_owned()]);
        assert!(!imports[0].is_relative);

        assert_eq!(imports[1].source, "numpy");
        assert_eq!(imports[1].aliases.get("numpy").map(String::as_str), Some("np"));
    }

    #[test]
    fn test_wildcard_and_bare_relative_import() {
        let src = "from x import *\nfrom . import sibling\n";
        let imports = imports_of(src);

        assert_eq!(imports[0].imported_names, vec!["*".to_owned()]);
        assert!(!imports[0].is_relative);

        assert_eq!(imports[1].source, ".");
        assert!(imports[1].is_relative);
        assert_eq!(imports[1].imported_names, vec!["sibling".to_owned()]);
    }

    #[test]
    fn test_call_target_shapes() {
        let src = "obj.method()\nmatrix[0]()\nget_fn()()\nlamb = lambda: hidden()\n";
        let calls = calls_of(src);
        let names: Vec<&str> = calls.iter().map(|c| c.called_name.as_str()).collect();
        assert!(names.contains(&"method"));
        assert!(names.contains(&"[indexed]"));
        assert!(names.contains(&"[chained]"));

        let hidden = calls.iter().find(|c| c.called_name == "hidden").unwrap();
        assert_eq!(hidden.caller_name, None, "lambda bodies are anonymous contexts");
    }

    #[test]
    fn test_module_constants_are_not_entities() {
        let src = "X = 1\nY = 'two'\n";
        assert!(entities_of(src).is_empty());
    }
}
