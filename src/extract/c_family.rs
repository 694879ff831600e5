//! Entity, import and call extraction for C and C++.
//!
//! One extractor covers both: the C++ grammar is a superset (classes,
//! namespaces, templates, qualified names). Wrappers — namespaces, template
//! declarations, linkage specifications — are traversed, never emitted.
//! Declarator chains (pointers, arrays, parentheses, references) are
//! descended to recover declaration names.

use tree_sitter::Node;

use super::helpers::{
    ANONYMOUS, DocStyle, doc_comment_above, entity_at, find_first_child, node_text, owned_text,
    start_column, start_line,
};
use super::{ExtractCtx, Extractor};
use crate::model::{
    CallInfo, CodeEntity, EntityKind, EntityMetadata, ImportInfo, ParameterInfo,
};

pub(crate) struct CFamilyExtractor {
    pub cpp: bool,
}

const DOC_STYLE: DocStyle = DocStyle {
    comment_kinds: &["comment"],
    line_prefixes: &["///", "//!"],
    block_prefixes: &["/**", "/*!"],
    skip_kinds: &[],
};

impl Extractor for CFamilyExtractor {
    fn entities(&self, root: Node<'_>, ctx: &ExtractCtx<'_>) -> Vec<CodeEntity> {
        let mut out = Vec::new();
        self.walk_entities(root, ctx, &mut out);
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

impl CFamilyExtractor {
    fn walk_entities(&self, node: Node, ctx: &ExtractCtx, out: &mut Vec<CodeEntity>) {
        match node.kind() {
            "function_definition" => {
                let name = declarator_name(node, ctx.source);
                let metadata = EntityMetadata {
                    parameters: parameters_of(node, ctx.source),
                    return_type: node
                        .child_by_field_name("type")
                        .map(|t| owned_text(t, ctx.source)),
                    documentation: doc_of(node, ctx),
                    ..EntityMetadata::default()
                };
                push_entity(node, EntityKind::Function, name, ctx, metadata, out);
            }
            "struct_specifier" | "union_specifier" => {
                self.emit_record(node, ctx, out);
            }
            "class_specifier" if self.cpp => {
                self.emit_record(node, ctx, out);
            }
            "enum_specifier" => {
                // Only definitions, not forward references.
                if node.child_by_field_name("body").is_some() {
                    let name = node
                        .child_by_field_name("name")
                        .map(|n| owned_text(n, ctx.source));
                    let metadata = EntityMetadata {
                        documentation: doc_of(node, ctx),
                        ..EntityMetadata::default()
                    };
                    push_entity(node, EntityKind::Enum, name, ctx, metadata, out);
                }
            }
            "type_definition" => {
                let mut cursor = node.walk();
                for declarator in node.children_by_field_name("declarator", &mut cursor) {
                    let name = descend_declarator(declarator, ctx.source);
                    let metadata = EntityMetadata {
                        documentation: doc_of(node, ctx),
                        ..EntityMetadata::default()
                    };
                    push_entity(node, EntityKind::TypeAlias, name, ctx, metadata, out);
                }
            }
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk_entities(child, ctx, out);
        }
    }

    /// struct/union/class with a body; bases (C++ only) fill extends and
    /// implements.
    fn emit_record(&self, node: Node, ctx: &ExtractCtx, out: &mut Vec<CodeEntity>) {
        if node.child_by_field_name("body").is_none() {
            return;
        }
        let name = node
            .child_by_field_name("name")
            .map(|n| owned_text(n, ctx.source));
        let mut metadata = EntityMetadata {
            documentation: doc_of(node, ctx),
            ..EntityMetadata::default()
        };
        if self.cpp
            && let Some(bases) = find_first_child(node, &["base_class_clause"])
        {
            let mut cursor = bases.walk();
            let mut names: Vec<String> = bases
                .named_children(&mut cursor)
                .filter(|b| b.kind() != "access_specifier")
                .map(|b| owned_text(b, ctx.source))
                .collect();
            if !names.is_empty() {
                metadata.extends = Some(names.remove(0));
                metadata.implements = names;
            }
        }
        push_entity(node, EntityKind::Class, name, ctx, metadata, out);
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

/// The declared name of a function definition, through its declarator chain.
fn declarator_name(def: Node, source: &[u8]) -> Option<String> {
    let declarator = def.child_by_field_name("declarator")?;
    descend_declarator(declarator, source)
}

/// Descend pointer / array / parenthesized / reference / function
/// declarators until an identifier-like node remains.
fn descend_declarator(node: Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "identifier" | "field_identifier" | "type_identifier" | "qualified_identifier"
        | "destructor_name" | "operator_name" => Some(owned_text(node, source)),
        "pointer_declarator"
        | "array_declarator"
        | "parenthesized_declarator"
        | "reference_declarator"
        | "function_declarator"
        | "init_declarator" => {
            let inner = node
                .child_by_field_name("declarator")
                .or_else(|| node.named_child(0))?;
            descend_declarator(inner, source)
        }
        _ => None,
    }
}

fn parameters_of(def: Node, source: &[u8]) -> Vec<ParameterInfo> {
    let Some(func_declarator) = find_function_declarator(def) else {
        return Vec::new();
    };
    let Some(params) = func_declarator.child_by_field_name("parameters") else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut cursor = params.walk();
    for child in params.named_children(&mut cursor) {
        match child.kind() {
            "parameter_declaration" | "optional_parameter_declaration" => {
                let ty = child
                    .child_by_field_name("type")
                    .map(|t| owned_text(t, source));
                let name = child
                    .child_by_field_name("declarator")
                    .and_then(|d| descend_declarator(d, source));
                match name {
                    Some(name) => out.push(ParameterInfo {
                        name,
                        ty,
                        has_default: child.child_by_field_name("default_value").is_some(),
                        ..ParameterInfo::default()
                    }),
                    None => {
                        // `(void)` is an empty parameter list, not a
                        // parameter.
                        if ty.as_deref() == Some("void") {
                            continue;
                        }
                        out.push(ParameterInfo {
                            name: "<unnamed>".to_owned(),
                            ty,
                            ..ParameterInfo::default()
                        });
                    }
                }
            }
            "variadic_parameter" => out.push(ParameterInfo {
                name: "...".to_owned(),
                is_rest: true,
                ..ParameterInfo::default()
            }),
            _ => {}
        }
    }
    out
}

/// The `function_declarator` of a definition, possibly wrapped in pointer
/// declarators (`int *f(void)`).
fn find_function_declarator(def: Node) -> Option<Node> {
    let mut current = def.child_by_field_name("declarator")?;
    loop {
        if current.kind() == "function_declarator" {
            return Some(current);
        }
        current = current
            .child_by_field_name("declarator")
            .or_else(|| current.named_child(0))?;
    }
}

fn doc_of(node: Node, ctx: &ExtractCtx) -> Option<String> {
    if !ctx.extract_documentation {
        return None;
    }
    // Template/namespace wrappers sit between the comment and the inner
    // definition; anchor the lookup on the outermost wrapped node.
    let mut anchor = node;
    while let Some(parent) = anchor.parent() {
        if matches!(
            parent.kind(),
            "template_declaration" | "linkage_specification"
        ) {
            anchor = parent;
        } else {
            break;
        }
    }
    doc_comment_above(anchor, ctx.source, &DOC_STYLE)
}

// ---------------------------------------------------------------------------
// Imports
// ---------------------------------------------------------------------------

fn walk_imports(node: Node, ctx: &ExtractCtx, out: &mut Vec<ImportInfo>) {
    if node.kind() == "preproc_include" {
        out.push(include_info(node, ctx));
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_imports(child, ctx, out);
    }
}

fn include_info(node: Node, ctx: &ExtractCtx) -> ImportInfo {
    let path = node.child_by_field_name("path");
    // `<…>` is a system include; `"…"` is a local (relative) one.
    let is_relative = path.is_some_and(|p| p.kind() == "string_literal");
    let source = path
        .map(|p| {
            node_text(p, ctx.source)
                .trim_matches(['<', '>', '"'])
                .to_owned()
        })
        .unwrap_or_default();
    let basename = source.rsplit('/').next().unwrap_or(&source).to_owned();

    ImportInfo {
        is_relative,
        imported_names: vec![basename],
        is_side_effect: true,
        line: start_line(node),
        source,
        ..ImportInfo::default()
    }
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

fn walk_calls(node: Node, caller: Option<&str>, ctx: &ExtractCtx, out: &mut Vec<CallInfo>) {
    let named: Option<String>;
    let next_caller: Option<&str> = match node.kind() {
        "function_definition" => {
            named = declarator_name(node, ctx.source);
            named.as_deref()
        }
        "lambda_expression" => None,
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
        // `obj.method(…)` / `ptr->method(…)`.
        "field_expression" => {
            let name = func
                .child_by_field_name("field")
                .map(|f| owned_text(f, source))
                .unwrap_or_else(|| "[dynamic]".to_owned());
            (name, full)
        }
        // `ns::f(…)` — rightmost segment names the call.
        "qualified_identifier" => {
            let mut name_node = func;
            while name_node.kind() == "qualified_identifier" {
                match name_node.child_by_field_name("name") {
                    Some(inner) => name_node = inner,
                    None => break,
                }
            }
            (owned_text(name_node, source), full)
        }
        "template_function" => {
            let name = func
                .child_by_field_name("name")
                .map(|n| owned_text(n, source))
                .unwrap_or_else(|| "[dynamic]".to_owned());
            (name, full)
        }
        // `(*fp)(…)` — function pointer dispatch.
        "parenthesized_expression" => match func.named_child(0) {
            Some(inner) if inner.kind() == "pointer_expression" => ("[pointer]".to_owned(), full),
            Some(inner) => {
                let (name, _) = resolve_target(inner, source);
                (name, full)
            }
            None => ("[dynamic]".to_owned(), full),
        },
        "pointer_expression" => ("[pointer]".to_owned(), full),
        "subscript_expression" => ("[indexed]".to_owned(), full),
        "call_expression" => ("[chained]".to_owned(), full),
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

    const C_EXTRACTOR: CFamilyExtractor = CFamilyExtractor { cpp: false };
    const CPP_EXTRACTOR: CFamilyExtractor = CFamilyExtractor { cpp: true };

    fn c_entities(src: &str) -> Vec<CodeEntity> {
        let tree = parse(Language::C, src);
        C_EXTRACTOR.entities(tree.root_node(), &ctx(src, "m.c"))
    }

    fn cpp_entities(src: &str) -> Vec<CodeEntity> {
        let tree = parse(Language::Cpp, src);
        CPP_EXTRACTOR.entities(tree.root_node(), &ctx(src, "m.cpp"))
    }

    fn cpp_calls(src: &str) -> Vec<CallInfo> {
        let tree = parse(Language::Cpp, src);
        CPP_EXTRACTOR.calls(tree.root_node(), &ctx(src, "m.cpp"))
    }

    fn cpp_imports(src: &str) -> Vec<ImportInfo> {
        let tree = parse(Language::Cpp, src);
        CPP_EXTRACTOR.imports(tree.root_node(), &ctx(src, "m.cpp"))
    }

    // Spec scenario: include and qualified call.
    #[test]
    fn test_include_and_member_call() {
        let src = "#include <vector>\nint main() { std::vector<int> v; v.push_back(1); return 0; }\n";
        let imports = cpp_imports(src);
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].source, "vector");
        assert!(!imports[0].is_relative);
        assert!(imports[0].is_side_effect);
        assert_eq!(imports[0].imported_names, vec!["vector".to_owned()]);

        let entities = cpp_entities(src);
        let main = entities.iter().find(|e| e.name == "main").unwrap();
        assert_eq!(main.kind, EntityKind::Function);
        assert!(main.is_exported);
        assert_eq!(main.metadata.return_type.as_deref(), Some("int"));

        let calls = cpp_calls(src);
        let push = calls.iter().find(|c| c.called_name == "push_back").unwrap();
        assert_eq!(push.called_expression, "v.push_back");
        assert_eq!(push.caller_name.as_deref(), Some("main"));
    }

    #[test]
    fn test_local_include_is_relative() {
        let src = "#include \"util/helpers.h\"\n";
        let imports = cpp_imports(src);
        assert!(imports[0].is_relative);
        assert_eq!(imports[0].source, "util/helpers.h");
        assert_eq!(imports[0].imported_names, vec!["helpers.h".to_owned()]);
    }

    #[test]
    fn test_c_records_and_typedefs() {
        let src = concat!(
            "struct point { int x; int y; };\n",
            "union value { int i; float f; };\n",
            "enum color { RED, BLUE };\n",
            "typedef unsigned long size_type;\n",
            "struct forward_only;\n",
        );
        let entities = c_entities(src);
        let kind_of = |name: &str| entities.iter().find(|e| e.name == name).map(|e| e.kind);
        assert_eq!(kind_of("point"), Some(EntityKind::Class));
        assert_eq!(kind_of("value"), Some(EntityKind::Class));
        assert_eq!(kind_of("color"), Some(EntityKind::Enum));
        assert_eq!(kind_of("size_type"), Some(EntityKind::TypeAlias));
        assert_eq!(kind_of("forward_only"), None, "forward declarations are skipped");
    }

    #[test]
    fn test_pointer_declarator_name_recovery() {
        let src = "char *dup_name(const char *input) { return 0; }\n";
        let entities = c_entities(src);
        assert_eq!(entities[0].name, "dup_name");
        assert_eq!(entities[0].metadata.parameters.len(), 1);
        assert_eq!(entities[0].metadata.parameters[0].name, "input");
    }

    #[test]
    fn test_variadic_and_void_parameters() {
        let src = "int printf_like(const char *fmt, ...) { return 0; }\nvoid no_args(void) {}\n";
        let entities = c_entities(src);

        let printf_like = entities.iter().find(|e| e.name == "printf_like").unwrap();
        let params = &printf_like.metadata.parameters;
        assert_eq!(params.len(), 2);
        assert_eq!(params[1].name, "...");
        assert!(params[1].is_rest);

        let no_args = entities.iter().find(|e| e.name == "no_args").unwrap();
        assert!(no_args.metadata.parameters.is_empty(), "(void) binds nothing");
    }

    #[test]
    fn test_unnamed_parameter_sentinel() {
        let src = "int handler(int, char *name);\nint handler(int code, char *name) { return code; }\n";
        let entities = c_entities(src);
        let def = entities.iter().find(|e| e.name == "handler").unwrap();
        assert_eq!(def.metadata.parameters[0].name, "code");

        let proto_src = "int cb(int) { return 0; }\n";
        let proto = c_entities(proto_src);
        assert_eq!(proto[0].metadata.parameters[0].name, "<unnamed>");
        assert_eq!(proto[0].metadata.parameters[0].ty.as_deref(), Some("int"));
    }

    #[test]
    fn test_cpp_class_with_bases() {
        let src = "class Derived : public Base, private Mixin { int x; };\n";
        let entities = cpp_entities(src);
        let class = &entities[0];
        assert_eq!(class.kind, EntityKind::Class);
        assert_eq!(class.name, "Derived");
        assert_eq!(class.metadata.extends.as_deref(), Some("Base"));
        assert_eq!(class.metadata.implements, vec!["Mixin".to_owned()]);
    }

    #[test]
    fn test_namespace_and_template_are_traversed_not_emitted() {
        let src = "namespace util {\ntemplate <typename T>\nT identity(T v) { return v; }\n}\n";
        let entities = cpp_entities(src);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "identity");
        assert_eq!(entities[0].kind, EntityKind::Function);
    }

    #[test]
    fn test_call_target_shapes() {
        let src = concat!(
            "void run(void (*fp)(void), int (*table[])(void)) {\n",
            "  plain();\n",
            "  std::sort(a, b);\n",
            "  (*fp)();\n",
            "  table[0]();\n",
            "  obj.finish();\n",
            "  ptr->close();\n",
            "}\n",
        );
        let calls = cpp_calls(src);
        let names: Vec<&str> = calls.iter().map(|c| c.called_name.as_str()).collect();
        assert!(names.contains(&"plain"));
        assert!(names.contains(&"sort"));
        assert!(names.contains(&"[pointer]"));
        assert!(names.contains(&"[indexed]"));
        assert!(names.contains(&"finish"));
        assert!(names.contains(&"close"));

        let sort = calls.iter().find(|c| c.called_name == "sort").unwrap();
        assert_eq!(sort.called_expression, "std::sort");
        assert!(calls.iter().all(|c| c.caller_name.as_deref() == Some("run")));
    }

    #[test]
    fn test_doc_comment_styles() {
        let src = "/** Frees the pool. */\nvoid pool_free(void) {}\n\n/// Line style.\n/// Second.\nvoid other(void) {}\n";
        let entities = c_entities(src);
        assert_eq!(
            entities[0].metadata.documentation.as_deref(),
            Some("/** Frees the pool. */")
        );
        assert_eq!(
            entities[1].metadata.documentation.as_deref(),
            Some("/// Line style.\n/// Second.")
        );
    }
}
