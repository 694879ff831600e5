//! Small node helpers shared by every per-language extractor.

use tree_sitter::Node;

use crate::model::{CodeEntity, EntityKind, EntityMetadata};

/// Placeholder name for entities emitted under `include_anonymous`.
pub(crate) const ANONYMOUS: &str = "<anonymous>";

/// Extract the UTF-8 text of a node from the original source bytes.
pub(crate) fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Owned copy of a node's text — results must not borrow from tree memory.
pub(crate) fn owned_text(node: Node, source: &[u8]) -> String {
    node_text(node, source).to_owned()
}

/// 1-based line of a node's start.
pub(crate) fn start_line(node: Node) -> usize {
    node.start_position().row + 1
}

/// 0-based column of a node's start.
pub(crate) fn start_column(node: Node) -> usize {
    node.start_position().column
}

/// Strip one layer of matching string quotes (`'`, `"`, backtick).
pub(crate) fn strip_quotes(text: &str) -> &str {
    let trimmed = text.trim();
    for quote in ['"', '\'', '`'] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}

/// First direct child whose kind is one of `kinds`, in child order.
pub(crate) fn find_first_child<'a>(node: Node<'a>, kinds: &[&str]) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .find(|child| kinds.contains(&child.kind()))
}

/// True iff `node` has a direct child of the given kind.
pub(crate) fn has_child_of_kind(node: Node, kind: &str) -> bool {
    find_first_child(node, &[kind]).is_some()
}

/// True iff any ancestor of `node` has the given kind.
// Part of the shared helper surface; current extractors resolve ancestry at
// the walk frame instead.
#[allow(dead_code)]
pub(crate) fn has_parent_of_kind(node: Node, kind: &str) -> bool {
    let mut current = node.parent();
    while let Some(n) = current {
        if n.kind() == kind {
            return true;
        }
        current = n.parent();
    }
    false
}

/// Collect the text of every identifier-like leaf under `node`, pre-order.
#[allow(dead_code)]
pub(crate) fn extract_identifiers(node: Node, source: &[u8], out: &mut Vec<String>) {
    if node.child_count() == 0 && node.kind().ends_with("identifier") {
        out.push(owned_text(node, source));
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        extract_identifiers(child, source, out);
    }
}

/// Build a [`CodeEntity`] spanning `node`, with the shared coordinate
/// conventions (1-based lines, 0-based byte columns).
pub(crate) fn entity_at(
    node: Node,
    kind: EntityKind,
    name: String,
    path: &str,
    is_exported: bool,
    metadata: EntityMetadata,
) -> CodeEntity {
    let start = node.start_position();
    let end = node.end_position();
    CodeEntity {
        kind,
        name,
        path: path.to_owned(),
        line_start: start.row + 1,
        line_end: end.row + 1,
        column_start: start.column,
        column_end: end.column,
        is_exported,
        metadata,
    }
}

/// How a language writes doc comments, for [`doc_comment_above`].
pub(crate) struct DocStyle {
    /// Node kinds that are comments in this grammar.
    pub comment_kinds: &'static [&'static str],
    /// Prefixes that make a line comment part of a doc block (`"///"`,
    /// `"//"`, `"#"`).
    pub line_prefixes: &'static [&'static str],
    /// Prefixes that make a block comment a doc comment (`"/**"`, `"/*!"`).
    pub block_prefixes: &'static [&'static str],
    /// Sibling kinds to skip between the doc comment and the declaration
    /// (Rust attribute items, Python decorators).
    pub skip_kinds: &'static [&'static str],
}

/// The doc comment attached immediately above `node`, source-form.
///
/// A matching block comment wins outright; otherwise a contiguous run of
/// matching line comments is gathered bottom-up and joined with newlines.
/// A blank line breaks the attachment.
pub(crate) fn doc_comment_above(node: Node, source: &[u8], style: &DocStyle) -> Option<String> {
    let mut anchor_row = node.start_position().row;
    let mut current = node.prev_sibling();

    // Skip interleaved attributes/decorators, re-anchoring on each.
    while let Some(sibling) = current {
        if style.skip_kinds.contains(&sibling.kind()) {
            anchor_row = sibling.start_position().row;
            current = sibling.prev_sibling();
        } else {
            break;
        }
    }

    let first = current?;
    if !style.comment_kinds.contains(&first.kind()) {
        return None;
    }
    if first.end_position().row + 1 < anchor_row {
        return None;
    }

    let text = node_text(first, source);
    if style.block_prefixes.iter().any(|p| text.starts_with(p)) {
        return Some(text.to_owned());
    }
    if !style.line_prefixes.iter().any(|p| text.starts_with(p)) {
        return None;
    }

    // Gather the contiguous run of matching line comments above.
    let mut lines = vec![text.to_owned()];
    let mut bottom = first;
    while let Some(prev) = bottom.prev_sibling() {
        let adjacent = prev.end_position().row + 1 == bottom.start_position().row;
        if !adjacent || !style.comment_kinds.contains(&prev.kind()) {
            break;
        }
        let prev_text = node_text(prev, source);
        if !style.line_prefixes.iter().any(|p| prev_text.starts_with(p)) {
            break;
        }
        lines.push(prev_text.to_owned());
        bottom = prev;
    }
    lines.reverse();
    Some(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    use crate::language::Language;

    fn parse(lang: Language, source: &str) -> tree_sitter::Tree {
        let mut parser = Parser::new();
        parser.set_language(lang.grammar()).unwrap();
        parser.parse(source.as_bytes(), None).unwrap()
    }

    #[test]
    fn test_strip_quotes_handles_all_quote_styles() {
        assert_eq!(strip_quotes("\"react\""), "react");
        assert_eq!(strip_quotes("'./utils'"), "./utils");
        assert_eq!(strip_quotes("`mod`"), "mod");
        assert_eq!(strip_quotes("bare"), "bare");
        assert_eq!(strip_quotes("\"\""), "");
    }

    #[test]
    fn test_find_first_child_respects_order() {
        let src = "class A { m() {} }";
        let tree = parse(Language::TypeScript, src);
        let class_decl = tree.root_node().child(0).unwrap();
        assert_eq!(class_decl.kind(), "class_declaration");
        let body = find_first_child(class_decl, &["class_body"]).unwrap();
        assert_eq!(body.kind(), "class_body");
        assert!(find_first_child(class_decl, &["no_such_kind"]).is_none());
    }

    #[test]
    fn test_has_parent_of_kind_walks_all_ancestors() {
        let src = "export function f() {}";
        let tree = parse(Language::TypeScript, src);
        let export = tree.root_node().child(0).unwrap();
        let func = find_first_child(export, &["function_declaration"]).unwrap();
        let name = func.child_by_field_name("name").unwrap();
        assert!(has_parent_of_kind(name, "export_statement"));
        assert!(!has_parent_of_kind(name, "class_declaration"));
    }

    #[test]
    fn test_extract_identifiers_collects_leaves() {
        let src = "const { a, b } = c;";
        let tree = parse(Language::JavaScript, src);
        let mut out = Vec::new();
        extract_identifiers(tree.root_node(), src.as_bytes(), &mut out);
        assert!(out.contains(&"a".to_owned()));
        assert!(out.contains(&"b".to_owned()));
        assert!(out.contains(&"c".to_owned()));
    }

    #[test]
    fn test_doc_comment_above_block_form() {
        let style = DocStyle {
            comment_kinds: &["comment"],
            line_prefixes: &[],
            block_prefixes: &["/**"],
            skip_kinds: &[],
        };
        let src = "/** Adds. */\nfunction add() {}\n";
        let tree = parse(Language::JavaScript, src);
        let func = tree.root_node().child(1).unwrap();
        assert_eq!(func.kind(), "function_declaration");
        let doc = doc_comment_above(func, src.as_bytes(), &style);
        assert_eq!(doc.as_deref(), Some("/** Adds. */"));
    }

    #[test]
    fn test_doc_comment_above_line_run_stops_at_blank() {
        let style = DocStyle {
            comment_kinds: &["comment"],
            line_prefixes: &["//"],
            block_prefixes: &[],
            skip_kinds: &[],
        };
        let src = "// stale note\n\n// Start does a thing.\n// Second line.\nfunc Start() {}\n";
        let tree = parse(Language::Go, src);
        let func = find_first_child(tree.root_node(), &["function_declaration"]).unwrap();
        let doc = doc_comment_above(func, src.as_bytes(), &style).unwrap();
        assert_eq!(doc, "// Start does a thing.\n// Second line.");
    }

    #[test]
    fn test_doc_comment_not_attached_across_gap() {
        let style = DocStyle {
            comment_kinds: &["comment"],
            line_prefixes: &["//"],
            block_prefixes: &[],
            skip_kinds: &[],
        };
        let src = "// far away\n\n\nfunc Start() {}\n";
        let tree = parse(Language::Go, src);
        let func = tree.root_node().child(1).unwrap();
        assert!(doc_comment_above(func, src.as_bytes(), &style).is_none());
    }
}
