//! AST walker: deadline-bounded parsing and syntax-error collection.
//!
//! Parsing is a single non-incremental pass; the walker never mutates the
//! tree. The deadline is observed through the parser's progress callback, so
//! a pathological input cannot overshoot the budget by more than one
//! progress tick.

use std::time::Instant;

use std::ops::ControlFlow;

use tree_sitter::{Node, ParseOptions, ParseState, Parser, Tree};

use crate::model::ParseError;

/// Parse `source` with `parser`, cancelling when `deadline` passes.
///
/// Returns `None` when the grammar produces no tree OR when the deadline
/// cancelled the parse — the caller distinguishes the two by checking the
/// clock against the deadline. A cancelled parser keeps partial state, so it
/// is reset before the handle goes back into the thread-local cache.
pub(crate) fn parse_with_deadline(
    parser: &mut Parser,
    source: &[u8],
    deadline: Instant,
) -> Option<Tree> {
    let mut expired = |_state: &ParseState| {
        if Instant::now() >= deadline {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    };
    let options = ParseOptions::new().progress_callback(&mut expired);

    let tree = parser.parse_with_options(
        &mut |byte, _point| {
            if byte < source.len() {
                &source[byte..]
            } else {
                &[]
            }
        },
        None,
        Some(options),
    );
    if tree.is_none() {
        parser.reset();
    }
    tree
}

/// Collect one recoverable [`ParseError`] per `ERROR` node and per missing
/// node under `root`, in pre-order. Lines are 1-based, columns 0-based.
pub(crate) fn collect_syntax_errors(root: Node) -> Vec<ParseError> {
    let mut errors = Vec::new();
    visit(root, &mut errors);
    errors
}

fn visit(node: Node, errors: &mut Vec<ParseError>) {
    let pos = node.start_position();
    if node.is_error() {
        errors.push(ParseError::recoverable(
            format!("Syntax error: unexpected {}", node.kind()),
            pos.row + 1,
            pos.column,
        ));
    } else if node.is_missing() {
        errors.push(ParseError::recoverable(
            format!("Missing {}", node.kind()),
            pos.row + 1,
            pos.column,
        ));
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit(child, errors);
    }
}
