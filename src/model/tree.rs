//! Generic tree-query helpers over tree-sitter nodes.
//!
//! Everything here is grammar-agnostic: callers pass node kinds or predicates.

use tree_sitter::Node;

/// Kinds the Kotlin grammar emits for comments (both are `extras`, so they can
/// appear as siblings of any node).
pub const COMMENT_KINDS: &[&str] = &["line_comment", "multiline_comment"];

pub fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// 1-based line of the node's first byte.
pub fn node_line(node: Node) -> u32 {
    node.start_position().row as u32 + 1
}

pub fn is_comment(node: Node) -> bool {
    COMMENT_KINDS.contains(&node.kind())
}

pub fn find_child_by_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if child.kind() == kind {
                return Some(child);
            }
        }
    }
    None
}

/// First direct child whose kind is any of `kinds`.
pub fn find_child_by_kinds<'a>(node: Node<'a>, kinds: &[&str]) -> Option<Node<'a>> {
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if kinds.contains(&child.kind()) {
                return Some(child);
            }
        }
    }
    None
}

pub fn children_by_kind<'a>(node: Node<'a>, kind: &str) -> Vec<Node<'a>> {
    let mut out = Vec::new();
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if child.kind() == kind {
                out.push(child);
            }
        }
    }
    out
}

pub fn find_descendant_by_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if child.kind() == kind {
                return Some(child);
            }
            if let Some(found) = find_descendant_by_kind(child, kind) {
                return Some(found);
            }
        }
    }
    None
}

/// Pre-order collection of every descendant of `node` (excluding `node`
/// itself) that satisfies `pred`. Matching nodes are still descended into,
/// so nested matches follow their enclosing match.
pub fn collect_descendants<'a, F>(node: Node<'a>, pred: &F, out: &mut Vec<Node<'a>>)
where
    F: Fn(Node<'a>) -> bool,
{
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if pred(child) {
                out.push(child);
            }
            collect_descendants(child, pred, out);
        }
    }
}

/// First `ERROR` or zero-width `MISSING` node in pre-order, `node` included.
pub fn find_error<'a>(node: Node<'a>) -> Option<Node<'a>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    for i in 0..node.child_count() {
        if let Some(found) = node.child(i).and_then(find_error) {
            return Some(found);
        }
    }
    None
}

/// True when only whitespace precedes `node` on its first line, i.e. it is
/// not a trailing comment of whatever ends on that line.
pub fn starts_own_line(node: Node, source: &str) -> bool {
    let start = node.start_byte().min(source.len());
    let line_start = source[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    source[line_start..start].trim().is_empty()
}

/// Follow the last-child chain below `node` and return the first node on it
/// that satisfies `pred`.
///
/// Used to find a comment that the grammar attached to the tail of a
/// preceding header node instead of leaving it as a sibling.
pub fn find_trailing<'a, F>(node: Node<'a>, pred: &F) -> Option<Node<'a>>
where
    F: Fn(Node<'a>) -> bool,
{
    let count = node.child_count();
    if count == 0 {
        return None;
    }
    let last = node.child(count - 1)?;
    if pred(last) {
        return Some(last);
    }
    find_trailing(last, pred)
}

/// Last named child, skipping comments.
pub fn last_named_child<'a>(node: Node<'a>) -> Option<Node<'a>> {
    let mut i = node.named_child_count();
    while i > 0 {
        i -= 1;
        if let Some(child) = node.named_child(i) {
            if !is_comment(child) {
                return Some(child);
            }
        }
    }
    None
}

/// First named child, skipping comments.
pub fn first_named_child<'a>(node: Node<'a>) -> Option<Node<'a>> {
    for i in 0..node.named_child_count() {
        if let Some(child) = node.named_child(i) {
            if !is_comment(child) {
                return Some(child);
            }
        }
    }
    None
}

/// Collapse all whitespace out of a node's text, e.g. a receiver chain
/// split across lines (`repo\n    .users` → `repo.users`).
pub fn compact_text(node: Node, source: &str) -> String {
    node_text(node, source).split_whitespace().collect()
}
