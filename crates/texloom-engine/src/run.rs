//! Run assembly.
//!
//! A delimiter pair may straddle several underlying leaves (text fragments
//! split by the host, or `<br>` boundaries), so scanning always works on the
//! merged text of the whole contiguous range. Runs are rebuilt fresh for
//! every scan and never cached.

use crate::dom::{NodeId, Tree};

/// The merged logical text of adjacent text and break leaves, plus the
/// leaves that produced it (for removal after a splice). Concatenation order
/// matches document order; breaks contribute a newline.
#[derive(Debug)]
pub struct Run {
    pub parts: Vec<NodeId>,
    pub text: String,
}

/// Assemble the run containing `leaf`, expanding across the contiguous
/// sibling range of text nodes and break elements in both directions.
pub fn merge_run(tree: &Tree, leaf: NodeId) -> Run {
    debug_assert!(tree.is_text(leaf), "runs start from text leaves");

    let mut first = leaf;
    if let Some(parent) = tree.parent(leaf) {
        let siblings = tree.children(parent);
        let position = siblings
            .iter()
            .position(|&s| s == leaf)
            .expect("leaf is a child of its parent");
        let mut start = position;
        while start > 0 && belongs_to_run(tree, siblings[start - 1]) {
            start -= 1;
        }
        first = siblings[start];
    }

    let mut parts = Vec::new();
    let mut text = String::new();
    if let Some(parent) = tree.parent(leaf) {
        let siblings = tree.children(parent);
        let start = siblings
            .iter()
            .position(|&s| s == first)
            .expect("first is a child of the same parent");
        for &sibling in &siblings[start..] {
            if !belongs_to_run(tree, sibling) {
                break;
            }
            match tree.text(sibling) {
                Some(content) => text.push_str(content),
                None => text.push('\n'),
            }
            parts.push(sibling);
        }
    } else {
        // Detached leaf: the run is just the leaf itself.
        text.push_str(tree.text(leaf).unwrap_or_default());
        parts.push(leaf);
    }

    Run { parts, text }
}

fn belongs_to_run(tree: &Tree, id: NodeId) -> bool {
    tree.is_text(id) || tree.is_break(id)
}
