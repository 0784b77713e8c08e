//! Final move choice after a cycle.

use crate::core::node::{NodeId, Tree};

/// Most visited immediate child of `root`, earliest child on ties.
///
/// Returns `None` when `root` has no children.
pub fn most_visited_child(tree: &Tree, root: NodeId) -> Option<NodeId> {
    let mut best: Option<(NodeId, u32)> = None;
    for &child in &tree.get(root).children {
        let visits = tree.get(child).visits;
        match best {
            Some((_, best_visits)) if visits <= best_visits => {}
            _ => best = Some((child, visits)),
        }
    }
    best.map(|(id, _)| id)
}

/// Follow most visited children from `root` down to a leaf.
///
/// The first element is the first child below `root`; an empty vector means
/// `root` is a leaf.
pub fn best_path(tree: &Tree, root: NodeId) -> Vec<NodeId> {
    let mut path = Vec::new();
    let mut current = root;
    while let Some(next) = most_visited_child(tree, current) {
        path.push(next);
        current = next;
    }
    path
}
