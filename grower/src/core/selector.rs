//! UCT descent from a start node to a leaf.

use crate::core::node::{NodeId, Tree};

/// Descend from `start` until a node without children is reached.
///
/// Read-only: calling this twice on an unchanged tree returns the same leaf.
pub fn select_leaf(tree: &Tree, start: NodeId) -> NodeId {
    let mut current = start;
    while let Some(next) = select_child(tree, current) {
        current = next;
    }
    current
}

/// Pick the child of `parent` to descend into, or `None` for a leaf.
///
/// When no child has been visited yet the first child wins outright. Otherwise
/// the child with the highest UCT score wins, unvisited children scoring
/// `+inf`. Ties keep the earliest child.
pub fn select_child(tree: &Tree, parent: NodeId) -> Option<NodeId> {
    let node = tree.get(parent);
    let first = *node.children.first()?;
    if node.children.iter().all(|&c| tree.get(c).visits == 0) {
        return Some(first);
    }

    let mut best = first;
    let mut best_score = f64::NEG_INFINITY;
    for &child in &node.children {
        let score = uct_score(tree, parent, child);
        if score > best_score {
            best = child;
            best_score = score;
        }
    }
    Some(best)
}

/// Exploitation plus exploration term for `child` under `parent`.
pub fn uct_score(tree: &Tree, parent: NodeId, child: NodeId) -> f64 {
    let child = tree.get(child);
    if child.visits == 0 {
        return f64::INFINITY;
    }
    let visits = f64::from(child.visits);
    let parent_visits = f64::from(tree.get(parent).visits);
    let exploitation = child.value / visits;
    let exploration = (2.0 * parent_visits.ln() / visits).sqrt();
    exploitation + exploration
}
