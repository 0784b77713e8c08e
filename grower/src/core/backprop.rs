//! Upward statistics update.

use crate::core::node::{NodeId, Tree};

/// Add one visit and `score` to `from` and every ancestor up to the tree root.
pub fn backpropagate(tree: &mut Tree, from: NodeId, score: f64) {
    let mut current = Some(from);
    while let Some(id) = current {
        let node = tree.get_mut(id);
        node.visits += 1;
        node.value += score;
        current = node.parent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn updates_node_and_every_ancestor() {
        let mut tree = Tree::new("");
        let a = tree.add_child(NodeId::ROOT, "", "a");
        let b = tree.add_child(a, "", "b");
        let sibling = tree.add_child(NodeId::ROOT, "", "s");

        backpropagate(&mut tree, b, 4.0);
        backpropagate(&mut tree, a, -1.5);

        assert_eq!(tree.get(b).visits, 1);
        assert_eq!(tree.get(b).value, 4.0);
        assert_eq!(tree.get(a).visits, 2);
        assert_eq!(tree.get(a).value, 2.5);
        assert_eq!(tree.get(NodeId::ROOT).visits, 2);
        assert_eq!(tree.get(NodeId::ROOT).value, 2.5);
        assert_eq!(tree.get(sibling).visits, 0);
    }

    #[test]
    fn root_only_walk_stops_at_root() {
        let mut tree = Tree::new("");
        backpropagate(&mut tree, NodeId::ROOT, 1.0);
        assert_eq!(tree.get(NodeId::ROOT).visits, 1);
        assert_eq!(tree.get(NodeId::ROOT).value, 1.0);
    }
}
