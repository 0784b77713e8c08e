//! Structural checks over a search tree.

use crate::core::node::{NodeId, Tree, join_state};

/// Check tree invariants and return one message per violation:
/// - every child's `parent` points back at the node listing it
/// - a child's state is its parent's state joined with its increment
/// - an unvisited node carries no value
/// - a child never has more visits than its parent
/// - the root has no parent and no other node is parentless
pub fn validate_invariants(tree: &Tree, separator: &str) -> Vec<String> {
    let mut errors = Vec::new();
    for id in tree.ids() {
        let node = tree.get(id);

        match node.parent {
            None if id != tree.root() => errors.push(format!("{id}: missing parent")),
            Some(_) if id == tree.root() => errors.push(format!("{id}: root must not have a parent")),
            _ => {}
        }

        if node.visits == 0 && node.value != 0.0 {
            errors.push(format!(
                "{id}: unvisited node carries value {}",
                node.value
            ));
        }

        for &child_id in &node.children {
            if !tree.contains(child_id) {
                errors.push(format!("{id}: child {child_id} not in tree"));
                continue;
            }
            check_child(tree, id, child_id, separator, &mut errors);
        }
    }
    errors
}

fn check_child(
    tree: &Tree,
    parent_id: NodeId,
    child_id: NodeId,
    separator: &str,
    errors: &mut Vec<String>,
) {
    let parent = tree.get(parent_id);
    let child = tree.get(child_id);

    if child.parent != Some(parent_id) {
        errors.push(format!(
            "{child_id}: listed under {parent_id} but parent is {:?}",
            child.parent
        ));
    }

    if child.state != join_state(&parent.state, separator, &child.increment) {
        errors.push(format!(
            "{child_id}: state does not extend parent {parent_id} with its increment"
        ));
    }

    if child.visits > parent.visits {
        errors.push(format!(
            "{child_id}: visits {} exceed parent {parent_id} visits {}",
            child.visits, parent.visits
        ));
    }
}
