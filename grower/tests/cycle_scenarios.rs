//! End-to-end cycle scenarios driven through the public API.
//!
//! These tests run full select/expand/simulate/backpropagate cycles against
//! scripted oracles and check tree statistics afterwards.

use std::time::Duration;

use grower::core::backprop::backpropagate;
use grower::core::invariants::validate_invariants;
use grower::core::node::{NodeId, Tree};
use grower::core::selector::select_leaf;
use grower::search::{CycleRunner, SearchSettings};
use grower::test_support::ScriptedOracle;

fn settings() -> SearchSettings {
    SearchSettings {
        retry_backoff: Duration::ZERO,
        ..SearchSettings::default()
    }
}

/// Empty root, generator always "A", evaluator always "5", three iterations.
///
/// Iteration 1 expands the root (always eligible) and scores the new child.
/// Iterations 2 and 3 descend through that child, so the root keeps a single
/// child that ends up as the decision.
#[test]
fn constant_oracles_three_iterations() {
    let mut tree = Tree::new("");
    let runner = CycleRunner::new(
        ScriptedOracle::constant("A"),
        ScriptedOracle::constant("5"),
        settings(),
    );

    let first = runner
        .run_cycle(&mut tree, NodeId::ROOT, "goal", 1)
        .expect("first iteration");
    let child = first.decision.expect("decision after first iteration");
    assert_eq!(tree.get(NodeId::ROOT).children, vec![child]);
    assert_eq!(tree.get(child).state, "A");
    assert_eq!(tree.get(child).visits, 1);
    assert_eq!(tree.get(child).value, 5.0);

    let rest = runner
        .run_cycle(&mut tree, NodeId::ROOT, "goal", 2)
        .expect("remaining iterations");

    assert_eq!(tree.get(NodeId::ROOT).visits, 3);
    assert_eq!(tree.get(NodeId::ROOT).value, 15.0);
    assert_eq!(tree.get(NodeId::ROOT).children.len(), 1);
    assert_eq!(rest.decision, Some(child));
    assert!(validate_invariants(&tree, "\n").is_empty());
}

#[test]
fn visits_count_backpropagations_through_each_node() {
    let mut tree = Tree::new("");
    let generator = ScriptedOracle::sequence(vec![Ok("a"), Ok("b"), Ok("c"), Ok("d"), Ok("e")]);
    let evaluator = ScriptedOracle::sequence(vec![Ok("1"), Ok("9"), Ok("2"), Ok("7"), Ok("3")]);
    let runner = CycleRunner::new(generator, evaluator, settings());
    runner
        .run_cycle(&mut tree, NodeId::ROOT, "goal", 5)
        .expect("cycle");

    // Every iteration backpropagates exactly once through the root, and each
    // node's visits equal one (its own simulation) plus its children's visits.
    assert_eq!(tree.get(NodeId::ROOT).visits, 5);
    for id in tree.ids().filter(|&id| id != NodeId::ROOT) {
        let node = tree.get(id);
        let below: u32 = node.children.iter().map(|&c| tree.get(c).visits).sum();
        assert_eq!(node.visits, below + 1, "{id}");
    }
    let total: f64 = [1.0, 9.0, 2.0, 7.0, 3.0].iter().sum();
    assert_eq!(tree.get(NodeId::ROOT).value, total);
    assert!(validate_invariants(&tree, "\n").is_empty());
}

#[test]
fn backpropagation_changes_path_by_exactly_one_visit_and_score() {
    let mut tree = Tree::new("");
    let a = tree.add_child(NodeId::ROOT, "\n", "a");
    let b = tree.add_child(a, "\n", "b");
    let before: Vec<(u32, f64)> = tree
        .ids()
        .map(|id| (tree.get(id).visits, tree.get(id).value))
        .collect();

    backpropagate(&mut tree, b, -2.5);

    for (id, (visits, value)) in tree.ids().zip(before) {
        assert_eq!(tree.get(id).visits, visits + 1);
        assert_eq!(tree.get(id).value, value - 2.5);
    }
}

#[test]
fn garbage_scores_fall_back_to_one() {
    let mut tree = Tree::new("");
    let runner = CycleRunner::new(
        ScriptedOracle::constant("A"),
        ScriptedOracle::constant("not-a-number"),
        settings(),
    );
    runner
        .run_cycle(&mut tree, NodeId::ROOT, "goal", 2)
        .expect("cycle");
    assert_eq!(tree.get(NodeId::ROOT).visits, 2);
    assert_eq!(tree.get(NodeId::ROOT).value, 2.0);
}

#[test]
fn zero_iterations_never_decide_on_childless_root() {
    let mut tree = Tree::new("draft");
    let generator = ScriptedOracle::constant("A");
    let evaluator = ScriptedOracle::constant("5");
    let runner = CycleRunner::new(&generator, &evaluator, settings());
    let outcome = runner
        .run_cycle(&mut tree, NodeId::ROOT, "goal", 0)
        .expect("cycle");
    assert_eq!(outcome.decision, None);
    assert!(generator.calls().is_empty());
    assert!(evaluator.calls().is_empty());
}

#[test]
fn selection_is_read_only_and_lands_on_a_leaf() {
    let mut tree = Tree::new("");
    let runner = CycleRunner::new(
        ScriptedOracle::constant("x"),
        ScriptedOracle::sequence(vec![Ok("3"), Ok("1"), Ok("4"), Ok("1"), Ok("5"), Ok("9")]),
        settings(),
    );
    runner
        .run_cycle(&mut tree, NodeId::ROOT, "goal", 6)
        .expect("cycle");

    let first = select_leaf(&tree, NodeId::ROOT);
    assert!(tree.get(first).is_leaf());
    for _ in 0..3 {
        assert_eq!(select_leaf(&tree, NodeId::ROOT), first);
    }
}

#[test]
fn goal_is_threaded_unchanged_to_every_oracle_call() {
    let mut tree = Tree::new("seed");
    let generator = ScriptedOracle::constant("more");
    let evaluator = ScriptedOracle::constant("2");
    let runner = CycleRunner::new(&generator, &evaluator, settings());
    runner
        .run_cycle(&mut tree, NodeId::ROOT, "write a sonnet", 4)
        .expect("cycle");

    let calls: Vec<_> = generator.calls().into_iter().chain(evaluator.calls()).collect();
    assert_eq!(calls.len(), 8);
    assert!(calls.iter().all(|call| call.goal == "write a sonnet"));
    assert!(
        evaluator
            .calls()
            .iter()
            .all(|call| call.state.starts_with("seed\nmore"))
    );
}
