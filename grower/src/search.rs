//! One search cycle: select, expand, simulate, backpropagate, then decide.

use std::thread;
use std::time::Duration;

use anyhow::{Result, bail};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::core::backprop::backpropagate;
use crate::core::decision::most_visited_child;
use crate::core::node::{NodeId, Tree};
use crate::core::selector::select_leaf;
use crate::io::config::{FailurePolicy, SearchConfig};
use crate::io::oracle::{Evaluator, Generator, OracleFailure, OracleInput, OraclePhase};

/// Score used when the evaluator response is not an integer.
pub const FALLBACK_SCORE: f64 = 1.0;

/// Knobs the cycle runner needs from the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub separator: String,
    pub max_nodes: Option<usize>,
    pub failure_policy: FailurePolicy,
    pub oracle_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for SearchSettings {
    fn from(cfg: &SearchConfig) -> Self {
        Self {
            separator: cfg.separator.clone(),
            max_nodes: cfg.max_nodes,
            failure_policy: cfg.failure_policy,
            oracle_retries: cfg.oracle_retries,
            retry_backoff: Duration::from_millis(cfg.retry_backoff_ms),
        }
    }
}

/// Result of one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Node the cycle searched from.
    pub root: NodeId,
    /// Most visited child of `root`, or `None` when `root` has no children.
    pub decision: Option<NodeId>,
    /// Iterations attempted.
    pub iterations: u32,
    /// Children created during the cycle.
    pub expanded: u32,
    /// Iterations abandoned under [`FailurePolicy::Skip`].
    pub skipped: u32,
}

impl CycleOutcome {
    pub fn report(&self, tree: &Tree) -> Option<DecisionReport> {
        self.decision.map(|id| DecisionReport::new(tree, id))
    }
}

/// Serializable summary of a chosen node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionReport {
    pub node: String,
    pub depth: usize,
    pub increment: String,
    pub state: String,
    pub visits: u32,
    pub value: f64,
    pub mean_value: Option<f64>,
    pub tree_size: usize,
}

impl DecisionReport {
    pub fn new(tree: &Tree, id: NodeId) -> Self {
        let node = tree.get(id);
        Self {
            node: id.to_string(),
            depth: tree.depth(id),
            increment: node.increment.clone(),
            state: node.state.clone(),
            visits: node.visits,
            value: node.value,
            mean_value: node.mean_value(),
            tree_size: tree.len(),
        }
    }
}

/// Parse an evaluator response into a score.
///
/// Anything that is not an integer (after trimming) scores [`FALLBACK_SCORE`].
pub fn parse_score(response: &str) -> f64 {
    match response.trim().parse::<i64>() {
        Ok(score) => score as f64,
        Err(err) => {
            warn!(response = %response.trim(), err = %err, "unparseable score, using fallback");
            FALLBACK_SCORE
        }
    }
}

/// Ask `generator` for a continuation of `node` and attach it as a new child.
///
/// Not idempotent: every call creates another child.
pub fn expand<G: Generator>(
    tree: &mut Tree,
    node: NodeId,
    generator: &G,
    goal: &str,
    separator: &str,
) -> Result<NodeId> {
    let parent = tree.get(node);
    let continuation = generator.generate(&OracleInput {
        goal,
        state: &parent.state,
        annotations: &parent.annotations,
    })?;
    let child = tree.add_child(node, separator, continuation.trim());
    debug!(parent = %node, %child, "expanded");
    Ok(child)
}

/// Score `node`'s state with `evaluator`.
///
/// Oracle failures are errors; malformed responses are not.
pub fn simulate<E: Evaluator>(tree: &Tree, node: NodeId, evaluator: &E, goal: &str) -> Result<f64> {
    let target = tree.get(node);
    let response = evaluator.evaluate(&OracleInput {
        goal,
        state: &target.state,
        annotations: &target.annotations,
    })?;
    let score = parse_score(&response);
    debug!(%node, score, "simulated");
    Ok(score)
}

/// Runs search cycles against a pair of oracles.
pub struct CycleRunner<G, E> {
    generator: G,
    evaluator: E,
    settings: SearchSettings,
}

impl<G: Generator, E: Evaluator> CycleRunner<G, E> {
    pub fn new(generator: G, evaluator: E, settings: SearchSettings) -> Self {
        Self {
            generator,
            evaluator,
            settings,
        }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Run `iterations` iterations from `root` and pick its most visited child.
    ///
    /// The tree is left intact so later cycles can continue from the decision.
    /// Under [`FailurePolicy::Abort`] an oracle failure ends the cycle with an
    /// [`OracleFailure`] error; statistics from earlier iterations are kept.
    /// A `root` that does not belong to `tree` is rejected before any oracle call.
    #[instrument(skip_all, fields(root = %root, iterations = iterations, goal_len = goal.len()))]
    pub fn run_cycle(
        &self,
        tree: &mut Tree,
        root: NodeId,
        goal: &str,
        iterations: u32,
    ) -> Result<CycleOutcome> {
        if !tree.contains(root) {
            bail!("cycle root {root} is not in the tree ({} nodes)", tree.len());
        }
        let mut outcome = CycleOutcome {
            root,
            decision: None,
            iterations: 0,
            expanded: 0,
            skipped: 0,
        };

        for iteration in 1..=iterations {
            outcome.iterations = iteration;
            let leaf = select_leaf(tree, root);
            let mut current = leaf;

            if self.may_expand(tree, root, leaf) {
                let expanded = self.with_retries(OraclePhase::Expand, leaf, iteration, || {
                    expand(tree, leaf, &self.generator, goal, &self.settings.separator)
                });
                match self.resolve(expanded)? {
                    Some(child) => {
                        current = child;
                        outcome.expanded += 1;
                    }
                    None => {
                        outcome.skipped += 1;
                        continue;
                    }
                }
            }

            let scored = self.with_retries(OraclePhase::Simulate, current, iteration, || {
                simulate(tree, current, &self.evaluator, goal)
            });
            let Some(score) = self.resolve(scored)? else {
                outcome.skipped += 1;
                continue;
            };

            backpropagate(tree, current, score);
        }

        outcome.decision = most_visited_child(tree, root);
        match outcome.decision {
            Some(id) => info!(
                decision = %id,
                visits = tree.get(id).visits,
                expanded = outcome.expanded,
                skipped = outcome.skipped,
                "cycle decided"
            ),
            None => info!(skipped = outcome.skipped, "cycle ended without a decision"),
        }
        Ok(outcome)
    }

    /// A node may be expanded when it is the cycle root or has been scored
    /// before, and the node cap (if any) leaves room.
    fn may_expand(&self, tree: &Tree, root: NodeId, leaf: NodeId) -> bool {
        if leaf != root && tree.get(leaf).visits == 0 {
            return false;
        }
        match self.settings.max_nodes {
            Some(cap) if tree.len() >= cap => {
                debug!(cap, "node cap reached, not expanding");
                false
            }
            _ => true,
        }
    }

    fn with_retries<T>(
        &self,
        phase: OraclePhase,
        node: NodeId,
        iteration: u32,
        mut call: impl FnMut() -> Result<T>,
    ) -> Result<T, OracleFailure> {
        let attempts = self.settings.oracle_retries + 1;
        let mut last_err = None;
        for attempt in 1..=attempts {
            match call() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    warn!(%phase, %node, iteration, attempt, err = %format!("{err:#}"), "oracle call failed");
                    last_err = Some(err);
                    if attempt < attempts && !self.settings.retry_backoff.is_zero() {
                        thread::sleep(self.settings.retry_backoff);
                    }
                }
            }
        }
        Err(OracleFailure {
            phase,
            node,
            iteration,
            attempts,
            message: last_err
                .map(|err| format!("{err:#}"))
                .unwrap_or_default(),
        })
    }

    /// Apply the failure policy: `Ok(None)` means skip this iteration.
    fn resolve<T>(&self, result: Result<T, OracleFailure>) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(failure) => match self.settings.failure_policy {
                FailurePolicy::Abort => Err(failure.into()),
                FailurePolicy::Skip => {
                    warn!(
                        phase = %failure.phase,
                        node = %failure.node,
                        iteration = failure.iteration,
                        "skipping iteration"
                    );
                    Ok(None)
                }
            },
        }
    }
}
