//! Multi-cycle growth loop for `grower grow`.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::core::node::{NodeId, Tree};
use crate::io::oracle::{Evaluator, Generator};
use crate::search::{CycleOutcome, CycleRunner};

/// Reason why `run_grow` stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowStop {
    /// The configured number of cycles ran.
    CycleLimit,
    /// A cycle ended with no child under its root.
    NoDecision,
}

/// Summary of a growth loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrowOutcome {
    pub cycles_run: u32,
    /// Decisions in commit order; each one is a child of the previous.
    pub committed: Vec<NodeId>,
    /// Last committed node, or the start node if nothing was committed.
    pub head: NodeId,
    pub stop: GrowStop,
}

/// Run cycles repeatedly, re-rooting at each decision.
///
/// Stops after `cycles` cycles or the first cycle without a decision. Any
/// error from a cycle (e.g. an oracle failure under the abort policy) stops
/// the loop immediately.
pub fn run_grow<G, E, F>(
    runner: &CycleRunner<G, E>,
    tree: &mut Tree,
    start: NodeId,
    goal: &str,
    iterations: u32,
    cycles: u32,
    mut on_cycle: F,
) -> Result<GrowOutcome>
where
    G: Generator,
    E: Evaluator,
    F: FnMut(&Tree, &CycleOutcome),
{
    let mut head = start;
    let mut committed = Vec::new();

    for cycle in 1..=cycles {
        debug!(cycle, %head, "starting cycle");
        let outcome = runner.run_cycle(tree, head, goal, iterations)?;
        on_cycle(tree, &outcome);

        let Some(decision) = outcome.decision else {
            info!(cycle, "no decision, stopping");
            return Ok(GrowOutcome {
                cycles_run: cycle,
                committed,
                head,
                stop: GrowStop::NoDecision,
            });
        };
        committed.push(decision);
        head = decision;
    }

    Ok(GrowOutcome {
        cycles_run: cycles,
        committed,
        head,
        stop: GrowStop::CycleLimit,
    })
}
