//! Oracle abstractions consulted by the search.
//!
//! [`Generator`] and [`Evaluator`] decouple the search loop from whatever
//! actually proposes and judges content. [`CommandOracle`] backs both with an
//! external command; tests use scripted oracles that never spawn processes.

use std::fmt;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};

use crate::core::node::NodeId;
use crate::io::config::OracleCommandConfig;
use crate::io::process::run_command_with_timeout;
use crate::io::prompt::{PromptEngine, PromptKind};

/// What an oracle gets to see about a node.
#[derive(Debug, Clone, Copy)]
pub struct OracleInput<'a> {
    /// Goal threaded unchanged through a whole run.
    pub goal: &'a str,
    /// Accumulated artifact content at the node.
    pub state: &'a str,
    /// External evidence attached to the node.
    pub annotations: &'a [String],
}

/// Proposes the next piece of content for a state.
pub trait Generator {
    fn generate(&self, input: &OracleInput<'_>) -> Result<String>;
}

/// Judges a state. The response is expected to parse as an integer.
pub trait Evaluator {
    fn evaluate(&self, input: &OracleInput<'_>) -> Result<String>;
}

impl<T: Generator + ?Sized> Generator for &T {
    fn generate(&self, input: &OracleInput<'_>) -> Result<String> {
        (**self).generate(input)
    }
}

impl<T: Evaluator + ?Sized> Evaluator for &T {
    fn evaluate(&self, input: &OracleInput<'_>) -> Result<String> {
        (**self).evaluate(input)
    }
}

/// Search phase in which an oracle call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OraclePhase {
    Expand,
    Simulate,
}

impl fmt::Display for OraclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OraclePhase::Expand => f.write_str("expand"),
            OraclePhase::Simulate => f.write_str("simulate"),
        }
    }
}

/// An oracle call failed after all configured attempts.
///
/// Returned (inside `anyhow::Error`) when the failure policy is `abort`, so
/// callers can `downcast_ref` it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleFailure {
    pub phase: OraclePhase,
    /// Node the oracle was asked about.
    pub node: NodeId,
    /// Iteration (1-indexed) within the cycle.
    pub iteration: u32,
    pub attempts: u32,
    pub message: String,
}

impl fmt::Display for OracleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} oracle failed on {} in iteration {} after {} attempt(s): {}",
            self.phase, self.node, self.iteration, self.attempts, self.message
        )
    }
}

impl std::error::Error for OracleFailure {}

/// Oracle that renders a prompt and pipes it to an external command.
///
/// The command's stdout is the oracle response. A non-zero exit status, a
/// spawn failure, or a timeout is an error.
pub struct CommandOracle {
    kind: PromptKind,
    command: Vec<String>,
    timeout: Duration,
    output_limit_bytes: usize,
    prompts: PromptEngine,
}

impl CommandOracle {
    pub fn generator(config: &OracleCommandConfig) -> Result<Self> {
        Self::new(PromptKind::Generate, config)
    }

    pub fn evaluator(config: &OracleCommandConfig) -> Result<Self> {
        Self::new(PromptKind::Evaluate, config)
    }

    fn new(kind: PromptKind, config: &OracleCommandConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            kind,
            command: config.command.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            output_limit_bytes: config.output_limit_bytes,
            prompts: PromptEngine::new()?,
        })
    }

    #[instrument(skip_all, fields(kind = ?self.kind, program = %self.command[0]))]
    fn call(&self, input: &OracleInput<'_>) -> Result<String> {
        let prompt = self.prompts.render(self.kind, input)?;
        let mut cmd = Command::new(&self.command[0]);
        cmd.args(&self.command[1..]);

        let output = run_command_with_timeout(
            cmd,
            Some(prompt.as_bytes()),
            self.timeout,
            self.output_limit_bytes,
        )
        .with_context(|| format!("run oracle command {:?}", self.command))?;

        if output.timed_out {
            warn!(timeout_secs = self.timeout.as_secs(), "oracle command timed out");
            return Err(anyhow!("oracle command timed out after {:?}", self.timeout));
        }
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "oracle command failed");
            return Err(anyhow!(
                "oracle command failed with status {:?}: {}",
                output.status.code(),
                output.stderr_tail(5)
            ));
        }

        let response = output.stdout_text();
        debug!(response_bytes = response.len(), "oracle responded");
        Ok(response)
    }
}

impl Generator for CommandOracle {
    fn generate(&self, input: &OracleInput<'_>) -> Result<String> {
        self.call(input)
    }
}

impl Evaluator for CommandOracle {
    fn evaluate(&self, input: &OracleInput<'_>) -> Result<String> {
        self.call(input)
    }
}
