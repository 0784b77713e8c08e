//! Test-only oracles with scripted responses.

use std::cell::RefCell;
use std::collections::VecDeque;

use anyhow::{Result, anyhow};

use crate::io::oracle::{Evaluator, Generator, OracleInput};

/// Owned copy of an [`OracleInput`] seen by a scripted oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub goal: String,
    pub state: String,
    pub annotations: Vec<String>,
}

enum Script {
    Constant(String),
    Failing(String),
    Sequence(RefCell<VecDeque<Result<String, String>>>),
}

/// Oracle that answers from a script and records every input it receives.
///
/// Works as both a [`Generator`] and an [`Evaluator`].
pub struct ScriptedOracle {
    script: Script,
    calls: RefCell<Vec<RecordedCall>>,
}

impl ScriptedOracle {
    /// Always answer `response`.
    pub fn constant(response: &str) -> Self {
        Self::with_script(Script::Constant(response.to_string()))
    }

    /// Always fail with `message`.
    pub fn failing(message: &str) -> Self {
        Self::with_script(Script::Failing(message.to_string()))
    }

    /// Answer from `responses` in order (`Err` entries fail); error once exhausted.
    pub fn sequence(responses: Vec<Result<&str, &str>>) -> Self {
        let queue: VecDeque<Result<String, String>> = responses
            .into_iter()
            .map(|r| r.map(str::to_string).map_err(str::to_string))
            .collect();
        Self::with_script(Script::Sequence(RefCell::new(queue)))
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Inputs received so far, in call order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    fn respond(&self, input: &OracleInput<'_>) -> Result<String> {
        self.calls.borrow_mut().push(RecordedCall {
            goal: input.goal.to_string(),
            state: input.state.to_string(),
            annotations: input.annotations.to_vec(),
        });
        match &self.script {
            Script::Constant(response) => Ok(response.clone()),
            Script::Failing(message) => Err(anyhow!("{message}")),
            Script::Sequence(queue) => match queue.borrow_mut().pop_front() {
                Some(Ok(response)) => Ok(response),
                Some(Err(message)) => Err(anyhow!("{message}")),
                None => Err(anyhow!("scripted oracle exhausted")),
            },
        }
    }
}

impl Generator for ScriptedOracle {
    fn generate(&self, input: &OracleInput<'_>) -> Result<String> {
        self.respond(input)
    }
}

impl Evaluator for ScriptedOracle {
    fn evaluate(&self, input: &OracleInput<'_>) -> Result<String> {
        self.respond(input)
    }
}
