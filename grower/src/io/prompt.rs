//! Prompt rendering for command-backed oracles.

use anyhow::{Context, Result};
use minijinja::{Environment, context};

use crate::io::oracle::OracleInput;

const GENERATE_TEMPLATE: &str = include_str!("prompts/generate.md");
const EVALUATE_TEMPLATE: &str = include_str!("prompts/evaluate.md");

/// Which oracle a prompt is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Generate,
    Evaluate,
}

impl PromptKind {
    fn template_name(self) -> &'static str {
        match self {
            PromptKind::Generate => "generate",
            PromptKind::Evaluate => "evaluate",
        }
    }
}

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("generate", GENERATE_TEMPLATE)
            .context("load generate template")?;
        env.add_template("evaluate", EVALUATE_TEMPLATE)
            .context("load evaluate template")?;
        Ok(Self { env })
    }

    pub fn render(&self, kind: PromptKind, input: &OracleInput<'_>) -> Result<String> {
        let template = self.env.get_template(kind.template_name())?;
        let annotations: Vec<&str> = input
            .annotations
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .collect();
        let rendered = template
            .render(context! {
                goal => input.goal.trim(),
                state => input.state,
                annotations => annotations,
            })
            .with_context(|| format!("render {} prompt", kind.template_name()))?;
        Ok(rendered)
    }
}
