//! Search configuration stored in `grower.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "grower.toml";

/// What to do when an oracle call still fails after its retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Propagate the failure and end the cycle.
    #[default]
    Abort,
    /// Leave the node unexpanded/unscored and move on to the next iteration.
    Skip,
}

/// Search configuration (TOML).
///
/// Intended to be edited by humans. Missing fields take the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Select/expand/simulate/backpropagate iterations per cycle.
    pub iterations: u32,

    /// Committed steps for `grower grow`.
    pub cycles: u32,

    /// Inserted between a parent's state and a new continuation.
    pub separator: String,

    /// Stop expanding once the tree holds this many nodes. Unbounded when unset.
    pub max_nodes: Option<usize>,

    pub failure_policy: FailurePolicy,

    /// Extra attempts per oracle call before `failure_policy` applies.
    pub oracle_retries: u32,

    /// Pause between oracle attempts.
    pub retry_backoff_ms: u64,

    pub generator: OracleCommandConfig,

    pub evaluator: OracleCommandConfig,
}

/// External command backing one oracle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OracleCommandConfig {
    /// Program and arguments; the rendered prompt is written to stdin.
    pub command: Vec<String>,
    pub timeout_secs: u64,
    /// Truncate captured stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,
}

impl Default for OracleCommandConfig {
    fn default() -> Self {
        Self {
            command: vec!["llm".to_string()],
            timeout_secs: 120,
            output_limit_bytes: 100_000,
        }
    }
}

impl OracleCommandConfig {
    pub fn validate(&self) -> Result<()> {
        if self.command.is_empty() || self.command[0].trim().is_empty() {
            return Err(anyhow!("command must be a non-empty array"));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            iterations: 20,
            cycles: 10,
            separator: "\n".to_string(),
            max_nodes: None,
            failure_policy: FailurePolicy::Abort,
            oracle_retries: 0,
            retry_backoff_ms: 500,
            generator: OracleCommandConfig::default(),
            evaluator: OracleCommandConfig::default(),
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(anyhow!("iterations must be > 0"));
        }
        if self.cycles == 0 {
            return Err(anyhow!("cycles must be > 0"));
        }
        if self.max_nodes == Some(0) {
            return Err(anyhow!("max_nodes must be > 0 when set"));
        }
        self.generator.validate().context("generator")?;
        self.evaluator.validate().context("evaluator")?;
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `SearchConfig::default()`.
pub fn load_config(path: &Path) -> Result<SearchConfig> {
    if !path.exists() {
        let cfg = SearchConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: SearchConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &SearchConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
