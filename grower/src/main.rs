//! Grow a text artifact with tree search over external oracles.
//!
//! `grower search` runs one cycle and prints the chosen continuation;
//! `grower grow` keeps committing continuations and prints the artifact.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use grower::core::decision::best_path;
use grower::core::invariants::validate_invariants;
use grower::core::node::{Node, NodeId, Tree};
use grower::exit_codes;
use grower::grow::{GrowStop, run_grow};
use grower::io::config::{DEFAULT_CONFIG_PATH, SearchConfig, load_config, write_config};
use grower::io::oracle::CommandOracle;
use grower::logging;
use grower::search::{CycleRunner, DecisionReport, SearchSettings};

#[derive(Parser)]
#[command(
    name = "grower",
    version,
    about = "Grow a text artifact with tree search over oracle proposals"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config file.
    Init {
        /// Config file to create.
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// Run one search cycle and print the chosen continuation.
    Search(SearchArgs),
    /// Run cycles until the cycle limit, committing each decision.
    Grow {
        #[command(flatten)]
        search: SearchArgs,
        /// Override the configured number of cycles.
        #[arg(long)]
        cycles: Option<u32>,
    },
}

#[derive(Args)]
struct SearchArgs {
    /// Goal text passed to every oracle call.
    #[arg(long, required_unless_present = "goal_file", conflicts_with = "goal_file")]
    goal: Option<String>,
    /// Read the goal from a file.
    #[arg(long)]
    goal_file: Option<PathBuf>,
    /// Initial artifact content.
    #[arg(long, default_value = "")]
    state: String,
    /// Evidence attached to the root node (repeatable).
    #[arg(long = "note")]
    notes: Vec<String>,
    /// Override the configured iterations per cycle.
    #[arg(long)]
    iterations: Option<u32>,
    /// Config file (defaults are used when it does not exist).
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Print a JSON report instead of plain text.
    #[arg(long)]
    json: bool,
    /// Print the search tree outline to stderr.
    #[arg(long)]
    show_tree: bool,
}

#[derive(Serialize)]
struct SearchSummary {
    iterations: u32,
    expanded: u32,
    skipped: u32,
    tree_size: usize,
    decision: Option<DecisionReport>,
    /// Increments along the most visited line below the root.
    principal_line: Vec<String>,
}

#[derive(Serialize)]
struct GrowSummary {
    cycles_run: u32,
    stop: GrowStop,
    tree_size: usize,
    committed: Vec<DecisionReport>,
    artifact: String,
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { config, force } => cmd_init(&config, force),
        Command::Search(args) => cmd_search(&args),
        Command::Grow { search, cycles } => cmd_grow(&search, cycles),
    }
}

fn cmd_init(path: &Path, force: bool) -> Result<i32> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    write_config(path, &SearchConfig::default())?;
    println!("{}", path.display());
    Ok(exit_codes::OK)
}

fn cmd_search(args: &SearchArgs) -> Result<i32> {
    let session = Session::open(args)?;
    let runner = session.runner()?;
    let mut tree = session.tree();

    let outcome = runner.run_cycle(&mut tree, NodeId::ROOT, &session.goal, session.iterations)?;
    session.finish(&tree)?;

    if args.json {
        print_json(&SearchSummary {
            iterations: outcome.iterations,
            expanded: outcome.expanded,
            skipped: outcome.skipped,
            tree_size: tree.len(),
            decision: outcome.report(&tree),
            principal_line: best_path(&tree, NodeId::ROOT)
                .into_iter()
                .map(|id| tree.get(id).increment.clone())
                .collect(),
        })?;
    } else if let Some(decision) = outcome.decision {
        println!("{}", tree.get(decision).increment);
    }

    if outcome.decision.is_none() {
        if !args.json {
            eprintln!("no decision: root has no children after {} iteration(s)", outcome.iterations);
        }
        return Ok(exit_codes::NO_DECISION);
    }
    Ok(exit_codes::OK)
}

fn cmd_grow(args: &SearchArgs, cycles: Option<u32>) -> Result<i32> {
    let session = Session::open(args)?;
    let cycles = cycles.unwrap_or(session.config.cycles);
    let runner = session.runner()?;
    let mut tree = session.tree();

    let outcome = run_grow(
        &runner,
        &mut tree,
        NodeId::ROOT,
        &session.goal,
        session.iterations,
        cycles,
        |_, _| {},
    )?;
    session.finish(&tree)?;

    let artifact = tree.get(outcome.head).state.clone();
    if args.json {
        print_json(&GrowSummary {
            cycles_run: outcome.cycles_run,
            stop: outcome.stop,
            tree_size: tree.len(),
            committed: outcome
                .committed
                .iter()
                .map(|&id| DecisionReport::new(&tree, id))
                .collect(),
            artifact,
        })?;
    } else {
        println!("{artifact}");
    }

    if outcome.committed.is_empty() {
        return Ok(exit_codes::NO_DECISION);
    }
    Ok(exit_codes::OK)
}

/// Inputs shared by `search` and `grow`.
struct Session {
    config: SearchConfig,
    goal: String,
    state: String,
    notes: Vec<String>,
    iterations: u32,
    show_tree: bool,
}

impl Session {
    fn open(args: &SearchArgs) -> Result<Self> {
        let config = load_config(&args.config)?;
        let goal = match (&args.goal, &args.goal_file) {
            (Some(goal), _) => goal.clone(),
            (None, Some(path)) => fs::read_to_string(path)
                .with_context(|| format!("read goal file {}", path.display()))?,
            (None, None) => return Err(anyhow!("either --goal or --goal-file is required")),
        };
        if goal.trim().is_empty() {
            bail!("goal must not be empty");
        }
        Ok(Self {
            iterations: args.iterations.unwrap_or(config.iterations),
            config,
            goal,
            state: args.state.clone(),
            notes: args.notes.clone(),
            show_tree: args.show_tree,
        })
    }

    fn runner(&self) -> Result<CycleRunner<CommandOracle, CommandOracle>> {
        let generator = CommandOracle::generator(&self.config.generator).context("generator")?;
        let evaluator = CommandOracle::evaluator(&self.config.evaluator).context("evaluator")?;
        Ok(CycleRunner::new(
            generator,
            evaluator,
            SearchSettings::from(&self.config),
        ))
    }

    fn tree(&self) -> Tree {
        Tree::with_root(Node::new(self.state.clone(), None).with_annotations(self.notes.clone()))
    }

    /// Check tree invariants and optionally print the outline.
    fn finish(&self, tree: &Tree) -> Result<()> {
        let errors = validate_invariants(tree, &self.config.separator);
        if !errors.is_empty() {
            bail!("invariant violations:\n- {}", errors.join("\n- "));
        }
        if self.show_tree {
            eprintln!("{}", tree.summarize(NodeId::ROOT, 200));
        }
        Ok(())
    }
}

/// Serialize `value` to pretty-printed JSON on stdout.
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{payload}");
    Ok(())
}
