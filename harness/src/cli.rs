//! Command-line surface for the planner binary, per spec.md §6 "CLI".
//!
//! Grounded on the `clap`-derive idiom visible across this pack (e.g.
//! `Brahmastra-Labs-logicaffeine`'s `logicaffeine_cli::cli`): one `Parser`
//! struct, `ValueEnum` for closed option sets, doc comments doubling as
//! `--help` text.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use epistemic_kernel::bisim::BisimKind;
use epistemic_search::heuristic::HeuristicKind;
use epistemic_search::policy::{SearchPolicy, Strategy};

use crate::error::HarnessError;

/// An epistemic planner: S5 multi-agent search over Kripke models.
#[derive(Debug, Parser)]
#[command(name = "epistemic-planner", about = "Multi-agent epistemic planner")]
pub struct Cli {
    /// Path to a domain description file.
    pub domain_file: PathBuf,

    /// Which open-list discipline drives expansion.
    #[arg(long, value_enum, default_value_t = SearchStrategyArg::Bfs)]
    pub search: SearchStrategyArg,

    /// Which heuristic scores states; only consulted under HFS.
    #[arg(long, value_enum, default_value_t = HeuristicArg::Subgoals)]
    pub heuristic: HeuristicArg,

    /// Enable bisimulation contraction after each action application.
    #[arg(long)]
    pub bis: bool,

    /// Which bisimulation algorithm `--bis` selects.
    #[arg(long, value_enum, default_value_t = BisTypeArg::Fb)]
    pub bis_type: BisTypeArg,

    /// Enable closed-set (visited) deduplication.
    #[arg(long)]
    pub check_visited: bool,

    /// Run the portfolio runner (one thread per built-in configuration)
    /// instead of the single configuration named by `--search`/`--heuristic`.
    #[arg(long)]
    pub portfolio: bool,

    /// Number of worker threads for parallel BFS; 1 runs sequentially.
    /// Ignored unless `--search BFS` and `--parallel` are both given.
    #[arg(long, default_value_t = 1)]
    pub parallel: usize,

    /// Generate a training dataset of this many visited states instead of
    /// running a single search to completion (spec.md §6 "Dataset dump").
    #[arg(long)]
    pub dataset_size: Option<usize>,

    /// Validate this action sequence from the initial state instead of
    /// searching.
    #[arg(long, num_args = 1.., value_name = "ACTION")]
    pub execute_actions: Vec<String>,

    /// Validate the plan, replacing `--execute-actions`.
    #[arg(long)]
    pub execute: bool,

    /// File to read the plan from when `--execute` is given (one action
    /// name per line).
    #[arg(long)]
    pub plan_file: Option<PathBuf>,

    /// Write timing/result summary alongside the plan.
    #[arg(long)]
    pub results_file: Option<PathBuf>,

    /// Redirect all output to `log/<domainStem>_<timestamp>[_n].log`.
    #[arg(long)]
    pub log: bool,

    /// Path to the external script invoked for `--heuristic GNN`
    /// (spec.md §6 "GNN heuristic oracle"). Required only when `GNN` is
    /// selected; otherwise unused.
    #[arg(long)]
    pub gnn_script: Option<PathBuf>,

    /// Scratch directory for the GNN oracle's query/result files.
    #[arg(long, default_value = "gnn_work")]
    pub gnn_work_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchStrategyArg {
    Bfs,
    Dfs,
    Idfs,
    Hfs,
}

impl From<SearchStrategyArg> for Strategy {
    fn from(value: SearchStrategyArg) -> Self {
        match value {
            SearchStrategyArg::Bfs => Strategy::Bfs,
            SearchStrategyArg::Dfs => Strategy::Dfs,
            SearchStrategyArg::Idfs => Strategy::Iddfs,
            SearchStrategyArg::Hfs => Strategy::HeuristicFirst,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HeuristicArg {
    Subgoals,
    #[value(name = "L_PG")]
    LPg,
    #[value(name = "S_PG")]
    SPg,
    #[value(name = "C_PG")]
    CPg,
    Gnn,
}

impl From<HeuristicArg> for HeuristicKind {
    fn from(value: HeuristicArg) -> Self {
        match value {
            HeuristicArg::Subgoals => HeuristicKind::Subgoals,
            HeuristicArg::LPg => HeuristicKind::LPg,
            HeuristicArg::SPg => HeuristicKind::SPg,
            HeuristicArg::CPg => HeuristicKind::CPg,
            HeuristicArg::Gnn => HeuristicKind::Gnn,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BisTypeArg {
    Fb,
    Pt,
}

impl From<BisTypeArg> for BisimKind {
    fn from(value: BisTypeArg) -> Self {
        match value {
            BisTypeArg::Fb => BisimKind::Fast,
            BisTypeArg::Pt => BisimKind::PaigeTarjan,
        }
    }
}

impl Cli {
    /// Build a [`SearchPolicy`] from the flags relevant to a single-engine
    /// run, validating the strategy/heuristic cross-field constraint spec.md
    /// §6 names ("used only with HFS or A\*").
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ArgumentParse`] if `--heuristic` is
    /// non-default under a strategy that ignores it.
    pub fn search_policy(&self) -> Result<SearchPolicy, HarnessError> {
        let policy = SearchPolicy {
            strategy: self.search.into(),
            heuristic: self.heuristic.into(),
            bisimulation: self.bis.then(|| self.bis_type.into()),
            check_visited: self.check_visited,
            ..SearchPolicy::default()
        };
        policy.validate().map_err(|err| HarnessError::ArgumentParse {
            detail: err.to_string(),
        })?;
        Ok(policy)
    }
}
