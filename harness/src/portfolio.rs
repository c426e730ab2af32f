//! Portfolio runner: one search engine per configuration, each on its own
//! thread, first success wins and cancels the rest.
//!
//! Grounded on `original_source/src/search/ParallelSearch.*`'s sibling
//! "run several searches at once" idea, generalized from parallel-BFS
//! workers sharing one frontier to independent single-threaded engines
//! sharing only the read-only `Domain`/`KripkeWorldStore` (spec.md §4.4
//! "Portfolio runner", §5 "one thread per configuration... do not share
//! search state").

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread;

use epistemic_kernel::bisim::BisimKind;
use epistemic_kernel::domain::Domain;
use epistemic_kernel::formula::BeliefFormula;
use epistemic_kernel::state::KripkeState;
use epistemic_search::engine::{run_cancellable, SearchOutcome};
use epistemic_search::error::TerminationReason;
use epistemic_search::heuristic::HeuristicKind;
use epistemic_search::policy::{SearchPolicy, Strategy};

use crate::error::HarnessError;

/// One named configuration in a portfolio run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioConfig {
    pub label: String,
    pub policy: SearchPolicy,
}

/// The default portfolio spec.md §4.4 names: "BFS / HFS×{SUBGOALS, L_PG,
/// S_PG, C_PG, GNN} / DFS".
#[must_use]
pub fn default_configs() -> Vec<PortfolioConfig> {
    let mut configs = vec![PortfolioConfig {
        label: "BFS".to_string(),
        policy: SearchPolicy {
            strategy: Strategy::Bfs,
            ..SearchPolicy::default()
        },
    }];
    for heuristic in [
        HeuristicKind::Subgoals,
        HeuristicKind::LPg,
        HeuristicKind::SPg,
        HeuristicKind::CPg,
        HeuristicKind::Gnn,
    ] {
        configs.push(PortfolioConfig {
            label: format!("HFS+{heuristic:?}"),
            policy: SearchPolicy {
                strategy: Strategy::HeuristicFirst,
                heuristic,
                ..SearchPolicy::default()
            },
        });
    }
    configs.push(PortfolioConfig {
        label: "DFS".to_string(),
        policy: SearchPolicy {
            strategy: Strategy::Dfs,
            ..SearchPolicy::default()
        },
    });
    configs
}

/// Parse a portfolio config file: one configuration per line, each a
/// comma-separated `key=value` list. Recognized keys: `strategy`
/// (`BFS`/`DFS`/`IDFS`/`HFS`), `heuristic` (`SUBGOALS`/`L_PG`/`S_PG`/
/// `C_PG`/`GNN`), `bis` (`FB`/`PT`/`off`), `check_visited` (`true`/`false`).
/// Blank lines and lines starting with `;` are ignored.
///
/// # Errors
///
/// Returns [`HarnessError::ArgumentParse`] on an unrecognized key or value.
pub fn parse_config_file(contents: &str) -> Result<Vec<PortfolioConfig>, HarnessError> {
    let mut configs = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        let mut policy = SearchPolicy::default();
        for field in line.split(',') {
            let (key, value) = field.trim().split_once('=').ok_or_else(|| {
                HarnessError::ArgumentParse {
                    detail: format!("line {}: expected key=value, found {field:?}", lineno + 1),
                }
            })?;
            apply_field(&mut policy, key.trim(), value.trim(), lineno + 1)?;
        }
        policy
            .validate()
            .map_err(|err| HarnessError::ArgumentParse {
                detail: format!("line {}: {err}", lineno + 1),
            })?;
        configs.push(PortfolioConfig {
            label: policy.label(),
            policy,
        });
    }
    Ok(configs)
}

fn apply_field(
    policy: &mut SearchPolicy,
    key: &str,
    value: &str,
    lineno: usize,
) -> Result<(), HarnessError> {
    match key {
        "strategy" => {
            policy.strategy = match value {
                "BFS" => Strategy::Bfs,
                "DFS" => Strategy::Dfs,
                "IDFS" | "IDDFS" => Strategy::Iddfs,
                "HFS" => Strategy::HeuristicFirst,
                "A*" => Strategy::AStar,
                other => {
                    return Err(HarnessError::ArgumentParse {
                        detail: format!("line {lineno}: unknown strategy {other:?}"),
                    })
                }
            };
        }
        "heuristic" => {
            policy.heuristic = match value {
                "SUBGOALS" => HeuristicKind::Subgoals,
                "L_PG" => HeuristicKind::LPg,
                "S_PG" => HeuristicKind::SPg,
                "C_PG" => HeuristicKind::CPg,
                "GNN" => HeuristicKind::Gnn,
                other => {
                    return Err(HarnessError::ArgumentParse {
                        detail: format!("line {lineno}: unknown heuristic {other:?}"),
                    })
                }
            };
        }
        "bis" => {
            policy.bisimulation = match value {
                "FB" => Some(BisimKind::Fast),
                "PT" => Some(BisimKind::PaigeTarjan),
                "off" => None,
                other => {
                    return Err(HarnessError::ArgumentParse {
                        detail: format!("line {lineno}: unknown bis value {other:?}"),
                    })
                }
            };
        }
        "check_visited" => {
            policy.check_visited = value.parse::<bool>().map_err(|_| HarnessError::ArgumentParse {
                detail: format!("line {lineno}: check_visited must be true/false, found {value:?}"),
            })?;
        }
        other => {
            return Err(HarnessError::ArgumentParse {
                detail: format!("line {lineno}: unknown config key {other:?}"),
            })
        }
    }
    Ok(())
}

/// Read a portfolio config file from disk.
///
/// # Errors
///
/// Returns [`HarnessError::Io`] if the file cannot be read, or
/// [`HarnessError::ArgumentParse`] if its contents are malformed.
pub fn read_config_file(path: &Path) -> Result<Vec<PortfolioConfig>, HarnessError> {
    let contents = fs::read_to_string(path)?;
    parse_config_file(&contents)
}

/// The outcome of one configuration within a portfolio run.
#[derive(Debug, Clone)]
pub struct PortfolioResult {
    pub label: String,
    pub outcome: SearchOutcome,
}

impl fmt::Display for PortfolioResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.label, self.outcome.reason)
    }
}

/// Run every configuration in `configs` on its own thread against the same
/// `(domain, goal, start)`, cooperatively cancelling the others as soon as
/// one reports [`TerminationReason::GoalReached`]. Returns every
/// configuration's outcome (cancelled ones reported as
/// [`TerminationReason::Cancelled`]), in the order configurations were
/// given, plus the index of the winner if any configuration succeeded.
#[must_use]
pub fn run_portfolio(
    domain: &Domain,
    goal: Vec<BeliefFormula>,
    start: &KripkeState,
    configs: &[PortfolioConfig],
) -> (Vec<PortfolioResult>, Option<usize>) {
    let cancel = AtomicBool::new(false);
    let winner = Mutex::new(None);
    let results: Mutex<Vec<Option<PortfolioResult>>> =
        Mutex::new(configs.iter().map(|_| None).collect());

    thread::scope(|scope| {
        for (index, config) in configs.iter().enumerate() {
            let domain = &*domain;
            let goal = goal.clone();
            let start = start.clone();
            let cancel = &cancel;
            let winner = &winner;
            let results = &results;
            let label = config.label.clone();
            let policy = config.policy.clone();
            scope.spawn(move || {
                log::info!("portfolio: starting {label}");
                let outcome = run_cancellable(domain, goal, start, &policy, Some(cancel));
                if matches!(outcome.reason, TerminationReason::GoalReached { .. }) {
                    cancel.store(true, Ordering::SeqCst);
                    let mut slot = winner.lock().expect("portfolio winner mutex poisoned");
                    if slot.is_none() {
                        *slot = Some(index);
                    }
                }
                log::info!("portfolio: {label} finished with {:?}", outcome.reason);
                results.lock().expect("portfolio results mutex poisoned")[index] =
                    Some(PortfolioResult { label, outcome });
            });
        }
    });

    let results: Vec<PortfolioResult> = results
        .into_inner()
        .expect("portfolio results mutex poisoned")
        .into_iter()
        .map(|r| r.expect("every configuration records a result"))
        .collect();
    let winner = winner.into_inner().expect("portfolio winner mutex poisoned");
    (results, winner)
}
