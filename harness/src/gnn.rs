//! External GNN heuristic oracle: the subprocess protocol spec.md §6
//! names ("the core writes the current state in a canonical graph form to
//! a file and invokes an external script with the file path and current
//! plan length as arguments; the oracle writes a single line
//! `VALUE:<integer>` to a result file. On non-zero exit code, a fatal
//! error is raised").
//!
//! Grounded on `epistemic_search::heuristic::GnnOracle` (the scoring seam
//! `search` exposes) and on `original_source/src/heuristics/` for the
//! file-exchange shape (the original keeps no in-process model; it always
//! shells out). The result-file path is a convention this side owns: the
//! input graph file's path with `.result` appended, since spec.md does
//! not name a third CLI argument for it.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use epistemic_kernel::domain::Domain;
use epistemic_kernel::state::KripkeState;
use epistemic_search::heuristic::{GnnOracle, GoalList};

use crate::error::HarnessError;

/// A [`GnnOracle`] backed by an external script, invoked once per scored
/// state.
///
/// `score` returns `None` (triggering the `SUBGOALS` fallback per
/// `epistemic_search`'s documented degrade path) only when the oracle
/// itself declines cleanly; a non-zero exit status is instead recorded
/// into [`GnnProcessOracle::take_fatal_error`] for the caller to surface
/// after the search completes, since the trait signature has no room for
/// a `Result`.
pub struct GnnProcessOracle {
    script_path: PathBuf,
    work_dir: PathBuf,
    counter: AtomicU64,
    fatal: Mutex<Option<HarnessError>>,
}

impl GnnProcessOracle {
    #[must_use]
    pub fn new(script_path: PathBuf, work_dir: PathBuf) -> Self {
        Self {
            script_path,
            work_dir,
            counter: AtomicU64::new(0),
            fatal: Mutex::new(None),
        }
    }

    /// Take (and clear) the first fatal error recorded by a failed
    /// invocation, if any. Call this after a search run completes to
    /// decide whether the run should be reported as failed despite the
    /// heuristic having degraded to `SUBGOALS` mid-search.
    pub fn take_fatal_error(&self) -> Option<HarnessError> {
        self.fatal.lock().expect("gnn oracle mutex poisoned").take()
    }

    fn record_fatal(&self, err: HarnessError) {
        let mut slot = self.fatal.lock().expect("gnn oracle mutex poisoned");
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    fn invoke(&self, state: &KripkeState, plan_length: u16) -> Result<i32, HarnessError> {
        fs::create_dir_all(&self.work_dir)?;
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let input_path = self.work_dir.join(format!("gnn_query_{n}.dot"));
        let result_path = result_path_for(&input_path);

        fs::write(&input_path, state.to_dot())?;

        let output = Command::new(&self.script_path)
            .arg(&input_path)
            .arg(plan_length.to_string())
            .output()
            .map_err(|err| HarnessError::Io {
                detail: format!("failed to invoke GNN oracle script: {err}"),
            })?;

        if !output.status.success() {
            return Err(HarnessError::Io {
                detail: format!(
                    "GNN oracle script exited with status {}",
                    output.status
                ),
            });
        }

        let contents = fs::read_to_string(&result_path)?;
        parse_value_line(&contents)
    }
}

fn result_path_for(input_path: &Path) -> PathBuf {
    let mut os = input_path.as_os_str().to_owned();
    os.push(".result");
    PathBuf::from(os)
}

fn parse_value_line(contents: &str) -> Result<i32, HarnessError> {
    let line = contents
        .lines()
        .find(|l| l.starts_with("VALUE:"))
        .ok_or_else(|| HarnessError::Io {
            detail: "GNN oracle result file had no VALUE: line".to_string(),
        })?;
    line.trim_start_matches("VALUE:")
        .trim()
        .parse::<i32>()
        .map_err(|err| HarnessError::Io {
            detail: format!("GNN oracle result file had a non-integer value: {err}"),
        })
}

impl GnnOracle for GnnProcessOracle {
    fn score(
        &self,
        _domain: &Domain,
        state: &KripkeState,
        _goal: &GoalList,
        plan_length: u16,
    ) -> Option<i32> {
        match self.invoke(state, plan_length) {
            Ok(value) => Some(value),
            Err(err) => {
                self.record_fatal(err);
                None
            }
        }
    }
}

/// Forwards to the shared oracle, so a caller can keep an `Arc` handle
/// alive to call [`GnnProcessOracle::take_fatal_error`] after the search
/// completes, while also handing a `Box<dyn GnnOracle>` to
/// [`epistemic_search::heuristic::HeuristicManager::with_oracle`].
impl GnnOracle for std::sync::Arc<GnnProcessOracle> {
    fn score(
        &self,
        domain: &Domain,
        state: &KripkeState,
        goal: &GoalList,
        plan_length: u16,
    ) -> Option<i32> {
        GnnOracle::score(self.as_ref(), domain, state, goal, plan_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_value_line_ignoring_surrounding_text() {
        let contents = "some preamble\nVALUE:7\n";
        assert_eq!(parse_value_line(contents).unwrap(), 7);
    }

    #[test]
    fn rejects_missing_value_line() {
        assert!(parse_value_line("nothing here").is_err());
    }

    #[test]
    fn result_path_appends_suffix() {
        let input = PathBuf::from("/tmp/gnn_query_0.dot");
        assert_eq!(
            result_path_for(&input),
            PathBuf::from("/tmp/gnn_query_0.dot.result")
        );
    }

    #[test]
    fn failed_invocation_records_fatal_error_and_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let missing_script = dir.path().join("does-not-exist.sh");
        let oracle = GnnProcessOracle::new(missing_script, dir.path().to_path_buf());

        let mut builder = epistemic_kernel::grounder::GrounderBuilder::new();
        builder.register_fluent("p");
        let grounder = builder.build();
        let domain = Domain::new(grounder, epistemic_kernel::formula::BeliefFormula::Top, 5);
        let store = std::sync::Arc::new(epistemic_kernel::world::KripkeWorldStore::new());
        let state = KripkeState::build_initial(store, &domain, 1).unwrap();

        let scored = oracle.score(&domain, &state, &vec![], 0);
        assert!(scored.is_none());
        assert!(oracle.take_fatal_error().is_some());
        assert!(oracle.take_fatal_error().is_none());
    }
}
