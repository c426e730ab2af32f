//! Search policy: strategy selection, heuristic selection, and the
//! bisimulation/visited-check toggles spec.md §6's CLI exposes.
//!
//! Grounded on the teacher's `SearchPolicyV1` (budget + dedup-mode struct
//! with a `validate_m1` cross-field check) generalized from a fixed M1
//! dedup mode to the planner's five-strategy, five-heuristic configuration
//! space. Per DESIGN.md's Open Question resolution #4 (REDESIGN FLAG:
//! `--bis_type` vs `--search` aliasing bug in the original CLI parser),
//! `strategy` and `bisimulation_kind` are always distinct fields here.

use epistemic_kernel::bisim::BisimKind;

use crate::error::SearchError;
use crate::heuristic::HeuristicKind;

/// Which open-list discipline drives expansion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Bfs,
    Dfs,
    /// Iterative-deepening DFS; `iddfs_step` in [`SearchPolicy`] sets the
    /// cap increment applied each time the stack empties without success.
    Iddfs,
    /// Best-first search keyed purely by heuristic value.
    HeuristicFirst,
    /// A* keyed by `heuristic + plan_length`.
    AStar,
}

impl Strategy {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Bfs => "BFS",
            Self::Dfs => "DFS",
            Self::Iddfs => "IDDFS",
            Self::HeuristicFirst => "HFS",
            Self::AStar => "A*",
        }
    }

    /// Only `HeuristicFirst` and `AStar` ever consult a heuristic; spec.md
    /// §6 notes `--heuristic` is "used only with HFS or A*".
    #[must_use]
    pub fn uses_heuristic(self) -> bool {
        matches!(self, Self::HeuristicFirst | Self::AStar)
    }
}

/// One engine configuration: everything the portfolio runner or CLI needs
/// to build and run a single search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPolicy {
    pub strategy: Strategy,
    pub heuristic: HeuristicKind,
    /// `None` disables bisimulation contraction entirely (spec.md's
    /// `--bis` flag gates this); `Some(kind)` selects Paige-Tarjan or Fast.
    pub bisimulation: Option<BisimKind>,
    /// Closed-set deduplication (spec.md's `--check_visited`).
    pub check_visited: bool,
    /// Depth-cap increment for IDDFS; unused by other strategies.
    pub iddfs_step: u16,
    /// Initial depth cap for IDDFS.
    pub iddfs_initial_cap: u16,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            strategy: Strategy::Bfs,
            heuristic: HeuristicKind::Subgoals,
            bisimulation: None,
            check_visited: false,
            iddfs_step: 1,
            iddfs_initial_cap: 10,
        }
    }
}

impl SearchPolicy {
    /// Validate cross-field consistency: a non-default heuristic is only
    /// meaningful under a strategy that consults it.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::UnsupportedPolicyMode`] if `heuristic` is set
    /// to anything other than the default under a strategy that ignores it.
    pub fn validate(&self) -> Result<(), SearchError> {
        if !self.strategy.uses_heuristic() && self.heuristic != HeuristicKind::Subgoals {
            return Err(SearchError::UnsupportedPolicyMode {
                detail: format!(
                    "heuristic {:?} has no effect under strategy {}",
                    self.heuristic,
                    self.strategy.name()
                ),
            });
        }
        Ok(())
    }

    /// A human-readable name for this configuration, used by the portfolio
    /// runner's logging and by `--results_file` output.
    #[must_use]
    pub fn label(&self) -> String {
        let bis = match self.bisimulation {
            None => "no-bis".to_string(),
            Some(BisimKind::PaigeTarjan) => "bis-pt".to_string(),
            Some(BisimKind::Fast) => "bis-fb".to_string(),
        };
        if self.strategy.uses_heuristic() {
            format!(
                "{}+{:?}+{bis}+visited={}",
                self.strategy.name(),
                self.heuristic,
                self.check_visited
            )
        } else {
            format!("{}+{bis}+visited={}", self.strategy.name(), self.check_visited)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_validates() {
        assert!(SearchPolicy::default().validate().is_ok());
    }

    #[test]
    fn non_default_heuristic_under_bfs_is_rejected() {
        let policy = SearchPolicy {
            heuristic: HeuristicKind::LPg,
            ..SearchPolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn heuristic_first_accepts_any_heuristic() {
        let policy = SearchPolicy {
            strategy: Strategy::HeuristicFirst,
            heuristic: HeuristicKind::Gnn,
            ..SearchPolicy::default()
        };
        assert!(policy.validate().is_ok());
    }
}
