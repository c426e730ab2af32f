//! Typed search errors.

use epistemic_kernel::error::KernelError;

/// Typed failure for search operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The kernel rejected an action transition (executability, type
    /// conflict, unsatisfiable initial state) while expanding a node.
    Kernel(KernelError),

    /// A reserved or incompatible policy combination was selected (e.g. a
    /// heuristic-only strategy requested under BFS/DFS).
    UnsupportedPolicyMode { detail: String },

    /// `--execute-actions`/`--execute --plan-file` validation disagreed
    /// with the plan at a given step.
    PlanValidationFailed { step: usize, detail: String },
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Kernel(inner) => write!(f, "{inner}"),
            Self::UnsupportedPolicyMode { detail } => {
                write!(f, "unsupported search policy: {detail}")
            }
            Self::PlanValidationFailed { step, detail } => {
                write!(f, "plan validation failed at step {step}: {detail}")
            }
        }
    }
}

impl std::error::Error for SearchError {}

impl From<KernelError> for SearchError {
    fn from(value: KernelError) -> Self {
        Self::Kernel(value)
    }
}

/// The terminal outcome of a completed search run -- distinguished from
/// [`SearchError`] because "no plan exists" is a non-fatal search outcome
/// per spec.md §7 ("User search outcome"), not an error to propagate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// A plan was found; carries its length for diagnostics.
    GoalReached { plan_length: u16 },
    /// The open list emptied without reaching the goal.
    FrontierExhausted { expanded: u64 },
    /// The initial state already satisfies the goal (spec.md §6 exit-code
    /// table: "planning-graph impossible-initial-state" when this is
    /// treated as an error by the caller; the engine itself reports it as
    /// the trivial empty plan).
    InitialStateIsGoal,
    /// A shared cancellation flag was observed set (spec.md §4.4 "Portfolio
    /// runner": another configuration already found a plan).
    Cancelled { expanded: u64 },
}
