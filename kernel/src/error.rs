//! Kernel error taxonomy, hand-rolled in the teacher's style (`Display` +
//! `std::error::Error`, no `thiserror`).
//!
//! Mirrors spec.md §7: domain-integrity and formula-shape errors here are
//! all immediate-fatal; the recoverable bisimulation-failure case lives in
//! [`crate::bisim`] instead since it is a counter-and-continue condition,
//! not a hard error.

use std::fmt;

use crate::grounder::UnknownName;

/// Errors raised while grounding or validating a domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// A name referenced in a formula or action was never declared.
    Unknown(UnknownName),
    /// A fluent literal set was internally inconsistent (same id, both
    /// polarities).
    InconsistentFluents,
    /// An effect or goal leaf was not a singleton `FluentFormula` disjunct,
    /// violating the domain's DNF-restriction-to-one-disjunct rule.
    NonSingletonEffectOrGoal,
    /// An action's guards mark it as more than one of
    /// {ontic, sensing, announcement} at the same world -- the
    /// action-type-conflict case called out in spec.md's REDESIGN FLAGS.
    ConflictingActionType { action: String },
    /// An action's executability formula is not satisfiable in any world
    /// enumerated for the domain's fluent set.
    UnsatisfiableExecutability { action: String },
    /// The initial-condition formulae could not be satisfied by any
    /// consistent, S5-closed set of worlds.
    UnsatisfiableInitialState,
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(inner) => write!(f, "{inner}"),
            Self::InconsistentFluents => write!(f, "inconsistent fluent literal set"),
            Self::NonSingletonEffectOrGoal => {
                write!(f, "effect or goal formula is not a singleton disjunct")
            }
            Self::ConflictingActionType { action } => {
                write!(f, "action {action:?} has conflicting observance types")
            }
            Self::UnsatisfiableExecutability { action } => {
                write!(f, "action {action:?} executability is unsatisfiable")
            }
            Self::UnsatisfiableInitialState => {
                write!(f, "initial-condition formulae admit no consistent S5 state")
            }
        }
    }
}

impl std::error::Error for KernelError {}

impl From<UnknownName> for KernelError {
    fn from(value: UnknownName) -> Self {
        Self::Unknown(value)
    }
}
