//! Fixed-width identifiers for fluents, agents, and actions, and the
//! consistent-conjunction fluent set built from them.
//!
//! Fluent polarity is carried in the sign bit of the packed `u32`, following
//! the domain's fixed-width-identifier convention rather than reproducing the
//! original's runtime-computed `ceil(log2(|F|)) + 1` variable width: a fixed
//! 32-bit id keeps every downstream type plain old data with no width
//! parameter to thread through constructors.

use std::collections::BTreeSet;
use std::fmt;

const POLARITY_BIT: u32 = 1 << 31;
const ID_MASK: u32 = !POLARITY_BIT;

/// A grounded fluent identifier together with its polarity.
///
/// `Fluent::new(id, true)` and `Fluent::new(id, false)` are negations of one
/// another; [`Fluent::negate`] flips polarity without touching the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fluent(u32);

impl Fluent {
    /// Build a fluent from a grounded id and polarity (`true` = positive).
    ///
    /// # Panics
    ///
    /// Panics if `id` does not fit in 31 bits.
    #[must_use]
    pub fn new(id: u32, positive: bool) -> Self {
        assert!(id & POLARITY_BIT == 0, "fluent id exceeds 31 bits");
        if positive {
            Self(id)
        } else {
            Self(id | POLARITY_BIT)
        }
    }

    #[must_use]
    pub fn id(self) -> u32 {
        self.0 & ID_MASK
    }

    #[must_use]
    pub fn is_positive(self) -> bool {
        self.0 & POLARITY_BIT == 0
    }

    #[must_use]
    pub fn negate(self) -> Self {
        Self(self.0 ^ POLARITY_BIT)
    }

    /// The underlying packed bits, used as a stable sort/hash key.
    #[must_use]
    pub fn packed(self) -> u32 {
        self.0
    }
}

/// A grounded agent identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Agent(pub u32);

/// A grounded action identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionId(pub u32);

/// A consistent conjunction of fluent literals: no fluent id appears with
/// both polarities.
///
/// Construction is the only place consistency is enforced; once built, a
/// `FluentsSet` is known-consistent for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FluentsSet {
    literals: BTreeSet<Fluent>,
}

impl FluentsSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an iterator of literals, rejecting inconsistent input
    /// (the same fluent id present with both polarities).
    ///
    /// Returns `None` if the literals are inconsistent.
    #[must_use]
    pub fn try_from_literals(literals: impl IntoIterator<Item = Fluent>) -> Option<Self> {
        let mut set = BTreeSet::new();
        for lit in literals {
            if set.contains(&lit.negate()) {
                return None;
            }
            set.insert(lit);
        }
        Some(Self { literals: set })
    }

    #[must_use]
    pub fn contains(&self, lit: Fluent) -> bool {
        self.literals.contains(&lit)
    }

    /// Truth value of `id` in this set, if the set fixes it.
    #[must_use]
    pub fn value_of(&self, id: u32) -> Option<bool> {
        if self.literals.contains(&Fluent::new(id, true)) {
            Some(true)
        } else if self.literals.contains(&Fluent::new(id, false)) {
            Some(false)
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Fluent> + '_ {
        self.literals.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Is `other` a subset of (consistent extension basis for) this set?
    #[must_use]
    pub fn is_superset_of(&self, other: &Self) -> bool {
        other.literals.is_subset(&self.literals)
    }

    /// Merge `effect` literals into this set, overwriting any existing
    /// polarity for the same id (used when applying ontic effects).
    #[must_use]
    pub fn with_overwritten(&self, effect: &Self) -> Self {
        let mut merged = self.literals.clone();
        for lit in &effect.literals {
            merged.remove(&lit.negate());
            merged.insert(*lit);
        }
        Self { literals: merged }
    }
}

impl fmt::Display for FluentsSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .literals
            .iter()
            .map(|lit| {
                if lit.is_positive() {
                    format!("f{}", lit.id())
                } else {
                    format!("!f{}", lit.id())
                }
            })
            .collect();
        write!(f, "{{{}}}", parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fluent_negate_round_trips() {
        let f = Fluent::new(5, true);
        assert!(f.is_positive());
        let nf = f.negate();
        assert!(!nf.is_positive());
        assert_eq!(nf.id(), 5);
        assert_eq!(nf.negate(), f);
    }

    #[test]
    fn fluent_ordering_is_by_packed_bits() {
        let a = Fluent::new(1, true);
        let b = Fluent::new(2, true);
        assert!(a < b);
    }

    #[test]
    fn fluents_set_rejects_inconsistent_literals() {
        let set = FluentsSet::try_from_literals([Fluent::new(1, true), Fluent::new(1, false)]);
        assert!(set.is_none());
    }

    #[test]
    fn fluents_set_accepts_consistent_literals() {
        let set =
            FluentsSet::try_from_literals([Fluent::new(1, true), Fluent::new(2, false)]).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.value_of(1), Some(true));
        assert_eq!(set.value_of(2), Some(false));
        assert_eq!(set.value_of(3), None);
    }

    #[test]
    fn with_overwritten_flips_polarity() {
        let base = FluentsSet::try_from_literals([Fluent::new(1, true)]).unwrap();
        let effect = FluentsSet::try_from_literals([Fluent::new(1, false)]).unwrap();
        let merged = base.with_overwritten(&effect);
        assert_eq!(merged.value_of(1), Some(false));
    }

    #[test]
    fn is_superset_of() {
        let full =
            FluentsSet::try_from_literals([Fluent::new(1, true), Fluent::new(2, false)]).unwrap();
        let partial = FluentsSet::try_from_literals([Fluent::new(1, true)]).unwrap();
        assert!(full.is_superset_of(&partial));
        assert!(!partial.is_superset_of(&full));
    }
}
