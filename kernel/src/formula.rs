//! Fluent formulae (restricted DNF over fluent literals) and belief formulae
//! (the full multi-agent epistemic language used for executability
//! conditions, effects, and goals).

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use crate::bitset::{Agent, Fluent, FluentsSet};

/// A disjunction of consistent fluent conjunctions.
///
/// Used wherever the domain model only needs classical (non-epistemic)
/// shape: action effects and goal/executability leaves bottom out in a
/// `FluentFormula` that, per the domain's restriction, is a single
/// [`FluentsSet`] disjunct rather than a general DNF -- but the type itself
/// supports the general case so entailment code has one implementation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FluentFormula {
    disjuncts: BTreeSet<FluentsSet>,
}

impl FluentFormula {
    #[must_use]
    pub fn from_singleton(set: FluentsSet) -> Self {
        let mut disjuncts = BTreeSet::new();
        disjuncts.insert(set);
        Self { disjuncts }
    }

    #[must_use]
    pub fn disjuncts(&self) -> impl Iterator<Item = &FluentsSet> {
        self.disjuncts.iter()
    }

    /// True if exactly one disjunct is present -- the shape required of
    /// effect and goal leaves.
    #[must_use]
    pub fn is_singleton(&self) -> bool {
        self.disjuncts.len() == 1
    }

    #[must_use]
    pub fn as_singleton(&self) -> Option<&FluentsSet> {
        if self.is_singleton() {
            self.disjuncts.iter().next()
        } else {
            None
        }
    }

    /// Classical entailment: true if `world` satisfies at least one disjunct.
    #[must_use]
    pub fn entailed_by(&self, world: &FluentsSet) -> bool {
        self.disjuncts.iter().any(|d| world.is_superset_of(d))
    }
}

impl fmt::Display for FluentFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.disjuncts.iter().map(ToString::to_string).collect();
        write!(f, "({})", parts.join(" | "))
    }
}

/// A group of agents, as used by `E`/`C`/`D` operators.
pub type Group = BTreeSet<Agent>;

/// The epistemic belief-formula AST.
///
/// Equality and ordering are structural but commute over `Prop::And`/`Or`
/// and over group membership, since `B(a, p and q)` must equal
/// `B(a, q and p)` and `E({a,b}, p)` must equal `E({b,a}, p)` for the
/// planning graph's memoized-score maps to work as intended.
#[derive(Debug, Clone, Eq)]
pub enum BeliefFormula {
    /// `true` -- the empty formula, trivially entailed everywhere.
    Top,
    Fluent(Fluent),
    Not(Box<BeliefFormula>),
    And(Vec<BeliefFormula>),
    Or(Vec<BeliefFormula>),
    /// Agent `a` believes `phi`.
    Believes(Agent, Box<BeliefFormula>),
    /// Everyone in `group` believes `phi`.
    Everyone(Group, Box<BeliefFormula>),
    /// `phi` is common knowledge/belief among `group`.
    Common(Group, Box<BeliefFormula>),
    /// `phi` is (at least) distributed knowledge among `group`.
    Distributed(Group, Box<BeliefFormula>),
}

impl BeliefFormula {
    #[must_use]
    pub fn not(phi: Self) -> Self {
        Self::Not(Box::new(phi))
    }

    #[must_use]
    pub fn and(mut parts: Vec<Self>) -> Self {
        if parts.len() == 1 {
            return parts.pop().unwrap();
        }
        parts.sort_by(cmp);
        Self::And(parts)
    }

    #[must_use]
    pub fn or(mut parts: Vec<Self>) -> Self {
        if parts.len() == 1 {
            return parts.pop().unwrap();
        }
        parts.sort_by(cmp);
        Self::Or(parts)
    }

    #[must_use]
    pub fn believes(agent: Agent, phi: Self) -> Self {
        Self::Believes(agent, Box::new(phi))
    }

    #[must_use]
    pub fn everyone(group: Group, phi: Self) -> Self {
        Self::Everyone(group, Box::new(phi))
    }

    #[must_use]
    pub fn common(group: Group, phi: Self) -> Self {
        Self::Common(group, Box::new(phi))
    }

    #[must_use]
    pub fn distributed(group: Group, phi: Self) -> Self {
        Self::Distributed(group, Box::new(phi))
    }

    /// Every agent id mentioned anywhere in this formula.
    pub fn agents_mentioned(&self, out: &mut BTreeSet<Agent>) {
        match self {
            Self::Top | Self::Fluent(_) => {}
            Self::Not(inner) => inner.agents_mentioned(out),
            Self::And(parts) | Self::Or(parts) => {
                for p in parts {
                    p.agents_mentioned(out);
                }
            }
            Self::Believes(a, inner) => {
                out.insert(*a);
                inner.agents_mentioned(out);
            }
            Self::Everyone(g, inner) | Self::Common(g, inner) | Self::Distributed(g, inner) => {
                out.extend(g.iter().copied());
                inner.agents_mentioned(out);
            }
        }
    }
}

/// Canonical ordering used both for `And`/`Or` argument sorting (to make
/// structural equality commute) and for `Ord`/`PartialOrd`.
fn cmp(a: &BeliefFormula, b: &BeliefFormula) -> Ordering {
    rank(a).cmp(&rank(b)).then_with(|| match (a, b) {
        (BeliefFormula::Top, BeliefFormula::Top) => Ordering::Equal,
        (BeliefFormula::Fluent(x), BeliefFormula::Fluent(y)) => x.cmp(y),
        (BeliefFormula::Not(x), BeliefFormula::Not(y)) => cmp(x, y),
        (BeliefFormula::And(xs), BeliefFormula::And(ys))
        | (BeliefFormula::Or(xs), BeliefFormula::Or(ys)) => cmp_slices(xs, ys),
        (BeliefFormula::Believes(xa, xp), BeliefFormula::Believes(ya, yp)) => {
            xa.cmp(ya).then_with(|| cmp(xp, yp))
        }
        (BeliefFormula::Everyone(xg, xp), BeliefFormula::Everyone(yg, yp))
        | (BeliefFormula::Common(xg, xp), BeliefFormula::Common(yg, yp))
        | (BeliefFormula::Distributed(xg, xp), BeliefFormula::Distributed(yg, yp)) => {
            xg.cmp(yg).then_with(|| cmp(xp, yp))
        }
        _ => Ordering::Equal,
    })
}

fn cmp_slices(xs: &[BeliefFormula], ys: &[BeliefFormula]) -> Ordering {
    xs.len().cmp(&ys.len()).then_with(|| {
        xs.iter()
            .zip(ys.iter())
            .map(|(x, y)| cmp(x, y))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    })
}

fn rank(f: &BeliefFormula) -> u8 {
    match f {
        BeliefFormula::Top => 0,
        BeliefFormula::Fluent(_) => 1,
        BeliefFormula::Not(_) => 2,
        BeliefFormula::And(_) => 3,
        BeliefFormula::Or(_) => 4,
        BeliefFormula::Believes(..) => 5,
        BeliefFormula::Everyone(..) => 6,
        BeliefFormula::Common(..) => 7,
        BeliefFormula::Distributed(..) => 8,
    }
}

impl PartialEq for BeliefFormula {
    fn eq(&self, other: &Self) -> bool {
        cmp(self, other) == Ordering::Equal
    }
}

impl PartialOrd for BeliefFormula {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(cmp(self, other))
    }
}

impl Ord for BeliefFormula {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp(self, other)
    }
}

impl std::hash::Hash for BeliefFormula {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Hash the canonical (sorted) textual form so structurally-equal
        // formulae (commuted And/Or, reordered groups) hash identically.
        format!("{self:?}-{}", rank(self)).hash(state);
        match self {
            Self::Top => {}
            Self::Fluent(f) => f.hash(state),
            Self::Not(inner) => inner.hash(state),
            Self::And(parts) | Self::Or(parts) => {
                for p in parts {
                    p.hash(state);
                }
            }
            Self::Believes(a, inner) => {
                a.hash(state);
                inner.hash(state);
            }
            Self::Everyone(g, inner) | Self::Common(g, inner) | Self::Distributed(g, inner) => {
                for a in g {
                    a.hash(state);
                }
                inner.hash(state);
            }
        }
    }
}

impl fmt::Display for BeliefFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => write!(f, "true"),
            Self::Fluent(x) => {
                if x.is_positive() {
                    write!(f, "f{}", x.id())
                } else {
                    write!(f, "!f{}", x.id())
                }
            }
            Self::Not(inner) => write!(f, "!({inner})"),
            Self::And(parts) => {
                let s: Vec<String> = parts.iter().map(ToString::to_string).collect();
                write!(f, "({})", s.join(" & "))
            }
            Self::Or(parts) => {
                let s: Vec<String> = parts.iter().map(ToString::to_string).collect();
                write!(f, "({})", s.join(" | "))
            }
            Self::Believes(a, inner) => write!(f, "B({}, {inner})", a.0),
            Self::Everyone(g, inner) => write!(f, "E({:?}, {inner})", g),
            Self::Common(g, inner) => write!(f, "C({:?}, {inner})", g),
            Self::Distributed(g, inner) => write!(f, "D({:?}, {inner})", g),
        }
    }
}
