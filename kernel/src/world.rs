//! Kripke worlds: content-addressed value objects, interned in a
//! process-wide store, referenced elsewhere by handle.
//!
//! Grounded on the teacher's `ByteStateV1` content-addressed value type (one
//! canonical hash identifies equal content) generalized from a two-plane
//! byte tensor to a [`FluentsSet`], plus the original planner's
//! `KripkeWorld`/`KripkeWorldPointer` split between "the world's content" and
//! "a possibly-repeated reference to it in one particular state".

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::bitset::FluentsSet;
use crate::proof::hash::{canonical_hash, DOMAIN_WORLD_FLUENTS};

/// Stable identifier for a world's fluent content, derived by hashing the
/// sorted literal list. Two worlds with the same fluents always get the
/// same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorldId(u64);

impl WorldId {
    /// The raw 64-bit id, used by [`crate::state::KripkeState::canonical_fingerprint`]
    /// to build a stable byte encoding without exposing hash internals
    /// elsewhere.
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// A Kripke world: a single consistent valuation of every fluent.
///
/// Value type; cheap to clone because it wraps an `Rc`-free `FluentsSet`
/// clone (a `BTreeSet<Fluent>`). The store is what prevents the same
/// content from being duplicated across a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KripkeWorld {
    fluents: FluentsSet,
    id: WorldId,
}

impl KripkeWorld {
    #[must_use]
    pub fn new(fluents: FluentsSet) -> Self {
        let id = id_of(&fluents);
        Self { fluents, id }
    }

    #[must_use]
    pub fn fluents(&self) -> &FluentsSet {
        &self.fluents
    }

    #[must_use]
    pub fn id(&self) -> WorldId {
        self.id
    }
}

fn id_of(fluents: &FluentsSet) -> WorldId {
    let mut bytes = Vec::with_capacity(fluents.len() * 4);
    for lit in fluents.iter() {
        bytes.extend_from_slice(&lit.packed().to_be_bytes());
    }
    WorldId(canonical_hash(DOMAIN_WORLD_FLUENTS, &bytes).as_u64_prefix())
}

/// Process-wide flyweight interning store for [`KripkeWorld`] values.
///
/// Append-only: once a world is inserted its id is stable for the store's
/// lifetime. A coarse mutex guards insertion; reads after insertion never
/// need synchronization because `WorldId` is a plain copy type and the
/// underlying `KripkeWorld` is immutable.
#[derive(Debug, Default)]
pub struct KripkeWorldStore {
    worlds: Mutex<BTreeMap<WorldId, KripkeWorld>>,
}

impl KripkeWorldStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or find) the world with these fluents, returning its stable id.
    pub fn intern(&self, fluents: FluentsSet) -> WorldId {
        let world = KripkeWorld::new(fluents);
        let id = world.id();
        let mut guard = self.worlds.lock().expect("world store mutex poisoned");
        guard.entry(id).or_insert(world);
        id
    }

    #[must_use]
    pub fn get(&self, id: WorldId) -> Option<KripkeWorld> {
        self.worlds
            .lock()
            .expect("world store mutex poisoned")
            .get(&id)
            .cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.worlds.lock().expect("world store mutex poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A reference to a world from within one particular [`crate::state::KripkeState`].
///
/// Two states may each contain a copy of "the same" world (by fluent
/// content) that must nonetheless be told apart -- e.g. the fully-observant
/// cone after a sensing action mints worlds with identical fluents to
/// worlds already present in the oblivious-reachable subgraph. The
/// `repetition` tag disambiguates these without making `KripkeWorld` itself
/// carry state-specific bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KripkeWorldPointer {
    id: WorldId,
    repetition: u16,
}

impl KripkeWorldPointer {
    #[must_use]
    pub fn new(id: WorldId, repetition: u16) -> Self {
        Self { id, repetition }
    }

    #[must_use]
    pub fn world_id(&self) -> WorldId {
        self.id
    }

    #[must_use]
    pub fn world_id_bits(&self) -> u64 {
        self.id.as_u64()
    }

    #[must_use]
    pub fn repetition(&self) -> u16 {
        self.repetition
    }

    /// A combined ordering key matching the original's
    /// `hash((id * 1000) + repetition)` disambiguation scheme, rendered
    /// here as an explicit `Ord` impl instead of a hash collision risk.
    fn sort_key(&self) -> (u64, u16) {
        (self.id.0, self.repetition)
    }
}

impl PartialOrd for KripkeWorldPointer {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KripkeWorldPointer {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitset::Fluent;

    fn set(lits: impl IntoIterator<Item = (u32, bool)>) -> FluentsSet {
        FluentsSet::try_from_literals(lits.into_iter().map(|(id, pos)| Fluent::new(id, pos)))
            .unwrap()
    }

    #[test]
    fn same_content_interns_to_same_id() {
        let store = KripkeWorldStore::new();
        let a = store.intern(set([(1, true), (2, false)]));
        let b = store.intern(set([(2, false), (1, true)]));
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn different_content_interns_to_different_ids() {
        let store = KripkeWorldStore::new();
        let a = store.intern(set([(1, true)]));
        let b = store.intern(set([(1, false)]));
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn pointer_disambiguates_by_repetition() {
        let store = KripkeWorldStore::new();
        let id = store.intern(set([(1, true)]));
        let p0 = KripkeWorldPointer::new(id, 0);
        let p1 = KripkeWorldPointer::new(id, 1);
        assert_ne!(p0, p1);
        assert!(p0 < p1);
    }

    #[test]
    fn get_round_trips_content() {
        let store = KripkeWorldStore::new();
        let fluents = set([(1, true), (3, false)]);
        let id = store.intern(fluents.clone());
        let world = store.get(id).unwrap();
        assert_eq!(world.fluents(), &fluents);
    }
}
