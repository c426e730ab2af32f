//! Epistemic Kernel: the deterministic core of the epistemic planner.
//!
//! # API Surface
//!
//! The kernel exposes the pieces needed to build and transition pointed
//! Kripke models under multi-agent S5 belief:
//!
//! - [`domain::Domain`] -- a grounded, read-only domain (fluents, agents,
//!   actions, propositions)
//! - [`state::KripkeState::build_initial`] -- construct the initial pointed
//!   Kripke state from a domain's initial-condition formulae
//! - [`state::KripkeState::apply_action`] -- transition a state through an
//!   action, producing a new pointed Kripke state
//! - [`bisim::contract`] -- contract a Kripke state to its bisimulation
//!   quotient
//!
//! # Module Dependency Direction
//!
//! `bitset` ← `grounder` ← `formula` ← `world` ← `action`/`domain` ← `state` ← `bisim`
//!
//! One-way only. No cycles. `proof` is a leaf utility (canonical hashing and
//! JSON) used by `world` and by downstream crates; it depends on nothing
//! else in this crate.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod action;
pub mod bisim;
pub mod bitset;
pub mod domain;
pub mod error;
pub mod formula;
pub mod grounder;
pub mod proof;
pub mod state;
pub mod world;
