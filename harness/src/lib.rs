//! Epistemic planner harness: domain-file reading, CLI parsing, and search
//! dispatch around the `epistemic-kernel`/`epistemic-search` core.
//!
//! The harness parses a textual domain description into a grounded
//! `epistemic_kernel::domain::Domain`, builds a `SearchPolicy` from CLI
//! flags, and either runs a single `epistemic_search::engine` invocation,
//! races a portfolio of configurations, replays/validates a plan, or dumps
//! training-dataset DOT files -- it does not implement planning logic
//! itself.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cli;
pub mod dataset;
pub mod domain_text;
pub mod error;
pub mod gnn;
pub mod logging;
pub mod portfolio;
pub mod validate;
