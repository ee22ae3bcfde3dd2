//! Questline Core -- the interpreter core for declarative text quests.
//!
//! A quest is a graph of locations connected by conditional jumps. This
//! crate provides the three pieces the interactive loop is built on:
//!
//! - [`expr`] -- evaluation of condition and variable-change expressions
//!   against a snapshot of named integer variables, over a restricted
//!   grammar (no identifiers, calls, or member access survive past the
//!   placeholder substitution pass).
//! - [`graph`] -- the validated, immutable quest graph. Invariants (exactly
//!   one start location, unique ids, resolvable jump targets) are checked
//!   eagerly at build time, never during play.
//! - [`state`] -- the per-session state machine: which jumps are currently
//!   available, and the atomic execute-jump transition that swaps in a new
//!   variable snapshot and moves the current-location pointer.
//!
//! Loading quest documents from RON/JSON/TOML lives in the companion
//! `questline-data` crate; this crate performs no I/O.
//!
//! # Key Types
//!
//! - [`graph::QuestGraph`] -- immutable location graph, built through
//!   [`graph::QuestGraphBuilder`].
//! - [`state::QuestState`] -- one play session; many sessions may share a
//!   graph behind `Arc`.
//! - [`expr::Value`] -- an expression result, integer or boolean.

pub mod expr;
pub mod graph;
pub mod id;
pub mod state;

pub use expr::{ExprError, SubstitutionMode, Value};
pub use graph::{GraphValidationError, Jump, Location, QuestGraph, QuestGraphBuilder};
pub use id::LocationId;
pub use state::{JumpError, JumpOption, QuestState, StateError};
