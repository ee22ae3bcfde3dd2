//! The quest state machine: a play session over an immutable graph.
//!
//! [`QuestState`] owns the variable snapshot and the current-location
//! pointer. Queries ([`QuestState::available_jumps`],
//! [`QuestState::is_terminal`]) never mutate; [`QuestState::select_jump`]
//! performs the single mutating transition per turn. A transition is atomic:
//! every variable-change right-hand side is evaluated against the pre-jump
//! snapshot, and any failure leaves the state untouched.
//!
//! The graph is shared behind [`Arc`]; concurrent sessions are independent
//! `QuestState` values over the same graph and need no locking.

use crate::expr::{self, ExprError};
use crate::graph::{Jump, Location, QuestGraph};
use crate::id::LocationId;
use std::collections::BTreeMap;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors from selecting a jump. `Finished`, `OutOfRange` and `Disabled`
/// are recoverable driver-loop errors; `Expression` and `UnknownVariable`
/// are authoring errors surfaced from the quest document. None of them
/// leaves the state modified.
#[derive(Debug, Clone, thiserror::Error)]
pub enum JumpError {
    #[error("the quest is already finished")]
    Finished,

    #[error("jump index {index} is out of range (location has {count} jumps)")]
    OutOfRange { index: usize, count: usize },

    #[error("jump {index} is currently disabled")]
    Disabled { index: usize },

    #[error("variable change targets unknown variable '{name}'")]
    UnknownVariable { name: String },

    #[error("jump {index}: {source}")]
    Expression { index: usize, source: ExprError },
}

/// Errors from constructing a session.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StateError {
    #[error("location '{id}' not found in quest graph")]
    UnknownLocation { id: LocationId },
}

// ---------------------------------------------------------------------------
// Jump options
// ---------------------------------------------------------------------------

/// One entry of [`QuestState::available_jumps`]: the jump at `index` of the
/// current location and whether its condition currently holds.
#[derive(Debug, Clone, Copy)]
pub struct JumpOption<'a> {
    pub index: usize,
    pub jump: &'a Jump,
    pub enabled: bool,
}

// ---------------------------------------------------------------------------
// QuestState
// ---------------------------------------------------------------------------

/// A mutable play session over an immutable [`QuestGraph`].
#[derive(Debug, Clone)]
pub struct QuestState {
    graph: Arc<QuestGraph>,
    variables: BTreeMap<String, i64>,
    current: LocationId,
}

impl QuestState {
    /// Start a session at the graph's start location.
    pub fn new(graph: Arc<QuestGraph>, variables: BTreeMap<String, i64>) -> Self {
        let current = graph.start().clone();
        Self {
            graph,
            variables,
            current,
        }
    }

    /// Resume a session at an explicit location, validated against the graph.
    pub fn resume(
        graph: Arc<QuestGraph>,
        variables: BTreeMap<String, i64>,
        current: LocationId,
    ) -> Result<Self, StateError> {
        if !graph.contains(&current) {
            return Err(StateError::UnknownLocation { id: current });
        }
        Ok(Self {
            graph,
            variables,
            current,
        })
    }

    pub fn graph(&self) -> &Arc<QuestGraph> {
        &self.graph
    }

    pub fn variables(&self) -> &BTreeMap<String, i64> {
        &self.variables
    }

    pub fn current(&self) -> &LocationId {
        &self.current
    }

    /// Set a variable from outside the jump mechanism, e.g. a driver-level
    /// cheat or test hook. Inserts the key if absent.
    pub fn set_variable(&mut self, name: impl Into<String>, value: i64) {
        self.variables.insert(name.into(), value);
    }

    /// The location the session currently occupies.
    pub fn current_location(&self) -> &Location {
        self.graph
            .get(&self.current)
            .expect("current location always resolves: validated at construction and on every jump")
    }

    /// True once the current location is flagged `is_end`. Terminal is
    /// absorbing: no further jump can be selected.
    pub fn is_terminal(&self) -> bool {
        self.current_location().is_end
    }

    /// Every jump of the current location, in declared order, with its
    /// condition evaluated against the current variables. Pure query.
    ///
    /// A condition that fails to evaluate yields `enabled: false` rather
    /// than an error, so a malformed condition cannot make the session
    /// unplayable at display time.
    pub fn available_jumps(&self) -> Vec<JumpOption<'_>> {
        self.current_location()
            .jumps
            .iter()
            .enumerate()
            .map(|(index, jump)| JumpOption {
                index,
                jump,
                enabled: expr::evaluate_condition(&jump.condition, &self.variables)
                    .unwrap_or(false),
            })
            .collect()
    }

    /// Execute the jump at `index` of the current location.
    ///
    /// On success the variable snapshot is replaced and the current-location
    /// pointer moves to the jump's destination, as one atomic transition.
    /// Every right-hand side in `var_changes` reads the pre-jump snapshot,
    /// so `{a: "<b>", b: "<a>"}` swaps the two values. On any error the
    /// state is left exactly as it was.
    pub fn select_jump(&mut self, index: usize) -> Result<(), JumpError> {
        if self.is_terminal() {
            return Err(JumpError::Finished);
        }

        let graph = Arc::clone(&self.graph);
        let location = graph
            .get(&self.current)
            .expect("current location always resolves: validated at construction and on every jump");

        let count = location.jumps.len();
        let jump = location
            .jumps
            .get(index)
            .ok_or(JumpError::OutOfRange { index, count })?;

        let enabled = expr::evaluate_condition(&jump.condition, &self.variables)
            .map_err(|source| JumpError::Expression { index, source })?;
        if !enabled {
            return Err(JumpError::Disabled { index });
        }

        // Stage every change against the pre-jump snapshot before touching
        // anything. Execution only updates existing keys.
        let mut staged = Vec::with_capacity(jump.var_changes.len());
        for (name, rhs) in &jump.var_changes {
            if !self.variables.contains_key(name) {
                return Err(JumpError::UnknownVariable { name: name.clone() });
            }
            let value = expr::evaluate_value(rhs, &self.variables)
                .map_err(|source| JumpError::Expression { index, source })?;
            staged.push((name.clone(), value));
        }

        for (name, value) in staged {
            self.variables.insert(name, value);
        }
        self.current = jump.next.clone();
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
