//! The quest graph: locations connected by conditional jumps.
//!
//! A [`QuestGraph`] is built once from a loaded document through
//! [`QuestGraphBuilder`], validated eagerly, and immutable afterwards. Play
//! sessions share it read-only; the state machine never has to handle an
//! invalid graph mid-session.

use crate::id::LocationId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The condition applied to jumps that declare none: always passes.
pub const DEFAULT_CONDITION: &str = "true";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors detected while building a quest graph. Validation runs at
/// construction time; a built graph never violates these invariants.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GraphValidationError {
    #[error("quest graph has no locations")]
    Empty,

    #[error("no location is flagged as the start")]
    NoStart,

    #[error("more than one start location: '{first}' and '{second}'")]
    DuplicateStart {
        first: LocationId,
        second: LocationId,
    },

    #[error("duplicate location id '{id}'")]
    DuplicateLocation { id: LocationId },

    #[error("jump {index} of location '{from}' targets unknown location '{target}'")]
    DanglingJump {
        from: LocationId,
        index: usize,
        target: LocationId,
    },
}

// ---------------------------------------------------------------------------
// Core data structures
// ---------------------------------------------------------------------------

/// A directed, conditionally-enabled edge between locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jump {
    /// Destination location id. Must resolve within the graph.
    pub next: LocationId,
    /// Label shown to the player.
    pub text: String,
    /// Condition expression deciding whether the jump is selectable.
    pub condition: String,
    /// Variable reassignments applied when the jump executes. Every
    /// right-hand side is evaluated against the pre-jump snapshot.
    pub var_changes: BTreeMap<String, String>,
}

impl Jump {
    /// A jump to `next` with the default always-true condition and no
    /// variable changes.
    pub fn new(next: impl Into<LocationId>, text: impl Into<String>) -> Self {
        Self {
            next: next.into(),
            text: text.into(),
            condition: DEFAULT_CONDITION.to_string(),
            var_changes: BTreeMap::new(),
        }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = condition.into();
        self
    }

    pub fn with_var_change(mut self, name: impl Into<String>, expr: impl Into<String>) -> Self {
        self.var_changes.insert(name.into(), expr.into());
        self
    }
}

/// A node in the quest graph: narrative text plus outgoing jumps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    /// Narrative text shown while this location is current.
    pub text: String,
    /// Exactly one location per graph carries this flag.
    pub is_start: bool,
    /// Terminal locations offer no jumps; reaching one ends the session.
    pub is_end: bool,
    /// Outgoing jumps in declared order. The order is the index the driver
    /// selects by.
    pub jumps: Vec<Jump>,
}

impl Location {
    pub fn new(id: impl Into<LocationId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            is_start: false,
            is_end: false,
            jumps: Vec::new(),
        }
    }

    pub fn start(mut self) -> Self {
        self.is_start = true;
        self
    }

    pub fn end(mut self) -> Self {
        self.is_end = true;
        self
    }

    pub fn with_jump(mut self, jump: Jump) -> Self {
        self.jumps.push(jump);
        self
    }
}

/// Validated, immutable quest graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestGraph {
    locations: BTreeMap<LocationId, Location>,
    start: LocationId,
}

impl QuestGraph {
    pub fn builder() -> QuestGraphBuilder {
        QuestGraphBuilder::new()
    }

    /// The id of the unique start location.
    pub fn start(&self) -> &LocationId {
        &self.start
    }

    pub fn get(&self, id: &LocationId) -> Option<&Location> {
        self.locations.get(id)
    }

    pub fn contains(&self, id: &LocationId) -> bool {
        self.locations.contains_key(id)
    }

    /// Locations in id order.
    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.values()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects locations, then validates them into an immutable [`QuestGraph`].
///
/// Validation is eager: `build` checks every invariant (single start, unique
/// ids, resolvable jump targets) and reports the first violation.
#[derive(Debug, Default)]
pub struct QuestGraphBuilder {
    locations: Vec<Location>,
}

impl QuestGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_location(&mut self, location: Location) -> &mut Self {
        self.locations.push(location);
        self
    }

    pub fn build(self) -> Result<QuestGraph, GraphValidationError> {
        if self.locations.is_empty() {
            return Err(GraphValidationError::Empty);
        }

        let mut locations: BTreeMap<LocationId, Location> = BTreeMap::new();
        let mut start: Option<LocationId> = None;

        for location in self.locations {
            if locations.contains_key(&location.id) {
                return Err(GraphValidationError::DuplicateLocation { id: location.id });
            }
            if location.is_start {
                if let Some(first) = start {
                    return Err(GraphValidationError::DuplicateStart {
                        first,
                        second: location.id,
                    });
                }
                start = Some(location.id.clone());
            }
            locations.insert(location.id.clone(), location);
        }

        let start = start.ok_or(GraphValidationError::NoStart)?;

        for location in locations.values() {
            for (index, jump) in location.jumps.iter().enumerate() {
                if !locations.contains_key(&jump.next) {
                    return Err(GraphValidationError::DanglingJump {
                        from: location.id.clone(),
                        index,
                        target: jump.next.clone(),
                    });
                }
            }
        }

        Ok(QuestGraph { locations, start })
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn two_location_graph() -> QuestGraph {
        let mut builder = QuestGraph::builder();
        builder
            .add_location(Location::new("gate", "You stand at the gate.").start().with_jump(
                Jump::new("hall", "Enter the hall").with_condition("<gold> >= 10"),
            ))
            .add_location(Location::new("hall", "The hall is empty.").end());
        builder.build().unwrap()
    }

    // -----------------------------------------------------------------------
    // Successful construction
    // -----------------------------------------------------------------------

    #[test]
    fn build_valid_graph() {
        let graph = two_location_graph();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.start().as_str(), "gate");
        assert!(graph.contains(&LocationId::new("hall")));
    }

    #[test]
    fn jump_defaults_to_true_condition() {
        let jump = Jump::new("hall", "go");
        assert_eq!(jump.condition, DEFAULT_CONDITION);
        assert!(jump.var_changes.is_empty());
    }

    #[test]
    fn self_targeting_jump_is_valid() {
        let mut builder = QuestGraph::builder();
        builder.add_location(
            Location::new("loop", "Around again.")
                .start()
                .with_jump(Jump::new("loop", "Stay")),
        );
        assert!(builder.build().is_ok());
    }

    #[test]
    fn locations_iterate_in_id_order() {
        let mut builder = QuestGraph::builder();
        builder
            .add_location(Location::new("zeta", "z").start())
            .add_location(Location::new("alpha", "a"));
        let graph = builder.build().unwrap();
        let ids: Vec<&str> = graph.locations().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "zeta"]);
    }

    // -----------------------------------------------------------------------
    // Validation failures
    // -----------------------------------------------------------------------

    #[test]
    fn empty_graph_fails() {
        let result = QuestGraph::builder().build();
        assert!(matches!(result, Err(GraphValidationError::Empty)));
    }

    #[test]
    fn missing_start_fails() {
        let mut builder = QuestGraph::builder();
        builder.add_location(Location::new("gate", "text"));
        assert!(matches!(
            builder.build(),
            Err(GraphValidationError::NoStart)
        ));
    }

    #[test]
    fn duplicate_start_fails() {
        let mut builder = QuestGraph::builder();
        builder
            .add_location(Location::new("a", "first").start())
            .add_location(Location::new("b", "second").start());
        let err = builder.build().unwrap_err();
        match err {
            GraphValidationError::DuplicateStart { first, second } => {
                assert_eq!(first.as_str(), "a");
                assert_eq!(second.as_str(), "b");
            }
            other => panic!("expected DuplicateStart, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_location_id_fails() {
        let mut builder = QuestGraph::builder();
        builder
            .add_location(Location::new("gate", "one").start())
            .add_location(Location::new("gate", "two"));
        assert!(matches!(
            builder.build(),
            Err(GraphValidationError::DuplicateLocation { id }) if id.as_str() == "gate"
        ));
    }

    #[test]
    fn dangling_jump_target_fails() {
        let mut builder = QuestGraph::builder();
        builder.add_location(
            Location::new("gate", "text")
                .start()
                .with_jump(Jump::new("nowhere", "go")),
        );
        let err = builder.build().unwrap_err();
        match err {
            GraphValidationError::DanglingJump {
                from,
                index,
                target,
            } => {
                assert_eq!(from.as_str(), "gate");
                assert_eq!(index, 0);
                assert_eq!(target.as_str(), "nowhere");
            }
            other => panic!("expected DanglingJump, got {other:?}"),
        }
    }

    #[test]
    fn dangling_jump_reports_correct_index() {
        let mut builder = QuestGraph::builder();
        builder
            .add_location(
                Location::new("gate", "text")
                    .start()
                    .with_jump(Jump::new("hall", "ok"))
                    .with_jump(Jump::new("void", "bad")),
            )
            .add_location(Location::new("hall", "fine"));
        let err = builder.build().unwrap_err();
        assert!(matches!(
            err,
            GraphValidationError::DanglingJump { index: 1, .. }
        ));
    }
}
