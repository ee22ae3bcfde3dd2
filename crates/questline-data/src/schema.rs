//! Serde document structs for quest files.
//!
//! These structs define the on-disk format for quests. They are deserialized
//! from RON, JSON, or TOML and then resolved into a validated
//! [`questline_core::QuestGraph`] by the loader.

use questline_core::graph::DEFAULT_CONDITION;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A whole quest document.
///
/// Field order matters for TOML output: scalar values must be serialized
/// before tables, so `current` comes first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestDocument {
    /// Resume pointer written by `dump`; absent on authored documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,
    /// Initial variable values.
    #[serde(default)]
    pub vars: BTreeMap<String, i64>,
    /// Locations keyed by id.
    pub locations: BTreeMap<String, LocationData>,
}

/// A location as it appears in a quest document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    pub text: String,
    #[serde(default)]
    pub is_start: bool,
    #[serde(default)]
    pub is_end: bool,
    #[serde(default)]
    pub jumps: Vec<JumpData>,
}

/// A jump as it appears in a quest document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JumpData {
    /// Destination id. Defaults to the enclosing location itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    pub text: String,
    #[serde(default = "default_condition")]
    pub condition: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub var_changes: BTreeMap<String, String>,
}

fn default_condition() -> String {
    DEFAULT_CONDITION.to_string()
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // JSON deserialization
    // -----------------------------------------------------------------------

    #[test]
    fn document_from_json() {
        let json = r#"{
            "locations": {
                "gate": {
                    "text": "You stand at the gate.",
                    "is_start": true,
                    "jumps": [
                        {"next": "hall", "text": "Enter", "condition": "<gold> >= 10"}
                    ]
                },
                "hall": {"text": "Inside.", "is_end": true}
            },
            "vars": {"gold": 5}
        }"#;
        let doc: QuestDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.locations.len(), 2);
        assert_eq!(doc.vars["gold"], 5);
        assert!(doc.current.is_none());

        let gate = &doc.locations["gate"];
        assert!(gate.is_start);
        assert!(!gate.is_end);
        assert_eq!(gate.jumps[0].next.as_deref(), Some("hall"));
        assert_eq!(gate.jumps[0].condition, "<gold> >= 10");
    }

    #[test]
    fn jump_defaults_from_json() {
        let json = r#"{"text": "Wait"}"#;
        let jump: JumpData = serde_json::from_str(json).unwrap();
        assert_eq!(jump.next, None);
        assert_eq!(jump.condition, "true");
        assert!(jump.var_changes.is_empty());
    }

    #[test]
    fn location_defaults_from_json() {
        let json = r#"{"text": "A quiet clearing."}"#;
        let loc: LocationData = serde_json::from_str(json).unwrap();
        assert!(!loc.is_start);
        assert!(!loc.is_end);
        assert!(loc.jumps.is_empty());
    }

    #[test]
    fn missing_text_is_rejected() {
        let json = r#"{"is_start": true}"#;
        assert!(serde_json::from_str::<LocationData>(json).is_err());
    }

    // -----------------------------------------------------------------------
    // RON deserialization
    // -----------------------------------------------------------------------

    #[test]
    fn document_from_ron() {
        let ron = r#"
            (
                vars: {"gold": 5},
                locations: {
                    "gate": (
                        text: "You stand at the gate.",
                        is_start: true,
                        jumps: [
                            (next: Some("hall"), text: "Enter",
                             var_changes: {"gold": "<gold> - 5"}),
                        ],
                    ),
                    "hall": (text: "Inside.", is_end: true),
                },
            )
        "#;
        let doc: QuestDocument = ron::from_str(ron).unwrap();
        assert_eq!(doc.locations.len(), 2);
        let gate = &doc.locations["gate"];
        assert_eq!(gate.jumps[0].condition, "true");
        assert_eq!(gate.jumps[0].var_changes["gold"], "<gold> - 5");
    }

    // -----------------------------------------------------------------------
    // TOML deserialization
    // -----------------------------------------------------------------------

    #[test]
    fn document_from_toml() {
        let toml_str = r#"
            [vars]
            gold = 5

            [locations.gate]
            text = "You stand at the gate."
            is_start = true

            [[locations.gate.jumps]]
            next = "hall"
            text = "Enter"
            condition = "<gold> >= 10"

            [locations.hall]
            text = "Inside."
            is_end = true
        "#;
        let doc: QuestDocument = toml::from_str(toml_str).unwrap();
        assert_eq!(doc.locations.len(), 2);
        assert_eq!(doc.vars["gold"], 5);
        assert!(doc.locations["hall"].is_end);
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    fn small_document() -> QuestDocument {
        let mut locations = BTreeMap::new();
        locations.insert(
            "gate".to_string(),
            LocationData {
                text: "At the gate.".to_string(),
                is_start: true,
                is_end: false,
                jumps: vec![JumpData {
                    next: Some("hall".to_string()),
                    text: "Enter".to_string(),
                    condition: "true".to_string(),
                    var_changes: BTreeMap::new(),
                }],
            },
        );
        locations.insert(
            "hall".to_string(),
            LocationData {
                text: "Inside.".to_string(),
                is_start: false,
                is_end: true,
                jumps: Vec::new(),
            },
        );
        QuestDocument {
            current: None,
            vars: [("gold".to_string(), 5)].into(),
            locations,
        }
    }

    #[test]
    fn json_round_trip() {
        let doc = small_document();
        let text = serde_json::to_string(&doc).unwrap();
        let back: QuestDocument = serde_json::from_str(&text).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn toml_round_trip() {
        let doc = small_document();
        let text = toml::to_string(&doc).unwrap();
        let back: QuestDocument = toml::from_str(&text).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn toml_serializes_with_resume_pointer() {
        let mut doc = small_document();
        doc.current = Some("hall".to_string());
        let text = toml::to_string(&doc).unwrap();
        let back: QuestDocument = toml::from_str(&text).unwrap();
        assert_eq!(back.current.as_deref(), Some("hall"));
    }
}
