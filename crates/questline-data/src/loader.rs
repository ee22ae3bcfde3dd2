//! Load and dump pipeline between quest documents and the core model.
//!
//! Provides format detection (RON/JSON/TOML), document parsing, resolution
//! into a validated [`QuestGraph`], and the inverse `dump` direction.

use crate::schema::{JumpData, LocationData, QuestDocument};
use questline_core::graph::{Jump, Location, QuestGraph};
use questline_core::id::LocationId;
use questline_core::state::{QuestState, StateError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading or dumping a quest document.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// The document does not match the quest schema.
    #[error("malformed quest document: {detail}")]
    Malformed { detail: String },

    /// The document parsed but violates a graph invariant.
    #[error(transparent)]
    Graph(#[from] questline_core::graph::GraphValidationError),

    /// The resume pointer names a location absent from the graph.
    #[error("resume location '{id}' not found in quest graph")]
    UnknownResume { id: String },

    /// Serializing a document failed.
    #[error("failed to serialize quest document: {detail}")]
    Serialize { detail: String },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported quest document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Json,
    Toml,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, LoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        _ => Err(LoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// Loading
// ===========================================================================

/// A fully resolved quest: the validated graph plus session inputs.
#[derive(Debug, Clone)]
pub struct LoadedQuest {
    pub graph: Arc<QuestGraph>,
    /// Initial variable values from the document.
    pub variables: BTreeMap<String, i64>,
    /// The graph's unique start location.
    pub start: LocationId,
    /// Resume pointer, when the document was dumped mid-session.
    pub resume: Option<LocationId>,
}

impl LoadedQuest {
    /// Build a session: at the resume pointer when present, else at the
    /// start location.
    pub fn into_state(self) -> Result<QuestState, StateError> {
        match self.resume {
            Some(current) => QuestState::resume(self.graph, self.variables, current),
            None => Ok(QuestState::new(self.graph, self.variables)),
        }
    }
}

/// Parse a document from text in the given format.
pub fn parse_document(text: &str, format: Format) -> Result<QuestDocument, LoadError> {
    match format {
        Format::Ron => ron::from_str(text).map_err(|e| LoadError::Malformed {
            detail: e.to_string(),
        }),
        Format::Json => serde_json::from_str(text).map_err(|e| LoadError::Malformed {
            detail: e.to_string(),
        }),
        Format::Toml => toml::from_str(text).map_err(|e| LoadError::Malformed {
            detail: e.to_string(),
        }),
    }
}

/// Resolve a parsed document into a validated graph and session inputs.
pub fn from_document(doc: &QuestDocument) -> Result<LoadedQuest, LoadError> {
    let mut builder = QuestGraph::builder();

    for (id, data) in &doc.locations {
        let jumps = data
            .jumps
            .iter()
            .map(|jump| Jump {
                // A jump without an explicit target points back at its own
                // location.
                next: LocationId::new(jump.next.clone().unwrap_or_else(|| id.clone())),
                text: jump.text.clone(),
                condition: jump.condition.clone(),
                var_changes: jump.var_changes.clone(),
            })
            .collect();

        builder.add_location(Location {
            id: LocationId::new(id.clone()),
            text: data.text.clone(),
            is_start: data.is_start,
            is_end: data.is_end,
            jumps,
        });
    }

    let graph = Arc::new(builder.build()?);
    let start = graph.start().clone();

    let resume = match &doc.current {
        Some(id) => {
            let id = LocationId::new(id.clone());
            if !graph.contains(&id) {
                return Err(LoadError::UnknownResume {
                    id: id.as_str().to_string(),
                });
            }
            Some(id)
        }
        None => None,
    };

    Ok(LoadedQuest {
        graph,
        variables: doc.vars.clone(),
        start,
        resume,
    })
}

/// Load a quest from text in the given format.
pub fn load_str(text: &str, format: Format) -> Result<LoadedQuest, LoadError> {
    let doc = parse_document(text, format)?;
    from_document(&doc)
}

/// Load a quest from a file, detecting the format from the extension.
pub fn load_file(path: &Path) -> Result<LoadedQuest, LoadError> {
    let format = detect_format(path)?;
    let text = std::fs::read_to_string(path)?;
    load_str(&text, format)
}

// ===========================================================================
// Dumping
// ===========================================================================

/// Convert a graph plus session state back into a document.
pub fn to_document(
    graph: &QuestGraph,
    variables: &BTreeMap<String, i64>,
    current: Option<&LocationId>,
) -> QuestDocument {
    let locations = graph
        .locations()
        .map(|location| {
            let jumps = location
                .jumps
                .iter()
                .map(|jump| JumpData {
                    next: Some(jump.next.as_str().to_string()),
                    text: jump.text.clone(),
                    condition: jump.condition.clone(),
                    var_changes: jump.var_changes.clone(),
                })
                .collect();
            (
                location.id.as_str().to_string(),
                LocationData {
                    text: location.text.clone(),
                    is_start: location.is_start,
                    is_end: location.is_end,
                    jumps,
                },
            )
        })
        .collect();

    QuestDocument {
        current: current.map(|id| id.as_str().to_string()),
        vars: variables.clone(),
        locations,
    }
}

/// Serialize a document to text in the given format.
pub fn dump_str(doc: &QuestDocument, format: Format) -> Result<String, LoadError> {
    match format {
        Format::Ron => ron::to_string(doc).map_err(|e| LoadError::Serialize {
            detail: e.to_string(),
        }),
        Format::Json => serde_json::to_string_pretty(doc).map_err(|e| LoadError::Serialize {
            detail: e.to_string(),
        }),
        Format::Toml => toml::to_string(doc).map_err(|e| LoadError::Serialize {
            detail: e.to_string(),
        }),
    }
}

/// Dump a live session, recording its current location as the resume pointer.
pub fn dump_state(state: &QuestState, format: Format) -> Result<String, LoadError> {
    let doc = to_document(state.graph(), state.variables(), Some(state.current()));
    dump_str(&doc, format)
}

// ===========================================================================
// Tests
// ===========================================================================
