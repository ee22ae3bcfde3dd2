//! Questline Data -- the document boundary for the quest interpreter.
//!
//! Converts quest documents (RON, JSON, or TOML) into validated
//! [`questline_core::QuestGraph`] values plus their initial variables, and
//! back again. The format is detected from the file extension; the document
//! schema itself is format-agnostic.
//!
//! # Usage
//!
//! ```rust,ignore
//! let loaded = questline_data::load_file(Path::new("quests/cave.json"))?;
//! let mut state = loaded.into_state()?;
//! ```

pub mod loader;
pub mod schema;

pub use loader::{Format, LoadError, LoadedQuest, detect_format, dump_state, dump_str, load_file, load_str};
pub use schema::{JumpData, LocationData, QuestDocument};
