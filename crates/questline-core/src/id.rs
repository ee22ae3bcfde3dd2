use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Identifies a location in the quest graph.
///
/// Location ids are the author-chosen keys from the quest document, so this
/// wraps a string rather than a numeric handle. Ids are compared and ordered
/// as plain strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(String);

impl LocationId {
    /// Create a location id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for LocationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Allows map lookups by `&str` without allocating.
impl Borrow<str> for LocationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_id_equality() {
        let a = LocationId::new("cave");
        let b = LocationId::from("cave");
        let c = LocationId::from("forest");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn location_id_displays_as_raw_string() {
        assert_eq!(LocationId::new("cave").to_string(), "cave");
    }

    #[test]
    fn location_ids_key_maps_by_str() {
        use std::collections::BTreeMap;
        let mut map = BTreeMap::new();
        map.insert(LocationId::new("cave"), 1);
        assert_eq!(map.get("cave"), Some(&1));
        assert_eq!(map.get("forest"), None);
    }
}
