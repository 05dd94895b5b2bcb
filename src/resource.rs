// 🧺 Resource Identity - What makes two items "the same kind"
//
// Two comparers are in play:
// - ResourceKey (qualified id + quality): used by the tracker, so a gold
//   melon and a normal melon are counted separately.
// - Display name: used by the live stock view, which merges by name.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// QUALITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Quality {
    #[default]
    Normal,
    Silver,
    Gold,
    Iridium,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Normal => "normal",
            Quality::Silver => "silver",
            Quality::Gold => "gold",
            Quality::Iridium => "iridium",
        }
    }

    /// Parse a quality tier (case-insensitive). Also accepts the numeric
    /// tiers used by save files: 0, 1, 2, 4.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "normal" | "0" => Some(Quality::Normal),
            "silver" | "1" => Some(Quality::Silver),
            "gold" | "2" => Some(Quality::Gold),
            "iridium" | "4" => Some(Quality::Iridium),
            _ => None,
        }
    }
}

// ============================================================================
// RESOURCE
// ============================================================================

/// An item kind as seen by the tracker.
///
/// `qualified_id` is the registry identifier (e.g. `"(O)24"`), `name` is the
/// localized display name. The name is not part of equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub qualified_id: String,
    #[serde(default)]
    pub quality: Quality,
    pub name: String,
}

/// Aggregation key: qualified id + quality tier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    pub qualified_id: String,
    pub quality: Quality,
}

impl Resource {
    pub fn new(qualified_id: impl Into<String>, name: impl Into<String>) -> Self {
        Resource {
            qualified_id: qualified_id.into(),
            quality: Quality::Normal,
            name: name.into(),
        }
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    /// Key used by the tracker for grouping
    pub fn key(&self) -> ResourceKey {
        ResourceKey {
            qualified_id: self.qualified_id.clone(),
            quality: self.quality,
        }
    }

    /// Same item regardless of quality
    pub fn same_item(&self, other: &Resource) -> bool {
        self.qualified_id == other.qualified_id
    }

    pub fn display_name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.qualified_id == other.qualified_id && self.quality == other.quality
    }
}

impl Eq for Resource {}

impl std::hash::Hash for Resource {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.qualified_id.hash(state);
        self.quality.hash(state);
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.quality {
            Quality::Normal => write!(f, "{}", self.name),
            q => write!(f, "{} ({})", self.name, q.as_str()),
        }
    }
}

// ============================================================================
// ITEM STACK / STOCK ENTRY
// ============================================================================

/// A physical stack held somewhere: a resource plus how many are in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    pub resource: Resource,
    pub stack: i32,
}

impl ItemStack {
    pub fn new(resource: Resource, stack: i32) -> Self {
        ItemStack { resource, stack }
    }
}

/// One row of an aggregated listing (rollup or live snapshot).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockEntry {
    pub resource: Resource,
    pub count: i64,
}

impl StockEntry {
    pub fn new(resource: Resource, count: i64) -> Self {
        StockEntry { resource, count }
    }

    pub fn name(&self) -> &str {
        self.resource.display_name()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_ignores_display_name() {
        let a = Resource::new("(O)24", "Parsnip");
        let b = Resource::new("(O)24", "Pastinake");

        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_quality_splits_identity() {
        let normal = Resource::new("(O)254", "Melon");
        let gold = Resource::new("(O)254", "Melon").with_quality(Quality::Gold);

        assert_ne!(normal, gold);
        assert!(normal.same_item(&gold));

        let set: HashSet<Resource> = [normal.clone(), gold, normal].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_quality_parse() {
        assert_eq!(Quality::parse("Gold"), Some(Quality::Gold));
        assert_eq!(Quality::parse("4"), Some(Quality::Iridium));
        assert_eq!(Quality::parse("3"), None);
    }

    #[test]
    fn test_display_includes_quality() {
        let melon = Resource::new("(O)254", "Melon").with_quality(Quality::Silver);
        assert_eq!(melon.to_string(), "Melon (silver)");
        assert_eq!(Resource::new("(O)254", "Melon").to_string(), "Melon");
    }
}
