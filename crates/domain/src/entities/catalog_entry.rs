//! Theme and role building blocks read from the catalog.

use serde::{Deserialize, Serialize};

use crate::value_objects::RarityTier;

/// A rarity-tagged descriptive building block.
///
/// Themes and roles share one shape; the collection they come from decides
/// which side of a class they fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Document id in the catalog (unique within its collection)
    pub id: String,
    pub name: String,
    pub rarity: RarityTier,
    pub description: String,
}

/// A catalog entry from the `themes` collection.
pub type ThemeEntry = CatalogEntry;

/// A catalog entry from the `roles` collection.
pub type RoleEntry = CatalogEntry;

impl CatalogEntry {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        rarity: impl Into<RarityTier>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rarity: rarity.into(),
            description: description.into(),
        }
    }

    pub fn has_rarity(&self, rarity: &RarityTier) -> bool {
        self.rarity == *rarity
    }

    /// Copy of the displayable fields, embedded into a generated class.
    pub fn snapshot(&self) -> ComponentSnapshot {
        ComponentSnapshot {
            name: self.name.clone(),
            rarity: self.rarity.clone(),
            description: self.description.clone(),
        }
    }
}

/// Frozen copy of a theme or role as it was when the class was generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSnapshot {
    pub name: String,
    pub rarity: RarityTier,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_copies_display_fields() {
        let entry = CatalogEntry::new("t-ember", "Ember", "Rare", "Smouldering resolve.");
        let snapshot = entry.snapshot();
        assert_eq!(snapshot.name, "Ember");
        assert_eq!(snapshot.rarity, "Rare");
        assert_eq!(snapshot.description, "Smouldering resolve.");
    }

    #[test]
    fn test_has_rarity() {
        let entry = CatalogEntry::new("r-monk", "Monk", "Common", "Disciplined fighter.");
        assert!(entry.has_rarity(&RarityTier::from("Common")));
        assert!(!entry.has_rarity(&RarityTier::from("common")));
    }

    #[test]
    fn test_deserialize_document() {
        let json = r#"{"id":"t1","name":"Void","rarity":"Epic","description":"The hungry dark."}"#;
        let entry: CatalogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.rarity, "Epic");
        assert_eq!(entry.name, "Void");
    }
}
