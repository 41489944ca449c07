//! The composite class produced by a roll.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog_entry::{CatalogEntry, ComponentSnapshot};
use crate::value_objects::RarityTier;

/// Where the class description came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassSource {
    /// Deterministic template over the theme and role descriptions
    Composed,
    /// Description replaced by validated generative-text output
    Augmented,
}

/// A generated RPG class.
///
/// `rarity` is always the rolled tier, independent of the rarities of the
/// embedded theme and role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedClass {
    id: String,
    name: String,
    rarity: RarityTier,
    description: String,
    theme: ComponentSnapshot,
    role: ComponentSnapshot,
    generated_at: DateTime<Utc>,
    source: ClassSource,
}

impl GeneratedClass {
    /// Build a class from a rolled tier and the chosen theme and role.
    pub fn compose(
        rarity: RarityTier,
        theme: &CatalogEntry,
        role: &CatalogEntry,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: format!(
                "{}_{}_{}",
                theme.id,
                role.id,
                generated_at.timestamp_millis()
            ),
            name: format!("{} {}", theme.name, role.name),
            rarity,
            description: format!(
                "{} infused with {} essence. {}",
                role.description, theme.name, theme.description
            ),
            theme: theme.snapshot(),
            role: role.snapshot(),
            generated_at,
            source: ClassSource::Composed,
        }
    }

    /// Replace the templated description with generated text.
    pub fn with_augmented_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self.source = ClassSource::Augmented;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rarity(&self) -> &RarityTier {
        &self.rarity
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn theme(&self) -> &ComponentSnapshot {
        &self.theme
    }

    pub fn role(&self) -> &ComponentSnapshot {
        &self.role
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn source(&self) -> ClassSource {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).single().unwrap()
    }

    #[test]
    fn test_compose_builds_name_id_and_description() {
        let theme = CatalogEntry::new("storm", "Storm", "Epic", "Lightning answers your call.");
        let role = CatalogEntry::new("monk", "Monk", "Common", "A disciplined ascetic");

        let class = GeneratedClass::compose("Rare".into(), &theme, &role, fixed_time());

        assert_eq!(class.name(), "Storm Monk");
        assert_eq!(
            class.id(),
            format!("storm_monk_{}", fixed_time().timestamp_millis())
        );
        assert_eq!(
            class.description(),
            "A disciplined ascetic infused with Storm essence. Lightning answers your call."
        );
        assert_eq!(class.rarity(), &RarityTier::from("Rare"));
        assert_eq!(class.theme().rarity, "Epic");
        assert_eq!(class.role().rarity, "Common");
        assert_eq!(class.source(), ClassSource::Composed);
    }

    #[test]
    fn test_augmented_description_keeps_identity() {
        let theme = CatalogEntry::new("ash", "Ash", "Common", "Cinders.");
        let role = CatalogEntry::new("bard", "Bard", "Common", "Sings");
        let class = GeneratedClass::compose("Common".into(), &theme, &role, fixed_time());
        let id = class.id().to_string();

        let augmented = class.with_augmented_description("A singer of burnt hymns.");

        assert_eq!(augmented.id(), id);
        assert_eq!(augmented.name(), "Ash Bard");
        assert_eq!(augmented.description(), "A singer of burnt hymns.");
        assert_eq!(augmented.source(), ClassSource::Augmented);
    }

    #[test]
    fn test_serializes_camel_case() {
        let theme = CatalogEntry::new("ash", "Ash", "Common", "Cinders.");
        let role = CatalogEntry::new("bard", "Bard", "Common", "Sings");
        let class = GeneratedClass::compose("Common".into(), &theme, &role, fixed_time());

        let value = serde_json::to_value(&class).unwrap();
        assert!(value.get("generatedAt").is_some());
        assert_eq!(value["source"], "composed");
        assert_eq!(value["theme"]["name"], "Ash");
    }
}
