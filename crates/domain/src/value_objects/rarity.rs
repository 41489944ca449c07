//! Rarity tiers and weighted rarity rolls.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

/// A named rarity bucket (e.g. "Common", "Eternal").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RarityTier(String);

impl RarityTier {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RarityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RarityTier {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RarityTier {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl PartialEq<str> for RarityTier {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for RarityTier {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Table used when the catalog has no configuration document.
pub const STANDARD_RARITY_WEIGHTS: [(&str, f64); 8] = [
    ("Common", 45.0),
    ("Uncommon", 25.0),
    ("Rare", 14.0),
    ("Epic", 8.0),
    ("Legendary", 4.0),
    ("Mythical", 2.0),
    ("Celestial", 1.5),
    ("Eternal", 0.5),
];

/// Ordered mapping of tier to sampling weight.
///
/// Insertion order is the canonical iteration order of a roll, so two tables
/// with the same weights in a different order can produce different tiers for
/// the same draw. Deserializing from a JSON object keeps the document order.
///
/// Construction rejects negative, non-finite, and duplicate entries. Empty or
/// all-zero tables are representable and fail at roll time instead.
#[derive(Debug, Clone, PartialEq)]
pub struct RarityWeights {
    entries: Vec<(RarityTier, f64)>,
}

impl RarityWeights {
    pub fn new<I, T>(entries: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = (T, f64)>,
        T: Into<RarityTier>,
    {
        let mut validated: Vec<(RarityTier, f64)> = Vec::new();

        for (tier, weight) in entries {
            let tier = tier.into();
            if !weight.is_finite() || weight < 0.0 {
                return Err(DomainError::configuration(format!(
                    "Rarity weight for '{}' must be a non-negative number, got {}",
                    tier, weight
                )));
            }
            if validated.iter().any(|(existing, _)| *existing == tier) {
                return Err(DomainError::configuration(format!(
                    "Rarity tier '{}' appears more than once",
                    tier
                )));
            }
            validated.push((tier, weight));
        }

        Ok(Self { entries: validated })
    }

    /// The built-in eight-tier table.
    pub fn standard() -> Self {
        Self {
            entries: STANDARD_RARITY_WEIGHTS
                .iter()
                .map(|(tier, weight)| (RarityTier::from(*tier), *weight))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, weight)| weight).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RarityTier, f64)> {
        self.entries.iter().map(|(tier, weight)| (tier, *weight))
    }

    pub fn tiers(&self) -> impl Iterator<Item = &RarityTier> {
        self.entries.iter().map(|(tier, _)| tier)
    }

    pub fn weight_of(&self, tier: &RarityTier) -> Option<f64> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == tier)
            .map(|(_, weight)| *weight)
    }

    /// Expected share of rolls landing on `tier`, if the table is rollable.
    pub fn probability_of(&self, tier: &RarityTier) -> Option<f64> {
        let total = self.total();
        if total <= 0.0 {
            return None;
        }
        self.weight_of(tier).map(|weight| weight / total)
    }

    /// Draw one tier.
    ///
    /// `draw` receives the table total and must return a value uniformly
    /// distributed in `[0, total)`. Each positive-weight tier's weight is
    /// subtracted in insertion order and the first tier that brings the
    /// remainder to zero or below wins. Zero-weight tiers are never returned.
    pub fn roll<F>(&self, draw: F) -> Result<RarityTier, DomainError>
    where
        F: FnOnce(f64) -> f64,
    {
        if self.entries.is_empty() {
            return Err(DomainError::configuration("Rarity weight table is empty"));
        }

        let total = self.total();
        if total <= 0.0 {
            return Err(DomainError::configuration(
                "Rarity weights must sum to a positive total",
            ));
        }

        let mut remaining = draw(total);
        if !remaining.is_finite() || remaining < 0.0 {
            remaining = 0.0;
        }

        let mut last_positive = None;
        for (tier, weight) in &self.entries {
            if *weight <= 0.0 {
                continue;
            }
            last_positive = Some(tier);
            remaining -= weight;
            if remaining <= 0.0 {
                return Ok(tier.clone());
            }
        }

        // Floating point drift can leave a sliver above zero after the last tier.
        last_positive
            .cloned()
            .ok_or_else(|| DomainError::configuration("Rarity weight table has no positive weight"))
    }
}

impl Default for RarityWeights {
    fn default() -> Self {
        Self::standard()
    }
}

/// Weighted roll over a rarity table. See [`RarityWeights::roll`].
pub fn roll_rarity<F>(weights: &RarityWeights, draw: F) -> Result<RarityTier, DomainError>
where
    F: FnOnce(f64) -> f64,
{
    weights.roll(draw)
}

impl Serialize for RarityWeights {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (tier, weight) in &self.entries {
            map.serialize_entry(tier, weight)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RarityWeights {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct WeightsVisitor;

        impl<'de> Visitor<'de> for WeightsVisitor {
            type Value = RarityWeights;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of rarity tier to numeric weight")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries: Vec<(String, f64)> =
                    Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((tier, weight)) = access.next_entry::<String, f64>()? {
                    entries.push((tier, weight));
                }
                RarityWeights::new(entries).map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_map(WeightsVisitor)
    }
}
