//! Value objects: immutable, validated-on-construction domain values.

mod rarity;

pub use rarity::{roll_rarity, RarityTier, RarityWeights, STANDARD_RARITY_WEIGHTS};
