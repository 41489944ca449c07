//! LoreForge Domain
//!
//! Rarity tables, catalog entries, and the pure logic that turns a rolled
//! tier plus a theme and a role into a [`GeneratedClass`].
//!
//! Nothing here performs I/O or owns an RNG: randomness is injected through
//! closures so the engine decides where it comes from.

pub mod composition;
pub mod entities;
pub mod error;
pub mod value_objects;

pub use composition::{candidates_for, compose_class};
pub use entities::{
    CatalogEntry, ClassSource, ComponentSnapshot, GeneratedClass, RoleEntry, ThemeEntry,
};
pub use error::DomainError;
pub use value_objects::{roll_rarity, RarityTier, RarityWeights, STANDARD_RARITY_WEIGHTS};
