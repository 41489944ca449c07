//! Domain entities - Core business objects with identity

mod catalog_entry;
mod generated_class;

pub use catalog_entry::{CatalogEntry, ComponentSnapshot, RoleEntry, ThemeEntry};
pub use generated_class::{ClassSource, GeneratedClass};
