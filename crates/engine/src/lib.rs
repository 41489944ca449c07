//! LoreForge Engine library.
//!
//! This crate contains all server-side code for the LoreForge RPG backend.
//!
//! ## Structure
//!
//! - `use_cases/` - Generation, class rolls, and catalog summaries
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - HTTP entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod use_cases;

/// End-to-end route tests against an in-memory catalog and a scripted model.
#[cfg(test)]
mod e2e_tests;

pub use app::App;
