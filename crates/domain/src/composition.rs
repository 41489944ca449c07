//! Class composition: theme + role = class.
//!
//! Composition is pure. Fetching themes and roles is the caller's job, and
//! randomness arrives through the `pick` closure (`pick(len)` must return an
//! index in `0..len`).

use chrono::{DateTime, Utc};

use crate::entities::{CatalogEntry, GeneratedClass, RoleEntry, ThemeEntry};
use crate::error::DomainError;
use crate::value_objects::RarityTier;

/// Entries tagged with `rarity`, or every entry when none match.
///
/// Themes and roles fall back independently, so a class can pair a matching
/// theme with a role of a different tier.
pub fn candidates_for<'a>(rarity: &RarityTier, entries: &'a [CatalogEntry]) -> Vec<&'a CatalogEntry> {
    let matching: Vec<&CatalogEntry> = entries
        .iter()
        .filter(|entry| entry.has_rarity(rarity))
        .collect();

    if matching.is_empty() {
        entries.iter().collect()
    } else {
        matching
    }
}

/// Compose a class for an already-rolled tier.
pub fn compose_class<P>(
    rarity: &RarityTier,
    themes: &[ThemeEntry],
    roles: &[RoleEntry],
    mut pick: P,
    generated_at: DateTime<Utc>,
) -> Result<GeneratedClass, DomainError>
where
    P: FnMut(usize) -> usize,
{
    let theme_pool = candidates_for(rarity, themes);
    let role_pool = candidates_for(rarity, roles);

    let (Some(theme), Some(role)) = (
        choose(&theme_pool, &mut pick),
        choose(&role_pool, &mut pick),
    ) else {
        return Err(DomainError::no_candidates(theme_pool.len(), role_pool.len()));
    };

    Ok(GeneratedClass::compose(
        rarity.clone(),
        theme,
        role,
        generated_at,
    ))
}

fn choose<'a, P>(pool: &[&'a CatalogEntry], pick: &mut P) -> Option<&'a CatalogEntry>
where
    P: FnMut(usize) -> usize,
{
    if pool.is_empty() {
        return None;
    }
    let index = pick(pool.len()).min(pool.len() - 1);
    Some(pool[index])
}
