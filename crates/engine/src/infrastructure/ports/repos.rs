//! Repository port traits for the theme/role catalog.

use async_trait::async_trait;
use loreforge_domain::{RarityTier, RarityWeights, RoleEntry, ThemeEntry};

use super::error::RepoError;

/// Document counts for the catalog summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogCounts {
    pub themes: u64,
    pub roles: u64,
}

impl CatalogCounts {
    /// Number of distinct theme × role pairings.
    pub fn combinations(&self) -> u64 {
        self.themes.saturating_mul(self.roles)
    }
}

/// A batch of catalog documents written together by [`CatalogRepo::import_catalog`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogImport {
    pub themes: Vec<ThemeEntry>,
    pub roles: Vec<RoleEntry>,
    /// Left untouched in the store when `None`.
    pub rarity_weights: Option<RarityWeights>,
}

// =============================================================================
// Catalog Storage
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepo: Send + Sync {
    /// Weight table from the `config` document, `None` when the document is
    /// missing or carries no weights.
    async fn rarity_weights(&self) -> Result<Option<RarityWeights>, RepoError>;

    async fn themes_with_rarity(&self, rarity: &RarityTier) -> Result<Vec<ThemeEntry>, RepoError>;
    async fn all_themes(&self) -> Result<Vec<ThemeEntry>, RepoError>;
    async fn roles_with_rarity(&self, rarity: &RarityTier) -> Result<Vec<RoleEntry>, RepoError>;
    async fn all_roles(&self) -> Result<Vec<RoleEntry>, RepoError>;

    async fn counts(&self) -> Result<CatalogCounts, RepoError>;

    // Seeding (upsert by id)
    async fn save_theme(&self, theme: &ThemeEntry) -> Result<(), RepoError>;
    async fn save_role(&self, role: &RoleEntry) -> Result<(), RepoError>;
    async fn save_rarity_weights(&self, weights: &RarityWeights) -> Result<(), RepoError>;

    /// Upsert every document in `import`, all or nothing.
    async fn import_catalog(&self, import: &CatalogImport) -> Result<(), RepoError>;
}
