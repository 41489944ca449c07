//! Catalog reads shared by the roll and summary endpoints.

use std::sync::Arc;

use loreforge_domain::RarityWeights;

use crate::infrastructure::ports::{CatalogCounts, CatalogRepo, RepoError};

/// Weight table from the store, or the standard table when no `config`
/// document exists. Storage failures propagate.
pub async fn load_rarity_weights(catalog: &dyn CatalogRepo) -> Result<RarityWeights, RepoError> {
    match catalog.rarity_weights().await? {
        Some(weights) => Ok(weights),
        None => {
            tracing::debug!("No rarity config document, using standard weights");
            Ok(RarityWeights::standard())
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSnapshot {
    pub counts: CatalogCounts,
    pub rarity_weights: RarityWeights,
}

/// Summarizes what the catalog currently holds.
pub struct CatalogOverview {
    catalog: Arc<dyn CatalogRepo>,
}

impl CatalogOverview {
    pub fn new(catalog: Arc<dyn CatalogRepo>) -> Self {
        Self { catalog }
    }

    pub async fn execute(&self) -> Result<CatalogSnapshot, RepoError> {
        let counts = self.catalog.counts().await?;
        let rarity_weights = load_rarity_weights(self.catalog.as_ref()).await?;
        Ok(CatalogSnapshot {
            counts,
            rarity_weights,
        })
    }
}
