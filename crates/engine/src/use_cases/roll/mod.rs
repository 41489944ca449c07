//! Random class roll: rarity → catalog candidates → composed class.
//!
//! Optionally asks the generative API for a fresh description; the display
//! name and rolled rarity are kept either way.

use std::sync::Arc;

use loreforge_domain::{
    compose_class, DomainError, GeneratedClass, RarityTier, RoleEntry, ThemeEntry,
};

use crate::infrastructure::correlation::RequestId;
use crate::infrastructure::ports::{CatalogRepo, ClockPort, RandomPort, RepoError};
use crate::use_cases::catalog::load_rarity_weights;
use crate::use_cases::generation::{GenerationError, GenerationService};

#[derive(Debug, thiserror::Error)]
pub enum RollClassError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Catalog unavailable: {0}")]
    Storage(#[from] RepoError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

pub struct RollClass {
    catalog: Arc<dyn CatalogRepo>,
    generation: Arc<GenerationService>,
    random: Arc<dyn RandomPort>,
    clock: Arc<dyn ClockPort>,
}

impl RollClass {
    pub fn new(
        catalog: Arc<dyn CatalogRepo>,
        generation: Arc<GenerationService>,
        random: Arc<dyn RandomPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            catalog,
            generation,
            random,
            clock,
        }
    }

    pub async fn execute(
        &self,
        augment: bool,
        request_id: &RequestId,
    ) -> Result<GeneratedClass, RollClassError> {
        let weights = load_rarity_weights(self.catalog.as_ref()).await?;
        let rarity = weights.roll(|total| self.random.gen_float(total))?;

        let themes = self.candidate_themes(&rarity).await?;
        let roles = self.candidate_roles(&rarity).await?;

        let class = compose_class(
            &rarity,
            &themes,
            &roles,
            |len| self.random.gen_index(len),
            self.clock.now(),
        )?;

        tracing::info!(
            request_id = %request_id.short(),
            rarity = %class.rarity(),
            name = %class.name(),
            augment,
            "Rolled class"
        );

        if !augment {
            return Ok(class);
        }

        let prompt = augmentation_prompt(&class);
        let payload = self
            .generation
            .generate_class(Some(&prompt), request_id)
            .await?;

        Ok(class.with_augmented_description(payload.description))
    }

    /// Themes tagged with `rarity`; the full collection only when none are.
    async fn candidate_themes(&self, rarity: &RarityTier) -> Result<Vec<ThemeEntry>, RepoError> {
        let matching = self.catalog.themes_with_rarity(rarity).await?;
        if !matching.is_empty() {
            return Ok(matching);
        }
        tracing::debug!(rarity = %rarity, "No themes for rarity, using all themes");
        self.catalog.all_themes().await
    }

    async fn candidate_roles(&self, rarity: &RarityTier) -> Result<Vec<RoleEntry>, RepoError> {
        let matching = self.catalog.roles_with_rarity(rarity).await?;
        if !matching.is_empty() {
            return Ok(matching);
        }
        tracing::debug!(rarity = %rarity, "No roles for rarity, using all roles");
        self.catalog.all_roles().await
    }
}

/// Prompt asking for a description of an already-composed class.
pub fn augmentation_prompt(class: &GeneratedClass) -> String {
    format!(
        "Create unique RPG class with {} rarity. Theme: {}, Role: {}. Avoid weaver/rune/chrono. JSON only:\n\
         {{\"name\":\"Name\",\"rarity\":\"Common|Uncommon|Rare|Epic|Legendary|Mythic|Eternal\",\"description\":\"Brief desc\"}}",
        class.rarity(),
        class.theme().name,
        class.role().name
    )
}
