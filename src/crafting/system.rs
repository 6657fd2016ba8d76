//! Crafting system - one timed job at a time
//!
//! Materials are checked when a job starts but only deducted when it
//! finishes, so cancelling never needs a refund. Because they are not
//! reserved, completion checks them again and aborts if they were spent
//! elsewhere in the meantime.

use ahash::AHashSet;

use crate::core::clock::{duration_reached, FrameTime};
use crate::core::config::CraftingConfig;
use crate::core::error::CraftRejection;
use crate::core::rng::SimRng;
use crate::core::types::item_counts;
use crate::crafting::quality::QualityTier;
use crate::crafting::recipe::{CraftRecipe, RecipeCatalog};
use crate::gathering::ToolTags;
use crate::inventory::Inventory;
use crate::simulation::events::ItemProduced;

/// An in-progress craft
#[derive(Debug, Clone, PartialEq)]
pub struct CraftJob {
    pub recipe_id: String,
    /// Simulated time the job started
    pub started_at: f64,
    /// 0-100
    pub progress: f32,
    /// Resolved only when progress reaches 100
    pub outcome_quality: Option<QualityTier>,
    elapsed: f32,
    duration: f32,
}

impl CraftJob {
    fn new(recipe: &CraftRecipe, started_at: f64) -> Self {
        Self {
            recipe_id: recipe.id.clone(),
            started_at,
            progress: 0.0,
            outcome_quality: None,
            elapsed: 0.0,
            duration: recipe.base_duration_seconds,
        }
    }

    /// Seconds left until completion
    pub fn remaining_seconds(&self) -> f32 {
        (self.duration - self.elapsed).max(0.0)
    }
}

/// What a crafting frame produced
#[derive(Debug, Clone, PartialEq)]
pub enum CraftOutcome {
    Produced(ItemProduced),
    /// Materials were gone at completion; nothing was deducted
    Aborted { recipe_id: String },
}

#[derive(Debug, Clone)]
pub struct CraftingSystem {
    catalog: RecipeCatalog,
    unlocked: AHashSet<String>,
    active: Option<CraftJob>,
    config: CraftingConfig,
}

impl CraftingSystem {
    pub fn new(catalog: RecipeCatalog, config: CraftingConfig) -> Self {
        let unlocked = Self::default_unlocked(&catalog);
        Self {
            catalog,
            unlocked,
            active: None,
            config,
        }
    }

    fn default_unlocked(catalog: &RecipeCatalog) -> AHashSet<String> {
        catalog
            .all()
            .iter()
            .filter(|r| !r.locked)
            .map(|r| r.id.clone())
            .collect()
    }

    pub fn catalog(&self) -> &RecipeCatalog {
        &self.catalog
    }

    pub fn active_job(&self) -> Option<&CraftJob> {
        self.active.as_ref()
    }

    pub fn is_unlocked(&self, recipe_id: &str) -> bool {
        self.unlocked.contains(recipe_id)
    }

    /// Add a recipe to the unlocked set. Returns false for unknown recipes
    /// or ones that were already unlocked.
    pub fn unlock(&mut self, recipe_id: &str) -> bool {
        if self.catalog.get(recipe_id).is_none() {
            return false;
        }
        let newly = self.unlocked.insert(recipe_id.to_string());
        if newly {
            tracing::info!("Recipe unlocked: {}", recipe_id);
        }
        newly
    }

    /// Unlocked and every material covered
    pub fn can_craft(&self, recipe_id: &str, inventory: &dyn Inventory) -> bool {
        self.validate(recipe_id, inventory).is_ok()
    }

    /// Why `recipe_id` can't be crafted right now, ignoring any active job
    pub fn validate(
        &self,
        recipe_id: &str,
        inventory: &dyn Inventory,
    ) -> Result<&CraftRecipe, CraftRejection> {
        let recipe = self
            .catalog
            .get(recipe_id)
            .ok_or_else(|| CraftRejection::UnknownRecipe(recipe_id.to_string()))?;

        if !self.is_unlocked(recipe_id) {
            return Err(CraftRejection::RecipeLocked(recipe_id.to_string()));
        }

        for (material, required) in &recipe.materials {
            let available = inventory.has_quantity(material);
            if available < *required {
                return Err(CraftRejection::InsufficientMaterials {
                    material: material.clone(),
                    required: *required,
                    available,
                });
            }
        }

        Ok(recipe)
    }

    /// Begin crafting. A second job while one is active is rejected.
    pub fn start_craft(
        &mut self,
        recipe_id: &str,
        inventory: &dyn Inventory,
        now: f64,
    ) -> Result<CraftJob, CraftRejection> {
        if self.active.is_some() {
            return Err(CraftRejection::JobAlreadyActive);
        }
        let recipe = self.validate(recipe_id, inventory)?;
        let job = CraftJob::new(recipe, now);
        tracing::debug!("Craft started: {} ({}s)", recipe.id, recipe.base_duration_seconds);
        self.active = Some(job.clone());
        Ok(job)
    }

    /// Drop the active job. Nothing was deducted, so nothing is refunded.
    pub fn cancel(&mut self) -> Option<CraftJob> {
        let job = self.active.take();
        if let Some(job) = &job {
            tracing::debug!("Craft cancelled: {}", job.recipe_id);
        }
        job
    }

    /// Advance the active job by one frame
    pub fn tick(
        &mut self,
        frame: FrameTime,
        inventory: &mut dyn Inventory,
        rng: &mut SimRng,
    ) -> Option<CraftOutcome> {
        let job = self.active.as_mut()?;
        job.elapsed += frame.delta;
        job.progress = if job.duration > 0.0 {
            (job.elapsed / job.duration * 100.0).min(100.0)
        } else {
            100.0
        };
        if !duration_reached(job.elapsed, job.duration) {
            return None;
        }

        let mut job = self.active.take()?;
        job.progress = 100.0;
        let Some(recipe) = self.catalog.get(&job.recipe_id) else {
            return Some(CraftOutcome::Aborted {
                recipe_id: job.recipe_id,
            });
        };

        if !inventory.has_all(&recipe.materials) {
            tracing::debug!("Craft aborted, materials missing: {}", recipe.id);
            return Some(CraftOutcome::Aborted {
                recipe_id: job.recipe_id,
            });
        }

        let quality = match recipe.quality_tier {
            Some(fixed) => fixed,
            None => QualityTier::roll(rng, &self.config),
        };
        job.outcome_quality = Some(quality);

        inventory.remove_items(&recipe.materials);
        inventory.add_items(&item_counts([(recipe.result.name.as_str(), 1)]));
        tracing::debug!("Crafted {} ({})", recipe.result.name, quality);

        Some(CraftOutcome::Produced(ItemProduced {
            recipe_id: job.recipe_id,
            item: recipe.result.name.clone(),
            quality,
        }))
    }

    /// Tool tags granted by crafted items currently held
    pub fn tool_tags(&self, inventory: &dyn Inventory) -> ToolTags {
        self.catalog
            .all()
            .iter()
            .filter_map(|r| {
                let tag = r.result.tool_tag.as_ref()?;
                (inventory.has_quantity(&r.result.name) > 0).then(|| tag.clone())
            })
            .collect()
    }

    /// Drop the active job and restore the initial unlocked set
    pub fn reset(&mut self) {
        self.active = None;
        self.unlocked = Self::default_unlocked(&self.catalog);
    }
}
