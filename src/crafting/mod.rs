//! Crafting - recipes, timed jobs and quality rolls

pub mod quality;
pub mod recipe;
pub mod system;

pub use quality::QualityTier;
pub use recipe::{CraftRecipe, ItemTemplate, RecipeCatalog};
pub use system::{CraftJob, CraftOutcome, CraftingSystem};
