//! Craft recipes - what materials make which item
//!
//! Recipes are static: the catalog is built once (defaults or TOML) and never
//! mutated while the world runs. Which recipes are usable is tracked
//! separately by the crafting system's unlocked set.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, WorldError};
use crate::core::types::{item_counts, ItemCounts};
use crate::crafting::quality::QualityTier;

/// The item a recipe produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemTemplate {
    /// Inventory item name
    pub name: String,
    /// Gathering capability granted while the item is held
    pub tool_tag: Option<String>,
}

/// A crafting recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CraftRecipe {
    pub id: String,
    pub name: String,
    /// Material name -> required count
    pub materials: ItemCounts,
    pub result: ItemTemplate,
    pub base_duration_seconds: f32,
    /// Overrides the quality roll when set
    pub quality_tier: Option<QualityTier>,
    /// Starts outside the unlocked set
    pub locked: bool,
}

impl CraftRecipe {
    pub fn new(id: &str, result: &str, materials: &[(&str, u32)], duration_seconds: f32) -> Self {
        Self {
            id: id.to_string(),
            name: result.to_string(),
            materials: item_counts(materials.iter().copied()),
            result: ItemTemplate {
                name: result.to_string(),
                tool_tag: None,
            },
            base_duration_seconds: duration_seconds,
            quality_tier: None,
            locked: false,
        }
    }

    pub fn with_tool_tag(mut self, tag: &str) -> Self {
        self.result.tool_tag = Some(tag.to_string());
        self
    }

    pub fn with_quality(mut self, tier: QualityTier) -> Self {
        self.quality_tier = Some(tier);
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }
}

/// Catalog of all known recipes
#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    recipes: Vec<CraftRecipe>,
}

impl RecipeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in recipe set
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();

        catalog.add(
            CraftRecipe::new("pickaxe", "Pickaxe", &[("Wood", 3), ("Stone", 2)], 5.0)
                .with_tool_tag("pickaxe"),
        );
        catalog.add(
            CraftRecipe::new("iron_sword", "Iron Sword", &[("Iron Ore", 3), ("Wood", 1)], 8.0)
                .with_tool_tag("sword"),
        );
        catalog.add(CraftRecipe::new(
            "healing_potion",
            "Healing Potion",
            &[("Herb", 2)],
            3.0,
        ));
        // Hand-made crowns always come out rare
        catalog.add(
            CraftRecipe::new("flower_crown", "Flower Crown", &[("Flower", 5)], 4.0)
                .with_quality(QualityTier::Rare),
        );
        catalog.add(
            CraftRecipe::new(
                "crystal_lamp",
                "Crystal Lamp",
                &[("Crystal", 2), ("Iron Ore", 1)],
                10.0,
            )
            .locked(),
        );

        catalog
    }

    /// Add a recipe, replacing any recipe with the same id
    pub fn add(&mut self, recipe: CraftRecipe) {
        match self.recipes.iter_mut().find(|r| r.id == recipe.id) {
            Some(existing) => *existing = recipe,
            None => self.recipes.push(recipe),
        }
    }

    pub fn get(&self, id: &str) -> Option<&CraftRecipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    pub fn all(&self) -> &[CraftRecipe] {
        &self.recipes
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Load recipes from a TOML file
    pub fn load_from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse recipes from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self> {
        let toml_data: TomlRecipes = toml::from_str(content)?;

        let mut catalog = Self::new();
        for recipe in toml_data.recipes {
            catalog.add(recipe.into_recipe()?);
        }
        Ok(catalog)
    }
}

/// TOML representation of a recipes file
#[derive(Debug, Deserialize)]
struct TomlRecipes {
    recipes: Vec<TomlRecipe>,
}

/// TOML representation of a single recipe
#[derive(Debug, Deserialize)]
struct TomlRecipe {
    id: String,
    name: Option<String>,
    duration_seconds: f32,
    #[serde(default)]
    locked: bool,
    quality: Option<String>,
    materials: BTreeMap<String, u32>,
    result: TomlResult,
}

#[derive(Debug, Deserialize)]
struct TomlResult {
    item: String,
    tool_tag: Option<String>,
}

impl TomlRecipe {
    fn into_recipe(self) -> Result<CraftRecipe> {
        let quality_tier = match self.quality {
            Some(name) => Some(QualityTier::parse(&name).ok_or_else(|| {
                WorldError::InvalidConfig(format!("recipe {}: unknown quality '{}'", self.id, name))
            })?),
            None => None,
        };

        if !(self.duration_seconds >= 0.0) {
            return Err(WorldError::InvalidConfig(format!(
                "recipe {}: duration_seconds must not be negative",
                self.id
            )));
        }

        let materials: ItemCounts = self.materials.into_iter().filter(|(_, n)| *n > 0).collect();
        if materials.is_empty() {
            return Err(WorldError::InvalidConfig(format!(
                "recipe {} needs at least one material",
                self.id
            )));
        }

        Ok(CraftRecipe {
            name: self.name.unwrap_or_else(|| self.result.item.clone()),
            id: self.id,
            materials,
            result: ItemTemplate {
                name: self.result.item,
                tool_tag: self.result.tool_tag,
            },
            base_duration_seconds: self.duration_seconds,
            quality_tier,
            locked: self.locked,
        })
    }
}
