//! Quality tiers for crafted items

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::config::CraftingConfig;
use crate::core::rng::SimRng;

/// Rarity label attached to a crafted item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl QualityTier {
    /// Map a uniform [0, 1) roll to a tier using the configured thresholds
    pub fn from_roll(roll: f32, config: &CraftingConfig) -> Self {
        if roll > config.legendary_threshold {
            QualityTier::Legendary
        } else if roll > config.epic_threshold {
            QualityTier::Epic
        } else if roll > config.rare_threshold {
            QualityTier::Rare
        } else {
            QualityTier::Common
        }
    }

    pub fn roll(rng: &mut SimRng, config: &CraftingConfig) -> Self {
        Self::from_roll(rng.unit(), config)
    }

    /// Case-insensitive name lookup
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "common" => Some(QualityTier::Common),
            "rare" => Some(QualityTier::Rare),
            "epic" => Some(QualityTier::Epic),
            "legendary" => Some(QualityTier::Legendary),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QualityTier::Common => "common",
            QualityTier::Rare => "rare",
            QualityTier::Epic => "epic",
            QualityTier::Legendary => "legendary",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
