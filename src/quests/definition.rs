//! Static quest table

use serde::{Deserialize, Serialize};

use crate::core::types::{item_counts, ItemCounts};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveDefinition {
    pub text: String,
    /// Counter objectives complete when the count reaches this
    pub target: Option<u32>,
}

impl ObjectiveDefinition {
    pub fn flag(text: &str) -> Self {
        Self {
            text: text.to_string(),
            target: None,
        }
    }

    pub fn counter(text: &str, target: u32) -> Self {
        Self {
            text: text.to_string(),
            target: Some(target.max(1)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestDefinition {
    pub id: String,
    pub title: String,
    pub objectives: Vec<ObjectiveDefinition>,
    pub reward: ItemCounts,
    /// Quest whose lock lifts when this one completes
    pub unlocks: Option<String>,
    /// Recipe added to the unlocked set on completion
    pub unlocks_recipe: Option<String>,
}

impl QuestDefinition {
    pub fn new(id: &str, title: &str, objectives: Vec<ObjectiveDefinition>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            objectives,
            reward: ItemCounts::new(),
            unlocks: None,
            unlocks_recipe: None,
        }
    }

    pub fn with_reward(mut self, reward: &[(&str, u32)]) -> Self {
        self.reward = item_counts(reward.iter().copied());
        self
    }

    pub fn unlocking(mut self, quest_id: &str) -> Self {
        self.unlocks = Some(quest_id.to_string());
        self
    }

    pub fn unlocking_recipe(mut self, recipe_id: &str) -> Self {
        self.unlocks_recipe = Some(recipe_id.to_string());
        self
    }
}

/// Starter chain: gather, craft, fight, befriend
pub fn default_quests() -> Vec<QuestDefinition> {
    vec![
        QuestDefinition::new(
            "first_harvest",
            "First Harvest",
            vec![ObjectiveDefinition::counter("Collect 5 Wood", 5)],
        )
        .with_reward(&[("Coin", 10)])
        .unlocking("toolmaker"),
        QuestDefinition::new(
            "toolmaker",
            "Toolmaker",
            vec![ObjectiveDefinition::flag("Craft a pickaxe")],
        )
        .with_reward(&[("Coin", 15)])
        .unlocking("monster_hunter"),
        QuestDefinition::new(
            "monster_hunter",
            "Monster Hunter",
            vec![ObjectiveDefinition::counter("Defeat 3 hostiles", 3)],
        )
        .with_reward(&[("Coin", 25), ("Healing Potion", 1)])
        .unlocking("herbalist_favour")
        .unlocking_recipe("crystal_lamp"),
        QuestDefinition::new(
            "herbalist_favour",
            "The Herbalist's Favour",
            vec![
                ObjectiveDefinition::flag("Give Lina a gift"),
                ObjectiveDefinition::counter("Reach relationship 30 with Lina", 30),
            ],
        )
        .with_reward(&[("Flower Crown", 1)]),
    ]
}
