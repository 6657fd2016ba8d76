//! Quests - objective aggregation and the unlock chain

pub mod definition;
pub mod tracker;

pub use definition::{default_quests, ObjectiveDefinition, QuestDefinition};
pub use tracker::{ObjectiveStatus, Progress, QuestStatus, QuestTracker};
