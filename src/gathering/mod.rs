//! Resource gathering - harvestable nodes, tool gating and timed respawn

pub mod node;
pub mod system;

pub use node::{NodeTemplate, NodeType, ResourceNode, YieldRange, FULL_HEALTH};
pub use system::{GatheringSystem, ToolTags};
