//! Harvestable resource nodes
//!
//! A node is full (health 100) until an actor finishes gathering it. It then
//! drops to health 0, becomes non-interactable, and counts depletion time
//! until it respawns at full health.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::clock::duration_reached;
use crate::core::rng::SimRng;
use crate::core::types::{EntityId, ItemCounts, Position};

pub const FULL_HEALTH: f32 = 100.0;

/// Kind of harvestable node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Tree,
    Rock,
    Herb,
    Crystal,
    Flower,
}

/// Inclusive integer yield range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YieldRange {
    pub min: u32,
    pub max: u32,
}

impl YieldRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// Static per-type defaults
#[derive(Debug, Clone)]
pub struct NodeTemplate {
    pub yield_table: BTreeMap<String, YieldRange>,
    pub required_tool: Option<String>,
    pub gather_duration_seconds: f32,
    pub respawn_duration_seconds: f32,
}

impl NodeType {
    pub const ALL: [NodeType; 5] = [
        NodeType::Tree,
        NodeType::Rock,
        NodeType::Herb,
        NodeType::Crystal,
        NodeType::Flower,
    ];

    pub fn template(&self) -> NodeTemplate {
        let (yields, tool, gather, respawn): (&[(&str, u32, u32)], Option<&str>, f32, f32) =
            match self {
                NodeType::Tree => (&[("Wood", 2, 5)][..], None, 3.0, 60.0),
                NodeType::Rock => (&[("Stone", 1, 3), ("Iron Ore", 0, 1)][..], None, 4.0, 90.0),
                NodeType::Herb => (&[("Herb", 1, 2)][..], None, 1.5, 45.0),
                NodeType::Crystal => (&[("Crystal", 1, 2)][..], Some("pickaxe"), 5.0, 180.0),
                NodeType::Flower => (&[("Flower", 1, 3)][..], None, 1.0, 30.0),
            };

        NodeTemplate {
            yield_table: yields
                .iter()
                .map(|(name, min, max)| (name.to_string(), YieldRange::new(*min, *max)))
                .collect(),
            required_tool: tool.map(str::to_string),
            gather_duration_seconds: gather,
            respawn_duration_seconds: respawn,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NodeType::Tree => "tree",
            NodeType::Rock => "rock",
            NodeType::Herb => "herb",
            NodeType::Crystal => "crystal",
            NodeType::Flower => "flower",
        }
    }
}

/// A harvestable world entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceNode {
    pub id: EntityId,
    pub node_type: NodeType,
    pub position: Position,
    /// 0-100; zero means depleted
    pub health: f32,
    /// Capability tag the actor needs, if any
    pub required_tool: Option<String>,
    pub yield_table: BTreeMap<String, YieldRange>,
    pub gather_duration_seconds: f32,
    pub respawn_duration_seconds: f32,
    /// Simulated time at which the node was depleted
    pub depleted_at: Option<f64>,
    respawn_elapsed: f32,
    gather_elapsed: f32,
    gathering: bool,
}

impl ResourceNode {
    /// Create a full node using the type's template
    pub fn new(id: EntityId, node_type: NodeType, position: Position) -> Self {
        let template = node_type.template();
        Self {
            id,
            node_type,
            position,
            health: FULL_HEALTH,
            required_tool: template.required_tool,
            yield_table: template.yield_table,
            gather_duration_seconds: template.gather_duration_seconds,
            respawn_duration_seconds: template.respawn_duration_seconds,
            depleted_at: None,
            respawn_elapsed: 0.0,
            gather_elapsed: 0.0,
            gathering: false,
        }
    }

    pub fn with_yield_table(mut self, yields: &[(&str, u32, u32)]) -> Self {
        self.yield_table = yields
            .iter()
            .map(|(name, min, max)| (name.to_string(), YieldRange::new(*min, *max)))
            .collect();
        self
    }

    pub fn with_required_tool(mut self, tool: Option<&str>) -> Self {
        self.required_tool = tool.map(str::to_string);
        self
    }

    pub fn with_gather_duration(mut self, seconds: f32) -> Self {
        self.gather_duration_seconds = seconds;
        self
    }

    pub fn with_respawn_duration(mut self, seconds: f32) -> Self {
        self.respawn_duration_seconds = seconds;
        self
    }

    pub fn is_depleted(&self) -> bool {
        self.health <= 0.0
    }

    pub fn is_gathering(&self) -> bool {
        self.gathering
    }

    /// Gather progress as a percentage (0-100)
    pub fn gather_progress(&self) -> f32 {
        if self.gather_duration_seconds <= 0.0 {
            return if self.gathering { FULL_HEALTH } else { 0.0 };
        }
        (self.gather_elapsed / self.gather_duration_seconds * 100.0).min(100.0)
    }

    /// Seconds of depletion counted so far
    pub fn respawn_elapsed(&self) -> f32 {
        self.respawn_elapsed
    }

    /// True when the actor may gather this node with the given tools
    pub fn tool_allows(&self, tools: &ahash::AHashSet<String>) -> bool {
        match &self.required_tool {
            Some(tool) => tools.contains(tool),
            None => true,
        }
    }

    /// Continue gathering for `delta` seconds. Returns true on completion.
    pub(crate) fn advance_gathering(&mut self, delta: f32) -> bool {
        self.gathering = true;
        self.gather_elapsed += delta;
        duration_reached(self.gather_elapsed, self.gather_duration_seconds)
    }

    /// Walked away or lost the tool: progress is lost entirely
    pub(crate) fn cancel_gathering(&mut self) {
        self.gathering = false;
        self.gather_elapsed = 0.0;
    }

    /// Count depletion time. Returns true when the node respawned.
    pub(crate) fn advance_respawn(&mut self, delta: f32) -> bool {
        self.respawn_elapsed += delta;
        if duration_reached(self.respawn_elapsed, self.respawn_duration_seconds) {
            self.respawn();
            true
        } else {
            false
        }
    }

    /// Draw one integer per yield entry, keeping only non-zero results
    pub(crate) fn roll_yields(&self, rng: &mut SimRng) -> ItemCounts {
        let mut items = ItemCounts::new();
        for (name, range) in &self.yield_table {
            let amount = rng.range_inclusive(range.min, range.max);
            if amount > 0 {
                items.insert(name.clone(), amount);
            }
        }
        items
    }

    pub(crate) fn deplete(&mut self, now: f64) {
        self.health = 0.0;
        self.depleted_at = Some(now);
        self.respawn_elapsed = 0.0;
        self.cancel_gathering();
    }

    pub(crate) fn respawn(&mut self) {
        self.health = FULL_HEALTH;
        self.depleted_at = None;
        self.respawn_elapsed = 0.0;
        self.cancel_gathering();
    }
}
