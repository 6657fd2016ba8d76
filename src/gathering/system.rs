//! Gathering system - proximity-based auto-gathering and timed respawn
//!
//! Each tick, for every node:
//! 1. Depleted nodes count respawn time and come back at full health.
//! 2. Otherwise, an actor inside the proximity radius who holds the required
//!    tool keeps gathering; anyone else resets the node's progress to zero.
//! 3. A node whose gather time is covered rolls its yield table, pays out,
//!    and becomes depleted.

use ahash::AHashSet;

use crate::core::clock::FrameTime;
use crate::core::rng::SimRng;
use crate::core::types::{ground_distance, merge_counts, EntityId, EntityKind, ItemCounts, Position};
use crate::ecs::EntityRegistry;
use crate::gathering::node::{NodeType, ResourceNode};
use crate::simulation::events::{RewardEvent, RewardSource};

/// Capability tags the actor currently holds (e.g. "pickaxe")
pub type ToolTags = AHashSet<String>;

/// Owner of every resource node in the world
#[derive(Debug, Clone)]
pub struct GatheringSystem {
    nodes: Vec<ResourceNode>,
    proximity_radius: f32,
}

impl GatheringSystem {
    pub fn new(proximity_radius: f32) -> Self {
        Self {
            nodes: Vec::new(),
            proximity_radius,
        }
    }

    /// Spawn a node from its type template
    pub fn spawn_node(
        &mut self,
        registry: &mut EntityRegistry,
        node_type: NodeType,
        position: Position,
    ) -> EntityId {
        let id = registry.spawn(EntityKind::ResourceNode, position);
        self.nodes.push(ResourceNode::new(id, node_type, position));
        id
    }

    /// Spawn a node customised by `build`
    pub fn spawn_custom(
        &mut self,
        registry: &mut EntityRegistry,
        node_type: NodeType,
        position: Position,
        build: impl FnOnce(ResourceNode) -> ResourceNode,
    ) -> EntityId {
        let id = registry.spawn(EntityKind::ResourceNode, position);
        self.nodes.push(build(ResourceNode::new(id, node_type, position)));
        id
    }

    pub fn nodes(&self) -> &[ResourceNode] {
        &self.nodes
    }

    pub fn node(&self, id: EntityId) -> Option<&ResourceNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Number of nodes that can currently be gathered
    pub fn available_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.is_depleted()).count()
    }

    /// Closest non-depleted node the actor is allowed to gather
    pub fn nearest_gatherable(&self, position: Position, tools: &ToolTags) -> Option<&ResourceNode> {
        self.nodes
            .iter()
            .filter(|n| !n.is_depleted() && n.tool_allows(tools))
            .min_by(|a, b| {
                ground_distance(a.position, position).total_cmp(&ground_distance(b.position, position))
            })
    }

    /// Advance every node by one frame.
    ///
    /// Yields from every node that finished this frame are merged into a
    /// single reward. A finish whose draws were all zero still depletes the
    /// node but produces no reward.
    pub fn tick(
        &mut self,
        frame: FrameTime,
        actor_position: Position,
        tools: &ToolTags,
        rng: &mut SimRng,
    ) -> Option<RewardEvent> {
        let mut items = ItemCounts::new();
        let mut finished = Vec::new();

        for node in &mut self.nodes {
            if node.is_depleted() {
                if node.advance_respawn(frame.delta) {
                    tracing::debug!("{} {} respawned", node.node_type.label(), node.id);
                }
                continue;
            }

            let in_range = ground_distance(node.position, actor_position) < self.proximity_radius;
            if !(in_range && node.tool_allows(tools)) {
                node.cancel_gathering();
                continue;
            }

            if node.advance_gathering(frame.delta) {
                let yields = node.roll_yields(rng);
                node.deplete(frame.now);
                tracing::debug!(
                    "Gathered {} {}: {:?}",
                    node.node_type.label(),
                    node.id,
                    yields
                );
                if !yields.is_empty() {
                    merge_counts(&mut items, &yields);
                    finished.push(node.id);
                }
            }
        }

        if items.is_empty() {
            None
        } else {
            Some(RewardEvent {
                source: RewardSource::Gathering { nodes: finished },
                items,
            })
        }
    }

    /// Bring every depleted node back immediately. Returns how many respawned.
    pub fn respawn_all(&mut self) -> usize {
        let mut count = 0;
        for node in self.nodes.iter_mut().filter(|n| n.is_depleted()) {
            node.respawn();
            count += 1;
        }
        count
    }

    /// Remove every node from this system and the registry
    pub fn clear(&mut self, registry: &mut EntityRegistry) {
        for node in self.nodes.drain(..) {
            registry.despawn(node.id);
        }
    }
}
