//! Entity registry - id allocation and liveness for every world entity
//!
//! Subsystems own the behaviour data for their entity kind (nodes, hostiles,
//! NPCs, event actors). The registry owns what they share: the id, the kind,
//! the last known position and whether the entity is alive.

use ahash::AHashMap;

use crate::core::error::invariant_violation;
use crate::core::types::{EntityId, EntityKind, Position};

/// Shared attributes of a live entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityRecord {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Position,
    pub alive: bool,
}

/// Store of live entities
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: AHashMap<EntityId, EntityRecord>,
    next_id: u64,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new entity under a fresh id
    pub fn spawn(&mut self, kind: EntityKind, position: Position) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.insert(
            id,
            EntityRecord {
                id,
                kind,
                position,
                alive: true,
            },
        );
        tracing::trace!("Spawned {:?} {}", kind, id);
        id
    }

    /// Register an entity under a known id (e.g. restored from a snapshot).
    ///
    /// Returns false and leaves the registry untouched if that id is
    /// already alive.
    pub fn adopt(&mut self, id: EntityId, kind: EntityKind, position: Position) -> bool {
        if self.is_alive(id) {
            invariant_violation(&format!("entity id {} adopted while alive", id));
            return false;
        }
        self.next_id = self.next_id.max(id.0 + 1);
        self.entities.insert(
            id,
            EntityRecord {
                id,
                kind,
                position,
                alive: true,
            },
        );
        true
    }

    /// Remove an entity. Returns false if it was not alive.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        match self.entities.remove(&id) {
            Some(record) => {
                tracing::trace!("Despawned {:?} {}", record.kind, id);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: EntityId) -> Option<&EntityRecord> {
        self.entities.get(&id)
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.entities.get(&id).map(|r| r.alive).unwrap_or(false)
    }

    pub fn position(&self, id: EntityId) -> Option<Position> {
        self.entities.get(&id).map(|r| r.position)
    }

    /// Update the last known position. Returns false for unknown ids.
    pub fn set_position(&mut self, id: EntityId, position: Position) -> bool {
        match self.entities.get_mut(&id) {
            Some(record) => {
                record.position = position;
                true
            }
            None => false,
        }
    }

    /// Number of live entities of one kind
    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities.values().filter(|r| r.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Ids of every live entity of one kind, in allocation order
    pub fn ids_of(&self, kind: EntityKind) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .entities
            .values()
            .filter(|r| r.kind == kind)
            .map(|r| r.id)
            .collect();
        ids.sort();
        ids
    }

    /// Drop every entity. Ids keep counting up so none is ever reused.
    pub fn clear(&mut self) {
        self.entities.clear();
    }
}
