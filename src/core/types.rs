//! Core type definitions used throughout the codebase

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// World-space position. The ground plane is XZ, Y is up.
pub type Position = glam::Vec3;

/// Item name -> count. Ordered so emitted rewards and persisted
/// snapshots are stable across runs.
pub type ItemCounts = BTreeMap<String, u32>;

/// Unique identifier for live entities
///
/// Allocated monotonically by the registry and never handed out twice,
/// so an id can't be shared between two simultaneously-alive entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kinds of entity the simulation tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    ResourceNode,
    Hostile,
    Npc,
    EventActor,
}

/// Distance between two positions projected onto the ground plane
pub fn ground_distance(a: Position, b: Position) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}

/// Unit direction from `from` towards `to` on the ground plane
///
/// Returns zero when the points coincide.
pub fn ground_direction(from: Position, to: Position) -> Position {
    let delta = Position::new(to.x - from.x, 0.0, to.z - from.z);
    delta.normalize_or_zero()
}

/// Yaw angle (radians) that faces along `direction`
pub fn yaw_towards(direction: Position) -> f32 {
    direction.x.atan2(direction.z)
}

/// Point on the ground at `angle` radians and `distance` units from `center`
pub fn ring_point(center: Position, angle: f32, distance: f32) -> Position {
    Position::new(
        center.x + angle.cos() * distance,
        center.y,
        center.z + angle.sin() * distance,
    )
}

/// Build an `ItemCounts` from `(name, count)` pairs, skipping zero counts
pub fn item_counts<'a>(pairs: impl IntoIterator<Item = (&'a str, u32)>) -> ItemCounts {
    let mut counts = ItemCounts::new();
    for (name, count) in pairs {
        if count > 0 {
            *counts.entry(name.to_string()).or_insert(0) += count;
        }
    }
    counts
}

/// Merge `extra` into `into`, summing counts of shared items
pub fn merge_counts(into: &mut ItemCounts, extra: &ItemCounts) {
    for (name, count) in extra {
        *into.entry(name.clone()).or_insert(0) += *count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_ordering() {
        assert!(EntityId(1) < EntityId(2));
        assert_eq!(EntityId(7).to_string(), "#7");
    }

    #[test]
    fn test_ground_distance_ignores_height() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(3.0, 50.0, 4.0);
        assert!((ground_distance(a, b) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_ground_direction_zero_when_coincident() {
        let p = Position::new(1.0, 2.0, 3.0);
        assert_eq!(ground_direction(p, p), Position::ZERO);

        let dir = ground_direction(Position::ZERO, Position::new(10.0, 5.0, 0.0));
        assert!((dir.x - 1.0).abs() < 1e-5);
        assert_eq!(dir.y, 0.0);
    }

    #[test]
    fn test_ring_point_distance() {
        let center = Position::new(5.0, 0.0, -5.0);
        let p = ring_point(center, 1.3, 20.0);
        assert!((ground_distance(center, p) - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_item_counts_skips_zero_and_merges() {
        let counts = item_counts([("Wood", 2), ("Stone", 0), ("Wood", 1)]);
        assert_eq!(counts.get("Wood"), Some(&3));
        assert!(!counts.contains_key("Stone"));

        let mut total = counts.clone();
        merge_counts(&mut total, &item_counts([("Stone", 4)]));
        assert_eq!(total.get("Stone"), Some(&4));
        assert_eq!(total.get("Wood"), Some(&3));
    }
}
