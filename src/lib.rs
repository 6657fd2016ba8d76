//! Live World - client-side simulation for a small open-world game
//!
//! Resource gathering, hostile combat, crafting, NPC relationships, world
//! events and quest progress, all stepped by a single per-frame `tick` on
//! [`simulation::SimulationWorld`]. Rendering, input and the inventory UI
//! live with the host; this crate only reports what happened.

pub mod combat;
pub mod core;
pub mod crafting;
pub mod ecs;
pub mod gathering;
pub mod inventory;
pub mod npc;
pub mod persistence;
pub mod quests;
pub mod simulation;
pub mod world_events;
