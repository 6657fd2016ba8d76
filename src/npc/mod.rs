//! NPCs - relationship-gated dialogue, gifts, shops and patrols

pub mod model;
pub mod roster;
pub mod system;

pub use model::{ActiveHours, DialogueLine, LineGate, Npc, NpcState, Shop, MAX_RELATIONSHIP};
pub use roster::{default_roster, VILLAGE_CENTER};
pub use system::{DialogueSession, NpcSystem};
