//! Combat - hostile creatures, player damage exchange and death payout

pub mod hostile;
pub mod player;
pub mod system;

pub use hostile::{Hostile, HostileArchetype, HostileState, HostileStats};
pub use player::PlayerState;
pub use system::{CombatSystem, CombatTick, DamageOutcome};
