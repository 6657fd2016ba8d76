//! NPC data: availability, dialogue, shops

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, Position};

pub const MAX_RELATIONSHIP: u8 = 100;

/// Window of the day cycle (0-1) in which an NPC will talk
///
/// Both ends are inclusive. `from > until` wraps through midnight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveHours {
    pub from: f32,
    pub until: f32,
}

impl ActiveHours {
    /// Awake for the middle half of the day, resting in the outer quartiles
    pub fn daytime() -> Self {
        Self {
            from: 0.25,
            until: 0.75,
        }
    }

    pub fn always() -> Self {
        Self {
            from: 0.0,
            until: 1.0,
        }
    }

    pub fn is_active(&self, day_time: f32) -> bool {
        if self.from <= self.until {
            day_time >= self.from && day_time <= self.until
        } else {
            day_time >= self.from || day_time <= self.until
        }
    }
}

/// What a line needs before it is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineGate {
    Always,
    /// Relationship at or above the value
    MinRelationship(u8),
    /// Relationship strictly above the configured romance threshold
    Romance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub text: String,
    pub gate: LineGate,
}

impl DialogueLine {
    pub fn always(text: &str) -> Self {
        Self {
            text: text.to_string(),
            gate: LineGate::Always,
        }
    }

    pub fn at(relationship: u8, text: &str) -> Self {
        Self {
            text: text.to_string(),
            gate: LineGate::MinRelationship(relationship),
        }
    }

    pub fn romance(text: &str) -> Self {
        Self {
            text: text.to_string(),
            gate: LineGate::Romance,
        }
    }

    pub fn visible(&self, relationship: u8, romance_threshold: u8) -> bool {
        match self.gate {
            LineGate::Always => true,
            LineGate::MinRelationship(min) => relationship >= min,
            LineGate::Romance => relationship > romance_threshold,
        }
    }
}

/// Items an NPC sells, priced in `currency`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    pub currency: String,
    /// Item name -> unit price
    pub stock: BTreeMap<String, u32>,
}

impl Shop {
    pub fn new(currency: &str, stock: &[(&str, u32)]) -> Self {
        Self {
            currency: currency.to_string(),
            stock: stock.iter().map(|(item, price)| (item.to_string(), *price)).collect(),
        }
    }

    pub fn price(&self, item: &str) -> Option<u32> {
        self.stock.get(item).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NpcState {
    /// Walking the waypoint loop
    Idle,
    /// Standing still in a dialogue session
    Interacting,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Npc {
    /// Registry id, assigned on spawn
    pub id: EntityId,
    /// Stable name used for persistence and lookups
    pub npc_id: String,
    pub name: String,
    pub position: Position,
    pub dialogue: Vec<DialogueLine>,
    /// 0-100
    pub relationship: u8,
    pub active_hours: ActiveHours,
    pub favorite_gifts: BTreeSet<String>,
    pub accepts_gifts: bool,
    pub shop: Option<Shop>,
    pub waypoints: Vec<Position>,
    pub state: NpcState,
    pub(crate) waypoint_index: usize,
}

impl Npc {
    pub fn new(npc_id: &str, name: &str, position: Position) -> Self {
        Self {
            id: EntityId(0),
            npc_id: npc_id.to_string(),
            name: name.to_string(),
            position,
            dialogue: Vec::new(),
            relationship: 0,
            active_hours: ActiveHours::daytime(),
            favorite_gifts: BTreeSet::new(),
            accepts_gifts: false,
            shop: None,
            waypoints: Vec::new(),
            state: NpcState::Idle,
            waypoint_index: 0,
        }
    }

    pub fn with_dialogue(mut self, lines: Vec<DialogueLine>) -> Self {
        self.dialogue = lines;
        self
    }

    pub fn with_active_hours(mut self, hours: ActiveHours) -> Self {
        self.active_hours = hours;
        self
    }

    /// Accept gifts, with a bigger bonus for the listed favourites
    pub fn with_gifts(mut self, favorites: &[&str]) -> Self {
        self.accepts_gifts = true;
        self.favorite_gifts = favorites.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_shop(mut self, shop: Shop) -> Self {
        self.shop = Some(shop);
        self
    }

    pub fn with_waypoints(mut self, waypoints: Vec<Position>) -> Self {
        self.waypoints = waypoints;
        self
    }

    pub fn with_relationship(mut self, relationship: u8) -> Self {
        self.relationship = relationship.min(MAX_RELATIONSHIP);
        self
    }

    /// Lines unlocked at the current relationship
    pub fn visible_lines(&self, romance_threshold: u8) -> Vec<String> {
        self.dialogue
            .iter()
            .filter(|line| line.visible(self.relationship, romance_threshold))
            .map(|line| line.text.clone())
            .collect()
    }

    /// Add to the relationship, clamped at 100. Returns the new value.
    pub fn raise_relationship(&mut self, amount: u8) -> u8 {
        self.relationship = self.relationship.saturating_add(amount).min(MAX_RELATIONSHIP);
        self.relationship
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daytime_window() {
        let hours = ActiveHours::daytime();
        assert!(!hours.is_active(0.0));
        assert!(!hours.is_active(0.2));
        assert!(hours.is_active(0.25));
        assert!(hours.is_active(0.5));
        assert!(hours.is_active(0.75));
        assert!(!hours.is_active(0.8));
    }

    #[test]
    fn test_wrapping_window() {
        let night_owl = ActiveHours {
            from: 0.8,
            until: 0.1,
        };
        assert!(night_owl.is_active(0.9));
        assert!(night_owl.is_active(0.05));
        assert!(!night_owl.is_active(0.5));
        assert!(ActiveHours::always().is_active(0.0));
    }

    #[test]
    fn test_line_gates() {
        let npc = Npc::new("lina", "Lina", Position::ZERO)
            .with_dialogue(vec![
                DialogueLine::always("Hello."),
                DialogueLine::at(30, "Nice to see you again."),
                DialogueLine::romance("Stay a while?"),
            ])
            .with_relationship(50);

        assert_eq!(npc.visible_lines(50), vec!["Hello.", "Nice to see you again."]);

        let npc = npc.with_relationship(51);
        assert_eq!(npc.visible_lines(50).len(), 3, "Romance only above the threshold");
    }

    #[test]
    fn test_relationship_clamps() {
        let mut npc = Npc::new("a", "A", Position::ZERO).with_relationship(250);
        assert_eq!(npc.relationship, 100);
        npc.relationship = 90;
        assert_eq!(npc.raise_relationship(20), 100);
        npc.relationship = 250;
        assert_eq!(npc.raise_relationship(20), 100);
    }
}
