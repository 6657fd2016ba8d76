//! Default villagers

use crate::core::types::Position;
use crate::npc::model::{ActiveHours, DialogueLine, Npc, Shop};

/// Village square the default roster lives around
pub const VILLAGE_CENTER: Position = Position::new(0.0, 0.0, -12.0);

fn around_village(x: f32, z: f32) -> Position {
    VILLAGE_CENTER + Position::new(x, 0.0, z)
}

/// Merchant, smith and herbalist, all awake during `hours`
pub fn default_roster(hours: ActiveHours) -> Vec<Npc> {
    vec![
        Npc::new("mara", "Mara the Merchant", around_village(-4.0, 0.0))
            .with_active_hours(hours)
            .with_shop(Shop::new(
                "Coin",
                &[("Healing Potion", 10), ("Wood", 2), ("Stone", 2), ("Herb", 3)],
            ))
            .with_dialogue(vec![
                DialogueLine::always("Fresh goods, fair prices."),
                DialogueLine::at(30, "For you I keep the good potions under the counter."),
            ])
            .with_waypoints(vec![around_village(-4.0, 0.0), around_village(-4.0, 4.0)]),
        Npc::new("bram", "Bram the Smith", around_village(4.0, 0.0))
            .with_active_hours(hours)
            .with_shop(Shop::new("Coin", &[("Iron Ore", 8), ("Pickaxe", 40)]))
            .with_gifts(&["Iron Ore", "Crystal"])
            .with_dialogue(vec![
                DialogueLine::always("Mind the sparks."),
                DialogueLine::at(40, "Bring me crystal and I'll show you how to set it in iron."),
            ]),
        Npc::new("lina", "Lina the Herbalist", around_village(0.0, 6.0))
            .with_active_hours(hours)
            .with_gifts(&["Flower", "Flower Crown", "Herb"])
            .with_dialogue(vec![
                DialogueLine::always("The meadow is blooming today."),
                DialogueLine::at(20, "Herbs gathered at dawn keep their scent longer."),
                DialogueLine::romance("Walk with me to the meadow tonight?"),
            ])
            .with_waypoints(vec![
                around_village(0.0, 6.0),
                around_village(6.0, 10.0),
                around_village(-6.0, 10.0),
            ]),
    ]
}
