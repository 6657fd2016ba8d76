//! Inventory boundary
//!
//! The simulation never owns inventory storage. It reads and writes through
//! the `Inventory` trait, which the host's inventory manager implements.
//! `ItemStore` is the in-memory implementation used by the headless runner
//! and the tests.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::ItemCounts;

/// Narrow contract the simulation uses to touch the player's items
pub trait Inventory {
    /// Current count of one item (0 when absent)
    fn has_quantity(&self, item: &str) -> u32;

    /// Add every entry of `items`
    fn add_items(&mut self, items: &ItemCounts);

    /// Remove every entry of `items`, saturating at zero
    fn remove_items(&mut self, items: &ItemCounts);

    /// True when every entry of `items` is covered
    fn has_all(&self, items: &ItemCounts) -> bool {
        items.iter().all(|(item, count)| self.has_quantity(item) >= *count)
    }
}

/// Simple item bag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStore {
    items: AHashMap<String, u32>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the given items
    pub fn with_items(items: &ItemCounts) -> Self {
        let mut store = Self::new();
        store.add_items(items);
        store
    }

    /// Add a single item, returns the new count
    pub fn add(&mut self, item: &str, amount: u32) -> u32 {
        let entry = self.items.entry(item.to_string()).or_insert(0);
        *entry = entry.saturating_add(amount);
        *entry
    }

    /// Remove a single item, returns amount actually removed
    pub fn remove(&mut self, item: &str, amount: u32) -> u32 {
        if let Some(entry) = self.items.get_mut(item) {
            let removed = amount.min(*entry);
            *entry -= removed;
            if *entry == 0 {
                self.items.remove(item);
            }
            removed
        } else {
            0
        }
    }

    /// Ordered copy of the contents, suitable for persistence
    pub fn snapshot(&self) -> ItemCounts {
        self.items
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(item, count)| (item.clone(), *count))
            .collect()
    }

    /// Replace the contents with a snapshot
    pub fn restore(&mut self, snapshot: &ItemCounts) {
        self.items.clear();
        self.add_items(snapshot);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Inventory for ItemStore {
    fn has_quantity(&self, item: &str) -> u32 {
        self.items.get(item).copied().unwrap_or(0)
    }

    fn add_items(&mut self, items: &ItemCounts) {
        for (item, count) in items {
            if *count > 0 {
                self.add(item, *count);
            }
        }
    }

    fn remove_items(&mut self, items: &ItemCounts) {
        for (item, count) in items {
            self.remove(item, *count);
        }
    }
}
