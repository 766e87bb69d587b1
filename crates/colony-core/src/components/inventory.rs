//! Inventories
//!
//! Resource stores with per-resource capacity, plus stowed EVA suits.
//! Adds clamp to remaining capacity and removes clamp to stock; both report
//! the amount actually moved so callers can accept shortfalls.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::components::EvaSuit;
use crate::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Oxygen,
    Water,
    Food,
    Methane,
    Ice,
    Regolith,
}

impl Resource {
    pub const ALL: [Resource; 6] = [
        Resource::Oxygen,
        Resource::Water,
        Resource::Food,
        Resource::Methane,
        Resource::Ice,
        Resource::Regolith,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Resource::Oxygen => "oxygen",
            Resource::Water => "water",
            Resource::Food => "food",
            Resource::Methane => "methane",
            Resource::Ice => "ice",
            Resource::Regolith => "regolith",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Inventory {
    stored: BTreeMap<Resource, f64>,
    capacity: BTreeMap<Resource, f64>,
    suits: Vec<EvaSuit>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Inventory::set_capacity`].
    pub fn with_capacity(mut self, resource: Resource, capacity: f64) -> Self {
        self.set_capacity(resource, capacity);
        self
    }

    /// Builder that stores `amount`, clamped to the declared capacity.
    pub fn with_stock(mut self, resource: Resource, amount: f64) -> Self {
        self.add(resource, amount);
        self
    }

    pub fn set_capacity(&mut self, resource: Resource, capacity: f64) {
        self.capacity.insert(resource, capacity.max(0.0));
        let stored = self.stored_amount(resource);
        if stored > capacity {
            self.stored.insert(resource, capacity.max(0.0));
        }
    }

    pub fn capacity(&self, resource: Resource) -> f64 {
        self.capacity.get(&resource).copied().unwrap_or(0.0)
    }

    pub fn stored_amount(&self, resource: Resource) -> f64 {
        self.stored.get(&resource).copied().unwrap_or(0.0)
    }

    pub fn remaining_capacity(&self, resource: Resource) -> f64 {
        (self.capacity(resource) - self.stored_amount(resource)).max(0.0)
    }

    /// Stores up to `amount`, returning what fit.
    pub fn add(&mut self, resource: Resource, amount: f64) -> f64 {
        if !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        let added = amount.min(self.remaining_capacity(resource));
        if added > 0.0 {
            *self.stored.entry(resource).or_insert(0.0) += added;
        }
        added
    }

    /// Takes up to `amount`, returning what was available.
    pub fn remove(&mut self, resource: Resource, amount: f64) -> f64 {
        if !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        let stored = self.stored_amount(resource);
        let removed = amount.min(stored);
        if removed > 0.0 {
            let left = stored - removed;
            self.stored
                .insert(resource, if left < EPSILON { 0.0 } else { left });
        }
        removed
    }

    pub fn total_mass(&self) -> f64 {
        self.stored.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stored.values().all(|amount| *amount < EPSILON)
    }

    /// Resources currently held in any amount.
    pub fn stored_resources(&self) -> Vec<Resource> {
        self.stored
            .iter()
            .filter(|(_, amount)| **amount > EPSILON)
            .map(|(resource, _)| *resource)
            .collect()
    }

    pub fn store_suit(&mut self, suit: EvaSuit) {
        self.suits.push(suit);
    }

    pub fn suits(&self) -> &[EvaSuit] {
        &self.suits
    }

    pub fn has_good_suit(&self) -> bool {
        self.suits.iter().any(EvaSuit::is_good)
    }

    /// Removes and returns the first suit that is fit for EVA.
    pub fn take_good_suit(&mut self) -> Option<EvaSuit> {
        let index = self.suits.iter().position(EvaSuit::is_good)?;
        Some(self.suits.remove(index))
    }

    pub fn suits_mut(&mut self) -> &mut [EvaSuit] {
        &mut self.suits
    }
}

/// Moves up to `amount` of `resource` from one inventory to another,
/// bounded by the source stock and the destination's free capacity.
pub fn transfer(from: &mut Inventory, to: &mut Inventory, resource: Resource, amount: f64) -> f64 {
    let movable = amount
        .min(from.stored_amount(resource))
        .min(to.remaining_capacity(resource));
    if movable <= 0.0 || !movable.is_finite() {
        return 0.0;
    }
    let taken = from.remove(resource, movable);
    let stored = to.add(resource, taken);
    if stored < taken {
        from.add(resource, taken - stored);
    }
    stored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_clamps_to_capacity() {
        let mut inv = Inventory::new().with_capacity(Resource::Water, 10.0);
        assert_eq!(inv.add(Resource::Water, 7.0), 7.0);
        assert_eq!(inv.add(Resource::Water, 7.0), 3.0);
        assert_eq!(inv.stored_amount(Resource::Water), 10.0);
        assert_eq!(inv.remaining_capacity(Resource::Water), 0.0);
        // no capacity declared means nothing fits
        assert_eq!(inv.add(Resource::Ice, 1.0), 0.0);
    }

    #[test]
    fn test_remove_clamps_to_stock() {
        let mut inv = Inventory::new()
            .with_capacity(Resource::Food, 5.0)
            .with_stock(Resource::Food, 2.0);
        assert_eq!(inv.remove(Resource::Food, 3.0), 2.0);
        assert_eq!(inv.stored_amount(Resource::Food), 0.0);
        assert_eq!(inv.remove(Resource::Food, 1.0), 0.0);
        assert_eq!(inv.remove(Resource::Food, -1.0), 0.0);
    }

    #[test]
    fn test_transfer_bounded_by_both_sides() {
        let mut settlement = Inventory::new()
            .with_capacity(Resource::Methane, 1000.0)
            .with_stock(Resource::Methane, 40.0);
        let mut rover = Inventory::new().with_capacity(Resource::Methane, 30.0);

        assert_eq!(transfer(&mut settlement, &mut rover, Resource::Methane, 20.0), 20.0);
        assert_eq!(transfer(&mut settlement, &mut rover, Resource::Methane, 20.0), 10.0);
        assert_eq!(rover.stored_amount(Resource::Methane), 30.0);
        assert_eq!(settlement.stored_amount(Resource::Methane), 10.0);
    }

    #[test]
    fn test_take_good_suit_skips_depleted() {
        let mut inv = Inventory::new();
        inv.store_suit(EvaSuit::empty("suit_a"));
        inv.store_suit(EvaSuit::new("suit_b"));
        assert!(inv.has_good_suit());
        let suit = inv.take_good_suit().unwrap();
        assert_eq!(suit.id, "suit_b");
        assert!(!inv.has_good_suit());
        assert_eq!(inv.suits().len(), 1);
    }
}
