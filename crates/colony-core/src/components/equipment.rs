//! EVA Suits
//!
//! A suit carries its own oxygen and water and its own malfunctions.

use crate::components::{transfer, Inventory, MalfunctionManager, Resource};
use crate::EPSILON;

pub const SUIT_OXYGEN_CAPACITY: f64 = 1.0;
pub const SUIT_WATER_CAPACITY: f64 = 4.0;
const SUIT_MAINTENANCE_WORK: f64 = 25.0;

#[derive(Debug, Clone)]
pub struct EvaSuit {
    pub id: String,
    inventory: Inventory,
    pub malfunctions: MalfunctionManager,
}

impl EvaSuit {
    /// A fully supplied suit.
    pub fn new(id: impl Into<String>) -> Self {
        let mut suit = Self::empty(id);
        suit.inventory.add(Resource::Oxygen, SUIT_OXYGEN_CAPACITY);
        suit.inventory.add(Resource::Water, SUIT_WATER_CAPACITY);
        suit
    }

    /// A suit with empty tanks.
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            inventory: Inventory::new()
                .with_capacity(Resource::Oxygen, SUIT_OXYGEN_CAPACITY)
                .with_capacity(Resource::Water, SUIT_WATER_CAPACITY),
            malfunctions: MalfunctionManager::new(SUIT_MAINTENANCE_WORK),
        }
    }

    pub fn oxygen(&self) -> f64 {
        self.inventory.stored_amount(Resource::Oxygen)
    }

    pub fn water(&self) -> f64 {
        self.inventory.stored_amount(Resource::Water)
    }

    pub fn oxygen_fraction(&self) -> f64 {
        self.oxygen() / SUIT_OXYGEN_CAPACITY
    }

    pub fn water_fraction(&self) -> f64 {
        self.water() / SUIT_WATER_CAPACITY
    }

    pub fn is_fully_resupplied(&self) -> bool {
        self.inventory.remaining_capacity(Resource::Oxygen) < EPSILON
            && self.inventory.remaining_capacity(Resource::Water) < EPSILON
    }

    /// Oxygen and water are present and no fault affects life support.
    pub fn life_support_check(&self) -> bool {
        self.oxygen() > 0.0 && self.water() > 0.0 && !self.malfunctions.has_life_support_fault()
    }

    /// Fit to start an EVA with.
    pub fn is_good(&self) -> bool {
        self.is_fully_resupplied() && self.life_support_check() && !self.malfunctions.has_malfunction()
    }

    /// Breathing and cooling draw while outside. Returns the amounts used.
    pub fn consume(&mut self, oxygen: f64, water: f64) -> (f64, f64) {
        (
            self.inventory.remove(Resource::Oxygen, oxygen),
            self.inventory.remove(Resource::Water, water),
        )
    }

    /// Refills oxygen and water from `source` up to the suit's free
    /// capacity; a short source fills what it can.
    pub fn resupply_from(&mut self, source: &mut Inventory) -> (f64, f64) {
        let oxygen = self.inventory.remaining_capacity(Resource::Oxygen);
        let water = self.inventory.remaining_capacity(Resource::Water);
        (
            transfer(source, &mut self.inventory, Resource::Oxygen, oxygen),
            transfer(source, &mut self.inventory, Resource::Water, water),
        )
    }
}
