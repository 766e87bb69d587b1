//! Settlements and Rovers
//!
//! Fixed settlement sites with their starting stock and facilities.

use crate::components::{
    Airlock, Coordinates, EvaSuit, Garage, Laboratory, MedicalAid, Resource, Rover, RoverSpec,
    Settlement, SettlementId, VehicleId,
};
use crate::config::SchedulerConfig;

/// A settlement's name, position and rover name.
pub struct SettlementSite {
    pub name: &'static str,
    pub x: f64,
    pub y: f64,
    pub rover: &'static str,
}

pub const SETTLEMENT_SITES: [SettlementSite; 2] = [
    SettlementSite {
        name: "Schiaparelli Base",
        x: 0.0,
        y: 0.0,
        rover: "Pathfinder",
    },
    SettlementSite {
        name: "Gale Outpost",
        x: 60.0,
        y: 15.0,
        rover: "Curiosity",
    },
];

/// Starting stock per resource (kg).
const STARTING_STOCK: [(Resource, f64); 6] = [
    (Resource::Oxygen, 2_000.0),
    (Resource::Water, 4_000.0),
    (Resource::Food, 2_000.0),
    (Resource::Methane, 2_000.0),
    (Resource::Ice, 200.0),
    (Resource::Regolith, 200.0),
];

const STORAGE_CAPACITY: f64 = 50_000.0;

pub fn settlement_id(index: u32) -> SettlementId {
    SettlementId(format!("settlement_{:02}", index + 1))
}

pub fn vehicle_id(index: u32) -> VehicleId {
    VehicleId(format!("rover_{:02}", index + 1))
}

/// A settlement with storage, one suit per resident, a two-seat lab, a sick
/// bay and a single garage bay.
pub fn create_settlement(index: u32, site: &SettlementSite, residents: usize, config: &SchedulerConfig) -> Settlement {
    let mut settlement = Settlement::new(
        settlement_id(index),
        site.name,
        index,
        Coordinates::new(site.x, site.y),
        Airlock::new(2, config.eva.airlock_cycle_time),
    );
    for (resource, amount) in STARTING_STOCK {
        settlement.inventory.set_capacity(resource, STORAGE_CAPACITY);
        settlement.inventory.add(resource, amount);
    }
    for n in 0..residents {
        settlement
            .inventory
            .store_suit(EvaSuit::new(format!("suit_{:02}_{:02}", index + 1, n + 1)));
    }
    settlement.garage = Garage::new(1);
    settlement.laboratories.push(Laboratory::new(format!("{} Lab", site.name), 2));
    settlement.medical_aids.push(MedicalAid::new(format!("{} Sick Bay", site.name)));
    settlement
}

/// A standard rover with a suit for every seat but one.
pub fn create_rover(index: u32, site: &SettlementSite, config: &SchedulerConfig) -> Rover {
    let spec = RoverSpec::default();
    let suits = spec.crew_capacity.saturating_sub(1);
    let mut rover = Rover::new(vehicle_id(index), site.rover, spec, config.eva.airlock_cycle_time);
    for n in 0..suits {
        rover
            .inventory
            .store_suit(EvaSuit::new(format!("rover_suit_{:02}_{:02}", index + 1, n + 1)));
    }
    rover
}
