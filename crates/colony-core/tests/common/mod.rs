//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use colony_core::components::{
    AgentId, Airlock, Colony, Coordinates, EvaSuit, Garage, Laboratory, MedicalAid, Person, Resource, Rover,
    RoverSpec, Settlement, SettlementId, UniformEnvironment, VehicleId,
};
use colony_core::{SchedulerConfig, SimRng, TickContext};
use colony_events::SimEvent;

pub fn home_id() -> SettlementId {
    SettlementId("settlement_01".into())
}

pub fn rover_id() -> VehicleId {
    VehicleId("rover_01".into())
}

pub fn agent(n: u32) -> AgentId {
    AgentId(format!("agent_{:04}", n))
}

/// A stocked settlement with one parked rover and `people` colonists.
pub fn colony_with(environment: UniformEnvironment, people: u32) -> Colony {
    let mut colony = Colony::new(Box::new(environment));
    let mut settlement = Settlement::new(
        home_id(),
        "Alpha Base",
        0,
        Coordinates::new(0.0, 0.0),
        Airlock::new(2, 5.0),
    );
    for resource in Resource::ALL {
        settlement.inventory.set_capacity(resource, 10_000.0);
        settlement.inventory.add(resource, 1_000.0);
    }
    for i in 0..4 {
        settlement.inventory.store_suit(EvaSuit::new(format!("suit_{:02}", i)));
    }
    settlement.laboratories.push(Laboratory::new("Lab", 1));
    settlement.medical_aids.push(MedicalAid::new("Bed"));
    settlement.garage = Garage::new(1);
    colony.add_settlement(settlement).expect("settlement");

    let mut rover = Rover::new(rover_id(), "Explorer", RoverSpec::default(), 5.0);
    rover.inventory.store_suit(EvaSuit::new("rover_suit_00"));
    colony.add_vehicle(rover, &home_id()).expect("rover");

    for n in 1..=people {
        colony
            .add_person(Person::new(agent(n), format!("Colonist {}", n), home_id()))
            .expect("person");
    }
    colony
}

pub fn colony(people: u32) -> Colony {
    colony_with(UniformEnvironment::default(), people)
}

/// Owned pieces of a tick context.
pub struct Harness {
    pub colony: Colony,
    pub rng: SimRng,
    pub config: SchedulerConfig,
    pub events: Vec<SimEvent>,
}

impl Harness {
    pub fn new(colony: Colony) -> Self {
        Self {
            colony,
            rng: SimRng::seeded(11),
            config: SchedulerConfig::default(),
            events: Vec::new(),
        }
    }

    pub fn ctx(&mut self) -> TickContext<'_> {
        TickContext::new(&mut self.colony, &mut self.rng, &self.config, &mut self.events)
    }
}
