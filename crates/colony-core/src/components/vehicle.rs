//! Rovers
//!
//! Ground vehicles with cargo, their own airlock and three exclusive
//! claims: the mission reservation, the driver seat and maintenance.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::components::{
    AgentId, Airlock, Coordinates, ExclusiveClaim, Inventory, MalfunctionManager, Resource,
    SettlementId,
};
use crate::missions::MissionId;
use crate::EPSILON;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleId(pub String);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VehicleStatus {
    #[default]
    Parked,
    Moving,
}

/// Static rover characteristics.
#[derive(Debug, Clone)]
pub struct RoverSpec {
    pub crew_capacity: usize,
    /// km per millisol on flat terrain
    pub base_speed: f64,
    /// km per kg of methane
    pub fuel_efficiency: f64,
    /// Cargo capacity per resource (kg)
    pub cargo_capacity: f64,
    pub maintenance_work: f64,
}

impl Default for RoverSpec {
    fn default() -> Self {
        Self {
            crew_capacity: 4,
            base_speed: 0.5,
            fuel_efficiency: 2.0,
            cargo_capacity: 1000.0,
            maintenance_work: 80.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rover {
    pub id: VehicleId,
    pub name: String,
    pub spec: RoverSpec,
    pub coordinates: Coordinates,
    pub parked_at: Option<SettlementId>,
    pub status: VehicleStatus,
    pub inventory: Inventory,
    pub airlock: Airlock,
    pub malfunctions: MalfunctionManager,
    pub odometer: f64,
    reservation: ExclusiveClaim<MissionId>,
    driver: ExclusiveClaim<AgentId>,
    maintenance: ExclusiveClaim<AgentId>,
}

impl Rover {
    pub fn new(
        id: VehicleId,
        name: impl Into<String>,
        spec: RoverSpec,
        airlock_cycle_time: f64,
    ) -> Self {
        let mut inventory = Inventory::new();
        for resource in Resource::ALL {
            inventory.set_capacity(resource, spec.cargo_capacity);
        }
        Self {
            id,
            name: name.into(),
            coordinates: Coordinates::default(),
            parked_at: None,
            status: VehicleStatus::Parked,
            inventory,
            airlock: Airlock::new(spec.crew_capacity.clamp(1, 2), airlock_cycle_time),
            malfunctions: MalfunctionManager::new(spec.maintenance_work),
            odometer: 0.0,
            reservation: ExclusiveClaim::new(),
            driver: ExclusiveClaim::new(),
            maintenance: ExclusiveClaim::new(),
            spec,
        }
    }

    pub fn crew_capacity(&self) -> usize {
        self.spec.crew_capacity
    }

    pub fn reserve(&mut self, mission: &MissionId) -> bool {
        self.reservation.try_acquire(mission)
    }

    pub fn release_reservation(&mut self, mission: &MissionId) -> bool {
        self.reservation.release(mission)
    }

    pub fn is_reserved(&self) -> bool {
        self.reservation.is_held()
    }

    pub fn reserved_by(&self) -> Option<&MissionId> {
        self.reservation.holder()
    }

    pub fn take_driver_seat(&mut self, agent: &AgentId) -> bool {
        self.driver.try_acquire(agent)
    }

    pub fn leave_driver_seat(&mut self, agent: &AgentId) -> bool {
        self.driver.release(agent)
    }

    pub fn driver(&self) -> Option<&AgentId> {
        self.driver.holder()
    }

    pub fn claim_maintenance(&mut self, agent: &AgentId) -> bool {
        self.maintenance.try_acquire(agent)
    }

    pub fn release_maintenance(&mut self, agent: &AgentId) -> bool {
        self.maintenance.release(agent)
    }

    pub fn is_under_maintenance(&self) -> bool {
        self.maintenance.is_held()
    }

    /// Available for a new mission: parked, unreserved, working, and
    /// nobody is maintaining it.
    pub fn is_available_for_mission(&self) -> bool {
        self.parked_at.is_some()
            && !self.is_reserved()
            && !self.is_under_maintenance()
            && !self.malfunctions.has_malfunction()
    }

    /// Distance the current methane load allows.
    pub fn fuel_range(&self) -> f64 {
        self.inventory.stored_amount(Resource::Methane) * self.spec.fuel_efficiency
    }

    /// Moves toward `destination` by up to `distance`, burning fuel.
    /// Returns the distance actually covered.
    pub fn drive_toward(&mut self, destination: Coordinates, distance: f64) -> f64 {
        if distance <= 0.0 || !distance.is_finite() {
            return 0.0;
        }
        let covered = distance
            .min(self.coordinates.distance_to(&destination))
            .min(self.fuel_range());
        if covered <= EPSILON {
            return 0.0;
        }
        self.inventory
            .remove(Resource::Methane, covered / self.spec.fuel_efficiency);
        self.coordinates = self.coordinates.move_toward(&destination, covered);
        self.odometer += covered;
        self.parked_at = None;
        self.status = VehicleStatus::Moving;
        covered
    }

    pub fn park_at(&mut self, settlement: SettlementId, coordinates: Coordinates) {
        self.parked_at = Some(settlement);
        self.coordinates = coordinates;
        self.status = VehicleStatus::Parked;
    }
}
