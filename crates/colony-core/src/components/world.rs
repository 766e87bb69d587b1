//! World State
//!
//! Surface coordinates, the read-only environment model and the [`Colony`]
//! that owns every colonist, settlement and vehicle.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fmt;

use colony_events::MarsClock;

use crate::components::{
    AgentId, Airlock, Inventory, Location, MalfunctionManager, Person, Rover, Settlement,
    SettlementId, VehicleId,
};
use crate::error::ColonyError;

/// Position on a local planar grid, in km.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

impl Coordinates {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }

    /// Heading toward `other` in radians.
    pub fn heading_to(&self, other: &Coordinates) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// Point `distance` km along the way to `target`, stopping at it.
    pub fn move_toward(&self, target: &Coordinates, distance: f64) -> Coordinates {
        let total = self.distance_to(target);
        if total <= distance || total == 0.0 {
            return *target;
        }
        let fraction = distance / total;
        Coordinates {
            x: self.x + (target.x - self.x) * fraction,
            y: self.y + (target.y - self.y) * fraction,
        }
    }

    /// Point `distance` km away along `heading`.
    pub fn offset(&self, heading: f64, distance: f64) -> Coordinates {
        Coordinates {
            x: self.x + heading.cos() * distance,
            y: self.y + heading.sin() * distance,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Read-only surface queries.
pub trait Environment: fmt::Debug {
    /// Sunlight from 0 (dark) to 1 (full) at `location`.
    fn sunlight_level(&self, clock: &MarsClock, location: &Coordinates) -> f64;

    /// Permanently shadowed terrain.
    fn in_dark_region(&self, location: &Coordinates) -> bool;

    /// Speed divisor for travel along `heading`; 1.0 is flat ground.
    fn terrain_difficulty(&self, location: &Coordinates, heading: f64) -> f64;
}

/// Default surface: daylight follows local solar time.
#[derive(Debug, Clone)]
pub struct SurfaceModel {
    /// Millisol of local sunrise
    pub sunrise: f64,
    /// Millisol of local sunset
    pub sunset: f64,
    /// Local time shift per km east
    pub millisols_per_km: f64,
    /// |y| beyond which terrain is permanently shadowed
    pub dark_region_y: f64,
    /// Extra difficulty added by rough terrain
    pub roughness: f64,
}

impl Default for SurfaceModel {
    fn default() -> Self {
        Self {
            sunrise: 250.0,
            sunset: 750.0,
            millisols_per_km: 0.3,
            dark_region_y: 2000.0,
            roughness: 0.5,
        }
    }
}

impl Environment for SurfaceModel {
    fn sunlight_level(&self, clock: &MarsClock, location: &Coordinates) -> f64 {
        if self.in_dark_region(location) {
            return 0.0;
        }
        let local = (clock.millisol() + location.x * self.millisols_per_km).rem_euclid(1000.0);
        if local <= self.sunrise || local >= self.sunset {
            return 0.0;
        }
        (PI * (local - self.sunrise) / (self.sunset - self.sunrise)).sin()
    }

    fn in_dark_region(&self, location: &Coordinates) -> bool {
        location.y.abs() > self.dark_region_y
    }

    fn terrain_difficulty(&self, location: &Coordinates, heading: f64) -> f64 {
        1.0 + self.roughness * (heading + location.x * 0.01 + location.y * 0.02).sin().abs()
    }
}

/// Same conditions everywhere at all times.
#[derive(Debug, Clone)]
pub struct UniformEnvironment {
    pub sunlight: f64,
    pub dark: bool,
    pub terrain: f64,
}

impl Default for UniformEnvironment {
    fn default() -> Self {
        Self {
            sunlight: 1.0,
            dark: false,
            terrain: 1.0,
        }
    }
}

impl Environment for UniformEnvironment {
    fn sunlight_level(&self, _clock: &MarsClock, _location: &Coordinates) -> f64 {
        self.sunlight
    }

    fn in_dark_region(&self, _location: &Coordinates) -> bool {
        self.dark
    }

    fn terrain_difficulty(&self, _location: &Coordinates, _heading: f64) -> f64 {
        self.terrain.max(1.0)
    }
}

/// Something a colonist can be inside of.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Host {
    Settlement(SettlementId),
    Vehicle(VehicleId),
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::Settlement(id) => write!(f, "{}", id),
            Host::Vehicle(id) => write!(f, "{}", id),
        }
    }
}

/// Owns all simulated entities. Maps are ordered so iteration is
/// deterministic.
#[derive(Debug)]
pub struct Colony {
    pub clock: MarsClock,
    pub people: BTreeMap<AgentId, Person>,
    pub settlements: BTreeMap<SettlementId, Settlement>,
    pub vehicles: BTreeMap<VehicleId, Rover>,
    pub environment: Box<dyn Environment>,
}

impl Colony {
    pub fn new(environment: Box<dyn Environment>) -> Self {
        Self {
            clock: MarsClock::start(),
            people: BTreeMap::new(),
            settlements: BTreeMap::new(),
            vehicles: BTreeMap::new(),
            environment,
        }
    }

    pub fn add_settlement(&mut self, settlement: Settlement) -> Result<(), ColonyError> {
        if self.settlements.contains_key(&settlement.id) {
            return Err(ColonyError::DuplicateId(settlement.id.0.clone()));
        }
        self.settlements.insert(settlement.id.clone(), settlement);
        Ok(())
    }

    /// Adds a rover parked at `settlement`.
    pub fn add_vehicle(&mut self, mut rover: Rover, settlement: &SettlementId) -> Result<(), ColonyError> {
        let home = self
            .settlements
            .get(settlement)
            .ok_or_else(|| ColonyError::UnknownSettlement(settlement.0.clone()))?;
        if self.vehicles.contains_key(&rover.id) {
            return Err(ColonyError::DuplicateId(rover.id.0.clone()));
        }
        rover.park_at(settlement.clone(), home.coordinates);
        self.vehicles.insert(rover.id.clone(), rover);
        Ok(())
    }

    /// Adds a colonist inside their home settlement.
    pub fn add_person(&mut self, person: Person) -> Result<(), ColonyError> {
        if !self.settlements.contains_key(&person.home) {
            return Err(ColonyError::UnknownSettlement(person.home.0.clone()));
        }
        if self.people.contains_key(&person.id) {
            return Err(ColonyError::DuplicateId(person.id.0.clone()));
        }
        self.people.insert(person.id.clone(), person);
        Ok(())
    }

    pub fn person(&self, id: &AgentId) -> Option<&Person> {
        self.people.get(id)
    }

    pub fn person_mut(&mut self, id: &AgentId) -> Option<&mut Person> {
        self.people.get_mut(id)
    }

    pub fn host_coordinates(&self, host: &Host) -> Option<Coordinates> {
        match host {
            Host::Settlement(id) => self.settlements.get(id).map(|s| s.coordinates),
            Host::Vehicle(id) => self.vehicles.get(id).map(|v| v.coordinates),
        }
    }

    pub fn host_inventory(&self, host: &Host) -> Option<&Inventory> {
        match host {
            Host::Settlement(id) => self.settlements.get(id).map(|s| &s.inventory),
            Host::Vehicle(id) => self.vehicles.get(id).map(|v| &v.inventory),
        }
    }

    pub fn host_inventory_mut(&mut self, host: &Host) -> Option<&mut Inventory> {
        match host {
            Host::Settlement(id) => self.settlements.get_mut(id).map(|s| &mut s.inventory),
            Host::Vehicle(id) => self.vehicles.get_mut(id).map(|v| &mut v.inventory),
        }
    }

    pub fn airlock(&self, host: &Host) -> Option<&Airlock> {
        match host {
            Host::Settlement(id) => self.settlements.get(id).map(|s| &s.airlock),
            Host::Vehicle(id) => self.vehicles.get(id).map(|v| &v.airlock),
        }
    }

    pub fn airlock_mut(&mut self, host: &Host) -> Option<&mut Airlock> {
        match host {
            Host::Settlement(id) => self.settlements.get_mut(id).map(|s| &mut s.airlock),
            Host::Vehicle(id) => self.vehicles.get_mut(id).map(|v| &mut v.airlock),
        }
    }

    pub fn host_malfunctions(&self, host: &Host) -> Option<&MalfunctionManager> {
        match host {
            Host::Settlement(id) => self.settlements.get(id).map(|s| &s.malfunctions),
            Host::Vehicle(id) => self.vehicles.get(id).map(|v| &v.malfunctions),
        }
    }

    pub fn host_malfunctions_mut(&mut self, host: &Host) -> Option<&mut MalfunctionManager> {
        match host {
            Host::Settlement(id) => self.settlements.get_mut(id).map(|s| &mut s.malfunctions),
            Host::Vehicle(id) => self.vehicles.get_mut(id).map(|v| &mut v.malfunctions),
        }
    }

    pub fn host_name(&self, host: &Host) -> String {
        match host {
            Host::Settlement(id) => self
                .settlements
                .get(id)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| id.0.clone()),
            Host::Vehicle(id) => self
                .vehicles
                .get(id)
                .map(|v| v.name.clone())
                .unwrap_or_else(|| id.0.clone()),
        }
    }

    /// Both mutable halves of a settlement-to-vehicle transfer.
    pub fn settlement_and_vehicle_mut(
        &mut self,
        settlement: &SettlementId,
        vehicle: &VehicleId,
    ) -> Option<(&mut Settlement, &mut Rover)> {
        let settlement = self.settlements.get_mut(settlement)?;
        let vehicle = self.vehicles.get_mut(vehicle)?;
        Some((settlement, vehicle))
    }

    /// A colonist together with the inventory of the host they are inside.
    pub fn person_and_host_inventory_mut(
        &mut self,
        agent: &AgentId,
        host: &Host,
    ) -> Option<(&mut Person, &mut Inventory)> {
        let person = self.people.get_mut(agent)?;
        let inventory = match host {
            Host::Settlement(id) => &mut self.settlements.get_mut(id)?.inventory,
            Host::Vehicle(id) => &mut self.vehicles.get_mut(id)?.inventory,
        };
        Some((person, inventory))
    }

    pub fn person_coordinates(&self, agent: &AgentId) -> Option<Coordinates> {
        let person = self.people.get(agent)?;
        match &person.location {
            Location::Inside(host) | Location::InAirlock(host) => self.host_coordinates(host),
            Location::Outside(coordinates) => Some(*coordinates),
        }
    }

    pub fn sunlight_at(&self, location: &Coordinates) -> f64 {
        self.environment.sunlight_level(&self.clock, location)
    }

    /// Ages every settlement and vehicle.
    pub fn time_passing(&mut self, time: f64) {
        for settlement in self.settlements.values_mut() {
            settlement.malfunctions.time_passing(time);
        }
        for vehicle in self.vehicles.values_mut() {
            vehicle.malfunctions.time_passing(time);
        }
    }

    /// Rovers parked at `settlement`, in id order.
    pub fn parked_vehicles(&self, settlement: &SettlementId) -> impl Iterator<Item = &Rover> + '_ {
        let settlement = settlement.clone();
        self.vehicles
            .values()
            .filter(move |v| v.parked_at.as_ref() == Some(&settlement))
    }

    /// Colonists currently inside `host`.
    pub fn occupants(&self, host: &Host) -> Vec<AgentId> {
        self.people
            .values()
            .filter(|p| p.location == Location::Inside(host.clone()))
            .map(|p| p.id.clone())
            .collect()
    }
}
