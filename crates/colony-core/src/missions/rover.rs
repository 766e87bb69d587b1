//! Rover Trips
//!
//! Bookkeeping every rover mission shares: the vehicle reservation, the
//! supply manifest and loading gate, boarding, driver rotation, repairs on
//! the road, disembarking with unloading, and giving the rover back.

use crate::components::{AgentId, Colony, Coordinates, Host, Inventory, Location, Rover, SettlementId, VehicleId};
use crate::config::SchedulerConfig;
use crate::missions::{MissionId, MissionState};
use crate::systems::TickContext;
use crate::tasks::{DriveVehicle, LoadVehicle, RepairMalfunction, SupplyManifest, Task, UnloadVehicle};
use crate::EPSILON;

/// What a trip step asks of the mission.
#[derive(Debug)]
pub enum TripStep {
    /// Hand this task to the member.
    Task(Task),
    /// Nothing for this member right now.
    Wait,
    /// The phase's goal is met.
    Ready,
    /// The mission cannot go on.
    Failed(&'static str),
}

/// First rover at `settlement` free for a mission.
pub fn available_rover<'a>(colony: &'a Colony, settlement: &SettlementId) -> Option<&'a Rover> {
    colony
        .parked_vehicles(settlement)
        .find(|rover| rover.is_available_for_mission())
}

/// Whether `settlement` could stock `manifest` into `rover` and keep its
/// reserve.
pub fn can_supply(colony: &Colony, settlement: &SettlementId, rover: &Rover, manifest: &SupplyManifest, config: &SchedulerConfig) -> bool {
    colony.settlements.get(settlement).is_some_and(|s| {
        manifest.has_enough_supplies(&s.inventory, &rover.inventory, config.missions.settlement_reserve)
    })
}

/// Any member hurt badly enough to call the trip off.
pub fn has_emergency(state: &MissionState, colony: &Colony, config: &SchedulerConfig) -> bool {
    state.roster.members().iter().any(|member| {
        colony
            .person(member)
            .is_some_and(|p| p.condition.seriousness() >= config.missions.emergency_seriousness)
    })
}

#[derive(Debug)]
pub struct RoverTrip {
    vehicle: VehicleId,
    manifest: SupplyManifest,
    reserved: bool,
    last_driver: Option<AgentId>,
}

impl RoverTrip {
    /// Reserves the first available rover at `home` for `mission`.
    pub fn reserve(colony: &mut Colony, home: &SettlementId, mission: &MissionId) -> Option<Self> {
        let vehicle = available_rover(colony, home)?.id.clone();
        let rover = colony.vehicles.get_mut(&vehicle)?;
        if !rover.reserve(mission) {
            return None;
        }
        tracing::debug!(mission = %mission, vehicle = %vehicle, "rover reserved");
        Some(Self {
            vehicle,
            manifest: SupplyManifest::new(),
            reserved: true,
            last_driver: None,
        })
    }

    pub fn vehicle(&self) -> &VehicleId {
        &self.vehicle
    }

    pub fn host(&self) -> Host {
        Host::Vehicle(self.vehicle.clone())
    }

    pub fn manifest(&self) -> &SupplyManifest {
        &self.manifest
    }

    pub fn set_manifest(&mut self, manifest: SupplyManifest) {
        self.manifest = manifest;
    }

    pub fn crew_capacity(&self, colony: &Colony) -> usize {
        colony
            .vehicles
            .get(&self.vehicle)
            .map(Rover::crew_capacity)
            .unwrap_or(0)
    }

    /// Good EVA suits the crew can draw on: stowed at home, stowed aboard,
    /// or already worn by a member.
    pub fn available_suits(&self, state: &MissionState, colony: &Colony) -> usize {
        let good = |inventory: &Inventory| inventory.suits().iter().filter(|s| s.is_good()).count();
        let at_home = colony
            .settlements
            .get(&state.home)
            .map(|s| good(&s.inventory))
            .unwrap_or(0);
        let aboard = colony
            .vehicles
            .get(&self.vehicle)
            .map(|v| good(&v.inventory))
            .unwrap_or(0);
        let worn = state
            .roster
            .members()
            .iter()
            .filter(|m| colony.person(m).is_some_and(|p| p.suit.is_some()))
            .count();
        at_home + aboard + worn
    }

    pub fn coordinates(&self, colony: &Colony) -> Option<Coordinates> {
        colony.vehicles.get(&self.vehicle).map(|v| v.coordinates)
    }

    pub fn is_aboard(&self, colony: &Colony, agent: &AgentId) -> bool {
        colony
            .person(agent)
            .is_some_and(|p| p.location == Location::Inside(self.host()))
    }

    pub fn all_aboard(&self, state: &MissionState, colony: &Colony) -> bool {
        state
            .roster
            .members()
            .iter()
            .all(|member| self.is_aboard(colony, member))
    }

    /// Loads supplies, boards members once the rover is stocked, and reports
    /// `Ready` when enough members are all aboard.
    pub fn embark(&mut self, state: &MissionState, agent: &AgentId, ctx: &mut TickContext<'_>) -> TripStep {
        let Some(rover) = ctx.colony.vehicles.get(&self.vehicle) else {
            return TripStep::Failed("vehicle lost");
        };
        let at_home = ctx
            .colony
            .person(agent)
            .is_some_and(|p| p.is_inside_settlement() == Some(&state.home));

        if at_home {
            if !self.manifest.is_fully_loaded(&rover.inventory) {
                if !can_supply(ctx.colony, &state.home, rover, &self.manifest, ctx.config) {
                    return TripStep::Failed("not enough supplies");
                }
                return TripStep::Task(LoadVehicle::task(
                    state.home.clone(),
                    self.vehicle.clone(),
                    self.manifest.clone(),
                ));
            }
            if let Some(person) = ctx.colony.person_mut(agent) {
                tracing::debug!(agent = %agent, vehicle = %self.vehicle, "boarded");
                person.location = Location::Inside(self.host());
            }
        }

        let crewed = state.roster.len() >= state.min_members;
        if crewed && self.all_aboard(state, ctx.colony) {
            return TripStep::Ready;
        }
        let waited = ctx.now().millisols_since(&state.started);
        if !crewed && waited >= ctx.config.missions.recruitment_time {
            return TripStep::Failed("not enough members");
        }
        TripStep::Wait
    }

    /// One member's share of driving toward `destination`: repair first,
    /// then take a shift unless someone else is at the wheel or this member
    /// drove last and another fit member is aboard.
    pub fn drive(
        &mut self,
        state: &MissionState,
        agent: &AgentId,
        ctx: &mut TickContext<'_>,
        destination: Coordinates,
    ) -> TripStep {
        let Some(rover) = ctx.colony.vehicles.get(&self.vehicle) else {
            return TripStep::Failed("vehicle lost");
        };
        if rover.coordinates.distance_to(&destination) <= EPSILON {
            return TripStep::Ready;
        }
        if !self.is_aboard(ctx.colony, agent) || !self.all_aboard(state, ctx.colony) {
            return TripStep::Wait;
        }
        if rover.malfunctions.has_malfunction() {
            return TripStep::Task(RepairMalfunction::task(ctx.colony, self.host()));
        }
        if rover.driver().is_some() {
            return TripStep::Wait;
        }
        if rover.fuel_range() <= EPSILON {
            tracing::warn!(mission = %state.id, vehicle = %self.vehicle, "rover out of fuel");
            return TripStep::Failed("out of fuel");
        }
        if self.last_driver.as_ref() == Some(agent) && self.other_fit_member(state, agent, ctx) {
            return TripStep::Wait;
        }

        self.last_driver = Some(agent.clone());
        TripStep::Task(DriveVehicle::task(
            ctx.colony,
            self.vehicle.clone(),
            destination,
            ctx.config.tasks.drive_shift_duration,
        ))
    }

    fn other_fit_member(&self, state: &MissionState, agent: &AgentId, ctx: &TickContext<'_>) -> bool {
        state.roster.members().iter().any(|member| {
            member != agent
                && self.is_aboard(ctx.colony, member)
                && ctx.performance(member) >= ctx.config.missions.min_performance
        })
    }

    /// Parks at `settlement`, moves members inside and unloads. `Ready`
    /// once nobody is aboard and the cargo hold is empty.
    pub fn disembark(
        &mut self,
        state: &MissionState,
        agent: &AgentId,
        ctx: &mut TickContext<'_>,
        settlement: &SettlementId,
    ) -> TripStep {
        let Some(coordinates) = ctx.colony.settlements.get(settlement).map(|s| s.coordinates) else {
            return TripStep::Failed("destination lost");
        };
        let Some(rover) = ctx.colony.vehicles.get_mut(&self.vehicle) else {
            return TripStep::Failed("vehicle lost");
        };
        if rover.parked_at.as_ref() != Some(settlement) {
            tracing::debug!(vehicle = %self.vehicle, settlement = %settlement, "rover parked");
            rover.park_at(settlement.clone(), coordinates);
        }
        let empty = rover.inventory.is_empty();

        if self.is_aboard(ctx.colony, agent) {
            if let Some(person) = ctx.colony.person_mut(agent) {
                person.location = Location::Inside(Host::Settlement(settlement.clone()));
            }
        }
        let inside = ctx
            .colony
            .person(agent)
            .is_some_and(|p| p.is_inside_settlement() == Some(settlement));
        if !empty && inside {
            return TripStep::Task(UnloadVehicle::task(settlement.clone(), self.vehicle.clone()));
        }

        let anyone_aboard = state
            .roster
            .members()
            .iter()
            .any(|member| self.is_aboard(ctx.colony, member));
        if empty && !anyone_aboard {
            TripStep::Ready
        } else {
            TripStep::Wait
        }
    }

    /// A removed member still aboard a parked rover walks into the
    /// settlement.
    pub fn on_member_removed(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>) {
        if self.last_driver.as_ref() == Some(agent) {
            self.last_driver = None;
        }
        let Some(parked) = ctx.colony.vehicles.get(&self.vehicle).and_then(|v| v.parked_at.clone()) else {
            return;
        };
        if self.is_aboard(ctx.colony, agent) {
            if let Some(person) = ctx.colony.person_mut(agent) {
                person.location = Location::Inside(Host::Settlement(parked));
            }
        }
    }

    /// Frees the reservation and lets anyone aboard a parked rover out.
    /// Idempotent.
    pub fn release(&mut self, mission: &MissionId, ctx: &mut TickContext<'_>) {
        if !self.reserved {
            return;
        }
        self.reserved = false;
        let Some(rover) = ctx.colony.vehicles.get_mut(&self.vehicle) else {
            return;
        };
        rover.release_reservation(mission);
        let parked = rover.parked_at.clone();
        tracing::debug!(mission = %mission, vehicle = %self.vehicle, "rover released");

        if let Some(settlement) = parked {
            for occupant in ctx.colony.occupants(&self.host()) {
                if let Some(person) = ctx.colony.person_mut(&occupant) {
                    person.location = Location::Inside(Host::Settlement(settlement.clone()));
                }
            }
        }
    }
}
