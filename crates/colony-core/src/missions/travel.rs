//! Travel Missions
//!
//! Relocates a crew to another settlement, which becomes their new home.
//! On a medical emergency the rover turns back only when home is nearer.

use crate::components::{AgentId, Colony, Coordinates, Person, SettlementId, VehicleId};
use crate::config::SchedulerConfig;
use crate::missions::rover::{available_rover, can_supply, has_emergency};
use crate::missions::{Mission, MissionBehavior, MissionId, MissionKind, MissionState, RoverTrip, TripStep};
use crate::systems::TickContext;
use crate::tasks::{SupplyManifest, Task};
use crate::EPSILON;

const MAX_TRANSITIONS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TravelPhase {
    Embarking,
    Traveling,
    Disembarking,
}

#[derive(Debug)]
pub struct TravelMission {
    phase: TravelPhase,
    trip: RoverTrip,
    destination: SettlementId,
    destination_name: String,
    turned_back: bool,
}

fn trip_manifest(distance: f64, crew: usize, base_speed: f64, fuel_efficiency: f64, config: &SchedulerConfig) -> SupplyManifest {
    let trip_time = distance / base_speed.max(EPSILON);
    SupplyManifest::for_trip(distance, crew, trip_time, fuel_efficiency, &config.missions)
}

/// Nearest other settlement the rover at `home` could be supplied to reach.
fn reachable_destination(colony: &Colony, home: &SettlementId, config: &SchedulerConfig) -> Option<SettlementId> {
    let origin = colony.settlements.get(home)?.coordinates;
    let rover = available_rover(colony, home)?;
    colony
        .settlements
        .values()
        .filter(|s| &s.id != home)
        .map(|s| (s, origin.distance_to(&s.coordinates)))
        .filter(|(_, distance)| {
            let manifest = trip_manifest(*distance, rover.crew_capacity(), rover.spec.base_speed, rover.spec.fuel_efficiency, config);
            can_supply(colony, home, rover, &manifest, config)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(s, _)| s.id.clone())
}

impl TravelMission {
    fn target(&self, state: &MissionState) -> SettlementId {
        if self.turned_back {
            state.home.clone()
        } else {
            self.destination.clone()
        }
    }

    fn coordinates_of(colony: &Colony, settlement: &SettlementId) -> Option<Coordinates> {
        colony.settlements.get(settlement).map(|s| s.coordinates)
    }

    /// Turns back if home is closer than the destination.
    fn consider_turning_back(&mut self, state: &MissionState, ctx: &TickContext<'_>) {
        if self.turned_back {
            return;
        }
        let (Some(position), Some(home), Some(destination)) = (
            self.trip.coordinates(ctx.colony),
            Self::coordinates_of(ctx.colony, &state.home),
            Self::coordinates_of(ctx.colony, &self.destination),
        ) else {
            return;
        };
        if position.distance_to(&home) < position.distance_to(&destination) {
            tracing::warn!(mission = %state.id, "medical emergency, turning back");
            self.turned_back = true;
        }
    }

    fn step(&mut self, state: &mut MissionState, agent: &AgentId, ctx: &mut TickContext<'_>) -> TripStep {
        match self.phase {
            TravelPhase::Embarking => match self.trip.embark(state, agent, ctx) {
                TripStep::Ready => {
                    self.phase = TravelPhase::Traveling;
                    TripStep::Ready
                }
                other => other,
            },
            TravelPhase::Traveling => {
                if has_emergency(state, ctx.colony, ctx.config) {
                    self.consider_turning_back(state, ctx);
                }
                let target = self.target(state);
                let Some(coordinates) = Self::coordinates_of(ctx.colony, &target) else {
                    return TripStep::Failed("destination lost");
                };
                match self.trip.drive(state, agent, ctx, coordinates) {
                    TripStep::Ready => {
                        self.phase = TravelPhase::Disembarking;
                        TripStep::Ready
                    }
                    other => other,
                }
            }
            TravelPhase::Disembarking => {
                let target = self.target(state);
                let step = self.trip.disembark(state, agent, ctx, &target);
                if !self.turned_back {
                    if let Some(person) = ctx.colony.person_mut(agent) {
                        person.home = target.clone();
                    }
                }
                match step {
                    TripStep::Ready => {
                        state.request_end(if self.turned_back { "turned back" } else { "arrived" });
                        TripStep::Wait
                    }
                    other => other,
                }
            }
        }
    }
}

impl MissionBehavior for TravelMission {
    fn phase(&self) -> String {
        match self.phase {
            TravelPhase::Embarking => "Embarking".to_string(),
            TravelPhase::Traveling if self.turned_back => "Returning home".to_string(),
            TravelPhase::Traveling => format!("Traveling to {}", self.destination_name),
            TravelPhase::Disembarking => "Disembarking".to_string(),
        }
    }

    fn perform(&mut self, state: &mut MissionState, agent: &AgentId, ctx: &mut TickContext<'_>) -> Option<Task> {
        for _ in 0..MAX_TRANSITIONS {
            match self.step(state, agent, ctx) {
                TripStep::Task(task) => return Some(task),
                TripStep::Wait => return None,
                TripStep::Ready => continue,
                TripStep::Failed(reason) => {
                    state.request_end(reason);
                    return None;
                }
            }
        }
        None
    }

    fn join_weight(&self, state: &MissionState, _colony: &Colony, person: &Person, config: &SchedulerConfig) -> f64 {
        if self.phase != TravelPhase::Embarking || person.is_inside_settlement() != Some(&state.home) {
            return 0.0;
        }
        config.missions.join_weight
    }

    fn capacity(&self, _state: &MissionState, colony: &Colony) -> Option<usize> {
        Some(self.trip.crew_capacity(colony))
    }

    fn vehicle(&self) -> Option<&VehicleId> {
        Some(self.trip.vehicle())
    }

    fn on_member_removed(&mut self, _state: &MissionState, agent: &AgentId, ctx: &mut TickContext<'_>) {
        self.trip.on_member_removed(agent, ctx);
    }

    fn release(&mut self, state: &MissionState, ctx: &mut TickContext<'_>) {
        self.trip.release(&state.id, ctx);
    }
}

pub fn weight(colony: &Colony, person: &Person, config: &SchedulerConfig) -> f64 {
    let Some(home) = person.is_inside_settlement() else {
        return 0.0;
    };
    if reachable_destination(colony, home, config).is_none() {
        return 0.0;
    }
    config.missions.travel_weight * person.performance()
}

pub fn create(id: MissionId, founder: &AgentId, ctx: &mut TickContext<'_>) -> Option<Mission> {
    let home = ctx.colony.person(founder)?.is_inside_settlement()?.clone();
    let destination = reachable_destination(ctx.colony, &home, ctx.config)?;
    let origin = ctx.colony.settlements.get(&home)?.coordinates;
    let target = ctx.colony.settlements.get(&destination)?;
    let (distance, destination_name) = (origin.distance_to(&target.coordinates), target.name.clone());

    let mut trip = RoverTrip::reserve(ctx.colony, &home, &id)?;
    let settings = ctx.config;
    let Some(rover) = ctx.colony.vehicles.get(trip.vehicle()) else {
        trip.release(&id, ctx);
        return None;
    };
    let capacity = rover.crew_capacity();
    trip.set_manifest(trip_manifest(distance, capacity, rover.spec.base_speed, rover.spec.fuel_efficiency, settings));

    let state = MissionState::new(
        id,
        MissionKind::TravelToSettlement,
        home,
        capacity,
        settings.missions.min_members,
        ctx.now(),
    );
    let behavior = TravelMission {
        phase: TravelPhase::Embarking,
        trip,
        destination,
        destination_name,
        turned_back: false,
    };
    Some(Mission::new(state, behavior))
}
