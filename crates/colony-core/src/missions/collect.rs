//! Collection Missions
//!
//! A rover crew drives out to a chain of sites, gathers ice or regolith on
//! EVAs at each one, and brings the haul home. A serious medical emergency
//! skips the remaining sites and heads straight back.

use colony_events::MarsClock;

use crate::components::{AgentId, Colony, Coordinates, Person, Resource, VehicleId};
use crate::config::{MissionConfig, SchedulerConfig};
use crate::missions::rover::{available_rover, can_supply, has_emergency};
use crate::missions::{Mission, MissionBehavior, MissionId, MissionKind, MissionState, RoverTrip, TripStep};
use crate::systems::TickContext;
use crate::tasks::eva::can_start_eva;
use crate::tasks::{CollectResources, SupplyManifest, Task};
use crate::EPSILON;

/// Phase transitions allowed within one `perform` call.
const MAX_TRANSITIONS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectPhase {
    Embarking,
    Traveling { leg: usize },
    Collecting { site: usize },
    ReturningHome,
    Disembarking,
}

/// Upper bound on the round trip: out to the last site and straight back.
fn trip_distance(config: &MissionConfig) -> f64 {
    2.0 * config.collection_sites as f64 * config.site_distance
}

fn trip_manifest(crew: usize, base_speed: f64, fuel_efficiency: f64, config: &MissionConfig) -> SupplyManifest {
    let distance = trip_distance(config);
    let trip_time = distance / base_speed.max(EPSILON) + config.collection_sites as f64 * config.site_time_limit;
    SupplyManifest::for_trip(distance, crew, trip_time, fuel_efficiency, config)
}

#[derive(Debug)]
pub struct CollectMission {
    resource: Resource,
    phase: CollectPhase,
    trip: RoverTrip,
    sites: Vec<Coordinates>,
    site_arrival: MarsClock,
    site_start_stock: f64,
}

impl CollectMission {
    fn collected_here(&self, colony: &Colony) -> f64 {
        colony
            .vehicles
            .get(self.trip.vehicle())
            .map(|v| v.inventory.stored_amount(self.resource) - self.site_start_stock)
            .unwrap_or(0.0)
            .max(0.0)
    }

    fn arrive_at_site(&mut self, site: usize, ctx: &TickContext<'_>) {
        self.phase = CollectPhase::Collecting { site };
        self.site_arrival = ctx.now();
        self.site_start_stock = ctx
            .colony
            .vehicles
            .get(self.trip.vehicle())
            .map(|v| v.inventory.stored_amount(self.resource))
            .unwrap_or(0.0);
    }

    fn after_site(&self, site: usize) -> CollectPhase {
        if site + 1 < self.sites.len() {
            CollectPhase::Traveling { leg: site + 1 }
        } else {
            CollectPhase::ReturningHome
        }
    }

    /// One call's worth of the phase machine.
    fn step(&mut self, state: &mut MissionState, agent: &AgentId, ctx: &mut TickContext<'_>) -> TripStep {
        let emergency = has_emergency(state, ctx.colony, ctx.config);
        match self.phase {
            CollectPhase::Embarking => match self.trip.embark(state, agent, ctx) {
                TripStep::Ready => {
                    self.phase = CollectPhase::Traveling { leg: 0 };
                    TripStep::Ready
                }
                other => other,
            },
            CollectPhase::Traveling { .. } | CollectPhase::Collecting { .. } if emergency => {
                tracing::warn!(mission = %state.id, "medical emergency, returning home");
                self.phase = CollectPhase::ReturningHome;
                TripStep::Ready
            }
            CollectPhase::Traveling { leg } => {
                let Some(destination) = self.sites.get(leg).copied() else {
                    self.phase = CollectPhase::ReturningHome;
                    return TripStep::Ready;
                };
                match self.trip.drive(state, agent, ctx, destination) {
                    TripStep::Ready => {
                        self.arrive_at_site(leg, ctx);
                        TripStep::Ready
                    }
                    other => other,
                }
            }
            CollectPhase::Collecting { site } => self.collect(state, agent, ctx, site),
            CollectPhase::ReturningHome => {
                let Some(home) = ctx.colony.settlements.get(&state.home).map(|s| s.coordinates) else {
                    return TripStep::Failed("home lost");
                };
                match self.trip.drive(state, agent, ctx, home) {
                    TripStep::Ready => {
                        self.phase = CollectPhase::Disembarking;
                        TripStep::Ready
                    }
                    other => other,
                }
            }
            CollectPhase::Disembarking => {
                let home = state.home.clone();
                match self.trip.disembark(state, agent, ctx, &home) {
                    TripStep::Ready => {
                        state.request_end("completed");
                        TripStep::Wait
                    }
                    other => other,
                }
            }
        }
    }

    fn collect(&mut self, state: &MissionState, agent: &AgentId, ctx: &mut TickContext<'_>, site: usize) -> TripStep {
        let config = &ctx.config.missions;
        let collected = self.collected_here(ctx.colony);
        let elapsed = ctx.now().millisols_since(&self.site_arrival);
        if collected >= config.site_goal - EPSILON || elapsed >= config.site_time_limit {
            if !self.trip.all_aboard(state, ctx.colony) {
                return TripStep::Wait;
            }
            tracing::debug!(mission = %state.id, site, collected, "site finished");
            self.phase = self.after_site(site);
            return TripStep::Ready;
        }

        let host = self.trip.host();
        let ready = ctx.colony.person(agent).is_some_and(|person| {
            self.trip.is_aboard(ctx.colony, agent) && can_start_eva(ctx.colony, person, &host, &ctx.config.eva)
        });
        if !ready {
            return TripStep::Wait;
        }
        TripStep::Task(CollectResources::task(
            host,
            self.resource,
            config.site_goal - collected,
            config.collection_rate,
        ))
    }
}

impl MissionBehavior for CollectMission {
    fn phase(&self) -> String {
        match self.phase {
            CollectPhase::Embarking => "Embarking".to_string(),
            CollectPhase::Traveling { leg } => format!("Traveling to site {}", leg + 1),
            CollectPhase::Collecting { site } => format!("Collecting at site {}", site + 1),
            CollectPhase::ReturningHome => "Returning home".to_string(),
            CollectPhase::Disembarking => "Disembarking".to_string(),
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
        if self.phase != CollectPhase::Embarking || person.is_inside_settlement() != Some(&state.home) {
            return 0.0;
        }
        config.missions.join_weight
    }

    /// Rover seats, and while still at home, the suits to go round.
    fn capacity(&self, state: &MissionState, colony: &Colony) -> Option<usize> {
        let seats = self.trip.crew_capacity(colony);
        if self.phase != CollectPhase::Embarking {
            return Some(seats);
        }
        Some(seats.min(self.trip.available_suits(state, colony)))
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

fn resource_of(kind: MissionKind) -> Resource {
    match kind {
        MissionKind::CollectRegolith => Resource::Regolith,
        _ => Resource::Ice,
    }
}

fn kind_weight(colony: &Colony, person: &Person, config: &SchedulerConfig, weight: f64) -> f64 {
    let Some(home) = person.is_inside_settlement() else {
        return 0.0;
    };
    let Some(rover) = available_rover(colony, home) else {
        return 0.0;
    };
    let manifest = trip_manifest(rover.crew_capacity(), rover.spec.base_speed, rover.spec.fuel_efficiency, &config.missions);
    if !can_supply(colony, home, rover, &manifest, config) {
        return 0.0;
    }
    weight * person.performance()
}

pub fn ice_weight(colony: &Colony, person: &Person, config: &SchedulerConfig) -> f64 {
    kind_weight(colony, person, config, config.missions.collect_ice_weight)
}

pub fn regolith_weight(colony: &Colony, person: &Person, config: &SchedulerConfig) -> f64 {
    kind_weight(colony, person, config, config.missions.collect_regolith_weight)
}

pub fn create_ice(id: MissionId, founder: &AgentId, ctx: &mut TickContext<'_>) -> Option<Mission> {
    create(MissionKind::CollectIce, id, founder, ctx)
}

pub fn create_regolith(id: MissionId, founder: &AgentId, ctx: &mut TickContext<'_>) -> Option<Mission> {
    create(MissionKind::CollectRegolith, id, founder, ctx)
}

fn create(kind: MissionKind, id: MissionId, founder: &AgentId, ctx: &mut TickContext<'_>) -> Option<Mission> {
    let home = ctx.colony.person(founder)?.is_inside_settlement()?.clone();
    let origin = ctx.colony.settlements.get(&home)?.coordinates;
    let mut trip = RoverTrip::reserve(ctx.colony, &home, &id)?;

    let settings = ctx.config;
    let config = &settings.missions;
    let (capacity, speed, efficiency) = match ctx.colony.vehicles.get(trip.vehicle()) {
        Some(rover) => (rover.crew_capacity(), rover.spec.base_speed, rover.spec.fuel_efficiency),
        None => {
            trip.release(&id, ctx);
            return None;
        }
    };
    trip.set_manifest(trip_manifest(capacity, speed, efficiency, config));

    let mut sites = Vec::with_capacity(config.collection_sites);
    let mut previous = origin;
    for _ in 0..config.collection_sites {
        let heading = ctx.rng.draw(std::f64::consts::TAU);
        let site = previous.offset(heading, config.site_distance);
        sites.push(site);
        previous = site;
    }

    let mut state = MissionState::new(id, kind, home, capacity, config.min_members, ctx.now());
    let suits = trip.available_suits(&state, ctx.colony);
    if suits == 0 {
        tracing::debug!(mission = %state.id, "no EVA suits for a crew");
        trip.release(&state.id, ctx);
        return None;
    }
    if suits < capacity {
        state.roster.set_capacity(suits);
    }
    let behavior = CollectMission {
        resource: resource_of(kind),
        phase: CollectPhase::Embarking,
        trip,
        sites,
        site_arrival: ctx.now(),
        site_start_stock: 0.0,
    };
    Some(Mission::new(state, behavior))
}
