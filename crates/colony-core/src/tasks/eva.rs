//! EVA Protocol
//!
//! [`EvaOperation`] is embedded by any task that works outside. It drives
//! the exit sub-task, reports the outside phase to its owner, and drives the
//! enter sub-task once the owner decides to come back in. Suit gating and
//! the end-of-EVA safety check live here too.

use crate::components::{
    AgentId, Colony, EvaSuit, Host, Inventory, Location, Person,
};
use crate::config::EvaConfig;
use crate::systems::TickContext;
use crate::tasks::{check_for_accident, EnterAirlock, ExitAirlock, HazardousWork, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaPhase {
    ExitingAirlock,
    Outside,
    EnteringAirlock,
    Finished,
    Aborted,
}

/// What the owning task should do next.
pub enum EvaStep {
    /// Run this airlock sub-task
    SubTask(Task),
    /// The colonist is outside; do the owner's outside work
    Outside,
    /// Back inside; the remaining time is unused
    Finished(f64),
    /// The colonist never got out; the remaining time is unused
    Aborted(f64),
}

#[derive(Debug)]
pub struct EvaOperation {
    host: Host,
    phase: EvaPhase,
    exit_started: bool,
}

impl EvaOperation {
    pub fn new(host: Host) -> Self {
        Self {
            host,
            phase: EvaPhase::ExitingAirlock,
            exit_started: false,
        }
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn phase(&self) -> EvaPhase {
        self.phase
    }

    pub fn advance(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>, time: f64) -> EvaStep {
        let Some(location) = ctx.person(agent).map(|p| p.location.clone()) else {
            self.phase = EvaPhase::Aborted;
            return EvaStep::Aborted(time);
        };

        match self.phase {
            EvaPhase::ExitingAirlock => {
                if location.is_outside() {
                    self.phase = EvaPhase::Outside;
                    return EvaStep::Outside;
                }
                if self.exit_started || !can_exit_airlock(ctx.colony, agent, &self.host) {
                    tracing::debug!(agent = %agent, host = %self.host, "could not exit airlock");
                    self.phase = EvaPhase::Aborted;
                    return EvaStep::Aborted(time);
                }
                self.exit_started = true;
                EvaStep::SubTask(ExitAirlock::task(self.host.clone()))
            }
            EvaPhase::Outside => EvaStep::Outside,
            EvaPhase::EnteringAirlock => {
                if location == Location::Inside(self.host.clone()) {
                    self.phase = EvaPhase::Finished;
                    return EvaStep::Finished(time);
                }
                if ctx.colony.airlock(&self.host).is_none() {
                    self.phase = EvaPhase::Aborted;
                    return EvaStep::Aborted(time);
                }
                // keep retrying until back inside
                EvaStep::SubTask(EnterAirlock::task(self.host.clone()))
            }
            EvaPhase::Finished => EvaStep::Finished(time),
            EvaPhase::Aborted => EvaStep::Aborted(time),
        }
    }

    /// Starts the way back in. Only meaningful while outside.
    pub fn return_to_airlock(&mut self) {
        if self.phase == EvaPhase::Outside {
            self.phase = EvaPhase::EnteringAirlock;
        }
    }

    /// Makes sure nobody is left outside or in a chamber when the owning
    /// task ends early.
    pub fn release(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>) {
        let stranded = matches!(
            ctx.person(agent).map(|p| &p.location),
            Some(Location::Outside(_)) | Some(Location::InAirlock(_))
        );
        if !stranded {
            return;
        }
        tracing::warn!(agent = %agent, host = %self.host, "EVA abandoned, returning colonist inside");
        if let Some(airlock) = ctx.colony.airlock_mut(&self.host) {
            airlock.leave(agent);
        }
        if let Some((person, inventory)) = ctx.colony.person_and_host_inventory_mut(agent, &self.host) {
            person.location = Location::Inside(self.host.clone());
            stow_suit(person, inventory);
        }
    }
}

/// A good suit is worn or stowed at `host`, the host has an airlock, and
/// the colonist is inside it.
pub fn can_exit_airlock(colony: &Colony, agent: &AgentId, host: &Host) -> bool {
    let Some(person) = colony.person(agent) else {
        return false;
    };
    let at_host = match &person.location {
        Location::Inside(h) | Location::InAirlock(h) => h == host,
        Location::Outside(_) => false,
    };
    at_host
        && colony.airlock(host).is_some()
        && (person.suit.as_ref().is_some_and(EvaSuit::is_good)
            || colony.host_inventory(host).is_some_and(Inventory::has_good_suit))
}

/// Whether an EVA could start from `host` right now: daylight (or a
/// permanently dark region), a good suit available and a fit colonist.
pub fn can_start_eva(colony: &Colony, person: &Person, host: &Host, config: &EvaConfig) -> bool {
    let Some(coordinates) = colony.host_coordinates(host) else {
        return false;
    };
    let daylight = colony.sunlight_at(&coordinates) > 0.0
        || colony.environment.in_dark_region(&coordinates);
    daylight
        && person.performance() >= config.min_performance
        && person.condition.problem.is_none()
        && can_exit_airlock(colony, &person.id, host)
}

/// True when the colonist outside must head back in.
pub fn should_end_eva_operation(colony: &Colony, agent: &AgentId, config: &EvaConfig) -> bool {
    let Some(person) = colony.person(agent) else {
        return true;
    };
    let Some(coordinates) = colony.person_coordinates(agent) else {
        return true;
    };
    if colony.sunlight_at(&coordinates) <= 0.0 && !colony.environment.in_dark_region(&coordinates) {
        return true;
    }
    let Some(suit) = &person.suit else {
        return true;
    };
    suit.oxygen_fraction() <= config.min_oxygen_fraction
        || suit.water_fraction() <= config.min_water_fraction
        || !suit.life_support_check()
        || suit.malfunctions.has_malfunction()
        || person.performance() < config.min_performance
}

/// Draws breathing and cooling supplies from the worn suit.
pub fn consume_suit_supplies(agent: &AgentId, ctx: &mut TickContext<'_>, time: f64) {
    let oxygen = ctx.config.eva.oxygen_per_millisol * time;
    let water = ctx.config.eva.water_per_millisol * time;
    if let Some(suit) = ctx.person_mut(agent).and_then(|p| p.suit.as_mut()) {
        suit.consume(oxygen, water);
    }
}

/// EVA accident check against the worn suit.
pub fn check_eva_accident(agent: &AgentId, ctx: &mut TickContext<'_>, time: f64) {
    let Some(suit_id) = ctx
        .person(agent)
        .and_then(|p| p.suit.as_ref())
        .map(|s| s.id.clone())
    else {
        return;
    };
    let work = HazardousWork {
        skill: crate::components::SkillType::EvaOperations,
        phase_weight: ctx.config.accidents.eva_phase_weight,
        environment_weight: 1.0,
        entity: &suit_id,
        activity: "EVA",
    };
    if check_for_accident(agent, ctx, &work, time) {
        if let Some(suit) = ctx.person_mut(agent).and_then(|p| p.suit.as_mut()) {
            suit.malfunctions.trigger_accident("on EVA");
        }
    }
}

/// Takes the worn suit off, refills it from `host_inventory` and stows it
/// there. Returns the oxygen and water used to refill.
pub fn stow_suit(person: &mut Person, host_inventory: &mut Inventory) -> (f64, f64) {
    let Some(mut suit) = person.suit.take() else {
        return (0.0, 0.0);
    };
    let refilled = suit.resupply_from(host_inventory);
    host_inventory.store_suit(suit);
    refilled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Malfunction, Resource, UniformEnvironment};
    use crate::tasks::test_support::{agent, colony, home_id, Harness};

    fn home() -> Host {
        Host::Settlement(home_id())
    }

    #[test]
    fn test_can_exit_requires_good_suit() {
        let mut colony = colony(1);
        assert!(can_exit_airlock(&colony, &agent(1), &home()));

        let settlement = colony.settlements.get_mut(&home_id()).unwrap();
        for suit in settlement.inventory.suits_mut() {
            suit.consume(0.5, 0.0);
        }
        assert!(!can_exit_airlock(&colony, &agent(1), &home()));
    }

    #[test]
    fn test_should_end_on_low_oxygen() {
        let mut colony = colony(1);
        let config = EvaConfig::default();
        let person = colony.person_mut(&agent(1)).unwrap();
        person.location = Location::Outside(Default::default());
        person.suit = Some(EvaSuit::new("suit"));
        assert!(!should_end_eva_operation(&colony, &agent(1), &config));

        let person = colony.person_mut(&agent(1)).unwrap();
        person.suit.as_mut().unwrap().consume(0.86, 0.0);
        assert!(should_end_eva_operation(&colony, &agent(1), &config));
    }

    #[test]
    fn test_should_end_on_malfunction_and_missing_suit() {
        let mut colony = colony(1);
        let config = EvaConfig::default();
        let person = colony.person_mut(&agent(1)).unwrap();
        person.location = Location::Outside(Default::default());
        assert!(should_end_eva_operation(&colony, &agent(1), &config));

        let mut suit = EvaSuit::new("suit");
        suit.malfunctions
            .add_malfunction(Malfunction::new("Glove tear", 10, 2.0));
        colony.person_mut(&agent(1)).unwrap().suit = Some(suit);
        assert!(should_end_eva_operation(&colony, &agent(1), &config));
    }

    #[test]
    fn test_should_end_at_night_unless_polar_dark() {
        let mut colony = colony(1);
        colony.environment = Box::new(UniformEnvironment {
            sunlight: 0.0,
            dark: false,
            terrain: 1.0,
        });
        let config = EvaConfig::default();
        let person = colony.person_mut(&agent(1)).unwrap();
        person.location = Location::Outside(Default::default());
        person.suit = Some(EvaSuit::new("suit"));
        assert!(should_end_eva_operation(&colony, &agent(1), &config));

        colony.environment = Box::new(UniformEnvironment {
            sunlight: 0.0,
            dark: true,
            terrain: 1.0,
        });
        assert!(!should_end_eva_operation(&colony, &agent(1), &config));
    }

    #[test]
    fn test_release_returns_stranded_colonist() {
        let mut harness = Harness::new(colony(1));
        {
            let person = harness.colony.person_mut(&agent(1)).unwrap();
            person.location = Location::Outside(Default::default());
            person.suit = Some(EvaSuit::empty("suit_x"));
        }
        let mut eva = EvaOperation::new(home());
        eva.release(&agent(1), &mut harness.ctx());

        let person = harness.colony.person(&agent(1)).unwrap();
        assert_eq!(person.location, Location::Inside(home()));
        assert!(person.suit.is_none());
        let settlement = &harness.colony.settlements[&home_id()];
        assert_eq!(settlement.inventory.suits().len(), 5);
        assert!(settlement.inventory.stored_amount(Resource::Oxygen) < 1000.0);
    }
}
