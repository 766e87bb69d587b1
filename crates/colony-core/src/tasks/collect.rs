//! Collect Resources
//!
//! EVA task used by collection missions: go out through the host's airlock,
//! gather ice or regolith into the colonist's hands, come back in and put
//! the load into the host inventory.

use crate::components::{transfer, AgentId, Host, Resource, SkillType};
use crate::systems::TickContext;
use crate::tasks::eva::{check_eva_accident, consume_suit_supplies, should_end_eva_operation};
use crate::tasks::{EvaOperation, EvaPhase, EvaStep, StepOutcome, Task, TaskBehavior, TaskKind};
use crate::EPSILON;

#[derive(Debug)]
pub struct CollectResources {
    eva: EvaOperation,
    resource: Resource,
    /// kg per millisol
    rate: f64,
    quota: f64,
    collected: f64,
}

impl CollectResources {
    pub fn task(host: Host, resource: Resource, quota: f64, rate: f64) -> Task {
        Task::new(
            TaskKind::CollectResources,
            format!("Collecting {} outside {}", resource.name(), host),
            Self {
                eva: EvaOperation::new(host),
                resource,
                rate: rate.max(EPSILON),
                quota: quota.max(0.0),
                collected: 0.0,
            },
        )
    }

    fn collect(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>, time: f64) -> StepOutcome {
        if should_end_eva_operation(ctx.colony, agent, &ctx.config.eva) {
            tracing::debug!(agent = %agent, collected = self.collected, "ending EVA early");
            self.eva.return_to_airlock();
            return StepOutcome::Continue(time);
        }
        check_eva_accident(agent, ctx, time);
        consume_suit_supplies(agent, ctx, time);

        let Some(person) = ctx.person_mut(agent) else {
            return StepOutcome::Done(time);
        };
        let wanted = (self.rate * time).min(self.quota - self.collected);
        let added = person.carried.add(self.resource, wanted.max(0.0));
        self.collected += added;
        let used = (added / self.rate).min(time);
        person.skills.add_experience(SkillType::EvaOperations, used / 100.0);
        person.skills.add_experience(SkillType::Areology, used / 10.0);

        let hands_full = person.carried.remaining_capacity(self.resource) <= EPSILON;
        if self.collected >= self.quota - EPSILON || hands_full {
            self.eva.return_to_airlock();
            return StepOutcome::Continue(time - used);
        }
        StepOutcome::Continue(0.0)
    }

    /// Moves everything carried into the host, once the colonist is inside.
    fn deposit(&self, agent: &AgentId, ctx: &mut TickContext<'_>) {
        let host = self.eva.host().clone();
        let Some((person, inventory)) = ctx.colony.person_and_host_inventory_mut(agent, &host) else {
            return;
        };
        if person.inside_host() != Some(&host) {
            return;
        }
        let carried = person.carried.stored_amount(self.resource);
        let stored = transfer(&mut person.carried, inventory, self.resource, carried);
        if stored > EPSILON {
            tracing::debug!(agent = %agent, resource = self.resource.name(), amount = stored, "samples deposited");
        }
    }
}

impl TaskBehavior for CollectResources {
    fn phase(&self) -> String {
        match self.eva.phase() {
            EvaPhase::ExitingAirlock => "Exiting airlock".to_string(),
            EvaPhase::Outside => format!("Collecting {}", self.resource.name()),
            EvaPhase::EnteringAirlock => "Entering airlock".to_string(),
            EvaPhase::Finished | EvaPhase::Aborted => "Finished".to_string(),
        }
    }

    fn perform(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>, time: f64) -> StepOutcome {
        match self.eva.advance(agent, ctx, time) {
            EvaStep::SubTask(task) => StepOutcome::Spawn { task, remaining: time },
            EvaStep::Outside => self.collect(agent, ctx, time),
            EvaStep::Finished(left) | EvaStep::Aborted(left) => {
                self.deposit(agent, ctx);
                StepOutcome::Done(left)
            }
        }
    }

    fn release(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>) {
        self.eva.release(agent, ctx);
        self.deposit(agent, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Location, UniformEnvironment};
    use crate::tasks::test_support::{agent, colony, home_id, Harness};

    fn home() -> Host {
        Host::Settlement(home_id())
    }

    fn ice_at_home(harness: &Harness) -> f64 {
        harness.colony.settlements[&home_id()]
            .inventory
            .stored_amount(Resource::Ice)
    }

    #[test]
    fn test_full_collection_round_trip() {
        let mut harness = Harness::new(colony(1));
        harness.config.accidents.base_chance = 0.0;
        let mut task = CollectResources::task(home(), Resource::Ice, 3.0, 1.0);

        // exit cycle 5, collect 3, enter cycle 5
        let left = task.step(&agent(1), &mut harness.ctx(), 20.0);
        assert!(task.is_done());
        assert!((left - 7.0).abs() < 1e-9);
        assert!((ice_at_home(&harness) - 1003.0).abs() < 1e-9);

        let person = harness.colony.person(&agent(1)).unwrap();
        assert_eq!(person.location, Location::Inside(home()));
        assert!(person.suit.is_none());
        assert_eq!(person.carried.stored_amount(Resource::Ice), 0.0);
        assert_eq!(harness.colony.settlements[&home_id()].inventory.suits().len(), 4);
    }

    #[test]
    fn test_abandoned_collection_rescues_and_deposits() {
        let mut harness = Harness::new(colony(1));
        harness.config.accidents.base_chance = 0.0;
        let mut task = CollectResources::task(home(), Resource::Ice, 30.0, 1.0);

        task.step(&agent(1), &mut harness.ctx(), 8.0);
        assert!(harness.colony.person(&agent(1)).unwrap().location.is_outside());
        assert!(task.phase().starts_with("Collecting"));

        task.end(&agent(1), &mut harness.ctx());
        let person = harness.colony.person(&agent(1)).unwrap();
        assert_eq!(person.location, Location::Inside(home()));
        assert!((ice_at_home(&harness) - 1003.0).abs() < 1e-9);
    }

    #[test]
    fn test_nightfall_sends_colonist_back() {
        let mut harness = Harness::new(colony(1));
        harness.config.accidents.base_chance = 0.0;
        let mut task = CollectResources::task(home(), Resource::Regolith, 30.0, 1.0);
        task.step(&agent(1), &mut harness.ctx(), 7.0);

        harness.colony.environment = Box::new(UniformEnvironment {
            sunlight: 0.0,
            ..UniformEnvironment::default()
        });
        task.step(&agent(1), &mut harness.ctx(), 10.0);
        assert!(task.is_done());
        let person = harness.colony.person(&agent(1)).unwrap();
        assert!(person.location.is_inside());
        let regolith = harness.colony.settlements[&home_id()]
            .inventory
            .stored_amount(Resource::Regolith);
        assert!((regolith - 1002.0).abs() < 1e-9);
    }
}
