//! Repair Malfunction
//!
//! Works off malfunctions of the settlement or rover the colonist is inside,
//! oldest first.

use crate::components::{AgentId, Colony, Host, Person, SkillType};
use crate::config::SchedulerConfig;
use crate::systems::TickContext;
use crate::tasks::{check_for_accident, HazardousWork, StepOutcome, Task, TaskBehavior, TaskKind};

#[derive(Debug)]
pub struct RepairMalfunction {
    host: Host,
}

impl RepairMalfunction {
    /// Repair task for a specific host, used by missions for their rover.
    pub fn task(colony: &Colony, host: Host) -> Task {
        let name = colony.host_name(&host);
        Task::new(
            TaskKind::RepairMalfunction,
            format!("Repairing {}", name),
            RepairMalfunction { host },
        )
    }
}

fn damaged_host<'a>(colony: &Colony, person: &'a Person) -> Option<&'a Host> {
    let host = person.inside_host()?;
    colony
        .host_malfunctions(host)
        .is_some_and(|m| m.has_malfunction())
        .then_some(host)
}

pub fn weight(colony: &Colony, person: &Person, config: &SchedulerConfig) -> f64 {
    match damaged_host(colony, person) {
        Some(_) => config.tasks.repair_weight * person.performance(),
        None => 0.0,
    }
}

pub fn create(colony: &Colony, person: &Person, _config: &SchedulerConfig) -> Option<Task> {
    let host = damaged_host(colony, person)?.clone();
    Some(RepairMalfunction::task(colony, host))
}

impl TaskBehavior for RepairMalfunction {
    fn phase(&self) -> String {
        "Repairing".to_string()
    }

    fn perform(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>, time: f64) -> StepOutcome {
        let Some(wear) = ctx
            .colony
            .host_malfunctions(&self.host)
            .filter(|m| m.has_malfunction())
            .map(|m| m.wear_accident_modifier())
        else {
            return StepOutcome::Done(time);
        };

        let entity = self.host.to_string();
        let work = HazardousWork {
            skill: SkillType::Mechanics,
            phase_weight: ctx.config.accidents.repair_phase_weight,
            environment_weight: wear,
            entity: &entity,
            activity: "repair",
        };
        if check_for_accident(agent, ctx, &work, time) {
            if let Some(malfunctions) = ctx.colony.host_malfunctions_mut(&self.host) {
                malfunctions.trigger_accident("repairing");
            }
        }

        let Some(malfunctions) = ctx.colony.host_malfunctions_mut(&self.host) else {
            return StepOutcome::Done(time);
        };
        let left = malfunctions.add_repair_work(time);
        let finished = !malfunctions.has_malfunction();
        if let Some(person) = ctx.person_mut(agent) {
            person.skills.add_experience(SkillType::Mechanics, (time - left) / 10.0);
        }
        if finished {
            tracing::debug!(agent = %agent, host = %self.host, "all malfunctions repaired");
            return StepOutcome::Done(left);
        }
        StepOutcome::Continue(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Malfunction;
    use crate::tasks::test_support::{agent, colony, home_id, Harness};

    fn home() -> Host {
        Host::Settlement(home_id())
    }

    #[test]
    fn test_no_malfunction_no_weight() {
        let colony = colony(1);
        let person = colony.person(&agent(1)).unwrap();
        assert_eq!(weight(&colony, person, &SchedulerConfig::default()), 0.0);
        assert!(create(&colony, person, &SchedulerConfig::default()).is_none());
    }

    #[test]
    fn test_repair_clears_malfunctions_and_returns_leftover() {
        let mut harness = Harness::new(colony(1));
        harness.config.accidents.base_chance = 0.0;
        harness
            .colony
            .host_malfunctions_mut(&home())
            .unwrap()
            .add_malfunction(Malfunction::new("Heater fault", 30, 25.0));
        let mut task = {
            let person = harness.colony.person(&agent(1)).unwrap();
            assert_eq!(weight(&harness.colony, person, &harness.config), 50.0);
            create(&harness.colony, person, &harness.config).unwrap()
        };

        assert_eq!(task.step(&agent(1), &mut harness.ctx(), 20.0), 0.0);
        assert!(!task.is_done());
        let left = task.step(&agent(1), &mut harness.ctx(), 20.0);
        assert!(task.is_done());
        assert!((left - 15.0).abs() < 1e-9);
        assert!(!harness.colony.host_malfunctions(&home()).unwrap().has_malfunction());
    }
}
