//! Sleep
//!
//! Recovers fatigue. Tired colonists want to sleep, and much more so in the
//! dark.

use crate::components::{AgentId, Colony, Person};
use crate::config::SchedulerConfig;
use crate::systems::TickContext;
use crate::tasks::{StepOutcome, Task, TaskBehavior, TaskKind};

#[derive(Debug, Default)]
pub struct Sleep;

pub fn weight(colony: &Colony, person: &Person, config: &SchedulerConfig) -> f64 {
    if person.inside_host().is_none() {
        return 0.0;
    }
    let tasks = &config.tasks;
    if person.condition.fatigue <= tasks.sleep_fatigue_threshold {
        return 0.0;
    }
    let mut weight = tasks.sleep_weight;
    let dark = colony
        .person_coordinates(&person.id)
        .map(|c| colony.sunlight_at(&c) <= 0.0)
        .unwrap_or(false);
    if dark {
        weight += tasks.sleep_night_bonus;
    }
    weight
}

pub fn create(_colony: &Colony, person: &Person, config: &SchedulerConfig) -> Option<Task> {
    person.inside_host()?;
    Some(
        Task::new(TaskKind::Sleep, format!("{} is sleeping", person.name), Sleep)
            .with_duration(config.tasks.sleep_duration),
    )
}

impl TaskBehavior for Sleep {
    fn phase(&self) -> String {
        "Sleeping".to_string()
    }

    fn perform(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>, time: f64) -> StepOutcome {
        let rate = ctx.config.tasks.sleep_recovery_rate;
        if let Some(person) = ctx.person_mut(agent) {
            let condition = &mut person.condition;
            condition.fatigue = (condition.fatigue - rate * time).max(0.0);
            condition.recompute_performance();
        }
        StepOutcome::Continue(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::UniformEnvironment;
    use crate::tasks::test_support::{agent, colony, Harness};

    #[test]
    fn test_sleep_weight_at_night() {
        let mut colony = colony(1);
        colony.environment = Box::new(UniformEnvironment {
            sunlight: 0.0,
            ..UniformEnvironment::default()
        });
        let config = SchedulerConfig::default();

        colony.person_mut(&agent(1)).unwrap().condition.fatigue = 800.0;
        let person = colony.person(&agent(1)).unwrap();
        assert_eq!(weight(&colony, person, &config), 75.0);

        colony.person_mut(&agent(1)).unwrap().condition.fatigue = 250.0;
        let person = colony.person(&agent(1)).unwrap();
        assert_eq!(weight(&colony, person, &config), 0.0);
    }

    #[test]
    fn test_sleep_weight_in_daylight() {
        let mut colony = colony(1);
        colony.person_mut(&agent(1)).unwrap().condition.fatigue = 800.0;
        let person = colony.person(&agent(1)).unwrap();
        assert_eq!(weight(&colony, person, &SchedulerConfig::default()), 25.0);
    }

    #[test]
    fn test_sleep_recovers_fatigue_until_duration() {
        let mut harness = Harness::new(colony(1));
        harness.colony.person_mut(&agent(1)).unwrap().condition.fatigue = 900.0;
        let mut task = {
            let person = harness.colony.person(&agent(1)).unwrap();
            create(&harness.colony, person, &harness.config).unwrap()
        };
        assert!(!task.is_effort_driven());

        let left = task.step(&agent(1), &mut harness.ctx(), 100.0);
        assert_eq!(left, 0.0);
        assert_eq!(harness.colony.person(&agent(1)).unwrap().condition.fatigue, 400.0);

        // 250 msol duration: 150 more is used, the rest comes back
        let left = task.step(&agent(1), &mut harness.ctx(), 200.0);
        assert!(task.is_done());
        assert!((left - 50.0).abs() < 1e-9);
        assert_eq!(harness.colony.person(&agent(1)).unwrap().condition.fatigue, 0.0);
    }
}
