//! Eat Meal
//!
//! Eats from the food stock of the host the colonist is inside. A short
//! stock means a smaller meal, not a failed one.

use crate::components::{AgentId, Colony, Host, Person, Resource};
use crate::config::SchedulerConfig;
use crate::systems::TickContext;
use crate::tasks::{StepOutcome, Task, TaskBehavior, TaskKind};
use crate::EPSILON;

#[derive(Debug)]
pub struct EatMeal {
    host: Host,
}

pub fn weight(colony: &Colony, person: &Person, config: &SchedulerConfig) -> f64 {
    let Some(host) = person.inside_host() else {
        return 0.0;
    };
    let tasks = &config.tasks;
    let hunger = person.condition.hunger;
    if hunger <= tasks.hunger_threshold {
        return 0.0;
    }
    let has_food = colony
        .host_inventory(host)
        .is_some_and(|inv| inv.stored_amount(Resource::Food) > EPSILON);
    if !has_food {
        return 0.0;
    }
    ((hunger - tasks.hunger_threshold) * tasks.eat_weight_per_hunger).min(tasks.eat_max_weight)
}

pub fn create(_colony: &Colony, person: &Person, config: &SchedulerConfig) -> Option<Task> {
    let host = person.inside_host()?.clone();
    Some(
        Task::new(
            TaskKind::EatMeal,
            format!("{} is eating a meal", person.name),
            EatMeal { host },
        )
        .with_duration(config.tasks.eat_duration),
    )
}

impl TaskBehavior for EatMeal {
    fn phase(&self) -> String {
        "Eating".to_string()
    }

    fn perform(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>, time: f64) -> StepOutcome {
        let wanted = ctx.config.tasks.food_per_millisol * time;
        let recovery = ctx.config.tasks.hunger_recovery_rate * time;
        let Some((person, inventory)) = ctx.colony.person_and_host_inventory_mut(agent, &self.host) else {
            return StepOutcome::Done(time);
        };
        let eaten = inventory.remove(Resource::Food, wanted);
        if eaten <= EPSILON {
            tracing::debug!(agent = %agent, host = %self.host, "no food left");
            return StepOutcome::Done(time);
        }
        let condition = &mut person.condition;
        condition.hunger = (condition.hunger - recovery * eaten / wanted).max(0.0);
        condition.recompute_performance();
        StepOutcome::Continue(0.0)
    }
}
