//! Relax
//!
//! Low-weight idle activity that bleeds off stress.

use crate::components::{AgentId, Colony, Person};
use crate::config::SchedulerConfig;
use crate::systems::TickContext;
use crate::tasks::{StepOutcome, Task, TaskBehavior, TaskKind};

const STRESS_RELIEF_PER_MILLISOL: f64 = 0.1;

#[derive(Debug, Default)]
pub struct Relax;

pub fn weight(_colony: &Colony, person: &Person, config: &SchedulerConfig) -> f64 {
    if person.inside_host().is_some() {
        config.tasks.relax_weight
    } else {
        0.0
    }
}

pub fn create(_colony: &Colony, person: &Person, config: &SchedulerConfig) -> Option<Task> {
    person.inside_host()?;
    Some(
        Task::new(TaskKind::Relax, format!("{} is relaxing", person.name), Relax)
            .with_duration(config.tasks.relax_duration),
    )
}

impl TaskBehavior for Relax {
    fn phase(&self) -> String {
        "Relaxing".to_string()
    }

    fn perform(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>, time: f64) -> StepOutcome {
        if let Some(person) = ctx.person_mut(agent) {
            let condition = &mut person.condition;
            condition.stress = (condition.stress - STRESS_RELIEF_PER_MILLISOL * time).max(0.0);
            condition.recompute_performance();
        }
        StepOutcome::Continue(0.0)
    }
}
