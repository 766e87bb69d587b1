//! Task Selection
//!
//! [`TaskRegistry`] is the explicit table of `{weight, factory}` pairs for
//! every task kind a colonist can pick on their own. [`TaskManager`] owns a
//! colonist's current task and runs it with effort scaling.

use colony_events::{EventKind, TaskSnapshot};

use crate::components::{AgentId, Colony, Person};
use crate::config::SchedulerConfig;
use crate::systems::TickContext;
use crate::tasks::{self, emit_task_ended, Task, TaskKind};
use crate::{SimRng, EPSILON};

/// Desirability of a task kind for a colonist right now.
pub type TaskWeightFn = fn(&Colony, &Person, &SchedulerConfig) -> f64;

/// Builds a task of the kind, or `None` if it cannot be started after all.
pub type TaskFactory = fn(&Colony, &Person, &SchedulerConfig) -> Option<Task>;

#[derive(Debug, Clone, Copy)]
pub struct TaskKindEntry {
    pub kind: TaskKind,
    pub weight: TaskWeightFn,
    pub factory: TaskFactory,
}

/// Weights that are negative, NaN or infinite count as zero.
fn sanitize(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    entries: Vec<TaskKindEntry>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every self-selected task kind, in a fixed order.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(TaskKind::Sleep, tasks::sleep::weight, tasks::sleep::create);
        registry.register(TaskKind::EatMeal, tasks::eat::weight, tasks::eat::create);
        registry.register(TaskKind::Relax, tasks::relax::weight, tasks::relax::create);
        registry.register(TaskKind::Research, tasks::research::weight, tasks::research::create);
        registry.register(
            TaskKind::ReceiveTreatment,
            tasks::medical::weight,
            tasks::medical::create,
        );
        registry.register(
            TaskKind::MaintainVehicle,
            tasks::maintenance::weight,
            tasks::maintenance::create,
        );
        registry.register(
            TaskKind::RepairMalfunction,
            tasks::repair::weight,
            tasks::repair::create,
        );
        registry
    }

    pub fn register(&mut self, kind: TaskKind, weight: TaskWeightFn, factory: TaskFactory) {
        self.entries.push(TaskKindEntry { kind, weight, factory });
    }

    pub fn entries(&self) -> &[TaskKindEntry] {
        &self.entries
    }

    pub fn total_weight(&self, colony: &Colony, person: &Person, config: &SchedulerConfig) -> f64 {
        self.entries
            .iter()
            .map(|entry| sanitize((entry.weight)(colony, person, config)))
            .sum()
    }

    /// The kind whose cumulative weight range contains `draw`. A draw at or
    /// past the total falls to the last kind with positive weight.
    pub fn select_kind(
        &self,
        colony: &Colony,
        person: &Person,
        config: &SchedulerConfig,
        draw: f64,
    ) -> Option<TaskKindEntry> {
        let mut cumulative = 0.0;
        let mut last_positive = None;
        for entry in &self.entries {
            let weight = sanitize((entry.weight)(colony, person, config));
            if weight <= 0.0 {
                continue;
            }
            cumulative += weight;
            last_positive = Some(*entry);
            if draw < cumulative {
                return Some(*entry);
            }
        }
        last_positive
    }

    /// Draws a kind in `[0, total)` and instantiates it.
    pub fn select_and_instantiate(
        &self,
        colony: &Colony,
        person: &Person,
        config: &SchedulerConfig,
        total: f64,
        rng: &mut SimRng,
    ) -> Option<Task> {
        if total <= EPSILON {
            return None;
        }
        let draw = rng.draw(total);
        let entry = self.select_kind(colony, person, config, draw)?;
        let task = (entry.factory)(colony, person, config);
        if task.is_none() {
            tracing::debug!(agent = %person.id, kind = %entry.kind, "task could not be created");
        }
        task
    }
}

/// A colonist's current task.
#[derive(Debug, Default)]
pub struct TaskManager {
    current: Option<Task>,
    last_task: Option<&'static str>,
}

impl TaskManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_active_task(&self) -> bool {
        self.current.as_ref().is_some_and(|t| !t.is_done())
    }

    pub fn current(&self) -> Option<&Task> {
        self.current.as_ref()
    }

    pub fn last_task(&self) -> Option<&'static str> {
        self.last_task
    }

    /// Replaces the current task, ending the old one first.
    pub fn assign_task(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>, task: Task) {
        self.end_task(agent, ctx);
        tracing::debug!(agent = %agent, task = task.name(), description = task.description(), "task started");
        ctx.emit(
            Some(agent),
            EventKind::TaskStarted {
                task: task.name().to_string(),
            },
        );
        self.current = Some(task);
    }

    /// Runs the current task for `time` millisols of wall time. Effort-driven
    /// tasks get `time * performance` of work; the unused work is scaled
    /// back to wall time before it is returned.
    pub fn execute_task(
        &mut self,
        agent: &AgentId,
        ctx: &mut TickContext<'_>,
        time: f64,
        performance: f64,
    ) -> f64 {
        let Some(task) = self.current.as_mut() else {
            return time;
        };
        let efficiency = if task.is_effort_driven() {
            performance.clamp(0.0, 1.0)
        } else {
            1.0
        };
        if efficiency <= EPSILON {
            self.end_task(agent, ctx);
            return time;
        }

        let budget = time * efficiency;
        let returned = task.step(agent, ctx, budget);
        let left = if returned.is_finite() && returned >= 0.0 && returned <= budget + EPSILON {
            returned.min(budget)
        } else {
            tracing::warn!(agent = %agent, task = task.name(), returned, budget, "task returned invalid leftover time");
            0.0
        };

        if task.is_done() {
            self.finish(agent, ctx);
        }
        left / efficiency
    }

    /// Ends the current task, releasing everything it holds.
    pub fn end_task(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>) {
        if let Some(task) = self.current.as_mut() {
            task.end(agent, ctx);
            self.finish(agent, ctx);
        }
    }

    fn finish(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>) {
        if let Some(task) = self.current.take() {
            emit_task_ended(ctx, agent, &task);
            self.last_task = Some(task.name());
        }
    }

    pub fn snapshot(&self) -> Option<TaskSnapshot> {
        self.current.as_ref().map(Task::snapshot)
    }
}
