//! Mind
//!
//! Per-colonist decision loop. Each tick the mind keeps the current task
//! running; once the colonist is free it asks their mission for work, and
//! failing that draws between a new task, a new mission and joining an
//! open mission.

use colony_events::TaskSnapshot;

use crate::components::AgentId;
use crate::missions::{MissionId, MissionRegistry};
use crate::systems::{TaskManager, TaskRegistry, TickContext};
use crate::tasks::Task;
use crate::EPSILON;

/// Bound on task and mission starts within one tick.
const MAX_ACTION_DEPTH: usize = 4;

#[derive(Debug)]
pub struct Mind {
    agent: AgentId,
    task_manager: TaskManager,
    mission: Option<MissionId>,
}

impl Mind {
    pub fn new(agent: AgentId) -> Self {
        Self {
            agent,
            task_manager: TaskManager::new(),
            mission: None,
        }
    }

    pub fn agent(&self) -> &AgentId {
        &self.agent
    }

    pub fn mission(&self) -> Option<&MissionId> {
        self.mission.as_ref()
    }

    pub fn task_manager(&self) -> &TaskManager {
        &self.task_manager
    }

    pub fn task_snapshot(&self) -> Option<TaskSnapshot> {
        self.task_manager.snapshot()
    }

    /// Spends `time` millisols of the colonist's tick.
    pub fn advance(
        &mut self,
        ctx: &mut TickContext<'_>,
        missions: &mut MissionRegistry,
        tasks: &TaskRegistry,
        time: f64,
    ) {
        self.take_action(ctx, missions, tasks, time, 0);
    }

    fn take_action(
        &mut self,
        ctx: &mut TickContext<'_>,
        missions: &mut MissionRegistry,
        tasks: &TaskRegistry,
        time: f64,
        depth: usize,
    ) {
        if time <= EPSILON || depth >= MAX_ACTION_DEPTH {
            return;
        }
        let agent = self.agent.clone();
        let performance = ctx.performance(&agent);

        if self.task_manager.has_active_task() {
            let left = self.task_manager.execute_task(&agent, ctx, time, performance);
            if !self.task_manager.has_active_task() && left > EPSILON {
                self.take_action(ctx, missions, tasks, left, depth + 1);
            }
            return;
        }

        self.refresh_mission(missions);
        if let Some(id) = self.mission.clone() {
            if let Some(task) = missions.perform_mission(&id, &agent, ctx) {
                self.start(ctx, missions, tasks, task, time, depth);
                return;
            }
            self.refresh_mission(missions);
            if self.mission.is_some() {
                // nothing from the mission this tick; fill in with own tasks
                if let Some(task) = self.draw_task(ctx, tasks) {
                    self.start(ctx, missions, tasks, task, time, depth);
                }
                return;
            }
        }

        let Some(person) = ctx.colony.person(&agent) else {
            return;
        };
        let task_weight = tasks.total_weight(ctx.colony, person, ctx.config);
        let (new_weight, join_weight) = if performance >= ctx.config.missions.min_performance {
            (
                missions.new_mission_total_weight(ctx.colony, person, ctx.config),
                missions.active_mission_total_weight(ctx.colony, person, ctx.config),
            )
        } else {
            (0.0, 0.0)
        };
        let total = task_weight + new_weight + join_weight;
        if total <= EPSILON {
            return;
        }

        let draw = ctx.rng.draw(total);
        if draw < task_weight {
            let task = tasks.select_and_instantiate(ctx.colony, person, ctx.config, task_weight, ctx.rng);
            if let Some(task) = task {
                self.start(ctx, missions, tasks, task, time, depth);
            }
        } else if draw < task_weight + new_weight {
            if let Some(id) = missions.instantiate_new_mission(&agent, ctx, new_weight) {
                self.mission = Some(id);
                self.take_action(ctx, missions, tasks, time, depth + 1);
            }
        } else if let Some(id) = missions.pick_active_mission(&agent, ctx, join_weight) {
            self.mission = Some(id);
            self.take_action(ctx, missions, tasks, time, depth + 1);
        }
    }

    fn draw_task(&self, ctx: &mut TickContext<'_>, tasks: &TaskRegistry) -> Option<Task> {
        let person = ctx.colony.person(&self.agent)?;
        let total = tasks.total_weight(ctx.colony, person, ctx.config);
        tasks.select_and_instantiate(ctx.colony, person, ctx.config, total, ctx.rng)
    }

    fn start(
        &mut self,
        ctx: &mut TickContext<'_>,
        missions: &mut MissionRegistry,
        tasks: &TaskRegistry,
        task: Task,
        time: f64,
        depth: usize,
    ) {
        let agent = self.agent.clone();
        self.task_manager.assign_task(&agent, ctx, task);
        self.take_action(ctx, missions, tasks, time, depth + 1);
    }

    /// Drops a mission reference that is done, gone, or no longer lists
    /// this colonist.
    fn refresh_mission(&mut self, missions: &MissionRegistry) {
        let Some(id) = &self.mission else {
            return;
        };
        let still_member = missions
            .get(id)
            .is_some_and(|m| !m.is_done() && m.has_member(&self.agent));
        if !still_member {
            tracing::debug!(agent = %self.agent, mission = %id, "mission reference cleared");
            self.mission = None;
        }
    }

    /// Ends whatever the colonist is doing.
    pub fn abandon_task(&mut self, ctx: &mut TickContext<'_>) {
        let agent = self.agent.clone();
        self.task_manager.end_task(&agent, ctx);
    }

    /// Ends the current task and forgets the mission.
    pub fn abandon(&mut self, ctx: &mut TickContext<'_>) {
        self.abandon_task(ctx);
        self.mission = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Colony, MedicalProblem, Person};
    use crate::config::SchedulerConfig;
    use crate::missions::{collect, MissionKind};
    use crate::tasks::test_support::{agent, colony, Harness};

    fn always(_: &Colony, _: &Person, _: &SchedulerConfig) -> f64 {
        1.0
    }

    fn ice_only() -> MissionRegistry {
        let mut missions = MissionRegistry::new();
        missions.register(MissionKind::CollectIce, always, collect::create_ice);
        missions
    }

    #[test]
    fn test_idle_colonist_picks_a_task() {
        let mut harness = Harness::new(colony(1));
        let mut missions = MissionRegistry::new();
        let tasks = TaskRegistry::standard();
        let mut mind = Mind::new(agent(1));

        mind.advance(&mut harness.ctx(), &mut missions, &tasks, 10.0);
        assert!(harness.events.iter().any(|e| e.kind.name() == "task_started"));
        assert!(mind.mission().is_none());
    }

    #[test]
    fn test_no_missions_below_performance_threshold() {
        let mut harness = Harness::new(colony(1));
        let mut missions = ice_only();
        let tasks = TaskRegistry::new();
        let mut mind = Mind::new(agent(1));

        harness
            .colony
            .person_mut(&agent(1))
            .unwrap()
            .condition
            .set_problem(Some(MedicalProblem::new("Flu", 60, 100.0)));
        mind.advance(&mut harness.ctx(), &mut missions, &tasks, 10.0);
        assert!(mind.mission().is_none());
        assert!(missions.is_empty());

        harness.colony.person_mut(&agent(1)).unwrap().condition.set_problem(None);
        mind.advance(&mut harness.ctx(), &mut missions, &tasks, 10.0);
        assert_eq!(mind.mission().map(|id| id.0.as_str()), Some("00-001"));
        // the founder goes straight to loading the rover
        assert!(harness.events.iter().any(|e| matches!(
            &e.kind,
            colony_events::EventKind::TaskStarted { task } if task == "Load Vehicle"
        )));
    }

    #[test]
    fn test_finished_mission_reference_is_cleared() {
        let mut harness = Harness::new(colony(1));
        let mut missions = ice_only();
        let tasks = TaskRegistry::new();
        let mut mind = Mind::new(agent(1));

        mind.advance(&mut harness.ctx(), &mut missions, &tasks, 10.0);
        let first = mind.mission().cloned().unwrap();
        missions.get_mut(&first).unwrap().end("test", &mut harness.ctx());
        mind.abandon_task(&mut harness.ctx());

        mind.advance(&mut harness.ctx(), &mut missions, &tasks, 10.0);
        assert_ne!(mind.mission(), Some(&first));
        assert!(missions.get(&first).is_none());
    }
}
