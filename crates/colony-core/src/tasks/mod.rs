//! Tasks
//!
//! A [`Task`] is the shared core (name, description, timing, sub-task,
//! termination) wrapped around a kind-specific [`TaskBehavior`] that runs
//! one phase at a time. Stepping delegates to a live sub-task first; only
//! when the chain is finished does the task advance its own phase.
//!
//! Behaviors return a [`StepOutcome`] from each phase call:
//! - `Continue(left)`: still running; `left` unused time may feed the next phase
//! - `Spawn { task, remaining }`: push a sub-task and hand it the remaining time
//! - `Done(left)`: finished; resources are released right away
//!
//! Waiting is a phase that consumes the whole budget with `Continue(0.0)`.

use colony_events::{EventKind, TaskSnapshot};
use std::fmt;

use crate::components::AgentId;
use crate::systems::TickContext;
use crate::EPSILON;

pub mod accident;
pub mod airlock;
pub mod collect;
pub mod drive;
pub mod eat;
pub mod eva;
pub mod load;
pub mod maintenance;
pub mod medical;
pub mod relax;
pub mod repair;
pub mod research;
pub mod sleep;

pub use accident::{accident_chance, check_for_accident, skill_modifier, HazardousWork};
pub use airlock::{EnterAirlock, ExitAirlock};
pub use collect::CollectResources;
pub use drive::DriveVehicle;
pub use eat::EatMeal;
pub use eva::{EvaOperation, EvaPhase, EvaStep};
pub use load::{LoadVehicle, SupplyManifest, UnloadVehicle};
pub use maintenance::MaintainVehicle;
pub use medical::ReceiveTreatment;
pub use relax::Relax;
pub use repair::RepairMalfunction;
pub use research::Research;
pub use sleep::Sleep;

/// Upper bound on phase transitions within one step.
const MAX_PHASE_ITERATIONS: usize = 32;

/// The closed set of task kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Sleep,
    EatMeal,
    Relax,
    Research,
    ReceiveTreatment,
    MaintainVehicle,
    RepairMalfunction,
    CollectResources,
    ExitAirlock,
    EnterAirlock,
    LoadVehicle,
    UnloadVehicle,
    DriveVehicle,
}

impl TaskKind {
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::Sleep => "Sleep",
            TaskKind::EatMeal => "Eat Meal",
            TaskKind::Relax => "Relax",
            TaskKind::Research => "Research",
            TaskKind::ReceiveTreatment => "Receive Treatment",
            TaskKind::MaintainVehicle => "Maintain Vehicle",
            TaskKind::RepairMalfunction => "Repair Malfunction",
            TaskKind::CollectResources => "Collect Resources",
            TaskKind::ExitAirlock => "Exit Airlock",
            TaskKind::EnterAirlock => "Enter Airlock",
            TaskKind::LoadVehicle => "Load Vehicle",
            TaskKind::UnloadVehicle => "Unload Vehicle",
            TaskKind::DriveVehicle => "Drive Vehicle",
        }
    }

    /// Effort-driven tasks run at the colonist's performance rating.
    pub fn is_effort_driven(&self) -> bool {
        !matches!(
            self,
            TaskKind::Sleep | TaskKind::EatMeal | TaskKind::Relax | TaskKind::ReceiveTreatment
        )
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one phase call.
pub enum StepOutcome {
    Continue(f64),
    Spawn { task: Task, remaining: f64 },
    Done(f64),
}

/// Kind-specific phase logic behind the shared task core.
pub trait TaskBehavior: fmt::Debug {
    /// Display name of the current phase.
    fn phase(&self) -> String;

    /// Runs the current phase for up to `time` millisols.
    fn perform(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>, time: f64) -> StepOutcome;

    /// Gives back every reservation still held. Called exactly once when
    /// the task ends, on every path.
    fn release(&mut self, _agent: &AgentId, _ctx: &mut TickContext<'_>) {}
}

#[derive(Debug)]
pub struct Task {
    kind: TaskKind,
    description: String,
    duration: Option<f64>,
    completed_time: f64,
    done: bool,
    sub_task: Option<Box<Task>>,
    behavior: Box<dyn TaskBehavior>,
}

impl Task {
    pub fn new(
        kind: TaskKind,
        description: impl Into<String>,
        behavior: impl TaskBehavior + 'static,
    ) -> Self {
        Self {
            kind,
            description: description.into(),
            duration: None,
            completed_time: 0.0,
            done: false,
            sub_task: None,
            behavior: Box::new(behavior),
        }
    }

    /// Ends the task once `duration` millisols of work are done.
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration.max(0.0));
        self
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn phase(&self) -> String {
        self.behavior.phase()
    }

    pub fn is_effort_driven(&self) -> bool {
        self.kind.is_effort_driven()
    }

    pub fn completed_time(&self) -> f64 {
        self.completed_time
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn sub_task(&self) -> Option<&Task> {
        self.sub_task.as_deref()
    }

    /// The task actually being stepped: the deepest live sub-task.
    pub fn innermost(&self) -> &Task {
        match &self.sub_task {
            Some(sub) => sub.innermost(),
            None => self,
        }
    }

    /// Advances the task by up to `time` millisols and returns the unused
    /// remainder.
    pub fn step(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>, time: f64) -> f64 {
        if self.done {
            return time.max(0.0);
        }
        if ctx.performance(agent) <= 0.0 {
            tracing::debug!(agent = %agent, task = self.name(), "colonist incapacitated, ending task");
            self.end(agent, ctx);
            return time.max(0.0);
        }

        let mut remaining = time.max(0.0);
        for _ in 0..MAX_PHASE_ITERATIONS {
            if self.done || remaining <= EPSILON {
                break;
            }

            if let Some(sub) = self.sub_task.as_mut() {
                remaining = sub.step(agent, ctx, remaining);
                if !sub.is_done() {
                    break;
                }
                self.sub_task = None;
                continue;
            }

            let usable = match self.duration {
                Some(duration) => remaining.min((duration - self.completed_time).max(0.0)),
                None => remaining,
            };
            let beyond_duration = remaining - usable;
            let phase_before = self.behavior.phase();

            let progressed = match self.behavior.perform(agent, ctx, usable) {
                StepOutcome::Continue(left) => {
                    let left = left.clamp(0.0, usable);
                    self.completed_time += usable - left;
                    remaining = left + beyond_duration;
                    if self.duration_reached() {
                        self.end(agent, ctx);
                    }
                    usable - left > EPSILON || self.behavior.phase() != phase_before
                }
                StepOutcome::Spawn { task, remaining: left } => {
                    let left = left.clamp(0.0, usable);
                    self.completed_time += usable - left;
                    remaining = left + beyond_duration;
                    tracing::debug!(agent = %agent, task = self.name(), sub_task = task.name(), "sub-task started");
                    self.sub_task = Some(Box::new(task));
                    true
                }
                StepOutcome::Done(left) => {
                    let left = left.clamp(0.0, usable);
                    self.completed_time += usable - left;
                    remaining = left + beyond_duration;
                    self.end(agent, ctx);
                    false
                }
            };

            if self.behavior.phase() != phase_before {
                tracing::debug!(
                    agent = %agent,
                    task = self.name(),
                    from = %phase_before,
                    to = %self.behavior.phase(),
                    "task phase changed"
                );
            }
            if !progressed {
                break;
            }
        }
        remaining
    }

    fn duration_reached(&self) -> bool {
        matches!(self.duration, Some(d) if self.completed_time >= d - EPSILON)
    }

    /// Terminates the task and its sub-task chain, releasing every
    /// reservation. Idempotent.
    pub fn end(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>) {
        if let Some(mut sub) = self.sub_task.take() {
            sub.end(agent, ctx);
        }
        if !self.done {
            self.behavior.release(agent, ctx);
            self.done = true;
            tracing::debug!(agent = %agent, task = self.name(), "task ended");
        }
    }

    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            name: self.name().to_string(),
            phase: self.phase(),
            description: self.description.clone(),
            sub_task: self.sub_task.as_ref().map(|sub| Box::new(sub.snapshot())),
        }
    }
}

/// Emits the display event for a task that has just ended.
pub(crate) fn emit_task_ended(ctx: &mut TickContext<'_>, agent: &AgentId, task: &Task) {
    ctx.emit(
        Some(agent),
        EventKind::TaskEnded {
            task: task.name().to_string(),
        },
    );
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Small colonies for task and mission tests.

    use colony_events::SimEvent;

    use crate::components::{
        AgentId, Airlock, Colony, Coordinates, EvaSuit, Laboratory, MedicalAid, Person, Resource,
        Rover, RoverSpec, Settlement, SettlementId, UniformEnvironment, VehicleId,
    };
    use crate::config::SchedulerConfig;
    use crate::systems::TickContext;
    use crate::SimRng;

    pub const HOME: &str = "settlement_01";
    pub const ROVER: &str = "rover_01";

    pub fn home_id() -> SettlementId {
        SettlementId(HOME.into())
    }

    pub fn rover_id() -> VehicleId {
        VehicleId(ROVER.into())
    }

    pub fn agent(n: u32) -> AgentId {
        AgentId(format!("agent_{:04}", n))
    }

    /// One settlement with stock, suits, a lab, a medical aid, a garage
    /// bay and one parked rover, plus `people` colonists inside.
    pub fn colony(people: u32) -> Colony {
        let mut colony = Colony::new(Box::new(UniformEnvironment::default()));
        let mut settlement = Settlement::new(
            home_id(),
            "Alpha Base",
            0,
            Coordinates::new(0.0, 0.0),
            Airlock::new(2, 5.0),
        );
        for resource in Resource::ALL {
            settlement.inventory.set_capacity(resource, 10_000.0);
            settlement.inventory.add(resource, 1_000.0);
        }
        for i in 0..4 {
            settlement.inventory.store_suit(EvaSuit::new(format!("suit_{:02}", i)));
        }
        settlement.laboratories.push(Laboratory::new("Lab", 1));
        settlement.medical_aids.push(MedicalAid::new("Bed"));
        settlement.garage = crate::components::Garage::new(1);
        colony.add_settlement(settlement).unwrap();

        let mut rover = Rover::new(rover_id(), "Explorer", RoverSpec::default(), 5.0);
        for i in 0..2 {
            rover.inventory.store_suit(EvaSuit::new(format!("rover_suit_{:02}", i)));
        }
        colony.add_vehicle(rover, &home_id()).unwrap();

        for n in 1..=people {
            colony
                .add_person(Person::new(agent(n), format!("Colonist {}", n), home_id()))
                .unwrap();
        }
        colony
    }

    /// Owned pieces of a [`TickContext`].
    pub struct Harness {
        pub colony: Colony,
        pub rng: SimRng,
        pub config: SchedulerConfig,
        pub events: Vec<SimEvent>,
    }

    impl Harness {
        pub fn new(colony: Colony) -> Self {
            Self {
                colony,
                rng: SimRng::seeded(7),
                config: SchedulerConfig::default(),
                events: Vec::new(),
            }
        }

        pub fn ctx(&mut self) -> TickContext<'_> {
            TickContext::new(&mut self.colony, &mut self.rng, &self.config, &mut self.events)
        }
    }
}
