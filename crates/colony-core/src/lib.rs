//! Colony Scheduling Core
//!
//! Decides, tick by tick, what each colonist does: weighted task selection,
//! resumable phase-based tasks with nested sub-tasks, the EVA airlock
//! protocol, multi-person rover missions, and the reservation discipline
//! for shared vehicles, airlocks, garages, laboratories and medical aids.
//!
//! # Modules
//!
//! - [`components`]: colonists, skills, inventories, suits, vehicles, settlements, reservations
//! - [`tasks`]: the task core, EVA protocol, accident utility and every task kind
//! - [`missions`]: mission core, rover trips, mission kinds and the mission registry
//! - [`systems`]: tick context, task selector, mind, needs and the simulation driver
//! - [`events`]: JSONL event logging
//! - [`setup`]: default colony construction
//! - [`output`]: display snapshots and run statistics

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod missions;
pub mod output;
pub mod setup;
pub mod systems;
pub mod tasks;

pub use config::SchedulerConfig;
pub use error::{ColonyError, ConfigError};
pub use systems::{Mind, Simulation, TaskManager, TaskRegistry, TickContext};

/// Tolerance used when comparing simulated time and resource amounts.
pub const EPSILON: f64 = 1e-9;

/// Seeded random number source shared by selection and accident checks.
#[derive(Debug, Clone)]
pub struct SimRng(pub SmallRng);

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }

    /// Uniform value in `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        self.0.gen::<f64>()
    }

    /// Uniform value in `[0, total)`; 0 when `total` is not positive.
    pub fn draw(&mut self, total: f64) -> f64 {
        if total > 0.0 && total.is_finite() {
            self.uniform() * total
        } else {
            0.0
        }
    }

    /// True with the given probability.
    pub fn chance(&mut self, probability: f64) -> bool {
        probability > 0.0 && self.uniform() < probability
    }

    /// Uniform integer in `[low, high]`.
    pub fn range_inclusive(&mut self, low: u32, high: u32) -> u32 {
        if high <= low {
            return low;
        }
        self.0.gen_range(low..=high)
    }
}
