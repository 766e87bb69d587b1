//! Scheduler Systems
//!
//! The per-tick machinery: the context handed to tasks and missions, task
//! selection, the per-colonist mind, passive needs and the simulation
//! driver that runs them in order.

pub mod context;
pub mod mind;
pub mod needs;
pub mod scheduler;
pub mod selector;

pub use context::TickContext;
pub use mind::Mind;
pub use needs::update_needs;
pub use scheduler::Simulation;
pub use selector::{TaskFactory, TaskKindEntry, TaskManager, TaskRegistry, TaskWeightFn};
