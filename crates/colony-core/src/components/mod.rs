//! Colony Components
//!
//! Colonists, skills, inventories, suits, vehicles, settlements and the
//! reservation primitives embedded in shared resources.

pub mod agent;
pub mod airlock;
pub mod equipment;
pub mod inventory;
pub mod malfunction;
pub mod reservation;
pub mod settlement;
pub mod skills;
pub mod vehicle;
pub mod world;

pub use agent::*;
pub use airlock::*;
pub use equipment::*;
pub use inventory::*;
pub use malfunction::*;
pub use reservation::*;
pub use settlement::*;
pub use skills::*;
pub use vehicle::*;
pub use world::*;
