//! Shared event types and serialization for the colony scheduler.
//!
//! This crate contains pure data structures with no simulation logic:
//! the simulated Mars clock, the events emitted for the display layer and
//! the read-only snapshots it renders from.

pub mod event;
pub mod snapshot;
pub mod timestamp;

// Re-export timestamp types
pub use timestamp::{MarsClock, ParseClockError, MILLISOLS_PER_SOL};

// Re-export event types
pub use event::{generate_event_id, EventKind, SimEvent};

// Re-export snapshot types
pub use snapshot::{
    generate_snapshot_id, AgentSnapshot, ColonySnapshot, MissionSnapshot, TaskSnapshot,
};
