//! Event Logging
//!
//! Display events are produced by [`crate::Simulation::tick`]; this module
//! only persists them.

pub mod logger;

pub use logger::EventLogger;
