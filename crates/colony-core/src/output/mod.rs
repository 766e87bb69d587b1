//! Output Generation
//!
//! Snapshot generation and run summaries.

pub mod snapshot;
pub mod summary;

pub use snapshot::*;
pub use summary::*;
