//! Airlock Chamber
//!
//! One shared chamber per settlement or vehicle. Occupancy is counted against
//! capacity; exactly one occupant holds the operator claim and cycles the
//! chamber while the others wait for the cycle to complete. Cycles carry no
//! direction: one completed cycle lets every occupant through, inbound and
//! outbound alike.

use std::collections::BTreeSet;

use crate::components::{AgentId, ExclusiveClaim};
use crate::EPSILON;

#[derive(Debug, Clone)]
pub struct Airlock {
    capacity: usize,
    occupants: BTreeSet<AgentId>,
    operator: ExclusiveClaim<AgentId>,
    cycle_time: f64,
    remaining_cycle: f64,
    completed_cycles: u64,
}

impl Airlock {
    pub fn new(capacity: usize, cycle_time: f64) -> Self {
        Self {
            capacity,
            occupants: BTreeSet::new(),
            operator: ExclusiveClaim::new(),
            cycle_time: cycle_time.max(EPSILON),
            remaining_cycle: 0.0,
            completed_cycles: 0,
        }
    }

    /// Adds `agent` to the chamber. Re-entering is a no-op success.
    pub fn try_enter(&mut self, agent: &AgentId) -> bool {
        if self.occupants.contains(agent) {
            return true;
        }
        if self.occupants.len() >= self.capacity {
            return false;
        }
        self.occupants.insert(agent.clone());
        true
    }

    /// Removes `agent`; an operator leaving mid-cycle aborts the cycle.
    pub fn leave(&mut self, agent: &AgentId) -> bool {
        if self.operator.is_held_by(agent) {
            self.deactivate(agent);
        }
        self.occupants.remove(agent)
    }

    pub fn has_occupant(&self, agent: &AgentId) -> bool {
        self.occupants.contains(agent)
    }

    pub fn occupant_count(&self) -> usize {
        self.occupants.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_activated(&self) -> bool {
        self.operator.is_held()
    }

    pub fn operator(&self) -> Option<&AgentId> {
        self.operator.holder()
    }

    pub fn completed_cycles(&self) -> u64 {
        self.completed_cycles
    }

    /// Starts a cycle with `agent` as operator. Only an occupant may
    /// operate, and only while nobody else does.
    pub fn activate(&mut self, agent: &AgentId) -> bool {
        if !self.occupants.contains(agent) || !self.operator.try_acquire(agent) {
            return false;
        }
        if self.remaining_cycle <= EPSILON {
            self.remaining_cycle = self.cycle_time;
        }
        true
    }

    /// Runs the cycle for up to `time`. Returns the time consumed; on
    /// completion the operator claim is released.
    pub fn add_cycle_time(&mut self, agent: &AgentId, time: f64) -> f64 {
        if !self.operator.is_held_by(agent) || time <= 0.0 {
            return 0.0;
        }
        let used = time.min(self.remaining_cycle);
        self.remaining_cycle -= used;
        if self.remaining_cycle <= EPSILON {
            self.remaining_cycle = 0.0;
            self.completed_cycles += 1;
            self.operator.release(agent);
        }
        used
    }

    /// Aborts a cycle in progress.
    pub fn deactivate(&mut self, agent: &AgentId) -> bool {
        if self.operator.release(agent) {
            self.remaining_cycle = 0.0;
            true
        } else {
            false
        }
    }
}
