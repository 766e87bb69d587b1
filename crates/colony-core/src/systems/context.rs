//! Tick Context
//!
//! The explicitly constructed bundle of collaborators handed to every task
//! and mission step: world state, the shared random source, tuning and the
//! event sink.

use colony_events::{EventKind, MarsClock, SimEvent};

use crate::components::{AgentId, Colony, Person};
use crate::config::SchedulerConfig;
use crate::SimRng;

pub struct TickContext<'a> {
    pub colony: &'a mut Colony,
    pub rng: &'a mut SimRng,
    pub config: &'a SchedulerConfig,
    pub events: &'a mut Vec<SimEvent>,
}

impl<'a> TickContext<'a> {
    pub fn new(
        colony: &'a mut Colony,
        rng: &'a mut SimRng,
        config: &'a SchedulerConfig,
        events: &'a mut Vec<SimEvent>,
    ) -> Self {
        Self {
            colony,
            rng,
            config,
            events,
        }
    }

    pub fn now(&self) -> MarsClock {
        self.colony.clock
    }

    pub fn person(&self, agent: &AgentId) -> Option<&Person> {
        self.colony.person(agent)
    }

    pub fn person_mut(&mut self, agent: &AgentId) -> Option<&mut Person> {
        self.colony.person_mut(agent)
    }

    /// Performance of `agent`; 0 for unknown agents.
    pub fn performance(&self, agent: &AgentId) -> f64 {
        self.colony
            .person(agent)
            .map(Person::performance)
            .unwrap_or(0.0)
    }

    /// Records a display event. Ids are assigned when the tick drains.
    pub fn emit(&mut self, agent: Option<&AgentId>, kind: EventKind) {
        let mut event = SimEvent::new(self.colony.clock, kind);
        if let Some(agent) = agent {
            event = event.with_agent(agent.0.clone());
        }
        self.events.push(event);
    }
}
