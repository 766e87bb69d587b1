//! Simulation Driver
//!
//! Owns the colony, one [`Mind`] per colonist, both registries and the
//! seeded random source. A tick advances the clock, applies passive needs,
//! runs every mind in id order, prunes finished missions and hands back the
//! tick's display events with ids assigned.

use std::collections::BTreeMap;

use colony_events::{generate_event_id, SimEvent};

use crate::components::{AgentId, Colony};
use crate::config::SchedulerConfig;
use crate::missions::MissionRegistry;
use crate::systems::{needs, Mind, TaskRegistry, TickContext};
use crate::SimRng;

#[derive(Debug)]
pub struct Simulation {
    colony: Colony,
    minds: BTreeMap<AgentId, Mind>,
    missions: MissionRegistry,
    tasks: TaskRegistry,
    rng: SimRng,
    config: SchedulerConfig,
    tick: u64,
    event_seq: u64,
}

impl Simulation {
    /// Builds a simulation with the standard registries, seeded from the
    /// configuration.
    pub fn new(colony: Colony, config: SchedulerConfig) -> Self {
        Self::with_registries(colony, config, TaskRegistry::standard(), MissionRegistry::standard())
    }

    pub fn with_registries(
        colony: Colony,
        config: SchedulerConfig,
        tasks: TaskRegistry,
        missions: MissionRegistry,
    ) -> Self {
        let minds = colony
            .people
            .keys()
            .map(|id| (id.clone(), Mind::new(id.clone())))
            .collect();
        Self {
            rng: SimRng::seeded(config.simulation.seed),
            colony,
            minds,
            missions,
            tasks,
            config,
            tick: 0,
            event_seq: 0,
        }
    }

    pub fn colony(&self) -> &Colony {
        &self.colony
    }

    /// Direct world access for scenario setup between ticks.
    pub fn colony_mut(&mut self) -> &mut Colony {
        &mut self.colony
    }

    pub fn missions(&self) -> &MissionRegistry {
        &self.missions
    }

    pub fn minds(&self) -> impl Iterator<Item = &Mind> {
        self.minds.values()
    }

    pub fn mind(&self, agent: &AgentId) -> Option<&Mind> {
        self.minds.get(agent)
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Runs one tick and returns its events.
    pub fn tick(&mut self) -> Vec<SimEvent> {
        let time = self.config.simulation.tick_millisols;
        self.colony.clock.advance(time);
        needs::update_needs(&mut self.colony, &mut self.rng, &self.config, time);

        let mut events = Vec::new();
        {
            let mut ctx = TickContext::new(&mut self.colony, &mut self.rng, &self.config, &mut events);
            for mind in self.minds.values_mut() {
                mind.advance(&mut ctx, &mut self.missions, &self.tasks, time);
            }
        }
        let pruned = self.missions.prune_done();
        if pruned > 0 {
            tracing::debug!(tick = self.tick, pruned, "finished missions pruned");
        }

        self.tick += 1;
        self.number_events(&mut events);
        events
    }

    /// Ends every task and mission so nothing stays claimed. Returns the
    /// resulting events; the clock does not move.
    pub fn shutdown(&mut self) -> Vec<SimEvent> {
        let mut events = Vec::new();
        {
            let mut ctx = TickContext::new(&mut self.colony, &mut self.rng, &self.config, &mut events);
            for mind in self.minds.values_mut() {
                mind.abandon(&mut ctx);
            }
            let ended = self.missions.end_all("simulation ended", &mut ctx);
            tracing::info!(tick = self.tick, ended, "simulation shut down");
        }
        self.number_events(&mut events);
        events
    }

    fn number_events(&mut self, events: &mut [SimEvent]) {
        for event in events {
            self.event_seq += 1;
            event.event_id = generate_event_id(self.event_seq);
        }
    }

    /// Runs `ticks` ticks, passing each tick's events to `sink`.
    pub fn run<F>(&mut self, ticks: u64, mut sink: F)
    where
        F: FnMut(u64, &[SimEvent]),
    {
        for _ in 0..ticks {
            let events = self.tick();
            sink(self.tick, &events);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::test_support::colony;

    #[test]
    fn test_tick_advances_clock_and_numbers_events() {
        let mut sim = Simulation::new(colony(3), SchedulerConfig::default());
        let start = sim.colony().clock.total_millisols();
        let mut all = Vec::new();
        for _ in 0..20 {
            all.extend(sim.tick());
        }
        assert_eq!(sim.current_tick(), 20);
        assert!((sim.colony().clock.total_millisols() - start - 200.0).abs() < 1e-6);
        assert!(!all.is_empty());
        for (i, event) in all.iter().enumerate() {
            assert_eq!(event.event_id, generate_event_id(i as u64 + 1));
        }
    }

    #[test]
    fn test_every_colonist_gets_a_mind() {
        let sim = Simulation::new(colony(4), SchedulerConfig::default());
        assert_eq!(sim.minds().count(), 4);
    }
}
