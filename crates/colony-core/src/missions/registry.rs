//! Mission Registry
//!
//! The explicit `{weight, factory}` table of mission kinds plus every live
//! mission, keyed by designation. Finished missions are pruned before any
//! query over active missions.

use std::collections::BTreeMap;

use colony_events::{EventKind, MissionSnapshot};

use crate::components::{AgentId, Colony, Person, SettlementId};
use crate::config::SchedulerConfig;
use crate::missions::{collect, travel, Mission, MissionId, MissionKind};
use crate::systems::TickContext;
use crate::tasks::Task;
use crate::EPSILON;

/// Desirability of starting a mission of the kind right now.
pub type MissionWeightFn = fn(&Colony, &Person, &SchedulerConfig) -> f64;

/// Builds a mission founded by the agent, or `None` if it cannot start.
pub type MissionFactory = fn(MissionId, &AgentId, &mut TickContext<'_>) -> Option<Mission>;

#[derive(Debug, Clone, Copy)]
pub struct MissionKindEntry {
    pub kind: MissionKind,
    pub weight: MissionWeightFn,
    pub factory: MissionFactory,
}

fn sanitize(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

#[derive(Debug, Default)]
pub struct MissionRegistry {
    kinds: Vec<MissionKindEntry>,
    missions: BTreeMap<MissionId, Mission>,
    counters: BTreeMap<SettlementId, u32>,
}

impl MissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(MissionKind::CollectIce, collect::ice_weight, collect::create_ice);
        registry.register(
            MissionKind::CollectRegolith,
            collect::regolith_weight,
            collect::create_regolith,
        );
        registry.register(MissionKind::TravelToSettlement, travel::weight, travel::create);
        registry
    }

    pub fn register(&mut self, kind: MissionKind, weight: MissionWeightFn, factory: MissionFactory) {
        self.kinds.push(MissionKindEntry { kind, weight, factory });
    }

    pub fn kinds(&self) -> &[MissionKindEntry] {
        &self.kinds
    }

    pub fn new_mission_total_weight(&self, colony: &Colony, person: &Person, config: &SchedulerConfig) -> f64 {
        self.kinds
            .iter()
            .map(|entry| sanitize((entry.weight)(colony, person, config)))
            .sum()
    }

    /// Draws a mission kind in `[0, total)` and founds it with `agent` as
    /// the first member. The designation counter only moves on success.
    pub fn instantiate_new_mission(
        &mut self,
        agent: &AgentId,
        ctx: &mut TickContext<'_>,
        total: f64,
    ) -> Option<MissionId> {
        if total <= EPSILON {
            return None;
        }
        let entry = {
            let person = ctx.colony.person(agent)?;
            let draw = ctx.rng.draw(total);
            let mut cumulative = 0.0;
            let mut chosen = None;
            for entry in &self.kinds {
                let weight = sanitize((entry.weight)(ctx.colony, person, ctx.config));
                if weight <= 0.0 {
                    continue;
                }
                cumulative += weight;
                chosen = Some(*entry);
                if draw < cumulative {
                    break;
                }
            }
            chosen?
        };

        let settlement = ctx.colony.person(agent)?.is_inside_settlement()?.clone();
        let index = ctx.colony.settlements.get(&settlement)?.index;
        let counter = self.counters.get(&settlement).copied().unwrap_or(0) + 1;
        let id = MissionId::designation(index, counter);

        let Some(mut mission) = (entry.factory)(id.clone(), agent, ctx) else {
            tracing::debug!(agent = %agent, kind = %entry.kind, "mission could not be created");
            return None;
        };
        self.counters.insert(settlement, counter);
        tracing::info!(agent = %agent, mission = %id, kind = %entry.kind, "mission started");
        ctx.emit(
            Some(agent),
            EventKind::MissionStarted {
                mission_id: id.0.clone(),
                mission: entry.kind.name().to_string(),
            },
        );
        mission.add_member(agent, ctx);
        self.missions.insert(id.clone(), mission);
        Some(id)
    }

    /// Sum of join weights over live missions.
    pub fn active_mission_total_weight(&mut self, colony: &Colony, person: &Person, config: &SchedulerConfig) -> f64 {
        self.prune_done();
        self.missions
            .values()
            .map(|m| sanitize(m.join_weight(colony, person, config)))
            .sum()
    }

    /// Draws a live mission by join weight in `[0, total)` and adds `agent`.
    pub fn pick_active_mission(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>, total: f64) -> Option<MissionId> {
        self.prune_done();
        if total <= EPSILON {
            return None;
        }
        let id = {
            let person = ctx.colony.person(agent)?;
            let draw = ctx.rng.draw(total);
            let mut cumulative = 0.0;
            let mut chosen = None;
            for mission in self.missions.values() {
                let weight = sanitize(mission.join_weight(ctx.colony, person, ctx.config));
                if weight <= 0.0 {
                    continue;
                }
                cumulative += weight;
                chosen = Some(mission.id().clone());
                if draw < cumulative {
                    break;
                }
            }
            chosen?
        };
        let mission = self.missions.get_mut(&id)?;
        mission.add_member(agent, ctx).then_some(id)
    }

    /// Lets `agent` ask their mission for the next task.
    pub fn perform_mission(&mut self, id: &MissionId, agent: &AgentId, ctx: &mut TickContext<'_>) -> Option<Task> {
        self.missions.get_mut(id)?.perform(agent, ctx)
    }

    /// Drops finished missions; returns how many went.
    /// Ends every live mission with `reason`; returns how many ended.
    pub fn end_all(&mut self, reason: &str, ctx: &mut TickContext<'_>) -> usize {
        let mut ended = 0;
        for mission in self.missions.values_mut().filter(|m| !m.is_done()) {
            mission.end(reason, ctx);
            ended += 1;
        }
        self.prune_done();
        ended
    }

    pub fn prune_done(&mut self) -> usize {
        let before = self.missions.len();
        self.missions.retain(|_, m| !m.is_done());
        before - self.missions.len()
    }

    pub fn get(&self, id: &MissionId) -> Option<&Mission> {
        self.missions.get(id)
    }

    pub fn get_mut(&mut self, id: &MissionId) -> Option<&mut Mission> {
        self.missions.get_mut(id)
    }

    pub fn missions(&self) -> impl Iterator<Item = &Mission> {
        self.missions.values()
    }

    pub fn len(&self) -> usize {
        self.missions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.missions.is_empty()
    }

    pub fn snapshots(&self) -> Vec<MissionSnapshot> {
        self.missions.values().map(Mission::snapshot).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::test_support::{agent, colony, rover_id, Harness};

    #[test]
    fn test_new_mission_weight_and_designation() {
        let mut harness = Harness::new(colony(3));
        let mut registry = MissionRegistry::standard();
        let total = {
            let person = harness.colony.person(&agent(1)).unwrap();
            registry.new_mission_total_weight(&harness.colony, person, &harness.config)
        };
        // ice 6 + regolith 3, no second settlement to travel to
        assert!((total - 9.0).abs() < 1e-9);

        let id = registry.instantiate_new_mission(&agent(1), &mut harness.ctx(), total).unwrap();
        assert_eq!(id.0, "00-001");
        let mission = registry.get(&id).unwrap();
        assert!(mission.has_member(&agent(1)));
        assert_eq!(mission.vehicle(), Some(&rover_id()));
        let names: Vec<_> = harness.events.iter().map(|e| e.kind.name()).collect();
        assert_eq!(names, vec!["mission_started", "mission_joined"]);

        // the only rover is reserved; nothing else can start
        let person = harness.colony.person(&agent(2)).unwrap();
        assert_eq!(registry.new_mission_total_weight(&harness.colony, person, &harness.config), 0.0);
    }

    #[test]
    fn test_failed_factory_keeps_counter() {
        fn always(_: &Colony, _: &Person, _: &SchedulerConfig) -> f64 {
            1.0
        }
        fn never(_: MissionId, _: &AgentId, _: &mut TickContext<'_>) -> Option<Mission> {
            None
        }
        let mut harness = Harness::new(colony(1));
        let mut registry = MissionRegistry::new();
        registry.register(MissionKind::CollectIce, always, never);
        assert!(registry.instantiate_new_mission(&agent(1), &mut harness.ctx(), 1.0).is_none());

        registry.register(MissionKind::CollectRegolith, always, collect::create_regolith);
        let mut ids = Vec::new();
        for _ in 0..20 {
            if let Some(id) = registry.instantiate_new_mission(&agent(1), &mut harness.ctx(), 2.0) {
                ids.push(id);
                break;
            }
        }
        assert_eq!(ids[0].0, "00-001");
    }

    #[test]
    fn test_join_then_prune() {
        let mut harness = Harness::new(colony(2));
        let mut registry = MissionRegistry::standard();
        let id = registry.instantiate_new_mission(&agent(1), &mut harness.ctx(), 9.0).unwrap();

        let total = {
            let person = harness.colony.person(&agent(2)).unwrap();
            registry.active_mission_total_weight(&harness.colony, person, &harness.config)
        };
        assert_eq!(total, harness.config.missions.join_weight);
        assert_eq!(registry.pick_active_mission(&agent(2), &mut harness.ctx(), total), Some(id.clone()));
        assert_eq!(registry.get(&id).unwrap().roster().len(), 2);

        registry.get_mut(&id).unwrap().end("test", &mut harness.ctx());
        let person = harness.colony.person(&agent(2)).unwrap();
        assert_eq!(registry.active_mission_total_weight(&harness.colony, person, &harness.config), 0.0);
        assert!(registry.is_empty());
        assert!(!harness.colony.vehicles[&rover_id()].is_reserved());
    }
}
