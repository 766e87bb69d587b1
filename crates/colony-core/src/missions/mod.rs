//! Missions
//!
//! A [`Mission`] is the shared core (designation, roster, lifecycle and
//! events) wrapped around a kind-specific [`MissionBehavior`] that owns the
//! phase machine. Members call [`Mission::perform`] whenever they are free;
//! the behavior answers with the task that member should do next, or
//! nothing while the mission waits.
//!
//! Ending a mission releases everything it holds, on every path.

use colony_events::{EventKind, MarsClock, MissionSnapshot};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::components::{AgentId, Colony, Person, SettlementId, VehicleId};
use crate::config::SchedulerConfig;
use crate::systems::TickContext;
use crate::tasks::Task;

pub mod collect;
pub mod registry;
pub mod rover;
pub mod travel;

pub use collect::CollectMission;
pub use registry::{MissionFactory, MissionKindEntry, MissionRegistry, MissionWeightFn};
pub use rover::{RoverTrip, TripStep};
pub use travel::TravelMission;

/// Mission designation, `"NN-NNN"`: settlement index and running counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MissionId(pub String);

impl MissionId {
    pub fn designation(settlement_index: u32, counter: u32) -> Self {
        Self(format!("{:02}-{:03}", settlement_index, counter))
    }
}

impl fmt::Display for MissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissionKind {
    CollectIce,
    CollectRegolith,
    TravelToSettlement,
}

impl MissionKind {
    pub fn name(&self) -> &'static str {
        match self {
            MissionKind::CollectIce => "Collect Ice",
            MissionKind::CollectRegolith => "Collect Regolith",
            MissionKind::TravelToSettlement => "Travel To Settlement",
        }
    }
}

impl fmt::Display for MissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered set of members with a capacity. Members are kept in join order.
#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    members: Vec<AgentId>,
    capacity: usize,
}

impl Roster {
    pub fn new(capacity: usize) -> Self {
        Self {
            members: Vec::new(),
            capacity,
        }
    }

    /// Adds `agent`. False only for a duplicate; a roster past capacity is
    /// trimmed by [`Roster::trim_to_capacity`], not refused here.
    pub fn add(&mut self, agent: &AgentId) -> bool {
        if self.contains(agent) {
            return false;
        }
        self.members.push(agent.clone());
        true
    }

    pub fn remove(&mut self, agent: &AgentId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != agent);
        self.members.len() != before
    }

    /// Changes the capacity without touching the members; see
    /// [`Roster::trim_to_capacity`].
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    /// Drops the most recently joined members until the roster fits.
    pub fn trim_to_capacity(&mut self) -> Vec<AgentId> {
        let mut removed = Vec::new();
        while self.members.len() > self.capacity {
            if let Some(agent) = self.members.pop() {
                removed.push(agent);
            }
        }
        removed
    }

    pub fn contains(&self, agent: &AgentId) -> bool {
        self.members.contains(agent)
    }

    pub fn members(&self) -> &[AgentId] {
        &self.members
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    fn clear(&mut self) {
        self.members.clear();
    }
}

/// State every mission kind shares; handed to the behavior on each call.
#[derive(Debug, Clone)]
pub struct MissionState {
    pub id: MissionId,
    pub kind: MissionKind,
    pub roster: Roster,
    pub min_members: usize,
    pub home: SettlementId,
    pub started: MarsClock,
    end_requested: Option<String>,
}

impl MissionState {
    pub fn new(
        id: MissionId,
        kind: MissionKind,
        home: SettlementId,
        capacity: usize,
        min_members: usize,
        started: MarsClock,
    ) -> Self {
        Self {
            id,
            kind,
            roster: Roster::new(capacity),
            min_members,
            home,
            started,
            end_requested: None,
        }
    }

    /// Asks the core to end the mission once the current call returns.
    pub fn request_end(&mut self, reason: impl Into<String>) {
        if self.end_requested.is_none() {
            self.end_requested = Some(reason.into());
        }
    }

    pub fn end_requested(&self) -> Option<&str> {
        self.end_requested.as_deref()
    }
}

/// Kind-specific phase logic behind the shared mission core.
pub trait MissionBehavior: fmt::Debug {
    /// Display name of the current phase.
    fn phase(&self) -> String;

    /// The next thing `agent` should do, or `None` while they wait.
    fn perform(
        &mut self,
        state: &mut MissionState,
        agent: &AgentId,
        ctx: &mut TickContext<'_>,
    ) -> Option<Task>;

    /// Desirability of joining for a colonist who is not yet a member.
    fn join_weight(
        &self,
        state: &MissionState,
        colony: &Colony,
        person: &Person,
        config: &SchedulerConfig,
    ) -> f64;

    /// Roster capacity under current conditions, re-read on every
    /// [`Mission::perform`]. `None` keeps whatever the roster has.
    fn capacity(&self, _state: &MissionState, _colony: &Colony) -> Option<usize> {
        None
    }

    fn vehicle(&self) -> Option<&VehicleId> {
        None
    }

    fn on_member_removed(&mut self, _state: &MissionState, _agent: &AgentId, _ctx: &mut TickContext<'_>) {}

    /// Gives back every reservation the mission holds. Called exactly once.
    fn release(&mut self, state: &MissionState, ctx: &mut TickContext<'_>);
}

#[derive(Debug)]
pub struct Mission {
    state: MissionState,
    done: bool,
    behavior: Box<dyn MissionBehavior>,
}

impl Mission {
    pub fn new(state: MissionState, behavior: impl MissionBehavior + 'static) -> Self {
        Self {
            state,
            done: false,
            behavior: Box::new(behavior),
        }
    }

    pub fn id(&self) -> &MissionId {
        &self.state.id
    }

    pub fn kind(&self) -> MissionKind {
        self.state.kind
    }

    pub fn name(&self) -> &'static str {
        self.state.kind.name()
    }

    pub fn phase(&self) -> String {
        if self.done {
            "Done".to_string()
        } else {
            self.behavior.phase()
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.state.roster
    }

    pub fn home(&self) -> &SettlementId {
        &self.state.home
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn has_member(&self, agent: &AgentId) -> bool {
        self.state.roster.contains(agent)
    }

    pub fn vehicle(&self) -> Option<&VehicleId> {
        self.behavior.vehicle()
    }

    /// Adds a member. Duplicates and finished missions are refused; joining
    /// past capacity is allowed and the newest members are trimmed on the
    /// next [`Mission::perform`].
    pub fn add_member(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>) -> bool {
        if self.done || !self.state.roster.add(agent) {
            return false;
        }
        tracing::debug!(agent = %agent, mission = %self.state.id, "joined mission");
        ctx.emit(
            Some(agent),
            EventKind::MissionJoined {
                mission_id: self.state.id.0.clone(),
            },
        );
        true
    }

    /// Removes a member; the mission ends when nobody is left.
    pub fn remove_member(&mut self, agent: &AgentId, reason: &str, ctx: &mut TickContext<'_>) -> bool {
        if self.done || !self.state.roster.remove(agent) {
            return false;
        }
        self.member_left(agent, reason, ctx);
        if self.state.roster.is_empty() {
            self.end("no members left", ctx);
        }
        true
    }

    fn member_left(&mut self, agent: &AgentId, reason: &str, ctx: &mut TickContext<'_>) {
        tracing::debug!(agent = %agent, mission = %self.state.id, reason, "member removed");
        ctx.emit(
            Some(agent),
            EventKind::MemberRemoved {
                mission_id: self.state.id.0.clone(),
                reason: reason.to_string(),
            },
        );
        self.behavior.on_member_removed(&self.state, agent, ctx);
    }

    /// Asks the mission what `agent` should do next.
    pub fn perform(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>) -> Option<Task> {
        if self.done {
            return None;
        }
        if let Some(capacity) = self.behavior.capacity(&self.state, ctx.colony) {
            if capacity != self.state.roster.capacity() {
                tracing::debug!(
                    mission = %self.state.id,
                    from = self.state.roster.capacity(),
                    to = capacity,
                    "mission capacity changed"
                );
                self.state.roster.set_capacity(capacity);
            }
        }
        self.enforce_capacity(ctx);
        if self.done || !self.state.roster.contains(agent) {
            return None;
        }
        if let Some(reason) = self.state.end_requested.clone() {
            self.end(&reason, ctx);
            return None;
        }

        let before = self.behavior.phase();
        let task = self.behavior.perform(&mut self.state, agent, ctx);
        let after = self.behavior.phase();
        if before != after {
            tracing::info!(mission = %self.state.id, from = %before, to = %after, "mission phase changed");
            ctx.emit(
                None,
                EventKind::MissionPhaseChanged {
                    mission_id: self.state.id.0.clone(),
                    from: before,
                    to: after,
                },
            );
        }

        if let Some(reason) = self.state.end_requested.clone() {
            self.end(&reason, ctx);
            return None;
        }
        task
    }

    fn enforce_capacity(&mut self, ctx: &mut TickContext<'_>) {
        let removed = self.state.roster.trim_to_capacity();
        if removed.is_empty() {
            return;
        }
        tracing::warn!(
            mission = %self.state.id,
            capacity = self.state.roster.capacity(),
            removed = removed.len(),
            "roster over capacity, trimming"
        );
        for agent in &removed {
            self.member_left(agent, "over capacity", ctx);
        }
        if self.state.roster.is_empty() {
            self.end("no members left", ctx);
        }
    }

    /// Ends the mission and releases its assets. Idempotent.
    pub fn end(&mut self, reason: &str, ctx: &mut TickContext<'_>) {
        if self.done {
            return;
        }
        self.behavior.release(&self.state, ctx);
        self.state.roster.clear();
        self.done = true;
        tracing::info!(mission = %self.state.id, kind = %self.state.kind, reason, "mission ended");
        ctx.emit(
            None,
            EventKind::MissionEnded {
                mission_id: self.state.id.0.clone(),
                reason: reason.to_string(),
            },
        );
    }

    /// Weight of `person` joining: zero once done, full or already joined.
    pub fn join_weight(&self, colony: &Colony, person: &Person, config: &SchedulerConfig) -> f64 {
        if self.done || self.state.roster.is_full() || self.state.roster.contains(&person.id) {
            return 0.0;
        }
        self.behavior.join_weight(&self.state, colony, person, config)
    }

    pub fn snapshot(&self) -> MissionSnapshot {
        MissionSnapshot {
            mission_id: self.state.id.0.clone(),
            name: self.name().to_string(),
            phase: self.phase(),
            roster: self.state.roster.members().iter().map(|a| a.0.clone()).collect(),
            capacity: self.state.roster.capacity(),
            vehicle: self.vehicle().map(|v| v.0.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::test_support::{agent, colony, home_id, Harness};
    use std::cell::Cell;
    use std::rc::Rc;

    /// Waits forever. The capacity cell stands in for whatever limits the
    /// crew, adjustable from the test.
    #[derive(Debug)]
    struct Idle {
        capacity: Rc<Cell<usize>>,
    }

    impl MissionBehavior for Idle {
        fn phase(&self) -> String {
            "Idle".to_string()
        }

        fn perform(&mut self, _: &mut MissionState, _: &AgentId, _: &mut TickContext<'_>) -> Option<Task> {
            None
        }

        fn join_weight(&self, _: &MissionState, _: &Colony, _: &Person, _: &SchedulerConfig) -> f64 {
            1.0
        }

        fn capacity(&self, _: &MissionState, _: &Colony) -> Option<usize> {
            Some(self.capacity.get())
        }

        fn release(&mut self, _: &MissionState, _: &mut TickContext<'_>) {}
    }

    fn limited_mission(capacity: usize) -> (Mission, Rc<Cell<usize>>) {
        let state = MissionState::new(
            MissionId::designation(0, 1),
            MissionKind::CollectIce,
            home_id(),
            capacity,
            1,
            MarsClock::start(),
        );
        let limit = Rc::new(Cell::new(capacity));
        let behavior = Idle {
            capacity: Rc::clone(&limit),
        };
        (Mission::new(state, behavior), limit)
    }

    fn mission(capacity: usize) -> Mission {
        limited_mission(capacity).0
    }

    #[test]
    fn test_designation_format() {
        assert_eq!(MissionId::designation(3, 7).0, "03-007");
        assert_eq!(MissionId::designation(12, 345).to_string(), "12-345");
    }

    #[test]
    fn test_roster_add_is_idempotent_and_not_capped() {
        let mut roster = Roster::new(2);
        assert!(roster.add(&agent(1)));
        assert!(!roster.add(&agent(1)));
        assert!(roster.add(&agent(2)));
        assert!(roster.is_full());
        assert!(roster.add(&agent(3)));
        assert_eq!(roster.len(), 3);
        assert_eq!(roster.trim_to_capacity(), vec![agent(3)]);
    }

    #[test]
    fn test_trim_drops_latest_joiners() {
        let mut roster = Roster::new(3);
        for n in 1..=3 {
            roster.add(&agent(n));
        }
        roster.set_capacity(1);
        assert_eq!(roster.len(), 3);
        assert_eq!(roster.trim_to_capacity(), vec![agent(3), agent(2)]);
        assert_eq!(roster.members(), &[agent(1)]);
    }

    #[test]
    fn test_capacity_reduction_trims_on_next_perform() {
        let mut harness = Harness::new(colony(2));
        let (mut mission, limit) = limited_mission(2);
        assert!(mission.add_member(&agent(1), &mut harness.ctx()));
        assert!(mission.add_member(&agent(2), &mut harness.ctx()));

        limit.set(1);
        assert_eq!(mission.roster().len(), 2);
        mission.perform(&agent(1), &mut harness.ctx());
        assert_eq!(mission.roster().members(), &[agent(1)]);
        assert!(!mission.is_done());

        let removed: Vec<_> = harness
            .events
            .iter()
            .filter(|e| e.kind.name() == "member_removed")
            .collect();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].agent_id.as_deref(), Some("agent_0002"));
    }

    #[test]
    fn test_join_past_capacity_evicts_newest() {
        let mut harness = Harness::new(colony(2));
        let mut mission = mission(1);
        assert!(mission.add_member(&agent(1), &mut harness.ctx()));
        assert!(mission.add_member(&agent(2), &mut harness.ctx()));
        assert_eq!(mission.roster().len(), 2);

        assert!(mission.perform(&agent(2), &mut harness.ctx()).is_none());
        assert_eq!(mission.roster().members(), &[agent(1)]);
        assert!(!mission.is_done());
    }

    #[test]
    fn test_zero_capacity_ends_mission() {
        let mut harness = Harness::new(colony(1));
        let (mut mission, limit) = limited_mission(1);
        mission.add_member(&agent(1), &mut harness.ctx());
        limit.set(0);
        mission.perform(&agent(1), &mut harness.ctx());
        assert!(mission.is_done());
        assert!(mission.roster().is_empty());
    }

    #[test]
    fn test_removing_last_member_ends_mission() {
        let mut harness = Harness::new(colony(1));
        let mut mission = mission(2);
        mission.add_member(&agent(1), &mut harness.ctx());
        assert!(mission.remove_member(&agent(1), "left", &mut harness.ctx()));
        assert!(mission.is_done());
        assert!(mission.roster().is_empty());
        assert_eq!(mission.phase(), "Done");
        assert!(!mission.remove_member(&agent(1), "left", &mut harness.ctx()));
    }

    #[test]
    fn test_end_is_idempotent() {
        let mut harness = Harness::new(colony(1));
        let mut mission = mission(1);
        mission.add_member(&agent(1), &mut harness.ctx());
        mission.end("test", &mut harness.ctx());
        mission.end("test", &mut harness.ctx());
        let ended = harness
            .events
            .iter()
            .filter(|e| e.kind.name() == "mission_ended")
            .count();
        assert_eq!(ended, 1);
        assert!(!mission.add_member(&agent(1), &mut harness.ctx()));
    }

    #[test]
    fn test_join_weight_zero_when_full_or_member() {
        let mut harness = Harness::new(colony(2));
        let mut mission = mission(1);
        let config = SchedulerConfig::default();
        {
            let person = harness.colony.person(&agent(1)).unwrap();
            assert_eq!(mission.join_weight(&harness.colony, person, &config), 1.0);
        }
        mission.add_member(&agent(1), &mut harness.ctx());
        let first = harness.colony.person(&agent(1)).unwrap();
        let second = harness.colony.person(&agent(2)).unwrap();
        assert_eq!(mission.join_weight(&harness.colony, first, &config), 0.0);
        assert_eq!(mission.join_weight(&harness.colony, second, &config), 0.0);
    }
}
