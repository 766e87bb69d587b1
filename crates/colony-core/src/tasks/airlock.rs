//! Airlock Sub-tasks
//!
//! Exit: don a good suit, join the chamber, wait for (or run) a cycle, step
//! outside. Enter: join the chamber from outside, wait for a cycle, step in,
//! stow and refill the suit.

use crate::components::{AgentId, EvaSuit, Host, Location};
use crate::systems::TickContext;
use crate::tasks::eva::{can_exit_airlock, stow_suit};
use crate::tasks::{StepOutcome, Task, TaskBehavior, TaskKind};

enum Cycle {
    /// The chamber cycled since entry; unused time attached
    Complete(f64),
    /// Still cycling or waiting on another operator
    Running(f64),
}

/// Runs the chamber for `time` if nobody else operates it, and reports
/// whether a cycle has completed since the colonist entered.
///
/// A cycle has no direction. Everyone in the chamber when it completes is
/// through, so an exit and an entry sharing the chamber finish on the same
/// cycle, even when one of them joined partway through it.
fn cycle_chamber(
    agent: &AgentId,
    ctx: &mut TickContext<'_>,
    host: &Host,
    entry_cycle: u64,
    time: f64,
) -> Option<Cycle> {
    let airlock = ctx.colony.airlock_mut(host)?;
    if airlock.completed_cycles() > entry_cycle {
        return Some(Cycle::Complete(time));
    }
    if !airlock.is_activated() {
        airlock.activate(agent);
    }
    if airlock.operator() != Some(agent) {
        return Some(Cycle::Running(0.0));
    }
    let used = airlock.add_cycle_time(agent, time);
    if airlock.completed_cycles() > entry_cycle {
        Some(Cycle::Complete(time - used))
    } else {
        Some(Cycle::Running(time - used))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitPhase {
    PendingSuit,
    InAirlock,
    Outside,
}

#[derive(Debug)]
pub struct ExitAirlock {
    host: Host,
    phase: ExitPhase,
    entry_cycle: u64,
    in_chamber: bool,
}

impl ExitAirlock {
    pub fn task(host: Host) -> Task {
        let description = format!("Exiting airlock of {}", host);
        Task::new(
            TaskKind::ExitAirlock,
            description,
            Self {
                host,
                phase: ExitPhase::PendingSuit,
                entry_cycle: 0,
                in_chamber: false,
            },
        )
    }

    fn don_suit(&self, agent: &AgentId, ctx: &mut TickContext<'_>) -> bool {
        let Some((person, inventory)) = ctx.colony.person_and_host_inventory_mut(agent, &self.host) else {
            return false;
        };
        if person.suit.as_ref().is_some_and(EvaSuit::is_good) {
            return true;
        }
        if let Some(old) = person.suit.take() {
            inventory.store_suit(old);
        }
        person.suit = inventory.take_good_suit();
        person.suit.is_some()
    }
}

impl TaskBehavior for ExitAirlock {
    fn phase(&self) -> String {
        match self.phase {
            ExitPhase::PendingSuit => "Putting on EVA suit",
            ExitPhase::InAirlock => "Cycling airlock",
            ExitPhase::Outside => "Outside",
        }
        .to_string()
    }

    fn perform(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>, time: f64) -> StepOutcome {
        match self.phase {
            ExitPhase::PendingSuit => {
                if !can_exit_airlock(ctx.colony, agent, &self.host) || !self.don_suit(agent, ctx) {
                    return StepOutcome::Done(time);
                }
                let Some(airlock) = ctx.colony.airlock_mut(&self.host) else {
                    return StepOutcome::Done(time);
                };
                if !airlock.try_enter(agent) {
                    // chamber full
                    return StepOutcome::Continue(0.0);
                }
                self.entry_cycle = airlock.completed_cycles();
                self.in_chamber = true;
                if let Some(person) = ctx.person_mut(agent) {
                    person.location = Location::InAirlock(self.host.clone());
                }
                self.phase = ExitPhase::InAirlock;
                StepOutcome::Continue(time)
            }
            ExitPhase::InAirlock => {
                match cycle_chamber(agent, ctx, &self.host, self.entry_cycle, time) {
                    Some(Cycle::Complete(left)) => {
                        if let Some(airlock) = ctx.colony.airlock_mut(&self.host) {
                            airlock.leave(agent);
                        }
                        self.in_chamber = false;
                        let coordinates = ctx.colony.host_coordinates(&self.host).unwrap_or_default();
                        if let Some(person) = ctx.person_mut(agent) {
                            person.location = Location::Outside(coordinates);
                        }
                        self.phase = ExitPhase::Outside;
                        StepOutcome::Done(left)
                    }
                    Some(Cycle::Running(left)) => StepOutcome::Continue(left),
                    None => StepOutcome::Done(time),
                }
            }
            ExitPhase::Outside => StepOutcome::Done(time),
        }
    }

    fn release(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>) {
        if self.phase == ExitPhase::Outside {
            return;
        }
        if self.in_chamber {
            if let Some(airlock) = ctx.colony.airlock_mut(&self.host) {
                airlock.leave(agent);
            }
            self.in_chamber = false;
        }
        // an aborted exit puts the colonist back inside without the suit
        if let Some((person, inventory)) = ctx.colony.person_and_host_inventory_mut(agent, &self.host) {
            if matches!(&person.location, Location::InAirlock(h) if *h == self.host) {
                person.location = Location::Inside(self.host.clone());
            }
            if person.location == Location::Inside(self.host.clone()) {
                stow_suit(person, inventory);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnterPhase {
    Outside,
    InAirlock,
    PendingStow,
}

#[derive(Debug)]
pub struct EnterAirlock {
    host: Host,
    phase: EnterPhase,
    entry_cycle: u64,
    in_chamber: bool,
}

impl EnterAirlock {
    pub fn task(host: Host) -> Task {
        let description = format!("Entering airlock of {}", host);
        Task::new(
            TaskKind::EnterAirlock,
            description,
            Self {
                host,
                phase: EnterPhase::Outside,
                entry_cycle: 0,
                in_chamber: false,
            },
        )
    }
}

impl TaskBehavior for EnterAirlock {
    fn phase(&self) -> String {
        match self.phase {
            EnterPhase::Outside => "Waiting to enter",
            EnterPhase::InAirlock => "Cycling airlock",
            EnterPhase::PendingStow => "Stowing EVA suit",
        }
        .to_string()
    }

    fn perform(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>, time: f64) -> StepOutcome {
        match self.phase {
            EnterPhase::Outside => {
                let Some(location) = ctx.person(agent).map(|p| p.location.clone()) else {
                    return StepOutcome::Done(time);
                };
                if location == Location::Inside(self.host.clone()) {
                    self.phase = EnterPhase::PendingStow;
                    return StepOutcome::Continue(time);
                }
                let Some(airlock) = ctx.colony.airlock_mut(&self.host) else {
                    return StepOutcome::Done(time);
                };
                if !airlock.try_enter(agent) {
                    // chamber full; keep waiting outside
                    return StepOutcome::Continue(0.0);
                }
                self.entry_cycle = airlock.completed_cycles();
                self.in_chamber = true;
                if let Some(person) = ctx.person_mut(agent) {
                    person.location = Location::InAirlock(self.host.clone());
                }
                self.phase = EnterPhase::InAirlock;
                StepOutcome::Continue(time)
            }
            EnterPhase::InAirlock => {
                match cycle_chamber(agent, ctx, &self.host, self.entry_cycle, time) {
                    Some(Cycle::Complete(left)) => {
                        if let Some(airlock) = ctx.colony.airlock_mut(&self.host) {
                            airlock.leave(agent);
                        }
                        self.in_chamber = false;
                        if let Some(person) = ctx.person_mut(agent) {
                            person.location = Location::Inside(self.host.clone());
                        }
                        self.phase = EnterPhase::PendingStow;
                        StepOutcome::Continue(left)
                    }
                    Some(Cycle::Running(left)) => StepOutcome::Continue(left),
                    None => StepOutcome::Done(time),
                }
            }
            EnterPhase::PendingStow => {
                if let Some((person, inventory)) =
                    ctx.colony.person_and_host_inventory_mut(agent, &self.host)
                {
                    stow_suit(person, inventory);
                }
                StepOutcome::Done(time)
            }
        }
    }

    fn release(&mut self, agent: &AgentId, ctx: &mut TickContext<'_>) {
        if !self.in_chamber {
            return;
        }
        if let Some(airlock) = ctx.colony.airlock_mut(&self.host) {
            airlock.leave(agent);
        }
        self.in_chamber = false;
        // complete the ingress rather than leave the colonist in the chamber
        if let Some((person, inventory)) = ctx.colony.person_and_host_inventory_mut(agent, &self.host) {
            person.location = Location::Inside(self.host.clone());
            stow_suit(person, inventory);
        }
    }
}
