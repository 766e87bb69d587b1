//! Colonist Components
//!
//! Identity, location, physical condition and personal gear of a colonist.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::components::{
    Coordinates, EvaSuit, Host, Inventory, Resource, SettlementId, SkillLedger,
};

/// Unique identifier for a colonist
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Carrying capacity per collected resource (kg)
pub const PERSONAL_CARRY_CAPACITY: f64 = 50.0;

/// Where a colonist is right now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Location {
    Inside(Host),
    InAirlock(Host),
    Outside(Coordinates),
}

impl Location {
    pub fn host(&self) -> Option<&Host> {
        match self {
            Location::Inside(host) | Location::InAirlock(host) => Some(host),
            Location::Outside(_) => None,
        }
    }

    pub fn is_inside(&self) -> bool {
        matches!(self, Location::Inside(_))
    }

    pub fn is_outside(&self) -> bool {
        matches!(self, Location::Outside(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalProblem {
    pub name: String,
    /// 0 to 100
    pub seriousness: u32,
    /// Treatment progress still needed
    pub recovery_remaining: f64,
}

impl MedicalProblem {
    pub fn new(name: impl Into<String>, seriousness: u32, recovery_remaining: f64) -> Self {
        Self {
            name: name.into(),
            seriousness: seriousness.min(100),
            recovery_remaining,
        }
    }
}

/// Fatigue, hunger, stress and health, summarized as a performance rating
/// from 0 (incapacitated) to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalCondition {
    pub fatigue: f64,
    pub hunger: f64,
    pub stress: f64,
    pub problem: Option<MedicalProblem>,
    performance: f64,
}

impl Default for PhysicalCondition {
    fn default() -> Self {
        Self {
            fatigue: 0.0,
            hunger: 0.0,
            stress: 0.0,
            problem: None,
            performance: 1.0,
        }
    }
}

impl PhysicalCondition {
    pub fn performance(&self) -> f64 {
        self.performance
    }

    /// Rederives performance from the current needs and health.
    pub fn recompute_performance(&mut self) {
        let mut performance = 1.0;
        if self.fatigue > 1000.0 {
            performance -= (self.fatigue - 1000.0) / 1000.0;
        }
        if self.hunger > 1000.0 {
            performance -= (self.hunger - 1000.0) / 2000.0;
        }
        if self.stress > 50.0 {
            performance -= (self.stress - 50.0) / 200.0;
        }
        if let Some(problem) = &self.problem {
            performance *= 1.0 - problem.seriousness as f64 / 100.0;
        }
        self.performance = performance.clamp(0.0, 1.0);
    }

    /// Needs accumulate with simulated time.
    pub fn time_passing(&mut self, time: f64) {
        if !time.is_finite() || time <= 0.0 {
            return;
        }
        self.fatigue += time;
        self.hunger += time;
        self.recompute_performance();
    }

    pub fn set_problem(&mut self, problem: Option<MedicalProblem>) {
        self.problem = problem;
        self.recompute_performance();
    }

    pub fn seriousness(&self) -> u32 {
        self.problem.as_ref().map(|p| p.seriousness).unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct Person {
    pub id: AgentId,
    pub name: String,
    pub home: SettlementId,
    pub location: Location,
    pub condition: PhysicalCondition,
    pub skills: SkillLedger,
    /// Suit being worn, if any
    pub suit: Option<EvaSuit>,
    /// Samples and resources carried in hand
    pub carried: Inventory,
}

impl Person {
    pub fn new(id: AgentId, name: impl Into<String>, home: SettlementId) -> Self {
        let mut carried = Inventory::new();
        for resource in [Resource::Ice, Resource::Regolith] {
            carried.set_capacity(resource, PERSONAL_CARRY_CAPACITY);
        }
        let location = Location::Inside(Host::Settlement(home.clone()));
        Self {
            id,
            name: name.into(),
            home,
            location,
            condition: PhysicalCondition::default(),
            skills: SkillLedger::new(),
            suit: None,
            carried,
        }
    }

    pub fn performance(&self) -> f64 {
        self.condition.performance()
    }

    /// Host the colonist is inside of, not counting airlocks.
    pub fn inside_host(&self) -> Option<&Host> {
        match &self.location {
            Location::Inside(host) => Some(host),
            _ => None,
        }
    }

    pub fn is_inside_settlement(&self) -> Option<&SettlementId> {
        match &self.location {
            Location::Inside(Host::Settlement(id)) => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_performance_drops_with_exhaustion() {
        let mut condition = PhysicalCondition::default();
        condition.time_passing(1500.0);
        // fatigue 1500 costs 0.5, hunger 1500 costs 0.25
        assert!((condition.performance() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_serious_problem_incapacitates() {
        let mut condition = PhysicalCondition::default();
        condition.set_problem(Some(MedicalProblem::new("Decompression", 100, 50.0)));
        assert_eq!(condition.performance(), 0.0);
        assert_eq!(condition.seriousness(), 100);

        condition.set_problem(None);
        assert_eq!(condition.performance(), 1.0);
    }

    #[test]
    fn test_new_person_starts_inside_home() {
        let person = Person::new(
            AgentId("agent_0001".into()),
            "Ada",
            SettlementId("settlement_01".into()),
        );
        assert_eq!(
            person.is_inside_settlement(),
            Some(&SettlementId("settlement_01".into()))
        );
        assert_eq!(person.carried.capacity(Resource::Ice), PERSONAL_CARRY_CAPACITY);
        assert!(person.suit.is_none());
    }
}
