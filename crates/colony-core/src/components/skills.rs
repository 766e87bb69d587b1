//! Skill Ledger
//!
//! Per-colonist skills that grow with experience. Each level needs twice the
//! experience of the previous one, starting at 25 points.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Experience needed to go from level 0 to level 1.
pub const BASE_EXPERIENCE_THRESHOLD: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillType {
    EvaOperations,
    Driving,
    Mechanics,
    Areology,
    Science,
    Medicine,
}

impl SkillType {
    pub const ALL: [SkillType; 6] = [
        SkillType::EvaOperations,
        SkillType::Driving,
        SkillType::Mechanics,
        SkillType::Areology,
        SkillType::Science,
        SkillType::Medicine,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SkillType::EvaOperations => "EVA Operations",
            SkillType::Driving => "Driving",
            SkillType::Mechanics => "Mechanics",
            SkillType::Areology => "Areology",
            SkillType::Science => "Science",
            SkillType::Medicine => "Medicine",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub skill_type: SkillType,
    level: u32,
    experience: f64,
    experience_to_next_level: f64,
}

impl Skill {
    pub fn new(skill_type: SkillType) -> Self {
        Self::with_level(skill_type, 0)
    }

    pub fn with_level(skill_type: SkillType, level: u32) -> Self {
        Self {
            skill_type,
            level,
            experience: 0.0,
            experience_to_next_level: threshold_for_level(level),
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn experience(&self) -> f64 {
        self.experience
    }

    pub fn experience_to_next_level(&self) -> f64 {
        self.experience_to_next_level
    }

    /// Adds experience and returns the number of levels gained.
    ///
    /// A single large award can cross several thresholds; the remainder
    /// carries into the next level each time.
    pub fn add_experience(&mut self, amount: f64) -> u32 {
        if !amount.is_finite() || amount <= 0.0 {
            return 0;
        }
        self.experience += amount;
        let mut gained = 0;
        while self.experience >= self.experience_to_next_level {
            self.experience -= self.experience_to_next_level;
            self.level += 1;
            self.experience_to_next_level *= 2.0;
            gained += 1;
        }
        gained
    }
}

fn threshold_for_level(level: u32) -> f64 {
    BASE_EXPERIENCE_THRESHOLD * 2f64.powi(level.min(60) as i32)
}

/// All skills of one colonist. Skills are created on first award.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillLedger {
    skills: BTreeMap<SkillType, Skill>,
}

impl SkillLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self, skill_type: SkillType) -> u32 {
        self.skills.get(&skill_type).map(|s| s.level()).unwrap_or(0)
    }

    pub fn skill(&self, skill_type: SkillType) -> Option<&Skill> {
        self.skills.get(&skill_type)
    }

    /// Skill level scaled by the colonist's current performance.
    pub fn effective_level(&self, skill_type: SkillType, performance: f64) -> u32 {
        (self.level(skill_type) as f64 * performance.clamp(0.0, 1.0)).round() as u32
    }

    pub fn set_level(&mut self, skill_type: SkillType, level: u32) {
        self.skills
            .insert(skill_type, Skill::with_level(skill_type, level));
    }

    pub fn add_experience(&mut self, skill_type: SkillType, amount: f64) -> u32 {
        let gained = self
            .skills
            .entry(skill_type)
            .or_insert_with(|| Skill::new(skill_type))
            .add_experience(amount);
        if gained > 0 {
            tracing::debug!(
                skill = skill_type.name(),
                level = self.level(skill_type),
                "skill level up"
            );
        }
        gained
    }

    pub fn iter(&self) -> impl Iterator<Item = &Skill> {
        self.skills.values()
    }
}
