//! Accident Checks
//!
//! Shared stochastic damage model for hands-on work. The chance per
//! millisol is `base * skill_modifier * phase_weight * environment_weight`;
//! low skill multiplies it, high skill divides it.

use colony_events::EventKind;

use crate::components::{AgentId, SkillType};
use crate::systems::TickContext;

/// Multiplier from the worker's effective skill level.
pub fn skill_modifier(skill: u32) -> f64 {
    if skill <= 3 {
        (4 - skill) as f64
    } else {
        1.0 / (skill as f64 - 2.0)
    }
}

pub fn accident_chance(base: f64, skill: u32, phase_weight: f64, environment_weight: f64) -> f64 {
    (base * skill_modifier(skill) * phase_weight * environment_weight).max(0.0)
}

/// What is being worked on and how risky the work is.
#[derive(Debug, Clone, Copy)]
pub struct HazardousWork<'a> {
    pub skill: SkillType,
    pub phase_weight: f64,
    pub environment_weight: f64,
    /// Name of the entity that takes the damage
    pub entity: &'a str,
    pub activity: &'a str,
}

/// Rolls for an accident over `time` millisols of work. On a hit the caller
/// triggers the accident on the entity being worked on; this records the
/// display event.
pub fn check_for_accident(
    agent: &AgentId,
    ctx: &mut TickContext<'_>,
    work: &HazardousWork<'_>,
    time: f64,
) -> bool {
    let Some(person) = ctx.person(agent) else {
        return false;
    };
    let skill = person
        .skills
        .effective_level(work.skill, person.performance());
    let chance = accident_chance(
        ctx.config.accidents.base_chance,
        skill,
        work.phase_weight,
        work.environment_weight,
    );
    if !ctx.rng.chance(chance * time) {
        return false;
    }
    tracing::info!(agent = %agent, entity = work.entity, activity = work.activity, "accident");
    ctx.emit(
        Some(agent),
        EventKind::Accident {
            entity: work.entity.to_string(),
            activity: work.activity.to_string(),
        },
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::test_support::{agent, colony, Harness};

    #[test]
    fn test_skill_modifier_table() {
        assert_eq!(skill_modifier(0), 4.0);
        assert_eq!(skill_modifier(3), 1.0);
        assert_eq!(skill_modifier(4), 0.5);
        assert_eq!(skill_modifier(6), 0.25);
    }

    #[test]
    fn test_accident_chance_combines_weights() {
        let chance = accident_chance(0.001, 0, 1.5, 2.0);
        assert!((chance - 0.012).abs() < 1e-12);
    }

    #[test]
    fn test_certain_accident_is_recorded() {
        let mut harness = Harness::new(colony(1));
        harness.config.accidents.base_chance = 1.0;
        let mut ctx = harness.ctx();
        let work = HazardousWork {
            skill: SkillType::Mechanics,
            phase_weight: 1.0,
            environment_weight: 1.0,
            entity: "rover_01",
            activity: "maintenance",
        };
        assert!(check_for_accident(&agent(1), &mut ctx, &work, 10.0));
        assert_eq!(harness.events.len(), 1);
        assert_eq!(harness.events[0].kind.name(), "accident");
    }

    #[test]
    fn test_zero_chance_never_fires() {
        let mut harness = Harness::new(colony(1));
        harness.config.accidents.base_chance = 0.0;
        let mut ctx = harness.ctx();
        let work = HazardousWork {
            skill: SkillType::Driving,
            phase_weight: 1.0,
            environment_weight: 1.0,
            entity: "rover_01",
            activity: "driving",
        };
        for _ in 0..100 {
            assert!(!check_for_accident(&agent(1), &mut ctx, &work, 10.0));
        }
    }
}
