//! Colonist Spawning
//!
//! Colonists with generated names, a spread of starting skills and slightly
//! staggered needs so they do not all act in lockstep.

use crate::components::{AgentId, Person, SettlementId, SkillType};
use crate::SimRng;

const GIVEN_NAMES: &[&str] = &[
    "Ada", "Boris", "Chen", "Dara", "Emil", "Farah", "Goran", "Hana", "Ilya", "Jun",
    "Kofi", "Lena", "Mateo", "Nadia", "Oren", "Priya", "Quinn", "Rosa", "Sven", "Tariq",
    "Uma", "Viktor", "Wen", "Yara", "Zane",
];

const FAMILY_NAMES: &[&str] = &[
    "Alvarez", "Brandt", "Castellano", "Dubois", "Eriksen", "Fujita", "Grant", "Haddad",
    "Ivanova", "Jensen", "Kowalski", "Lindqvist", "Moreau", "Nakamura", "Okafor", "Petrov",
    "Rahman", "Sato", "Tanaka", "Varga",
];

/// Highest starting level of any skill.
const MAX_STARTING_LEVEL: u32 = 3;

/// Generate agent ID
pub fn generate_agent_id(settlement_index: usize, n: usize) -> AgentId {
    AgentId(format!("agent_{:02}_{:04}", settlement_index + 1, n + 1))
}

fn generate_name(rng: &mut SimRng) -> String {
    let given = GIVEN_NAMES[rng.range_inclusive(0, GIVEN_NAMES.len() as u32 - 1) as usize];
    let family = FAMILY_NAMES[rng.range_inclusive(0, FAMILY_NAMES.len() as u32 - 1) as usize];
    format!("{} {}", given, family)
}

/// Spawns `count` colonists living in `home`.
pub fn spawn_colonists(home: &SettlementId, settlement_index: usize, count: usize, rng: &mut SimRng) -> Vec<Person> {
    (0..count)
        .map(|n| {
            let mut person = Person::new(generate_agent_id(settlement_index, n), generate_name(rng), home.clone());
            for skill in SkillType::ALL {
                person.skills.set_level(skill, rng.range_inclusive(0, MAX_STARTING_LEVEL));
            }
            person.condition.fatigue = rng.draw(400.0);
            person.condition.hunger = rng.draw(200.0);
            person.condition.recompute_performance();
            person
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawned_colonists() {
        let mut rng = SimRng::seeded(3);
        let home = SettlementId("settlement_01".into());
        let people = spawn_colonists(&home, 0, 5, &mut rng);

        assert_eq!(people.len(), 5);
        assert_eq!(people[0].id.0, "agent_01_0001");
        assert_eq!(people[4].id.0, "agent_01_0005");
        for person in &people {
            assert_eq!(person.home, home);
            assert_eq!(person.performance(), 1.0);
            for skill in SkillType::ALL {
                assert!(person.skills.level(skill) <= MAX_STARTING_LEVEL);
            }
        }
    }
}
