//! Needs
//!
//! Passive change each tick: fatigue and hunger build up, equipment and
//! buildings age, and now and then someone falls ill.

use crate::components::{Colony, MedicalProblem};
use crate::config::SchedulerConfig;
use crate::SimRng;

/// Ailments drawn for random illness, with seriousness and recovery bounds.
const AILMENTS: [(&str, u32, u32, f64); 4] = [
    ("Cold", 10, 25, 100.0),
    ("Food poisoning", 20, 45, 150.0),
    ("Decompression sickness", 40, 70, 300.0),
    ("Radiation sickness", 50, 80, 400.0),
];

pub fn update_needs(colony: &mut Colony, rng: &mut SimRng, config: &SchedulerConfig, time: f64) {
    for person in colony.people.values_mut() {
        person.condition.time_passing(time);
        if person.condition.problem.is_some() || !rng.chance(config.tasks.illness_chance * time) {
            continue;
        }
        let index = rng.range_inclusive(0, AILMENTS.len() as u32 - 1) as usize;
        let (name, low, high, recovery) = AILMENTS[index];
        let seriousness = rng.range_inclusive(low, high);
        tracing::debug!(agent = %person.id, ailment = name, seriousness, "fell ill");
        person
            .condition
            .set_problem(Some(MedicalProblem::new(name, seriousness, recovery)));
    }
    colony.time_passing(time);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::test_support::{agent, colony};

    #[test]
    fn test_needs_build_up() {
        let mut colony = colony(2);
        let mut rng = SimRng::seeded(1);
        let mut config = SchedulerConfig::default();
        config.tasks.illness_chance = 0.0;
        update_needs(&mut colony, &mut rng, &config, 100.0);

        for n in 1..=2 {
            let condition = &colony.person(&agent(n)).unwrap().condition;
            assert_eq!(condition.fatigue, 100.0);
            assert_eq!(condition.hunger, 100.0);
            assert!(condition.problem.is_none());
        }
        let rover = colony.vehicles.values().next().unwrap();
        assert_eq!(rover.malfunctions.time_since_last_maintenance(), 100.0);
    }

    #[test]
    fn test_certain_illness_sets_problem_once() {
        let mut colony = colony(1);
        let mut rng = SimRng::seeded(1);
        let mut config = SchedulerConfig::default();
        config.tasks.illness_chance = 1.0;
        update_needs(&mut colony, &mut rng, &config, 10.0);
        let first = colony.person(&agent(1)).unwrap().condition.problem.clone().unwrap();
        assert!((10..=80).contains(&first.seriousness));

        update_needs(&mut colony, &mut rng, &config, 10.0);
        let second = colony.person(&agent(1)).unwrap().condition.problem.clone().unwrap();
        assert_eq!(first, second);
    }
}
