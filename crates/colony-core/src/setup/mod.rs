//! Colony Setup
//!
//! Default colony construction for the headless runner: settlements with
//! stock, suits and facilities, their rovers, and the colonists living there.

pub mod colonists;
pub mod settlements;

pub use colonists::*;
pub use settlements::*;

use crate::components::{Colony, SurfaceModel};
use crate::config::SchedulerConfig;
use crate::error::ColonyError;
use crate::SimRng;

/// Builds the default two-settlement colony described by `config`.
pub fn build_colony(config: &SchedulerConfig) -> Result<Colony, ColonyError> {
    let mut colony = Colony::new(Box::new(SurfaceModel::default()));
    // separate stream so changing the colony layout leaves scheduling draws alone
    let mut rng = SimRng::seeded(config.simulation.seed.wrapping_add(1));
    let per_settlement = config.simulation.colonists_per_settlement;

    for (index, site) in SETTLEMENT_SITES.iter().enumerate() {
        let settlement = create_settlement(index as u32, site, per_settlement, config);
        let id = settlement.id.clone();
        colony.add_settlement(settlement)?;
        colony.add_vehicle(create_rover(index as u32, site, config), &id)?;
        for person in spawn_colonists(&id, index, per_settlement, &mut rng) {
            colony.add_person(person)?;
        }
    }

    tracing::info!(
        settlements = colony.settlements.len(),
        vehicles = colony.vehicles.len(),
        colonists = colony.people.len(),
        "colony built"
    );
    Ok(colony)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Host, Location};

    #[test]
    fn test_default_colony() {
        let config = SchedulerConfig::default();
        let colony = build_colony(&config).unwrap();
        assert_eq!(colony.settlements.len(), 2);
        assert_eq!(colony.vehicles.len(), 2);
        assert_eq!(colony.people.len(), 2 * config.simulation.colonists_per_settlement);

        for person in colony.people.values() {
            assert_eq!(person.location, Location::Inside(Host::Settlement(person.home.clone())));
        }
        for rover in colony.vehicles.values() {
            assert!(rover.is_available_for_mission());
        }
    }

    #[test]
    fn test_same_seed_same_colony() {
        let config = SchedulerConfig::default();
        let a = build_colony(&config).unwrap();
        let b = build_colony(&config).unwrap();
        let names_a: Vec<_> = a.people.values().map(|p| p.name.clone()).collect();
        let names_b: Vec<_> = b.people.values().map(|p| p.name.clone()).collect();
        assert_eq!(names_a, names_b);
    }
}
