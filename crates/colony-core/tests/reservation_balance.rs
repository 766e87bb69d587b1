//! Reservation bookkeeping over long runs
//!
//! Every claim on a shared resource must belong to someone who still needs
//! it, no capacity-limited resource may ever be overfilled, and a shutdown
//! must hand everything back.

use colony_core::components::{Host, Location};
use colony_core::{setup, SchedulerConfig, Simulation};
use colony_events::TaskSnapshot;

/// `(task, phase)` pairs along every live task chain, outermost first.
fn live_phases(sim: &Simulation) -> Vec<(String, String)> {
    let mut phases = Vec::new();
    for mind in sim.minds() {
        if !mind.task_manager().has_active_task() {
            continue;
        }
        let mut next: Option<TaskSnapshot> = mind.task_snapshot();
        while let Some(task) = next {
            phases.push((task.name.clone(), task.phase.clone()));
            next = task.sub_task.map(|sub| *sub);
        }
    }
    phases
}

fn holders(phases: &[(String, String)], task: &str, phase: &str) -> usize {
    phases.iter().filter(|(t, p)| t == task && p == phase).count()
}

fn check_balance(sim: &Simulation, tick: u64) {
    let colony = sim.colony();

    for settlement in colony.settlements.values() {
        assert!(
            settlement.airlock.occupant_count() <= settlement.airlock.capacity(),
            "tick {}: {} airlock overfilled",
            tick,
            settlement.id
        );
        assert!(settlement.garage.occupied() <= settlement.garage.capacity());
        for aid in &settlement.medical_aids {
            if let Some(patient) = aid.patient() {
                assert!(colony.person(patient).is_some());
            }
        }
    }

    for rover in colony.vehicles.values() {
        assert!(rover.airlock.occupant_count() <= rover.airlock.capacity());
        if let Some(mission_id) = rover.reserved_by() {
            let mission = sim
                .missions()
                .get(mission_id)
                .unwrap_or_else(|| panic!("tick {}: {} held by finished mission {}", tick, rover.id, mission_id));
            assert_eq!(mission.vehicle(), Some(&rover.id));
        }
        let aboard = colony
            .people
            .values()
            .filter(|p| matches!(&p.location, Location::Inside(Host::Vehicle(id)) if id == &rover.id))
            .count();
        assert!(aboard <= rover.crew_capacity(), "tick {}: {} over crew capacity", tick, rover.id);
    }

    for mission in sim.missions().missions() {
        assert!(mission.roster().len() <= mission.roster().capacity());
        if let Some(vehicle) = mission.vehicle() {
            if !mission.is_done() {
                assert_eq!(colony.vehicles[vehicle].reserved_by(), Some(mission.id()));
            }
        }
    }
}

/// Each counted slot has exactly one live task holding it.
fn check_holders(sim: &Simulation, tick: u64) {
    let colony = sim.colony();
    let phases = live_phases(sim);

    let researchers: u32 = colony
        .settlements
        .values()
        .flat_map(|s| s.laboratories.iter())
        .map(|lab| lab.researcher_count())
        .sum();
    assert_eq!(
        researchers as usize,
        holders(&phases, "Research", "Researching"),
        "tick {}: lab slots out of step with researchers",
        tick
    );

    let garaged: u32 = colony.settlements.values().map(|s| s.garage.occupied()).sum();
    let mechanics = holders(&phases, "Maintain Vehicle", "Maintaining");
    assert_eq!(garaged as usize, mechanics, "tick {}: garage bays out of step", tick);
    let claimed = colony.vehicles.values().filter(|v| v.is_under_maintenance()).count();
    assert_eq!(claimed, mechanics, "tick {}: maintenance claims out of step", tick);

    let drivers = colony.vehicles.values().filter(|v| v.driver().is_some()).count();
    assert_eq!(
        drivers,
        holders(&phases, "Drive Vehicle", "Driving"),
        "tick {}: driver seats out of step",
        tick
    );

    let in_chambers: usize = colony
        .settlements
        .values()
        .map(|s| s.airlock.occupant_count())
        .chain(colony.vehicles.values().map(|v| v.airlock.occupant_count()))
        .sum();
    let cycling = holders(&phases, "Exit Airlock", "Cycling airlock")
        + holders(&phases, "Enter Airlock", "Cycling airlock");
    assert_eq!(in_chambers, cycling, "tick {}: airlock occupants out of step", tick);

    let patients = colony
        .settlements
        .values()
        .flat_map(|s| s.medical_aids.iter())
        .filter(|aid| aid.is_in_use())
        .count();
    assert_eq!(
        patients,
        holders(&phases, "Receive Treatment", "Recovering"),
        "tick {}: medical aids out of step",
        tick
    );
}

/// Nothing held by anyone.
fn check_baseline(sim: &Simulation) {
    let colony = sim.colony();
    for settlement in colony.settlements.values() {
        assert_eq!(settlement.airlock.occupant_count(), 0, "{} airlock", settlement.id);
        assert!(settlement.airlock.operator().is_none());
        assert_eq!(settlement.garage.occupied(), 0, "{} garage", settlement.id);
        for lab in &settlement.laboratories {
            assert_eq!(lab.researcher_count(), 0, "{} lab", settlement.id);
        }
        assert!(settlement.medical_aids.iter().all(|aid| !aid.is_in_use()));
    }
    for rover in colony.vehicles.values() {
        assert!(rover.driver().is_none(), "{} driver seat", rover.id);
        assert!(!rover.is_under_maintenance(), "{} maintenance claim", rover.id);
        assert!(!rover.is_reserved(), "{} reservation", rover.id);
        assert_eq!(rover.airlock.occupant_count(), 0);
        assert!(rover.airlock.operator().is_none());
    }
    assert!(sim.missions().is_empty());
    assert!(sim.minds().all(|m| !m.task_manager().has_active_task() && m.mission().is_none()));
}

#[test]
fn test_reservations_stay_balanced() {
    let mut config = SchedulerConfig::default();
    config.simulation.seed = 7;
    let colony = setup::build_colony(&config).unwrap();
    let mut sim = Simulation::new(colony, config);

    for _ in 0..1500 {
        sim.tick();
        check_balance(&sim, sim.current_tick());
        check_holders(&sim, sim.current_tick());
    }

    let closing = sim.shutdown();
    assert!(closing.iter().all(|e| e.kind.name() != "task_started"));
    check_baseline(&sim);
}

#[test]
fn test_shutdown_mid_mission_returns_to_baseline() {
    let mut config = SchedulerConfig::default();
    config.simulation.seed = 3;
    config.missions.min_members = 1;
    let colony = setup::build_colony(&config).unwrap();
    let mut sim = Simulation::new(colony, config);

    let mut ticks = 0;
    while sim.missions().is_empty() && ticks < 1500 {
        sim.tick();
        ticks += 1;
    }
    assert!(!sim.missions().is_empty(), "no mission started in 1500 ticks");
    // let the crew pick up work before pulling the plug
    for _ in 0..20 {
        sim.tick();
        check_holders(&sim, sim.current_tick());
    }

    let live = sim.missions().len();
    let closing = sim.shutdown();
    let ended = closing.iter().filter(|e| e.kind.name() == "mission_ended").count();
    assert_eq!(ended, live);
    check_baseline(&sim);
}

#[test]
fn test_missions_eventually_start() {
    let mut config = SchedulerConfig::default();
    config.simulation.seed = 3;
    config.missions.min_members = 1;
    let colony = setup::build_colony(&config).unwrap();
    let mut sim = Simulation::new(colony, config);

    let mut started = 0;
    sim.run(1500, |_, events| {
        started += events.iter().filter(|e| e.kind.name() == "mission_started").count();
    });
    assert!(started > 0, "no mission started in 1500 ticks");
}
