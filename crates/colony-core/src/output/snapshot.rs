//! Snapshot Generation
//!
//! Builds read-only colony snapshots at regular intervals and writes them
//! as JSON.

use colony_events::{generate_snapshot_id, AgentSnapshot, ColonySnapshot};
use std::fs;
use std::path::Path;

use crate::components::{Colony, Location, Person};
use crate::systems::Simulation;

/// Tracks snapshot ids and when the next one is due
#[derive(Debug)]
pub struct SnapshotGenerator {
    next_snapshot_id: u64,
    snapshot_interval: u64,
    last_snapshot_tick: u64,
}

impl SnapshotGenerator {
    /// An interval of 0 disables periodic snapshots.
    pub fn new(snapshot_interval: u64) -> Self {
        Self {
            next_snapshot_id: 1,
            snapshot_interval,
            last_snapshot_tick: 0,
        }
    }

    pub fn should_snapshot(&self, current_tick: u64) -> bool {
        self.snapshot_interval > 0 && current_tick % self.snapshot_interval == 0
    }

    pub fn next_id(&mut self) -> String {
        let id = generate_snapshot_id(self.next_snapshot_id);
        self.next_snapshot_id += 1;
        id
    }

    pub fn mark_snapshot(&mut self, tick: u64) {
        self.last_snapshot_tick = tick;
    }

    pub fn last_snapshot_tick(&self) -> u64 {
        self.last_snapshot_tick
    }

    pub fn snapshot_count(&self) -> u64 {
        self.next_snapshot_id - 1
    }
}

fn describe_location(colony: &Colony, person: &Person) -> String {
    match &person.location {
        Location::Inside(host) => colony.host_name(host),
        Location::InAirlock(host) => format!("{} airlock", colony.host_name(host)),
        Location::Outside(coordinates) => format!("outside at {}", coordinates),
    }
}

/// Generate a complete colony snapshot
pub fn generate_snapshot(sim: &Simulation, generator: &mut SnapshotGenerator) -> ColonySnapshot {
    let colony = sim.colony();
    let agents = sim
        .minds()
        .filter_map(|mind| {
            let person = colony.person(mind.agent())?;
            Some(AgentSnapshot {
                agent_id: person.id.0.clone(),
                name: person.name.clone(),
                location: describe_location(colony, person),
                performance: person.performance(),
                task: mind.task_snapshot(),
                mission_id: mind.mission().map(|id| id.0.clone()),
            })
        })
        .collect();

    generator.mark_snapshot(sim.current_tick());
    ColonySnapshot {
        snapshot_id: generator.next_id(),
        timestamp: colony.clock,
        agents,
        missions: sim.missions().snapshots(),
    }
}

/// Write snapshot to a JSON file
pub fn write_snapshot(snapshot: &ColonySnapshot, path: impl AsRef<Path>) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json)?;
    Ok(())
}

/// Write snapshot into `dir` under its own id
pub fn write_snapshot_to_dir(snapshot: &ColonySnapshot, dir: impl AsRef<Path>) -> std::io::Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    write_snapshot(snapshot, dir.join(format!("{}.json", snapshot.snapshot_id)))
}

/// Write current state (overwrites each time)
pub fn write_current_state(snapshot: &ColonySnapshot, dir: impl AsRef<Path>) -> std::io::Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    write_snapshot(snapshot, dir.join("current_state.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::tasks::test_support::colony;

    #[test]
    fn test_generator_interval() {
        let mut generator = SnapshotGenerator::new(100);
        assert!(generator.should_snapshot(0));
        assert!(!generator.should_snapshot(50));
        assert!(generator.should_snapshot(200));
        assert_eq!(generator.next_id(), "snap_000001");
        assert_eq!(generator.snapshot_count(), 1);

        assert!(!SnapshotGenerator::new(0).should_snapshot(100));
    }

    #[test]
    fn test_snapshot_serialization() {
        let mut sim = Simulation::new(colony(2), SchedulerConfig::default());
        for _ in 0..5 {
            sim.tick();
        }
        let mut generator = SnapshotGenerator::new(10);
        let snapshot = generate_snapshot(&sim, &mut generator);
        assert_eq!(snapshot.snapshot_id, "snap_000001");
        assert_eq!(snapshot.agents.len(), 2);
        assert_eq!(snapshot.agent("agent_0001").unwrap().name, "Colonist 1");
        assert_eq!(generator.last_snapshot_tick(), 5);

        let dir = tempfile::tempdir().unwrap();
        write_snapshot_to_dir(&snapshot, dir.path()).unwrap();
        write_current_state(&snapshot, dir.path()).unwrap();

        let json = fs::read_to_string(dir.path().join("snap_000001.json")).unwrap();
        let parsed: ColonySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.snapshot_id, snapshot.snapshot_id);
        assert_eq!(parsed.agents.len(), 2);
        assert_eq!(parsed.missions, snapshot.missions);
        assert!(dir.path().join("current_state.json").exists());
    }
}
