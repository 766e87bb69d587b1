//! Run Summary
//!
//! Event tallies collected while the headless runner drains ticks.

use colony_events::SimEvent;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Clone, Serialize)]
pub struct RunSummary {
    ticks: u64,
    total_events: u64,
    by_kind: BTreeMap<&'static str, u64>,
    tasks_by_name: BTreeMap<String, u64>,
    mission_end_reasons: BTreeMap<String, u64>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one tick's worth of events.
    pub fn record_tick(&mut self, events: &[SimEvent]) {
        self.ticks += 1;
        self.record_events(events);
    }

    /// Records events that did not come from a tick.
    pub fn record_events(&mut self, events: &[SimEvent]) {
        self.total_events += events.len() as u64;
        for event in events {
            *self.by_kind.entry(event.kind.name()).or_default() += 1;
            match &event.kind {
                colony_events::EventKind::TaskStarted { task } => {
                    *self.tasks_by_name.entry(task.clone()).or_default() += 1;
                }
                colony_events::EventKind::MissionEnded { reason, .. } => {
                    *self.mission_end_reasons.entry(reason.clone()).or_default() += 1;
                }
                _ => {}
            }
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn total_events(&self) -> u64 {
        self.total_events
    }

    pub fn count(&self, kind: &str) -> u64 {
        self.by_kind.get(kind).copied().unwrap_or(0)
    }

    pub fn tasks_started(&self, task: &str) -> u64 {
        self.tasks_by_name.get(task).copied().unwrap_or(0)
    }

    /// Writes the tallies as pretty JSON.
    pub fn write(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ticks run: {}", self.ticks)?;
        writeln!(f, "Events: {}", self.total_events)?;
        for (kind, count) in &self.by_kind {
            writeln!(f, "  {:<24} {}", kind, count)?;
        }
        writeln!(f, "Tasks started:")?;
        for (task, count) in &self.tasks_by_name {
            writeln!(f, "  {:<24} {}", task, count)?;
        }
        if !self.mission_end_reasons.is_empty() {
            writeln!(f, "Missions ended:")?;
            for (reason, count) in &self.mission_end_reasons {
                writeln!(f, "  {:<24} {}", reason, count)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colony_events::{EventKind, MarsClock};

    #[test]
    fn test_tallies() {
        let mut summary = RunSummary::new();
        let clock = MarsClock::start();
        summary.record_tick(&[
            SimEvent::new(clock, EventKind::TaskStarted { task: "Sleep".into() }),
            SimEvent::new(clock, EventKind::TaskEnded { task: "Sleep".into() }),
        ]);
        summary.record_tick(&[SimEvent::new(
            clock,
            EventKind::MissionEnded {
                mission_id: "00-001".into(),
                reason: "completed".into(),
            },
        )]);

        summary.record_events(&[SimEvent::new(clock, EventKind::TaskEnded { task: "Relax".into() })]);

        assert_eq!(summary.ticks(), 2);
        assert_eq!(summary.count("task_started"), 1);
        assert_eq!(summary.count("accident"), 0);
        assert_eq!(summary.tasks_started("Sleep"), 1);
        assert_eq!(summary.total_events(), 4);
        assert_eq!(summary.count("task_ended"), 2);
        let text = summary.to_string();
        assert!(text.contains("completed"));
    }

    #[test]
    fn test_write_json() {
        let mut summary = RunSummary::new();
        summary.record_tick(&[]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        summary.write(&path).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["ticks"], 1);
        assert_eq!(value["total_events"], 0);
    }
}
