//! Snapshot Types
//!
//! Read-only views of scheduler state for the display layer. Snapshots are
//! built by the scheduler and never mutate it.

use serde::{Deserialize, Serialize};

use crate::MarsClock;

/// Generates a snapshot ID with the given sequence number.
pub fn generate_snapshot_id(sequence: u64) -> String {
    format!("snap_{:06}", sequence)
}

/// A task and its nested sub-task chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub name: String,
    pub phase: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_task: Option<Box<TaskSnapshot>>,
}

impl TaskSnapshot {
    /// The innermost task of the chain, which is the one actually stepped.
    pub fn innermost(&self) -> &TaskSnapshot {
        match &self.sub_task {
            Some(sub) => sub.innermost(),
            None => self,
        }
    }
}

/// What an agent is doing right now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub agent_id: String,
    pub name: String,
    pub location: String,
    pub performance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mission_id: Option<String>,
}

impl AgentSnapshot {
    /// True when the agent has neither a task nor a mission.
    pub fn is_idle(&self) -> bool {
        self.task.is_none() && self.mission_id.is_none()
    }
}

/// A mission's phase and roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionSnapshot {
    pub mission_id: String,
    pub name: String,
    pub phase: String,
    pub roster: Vec<String>,
    pub capacity: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<String>,
}

/// Complete scheduler state at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColonySnapshot {
    pub snapshot_id: String,
    pub timestamp: MarsClock,
    pub agents: Vec<AgentSnapshot>,
    pub missions: Vec<MissionSnapshot>,
}

impl ColonySnapshot {
    pub fn agent(&self, agent_id: &str) -> Option<&AgentSnapshot> {
        self.agents.iter().find(|a| a.agent_id == agent_id)
    }

    pub fn idle_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_idle()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(name: &str, sub: Option<TaskSnapshot>) -> TaskSnapshot {
        TaskSnapshot {
            name: name.into(),
            phase: "Working".into(),
            description: format!("{} description", name),
            sub_task: sub.map(Box::new),
        }
    }

    #[test]
    fn test_innermost_follows_chain() {
        let chain = task("Collect Ice", Some(task("Exit Airlock", None)));
        assert_eq!(chain.innermost().name, "Exit Airlock");
        assert_eq!(task("Sleep", None).innermost().name, "Sleep");
    }

    #[test]
    fn test_idle_agents() {
        let snapshot = ColonySnapshot {
            snapshot_id: generate_snapshot_id(1),
            timestamp: MarsClock::start(),
            agents: vec![
                AgentSnapshot {
                    agent_id: "agent_0001".into(),
                    name: "Ada".into(),
                    location: "Inside Alpha Base".into(),
                    performance: 1.0,
                    task: None,
                    mission_id: None,
                },
                AgentSnapshot {
                    agent_id: "agent_0002".into(),
                    name: "Bo".into(),
                    location: "Inside Alpha Base".into(),
                    performance: 0.8,
                    task: Some(task("Sleep", None)),
                    mission_id: None,
                },
            ],
            missions: Vec::new(),
        };
        assert_eq!(snapshot.snapshot_id, "snap_000001");
        assert_eq!(snapshot.idle_count(), 1);
        assert!(snapshot.agent("agent_0002").is_some());
    }
}
