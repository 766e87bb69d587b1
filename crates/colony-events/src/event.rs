//! Event Types
//!
//! Events emitted by the scheduler for the display layer. The scheduler never
//! reads these back; they are an append-only record of what happened.

use serde::{Deserialize, Serialize};

use crate::MarsClock;

/// Generates an event ID with the given sequence number.
pub fn generate_event_id(sequence: u64) -> String {
    format!("evt_{:08}", sequence)
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum EventKind {
    /// An agent started a task
    TaskStarted { task: String },
    /// An agent's task finished or was abandoned
    TaskEnded { task: String },
    /// A new mission was created by its first member
    MissionStarted { mission_id: String, mission: String },
    /// An agent joined an existing mission
    MissionJoined { mission_id: String },
    /// A mission moved to a new phase
    MissionPhaseChanged {
        mission_id: String,
        from: String,
        to: String,
    },
    /// A member left the roster (capacity trim, incapacity, ...)
    MemberRemoved { mission_id: String, reason: String },
    /// A mission ended and released its assets
    MissionEnded { mission_id: String, reason: String },
    /// A stochastic accident damaged an entity
    Accident { entity: String, activity: String },
}

impl EventKind {
    /// Short snake_case name of the event kind.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::TaskStarted { .. } => "task_started",
            EventKind::TaskEnded { .. } => "task_ended",
            EventKind::MissionStarted { .. } => "mission_started",
            EventKind::MissionJoined { .. } => "mission_joined",
            EventKind::MissionPhaseChanged { .. } => "mission_phase_changed",
            EventKind::MemberRemoved { .. } => "member_removed",
            EventKind::MissionEnded { .. } => "mission_ended",
            EventKind::Accident { .. } => "accident",
        }
    }

    /// Returns true for mission lifecycle events.
    pub fn is_mission_event(&self) -> bool {
        matches!(
            self,
            EventKind::MissionStarted { .. }
                | EventKind::MissionJoined { .. }
                | EventKind::MissionPhaseChanged { .. }
                | EventKind::MemberRemoved { .. }
                | EventKind::MissionEnded { .. }
        )
    }
}

/// A single recorded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    /// Sequence identifier, assigned when the event is drained from a tick
    #[serde(default)]
    pub event_id: String,
    pub timestamp: MarsClock,
    /// Agent the event is about, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl SimEvent {
    pub fn new(timestamp: MarsClock, kind: EventKind) -> Self {
        Self {
            event_id: String::new(),
            timestamp,
            agent_id: None,
            kind,
        }
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn with_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = event_id.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_format() {
        assert_eq!(generate_event_id(42), "evt_00000042");
    }

    #[test]
    fn test_event_serializes_flat() {
        let event = SimEvent::new(
            MarsClock::new(3, 120.0),
            EventKind::MissionPhaseChanged {
                mission_id: "00-001".into(),
                from: "Embarking".into(),
                to: "Traveling to site 1".into(),
            },
        )
        .with_agent("agent_0002")
        .with_id(generate_event_id(7));

        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "mission_phase_changed");
        assert_eq!(json["mission_id"], "00-001");
        assert_eq!(json["agent_id"], "agent_0002");
        assert_eq!(json["timestamp"], "sol_3.msol_120.000");

        let back: SimEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_agentless_event_omits_agent_field() {
        let event = SimEvent::new(
            MarsClock::start(),
            EventKind::MissionEnded {
                mission_id: "00-000".into(),
                reason: "completed".into(),
            },
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("agent_id"));
        assert!(event.kind.is_mission_event());
        assert_eq!(event.kind.name(), "mission_ended");
    }
}
