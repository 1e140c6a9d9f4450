//! Event types streamed to observers.
//!
//! Every event serializes as `{"type": …, "data": {…}}`; the envelope adds
//! a Unix-millisecond `timestamp`. Consumers must tolerate types they do
//! not know.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::{GamePhase, ParticipantId, Role, Team};

/// Why the runner stopped advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseReason {
    /// Single-step mode re-paused after one unit of progress.
    Step,
    /// An operator pause command.
    Pause,
}

impl std::fmt::Display for PauseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Step => write!(f, "step"),
            Self::Pause => write!(f, "pause"),
        }
    }
}

/// What a participant is currently deciding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThinkingAction {
    ProposingTeam,
    Speaking,
    Voting,
    MissionVote,
    Advising,
    Assassinating,
}

/// Public seat summary for observers (roles included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub player_id: ParticipantId,
    pub player_name: String,
    pub role: Role,
    pub team: Team,
}

/// All game events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GameEvent {
    GameStarted {
        game_id: String,
        players: Vec<PlayerInfo>,
        leader_id: ParticipantId,
    },

    PhaseStarted {
        phase: GamePhase,
        #[serde(skip_serializing_if = "Option::is_none")]
        round: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        leader_id: Option<ParticipantId>,
    },

    PhaseCompleted {
        phase: GamePhase,
        #[serde(skip_serializing_if = "Option::is_none")]
        round: Option<usize>,
    },

    RoundStarted {
        round: usize,
        team_size: usize,
        leader_id: ParticipantId,
    },

    LeaderChanged {
        new_leader_id: ParticipantId,
        consecutive_rejects: u32,
    },

    AgentThinking {
        player_id: ParticipantId,
        action: ThinkingAction,
    },

    TeamProposed {
        leader_id: ParticipantId,
        team: Vec<ParticipantId>,
        round: usize,
    },

    AgentSpeech {
        player_id: ParticipantId,
        player_name: String,
        text: String,
        round: usize,
    },

    AgentVote {
        player_id: ParticipantId,
        player_name: String,
        approved: bool,
    },

    VoteResult {
        approved: bool,
        approve_count: usize,
        reject_count: usize,
        votes: BTreeMap<ParticipantId, bool>,
        round: usize,
        consecutive_rejects: u32,
    },

    AgentMissionVote {
        player_id: ParticipantId,
        success: bool,
    },

    MissionResult {
        success: bool,
        success_count: usize,
        fail_count: usize,
        round: usize,
    },

    ScoreUpdate {
        good_wins: usize,
        evil_wins: usize,
    },

    MorganaAdvice {
        player_id: ParticipantId,
        text: String,
    },

    AssassinResult {
        merlin_killed: bool,
        assassin_id: ParticipantId,
        target_id: ParticipantId,
    },

    GameEnded {
        winner: Team,
        reason: String,
        description: String,
        players: Vec<PlayerInfo>,
    },

    RunnerPaused {
        reason: PauseReason,
    },

    RunnerResumed {
        step_mode: bool,
    },

    SessionStopped {
        reason: String,
        round: usize,
    },
}

impl GameEvent {
    /// Wire tag of this event.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::GameStarted { .. } => "game_started",
            Self::PhaseStarted { .. } => "phase_started",
            Self::PhaseCompleted { .. } => "phase_completed",
            Self::RoundStarted { .. } => "round_started",
            Self::LeaderChanged { .. } => "leader_changed",
            Self::AgentThinking { .. } => "agent_thinking",
            Self::TeamProposed { .. } => "team_proposed",
            Self::AgentSpeech { .. } => "agent_speech",
            Self::AgentVote { .. } => "agent_vote",
            Self::VoteResult { .. } => "vote_result",
            Self::AgentMissionVote { .. } => "agent_mission_vote",
            Self::MissionResult { .. } => "mission_result",
            Self::ScoreUpdate { .. } => "score_update",
            Self::MorganaAdvice { .. } => "morgana_advice",
            Self::AssassinResult { .. } => "assassin_result",
            Self::GameEnded { .. } => "game_ended",
            Self::RunnerPaused { .. } => "runner_paused",
            Self::RunnerResumed { .. } => "runner_resumed",
            Self::SessionStopped { .. } => "session_stopped",
        }
    }

    /// Whether this event ends the stream for a game.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::GameEnded { .. } | Self::SessionStopped { .. })
    }

    /// Control-flow markers that do not represent protocol progress.
    pub fn is_control_marker(&self) -> bool {
        matches!(self, Self::RunnerPaused { .. } | Self::RunnerResumed { .. })
    }
}

/// An event stamped at publication time.
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    /// Position in the bus's emission order, starting at 0.
    pub sequence: u64,
    pub event: GameEvent,
    pub timestamp: DateTime<Utc>,
}

impl EventEnvelope {
    pub fn new(sequence: u64, event: GameEvent) -> Self {
        Self {
            sequence,
            event,
            timestamp: Utc::now(),
        }
    }

    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }

    /// `{type, data, timestamp}` wire form.
    pub fn to_json(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(&self.event)
            .unwrap_or_else(|_| serde_json::json!({ "type": self.event_type() }));
        if let Some(object) = value.as_object_mut() {
            object.insert(
                "timestamp".to_string(),
                serde_json::json!(self.timestamp.timestamp_millis()),
            );
        }
        value
    }
}

impl Serialize for EventEnvelope {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let envelope = EventEnvelope::new(
            0,
            GameEvent::RunnerPaused {
                reason: PauseReason::Step,
            },
        );
        let json = envelope.to_json();
        assert_eq!(json["type"], "runner_paused");
        assert_eq!(json["data"]["reason"], "step");
        assert!(json["timestamp"].is_i64());
    }

    #[test]
    fn test_event_type_matches_serde_tag() {
        let events = vec![
            GameEvent::PhaseStarted {
                phase: GamePhase::Night,
                round: None,
                leader_id: None,
            },
            GameEvent::VoteResult {
                approved: false,
                approve_count: 3,
                reject_count: 3,
                votes: BTreeMap::new(),
                round: 1,
                consecutive_rejects: 1,
            },
            GameEvent::SessionStopped {
                reason: "stop requested".into(),
                round: 2,
            },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.event_type());
        }
    }

    #[test]
    fn test_optional_fields_omitted() {
        let json = serde_json::to_value(GameEvent::PhaseStarted {
            phase: GamePhase::Night,
            round: None,
            leader_id: None,
        })
        .unwrap();
        assert_eq!(json["data"], serde_json::json!({"phase": "night"}));
    }

    #[test]
    fn test_terminal_and_marker_classification() {
        assert!(GameEvent::SessionStopped {
            reason: String::new(),
            round: 0
        }
        .is_terminal());
        assert!(GameEvent::RunnerResumed { step_mode: true }.is_control_marker());
        assert!(!GameEvent::ScoreUpdate {
            good_wins: 1,
            evil_wins: 0
        }
        .is_terminal());
    }
}
