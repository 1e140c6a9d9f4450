//! Replay export: a serializable snapshot of a finished (or stopped) game.
//!
//! The core only builds the snapshot; writing it somewhere is the
//! operator's job.

use serde::{Deserialize, Serialize};

use super::config::GameConfig;
use super::roles::{Role, Team};
use super::state::{GameState, Knowledge, ParticipantId, RoundRecord};

/// Result of the assassination phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssassinOutcome {
    pub merlin_killed: bool,
    pub assassin_id: ParticipantId,
    pub target_id: ParticipantId,
    /// What Morgana told the assassin before the pick, if Morgana is seated.
    pub morgana_advice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerExport {
    pub player_id: ParticipantId,
    pub player_name: String,
    pub role: Role,
    pub team: Team,
    pub knowledge: Knowledge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedConfig {
    pub player_count: usize,
    pub team_sizes: Vec<usize>,
    pub fail_thresholds: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameExport {
    /// Schema version for forward compatibility.
    pub version: u32,
    pub game_id: String,
    pub game_config: ExportedConfig,
    pub players: Vec<PlayerExport>,
    pub round_records: Vec<RoundRecord>,
    pub mission_results: Vec<bool>,
    pub good_wins: usize,
    pub evil_wins: usize,
    pub winner: Option<Team>,
    pub end_reason: Option<String>,
    pub end_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assassin_phase: Option<AssassinOutcome>,
}

impl GameExport {
    /// Current schema version.
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(
        config: &GameConfig,
        state: &GameState,
        assassination: Option<&AssassinOutcome>,
    ) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            game_id: state.game_id.to_string(),
            game_config: ExportedConfig {
                player_count: config.player_count(),
                team_sizes: config.team_sizes.clone(),
                fail_thresholds: config.fail_thresholds.clone(),
            },
            players: state
                .participants
                .iter()
                .map(|p| PlayerExport {
                    player_id: p.id,
                    player_name: p.name.clone(),
                    role: p.role,
                    team: p.team(),
                    knowledge: p.knowledge.clone(),
                })
                .collect(),
            round_records: state.records.clone(),
            mission_results: state.mission_results.clone(),
            good_wins: state.good_wins(),
            evil_wins: state.evil_wins(),
            winner: state.winner,
            end_reason: state.end_reason.map(|r| r.tag().to_string()),
            end_description: state.end_reason.map(|r| r.description().to_string()),
            assassin_phase: assassination.cloned(),
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        serde_json::to_string_pretty(self).map_err(|e| PersistenceError::SerializeFailed {
            reason: e.to_string(),
        })
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        let export: Self =
            serde_json::from_str(json).map_err(|e| PersistenceError::DeserializeFailed {
                reason: e.to_string(),
            })?;

        if export.version > Self::CURRENT_VERSION {
            return Err(PersistenceError::VersionMismatch {
                expected: Self::CURRENT_VERSION,
                found: export.version,
            });
        }

        Ok(export)
    }
}

/// Error during export serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    SerializeFailed { reason: String },
    DeserializeFailed { reason: String },
    VersionMismatch { expected: u32, found: u32 },
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SerializeFailed { reason } => write!(f, "serialize failed: {}", reason),
            Self::DeserializeFailed { reason } => write!(f, "deserialize failed: {}", reason),
            Self::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "version mismatch: expected {}, found {}",
                    expected, found
                )
            }
        }
    }
}

impl std::error::Error for PersistenceError {}
