//! Game model: roles, table configuration, state and pure rules.

pub mod config;
pub mod export;
pub mod phase;
pub mod roles;
pub mod rules;
pub mod state;

pub use config::{ConfigError, GameConfig};
pub use export::{AssassinOutcome, GameExport, PersistenceError, PlayerExport};
pub use phase::{GamePhase, PhaseTransition, TransitionError};
pub use roles::{Role, Team};
pub use rules::{assassin_candidates, correct_team, mission_failed, speaking_order, tally};
pub use state::{
    player_name, EndReason, GameState, Knowledge, Participant, ParticipantId, RoundRecord,
};
