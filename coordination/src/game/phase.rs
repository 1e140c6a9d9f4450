//! Protocol phases and their legal transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where the game currently is in the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Seats dealt, nothing revealed yet.
    Setup,
    /// Night knowledge being handed out.
    Night,
    /// The leader picks a team.
    TeamProposal,
    /// Every seat makes one statement about the proposal.
    Discussion,
    /// Every seat approves or rejects the proposal.
    Vote,
    /// The approved team signals success or failure.
    Mission,
    /// The assassin names a target after the good side won the missions.
    Assassin,
    /// Game over.
    Terminal,
}

impl GamePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Terminal)
    }

    /// Valid transitions from this phase.
    pub fn valid_transitions(self) -> &'static [GamePhase] {
        match self {
            Self::Setup => &[Self::Night],
            Self::Night => &[Self::TeamProposal],
            Self::TeamProposal => &[Self::Discussion],
            Self::Discussion => &[Self::Vote],
            Self::Vote => &[Self::TeamProposal, Self::Mission, Self::Terminal],
            Self::Mission => &[Self::TeamProposal, Self::Assassin, Self::Terminal],
            Self::Assassin => &[Self::Terminal],
            Self::Terminal => &[],
        }
    }

    pub fn can_transition_to(self, to: GamePhase) -> bool {
        self.valid_transitions().contains(&to)
    }
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Setup => write!(f, "setup"),
            Self::Night => write!(f, "night"),
            Self::TeamProposal => write!(f, "team_proposal"),
            Self::Discussion => write!(f, "discussion"),
            Self::Vote => write!(f, "vote"),
            Self::Mission => write!(f, "mission"),
            Self::Assassin => write!(f, "assassin"),
            Self::Terminal => write!(f, "terminal"),
        }
    }
}

/// A phase transition record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: GamePhase,
    pub to: GamePhase,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

/// Error for invalid phase transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub from: GamePhase,
    pub to: GamePhase,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid transition {} → {}", self.from, self.to)
    }
}

impl std::error::Error for TransitionError {}
