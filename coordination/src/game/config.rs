//! Table configuration: seats, per-round schedules and vote limits.

use serde::{Deserialize, Serialize};

use super::roles::{Role, Team};
use crate::memory::CompactionError;

/// Error raised when a [`GameConfig`] cannot drive a legal game.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("schedule length mismatch: {team_sizes} team sizes, {thresholds} fail thresholds")]
    ScheduleMismatch { team_sizes: usize, thresholds: usize },

    #[error("round {round} needs {size} members but only {players} seats exist")]
    TeamTooLarge {
        round: usize,
        size: usize,
        players: usize,
    },

    #[error("round {round} has a zero team size or fail threshold")]
    ZeroEntry { round: usize },

    #[error("role set must contain both teams and be free of duplicates")]
    InvalidRoles,

    #[error("max_team_votes and wins_needed must be positive")]
    ZeroLimit,

    #[error("{rounds} rounds cannot always produce {wins_needed} wins for one side")]
    UndecidableSchedule { rounds: usize, wins_needed: usize },

    #[error("memory policy rejected: {0}")]
    MemoryPolicy(#[from] CompactionError),
}

/// Static rules for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Roles dealt to the seats; the seat count is `roles.len()`.
    pub roles: Vec<Role>,
    /// Team size per round (1-based round r uses index r-1).
    pub team_sizes: Vec<usize>,
    /// Failure signals needed to fail the mission, per round.
    pub fail_thresholds: Vec<usize>,
    /// Consecutive rejected proposals that end the game for the evil side.
    pub max_team_votes: u32,
    /// Mission results one side needs to finish the round loop.
    pub wins_needed: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            roles: Role::STANDARD_SIX.to_vec(),
            team_sizes: vec![2, 3, 4, 3, 4],
            fail_thresholds: vec![1, 1, 1, 1, 1],
            max_team_votes: 5,
            wins_needed: 3,
        }
    }
}

impl GameConfig {
    pub fn player_count(&self) -> usize {
        self.roles.len()
    }

    pub fn rounds(&self) -> usize {
        self.team_sizes.len()
    }

    /// Team size for a 1-based round number.
    pub fn team_size(&self, round: usize) -> usize {
        self.team_sizes[round - 1]
    }

    /// Fail threshold for a 1-based round number.
    pub fn fail_threshold(&self, round: usize) -> usize {
        self.fail_thresholds[round - 1]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.team_sizes.len() != self.fail_thresholds.len() {
            return Err(ConfigError::ScheduleMismatch {
                team_sizes: self.team_sizes.len(),
                thresholds: self.fail_thresholds.len(),
            });
        }
        if self.max_team_votes == 0 || self.wins_needed == 0 {
            return Err(ConfigError::ZeroLimit);
        }

        if self.rounds() < self.wins_needed * 2 - 1 {
            return Err(ConfigError::UndecidableSchedule {
                rounds: self.rounds(),
                wins_needed: self.wins_needed,
            });
        }

        let players = self.player_count();
        for (idx, (&size, &threshold)) in self
            .team_sizes
            .iter()
            .zip(self.fail_thresholds.iter())
            .enumerate()
        {
            if size == 0 || threshold == 0 {
                return Err(ConfigError::ZeroEntry { round: idx + 1 });
            }
            if size > players {
                return Err(ConfigError::TeamTooLarge {
                    round: idx + 1,
                    size,
                    players,
                });
            }
        }

        let mut seen = self.roles.clone();
        seen.sort_by_key(|r| r.id());
        seen.dedup();
        let has_good = self.roles.iter().any(|r| r.team() == Team::Good);
        let has_evil = self.roles.iter().any(|r| r.team() == Team::Evil);
        if seen.len() != self.roles.len() || !has_good || !has_evil {
            return Err(ConfigError::InvalidRoles);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid_six_seat_table() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.player_count(), 6);
        assert_eq!(config.team_size(1), 2);
        assert_eq!(config.team_size(5), 4);
        assert_eq!(config.fail_threshold(3), 1);
    }

    #[test]
    fn test_schedule_mismatch_rejected() {
        let config = GameConfig {
            fail_thresholds: vec![1, 1],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ScheduleMismatch { .. })
        ));
    }

    #[test]
    fn test_oversized_team_rejected() {
        let config = GameConfig {
            team_sizes: vec![2, 3, 7, 3, 4],
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::TeamTooLarge {
                round: 3,
                size: 7,
                players: 6
            })
        );
    }

    #[test]
    fn test_duplicate_roles_rejected() {
        let config = GameConfig {
            roles: vec![
                Role::Merlin,
                Role::Merlin,
                Role::Percival,
                Role::LoyalServant1,
                Role::Morgana,
                Role::Assassin,
            ],
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidRoles));
    }

    #[test]
    fn test_schedule_must_force_a_winner() {
        let config = GameConfig {
            team_sizes: vec![2, 3, 4, 3],
            fail_thresholds: vec![1, 1, 1, 1],
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::UndecidableSchedule {
                rounds: 4,
                wins_needed: 3
            })
        );
    }

    #[test]
    fn test_per_round_threshold_is_configurable() {
        let config = GameConfig {
            fail_thresholds: vec![1, 1, 1, 2, 1],
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.fail_threshold(4), 2);
    }
}
