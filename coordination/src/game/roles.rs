//! Closed role set and per-role capabilities.
//!
//! Roles are a tagged variant rather than a trait hierarchy: every behavior
//! difference between roles is expressed as a capability flag that phase
//! functions consult.

use serde::{Deserialize, Serialize};

/// The two sides of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    /// The non-deceptive side. Wins by completing three missions and
    /// keeping Merlin hidden.
    Good,
    /// The deceptive side. Wins by failing three missions, by exhausting
    /// the team votes of a round, or by assassinating Merlin.
    Evil,
}

impl Team {
    pub fn opponent(self) -> Self {
        match self {
            Self::Good => Self::Evil,
            Self::Evil => Self::Good,
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Good => write!(f, "good"),
            Self::Evil => write!(f, "evil"),
        }
    }
}

/// A seat's hidden identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Merlin,
    Percival,
    #[serde(rename = "loyal_servant_1")]
    LoyalServant1,
    #[serde(rename = "loyal_servant_2")]
    LoyalServant2,
    Morgana,
    Assassin,
}

impl Role {
    /// The standard six-seat table.
    pub const STANDARD_SIX: [Role; 6] = [
        Role::Merlin,
        Role::Percival,
        Role::LoyalServant1,
        Role::LoyalServant2,
        Role::Morgana,
        Role::Assassin,
    ];

    pub fn team(self) -> Team {
        match self {
            Self::Merlin | Self::Percival | Self::LoyalServant1 | Self::LoyalServant2 => {
                Team::Good
            }
            Self::Morgana | Self::Assassin => Team::Evil,
        }
    }

    /// Stable snake_case identifier.
    pub fn id(self) -> &'static str {
        match self {
            Self::Merlin => "merlin",
            Self::Percival => "percival",
            Self::LoyalServant1 => "loyal_servant_1",
            Self::LoyalServant2 => "loyal_servant_2",
            Self::Morgana => "morgana",
            Self::Assassin => "assassin",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Merlin => "Merlin",
            Self::Percival => "Percival",
            Self::LoyalServant1 => "Loyal Servant (Arthur)",
            Self::LoyalServant2 => "Loyal Servant (Kay)",
            Self::Morgana => "Morgana",
            Self::Assassin => "Assassin",
        }
    }

    /// Sees every evil seat during the night.
    pub fn can_see_evil(self) -> bool {
        matches!(self, Self::Merlin)
    }

    /// Sees Merlin and Morgana during the night without telling them apart.
    pub fn can_see_merlin(self) -> bool {
        matches!(self, Self::Percival)
    }

    /// Picks the target in the assassination phase.
    pub fn is_assassin(self) -> bool {
        matches!(self, Self::Assassin)
    }

    /// May signal either outcome on a mission. Everyone else must signal
    /// success.
    pub fn free_mission_choice(self) -> bool {
        self.team() == Team::Evil
    }

    /// What the role knows and wants, used in the role's system prompt.
    pub fn description(self) -> &'static str {
        match self {
            Self::Merlin => {
                "You are Merlin, the seer of the good side. During the night you saw every \
                 member of the evil side. Guide the good players toward clean teams, but stay \
                 hidden: if the Assassin identifies you at the end, the good side loses."
            }
            Self::Percival => {
                "You are Percival, Merlin's guardian. During the night you saw Merlin and \
                 Morgana but cannot tell which is which. Work out the real Merlin and protect \
                 them from the Assassin."
            }
            Self::LoyalServant1 | Self::LoyalServant2 => {
                "You are a Loyal Servant of Arthur on the good side. You have no special \
                 knowledge; reason from speeches, votes and mission results to find the evil \
                 players, and do not expose Merlin."
            }
            Self::Morgana => {
                "You are Morgana of the evil side. To Percival you look exactly like Merlin. \
                 Pose as Merlin to mislead the good side, make missions fail, and help the \
                 Assassin find the real Merlin at the end."
            }
            Self::Assassin => {
                "You are the Assassin of the evil side. You know your ally Morgana. Pass as \
                 good and sabotage missions. If the good side completes three missions you get \
                 one last chance: name the real Merlin and the evil side wins."
            }
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}
