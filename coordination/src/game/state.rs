//! Authoritative game record: seats, round records and terminal fields.
//!
//! Owned by the orchestrator for the lifetime of one game. Phase functions
//! mutate it through the methods here; nothing else holds a reference.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::config::GameConfig;
use super::phase::{GamePhase, PhaseTransition, TransitionError};
use super::roles::{Role, Team};

/// Seat index, 0-based. Prompts and transcripts use the 1-based
/// `Player N` form.
pub type ParticipantId = usize;

/// Public name for a seat.
pub fn player_name(id: ParticipantId) -> String {
    format!("Player {}", id + 1)
}

/// Private knowledge handed out during the night. Written once, never
/// mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Knowledge {
    /// Every evil seat (Merlin only).
    pub known_evil: Vec<ParticipantId>,
    /// Merlin and Morgana, unordered (Percival only).
    pub known_merlin_or_morgana: Vec<ParticipantId>,
    /// Fellow evil seats (evil roles only).
    pub known_allies: Vec<ParticipantId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub role: Role,
    pub is_leader: bool,
    pub knowledge: Knowledge,
}

impl Participant {
    pub fn team(&self) -> Team {
        self.role.team()
    }

    pub fn is_good(&self) -> bool {
        self.team() == Team::Good
    }
}

/// One team-proposal attempt. Rejected attempts keep their votes and
/// transcript but never get mission votes or a success value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// 1-based round number.
    pub round: usize,
    pub leader: ParticipantId,
    pub team: Vec<ParticipantId>,
    pub team_votes: BTreeMap<ParticipantId, bool>,
    pub mission_votes: BTreeMap<ParticipantId, bool>,
    pub success: Option<bool>,
    /// Statements in speaking order.
    pub speeches: Vec<(ParticipantId, String)>,
}

impl RoundRecord {
    pub fn new(round: usize, leader: ParticipantId, team: Vec<ParticipantId>) -> Self {
        Self {
            round,
            leader,
            team,
            team_votes: BTreeMap::new(),
            mission_votes: BTreeMap::new(),
            success: None,
            speeches: Vec::new(),
        }
    }

    pub fn approve_count(&self) -> usize {
        self.team_votes.values().filter(|v| **v).count()
    }

    pub fn reject_count(&self) -> usize {
        self.team_votes.values().filter(|v| !**v).count()
    }

    /// Strict majority; a tie rejects.
    pub fn approved(&self) -> bool {
        self.approve_count() > self.reject_count()
    }

    pub fn fail_count(&self) -> usize {
        self.mission_votes.values().filter(|v| !**v).count()
    }
}

/// Why the game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// A round ran out of team votes.
    MaxRejections,
    /// The evil side failed enough missions.
    ThreeFailures,
    /// The good side won the missions but the Assassin found Merlin.
    MerlinAssassinated,
    /// The good side won the missions and Merlin survived.
    MerlinSurvived,
}

impl EndReason {
    pub fn tag(self) -> &'static str {
        match self {
            Self::MaxRejections => "max_rejections",
            Self::ThreeFailures => "three_failures",
            Self::MerlinAssassinated => "merlin_assassinated",
            Self::MerlinSurvived => "merlin_survived",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::MaxRejections => "Five consecutive team proposals were rejected. Evil wins!",
            Self::ThreeFailures => "Three missions failed. Evil wins!",
            Self::MerlinAssassinated => "Merlin was assassinated. Evil wins in the end!",
            Self::MerlinSurvived => "Three missions succeeded and Merlin survived. Good wins!",
        }
    }

    pub fn winner(self) -> Team {
        match self {
            Self::MerlinSurvived => Team::Good,
            _ => Team::Evil,
        }
    }
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub game_id: uuid::Uuid,
    pub participants: Vec<Participant>,
    /// 1-based current round; 0 before the first round starts.
    pub round: usize,
    pub leader: ParticipantId,
    /// Reset at each round start, incremented per rejected proposal.
    pub consecutive_rejects: u32,
    pub records: Vec<RoundRecord>,
    /// Completed mission outcomes in order; `true` is a success.
    pub mission_results: Vec<bool>,
    pub proposed_team: Vec<ParticipantId>,
    pub phase: GamePhase,
    pub transitions: Vec<PhaseTransition>,
    pub game_over: bool,
    pub winner: Option<Team>,
    pub end_reason: Option<EndReason>,
}

impl GameState {
    /// Deal the configured roles over shuffled seats and draw the first
    /// leader.
    pub fn new<R: Rng>(config: &GameConfig, rng: &mut R) -> Self {
        let mut roles = config.roles.clone();
        roles.shuffle(rng);
        let leader = rng.random_range(0..roles.len());

        let participants = roles
            .into_iter()
            .enumerate()
            .map(|(id, role)| Participant {
                id,
                name: player_name(id),
                role,
                is_leader: id == leader,
                knowledge: Knowledge::default(),
            })
            .collect();

        Self::from_participants(participants, leader)
    }

    /// Build a state from an explicit seating, for tests and replays.
    pub fn from_participants(mut participants: Vec<Participant>, leader: ParticipantId) -> Self {
        for p in participants.iter_mut() {
            p.is_leader = p.id == leader;
        }
        Self {
            game_id: uuid::Uuid::new_v4(),
            participants,
            round: 0,
            leader,
            consecutive_rejects: 0,
            records: Vec::new(),
            mission_results: Vec::new(),
            proposed_team: Vec::new(),
            phase: GamePhase::Setup,
            transitions: Vec::new(),
            game_over: false,
            winner: None,
            end_reason: None,
        }
    }

    pub fn player_count(&self) -> usize {
        self.participants.len()
    }

    pub fn participant(&self, id: ParticipantId) -> &Participant {
        &self.participants[id]
    }

    pub fn leader(&self) -> &Participant {
        &self.participants[self.leader]
    }

    pub fn find_role(&self, role: Role) -> Option<ParticipantId> {
        self.participants
            .iter()
            .find(|p| p.role == role)
            .map(|p| p.id)
    }

    pub fn assassin(&self) -> Option<ParticipantId> {
        self.participants
            .iter()
            .find(|p| p.role.is_assassin())
            .map(|p| p.id)
    }

    pub fn ids_on(&self, team: Team) -> Vec<ParticipantId> {
        self.participants
            .iter()
            .filter(|p| p.team() == team)
            .map(|p| p.id)
            .collect()
    }

    /// Hand out night knowledge: Merlin sees the evil seats, the evil seats
    /// see each other, Percival sees Merlin and Morgana.
    pub fn reveal_night_knowledge(&mut self) {
        let evil = self.ids_on(Team::Evil);
        let merlin = self.find_role(Role::Merlin);
        let morgana = self.find_role(Role::Morgana);

        for p in self.participants.iter_mut() {
            if p.role.can_see_evil() {
                p.knowledge.known_evil = evil.clone();
            }
            if p.team() == Team::Evil {
                p.knowledge.known_allies = evil.iter().copied().filter(|&e| e != p.id).collect();
            }
            if p.role.can_see_merlin() {
                if let (Some(merlin), Some(morgana)) = (merlin, morgana) {
                    p.knowledge.known_merlin_or_morgana = vec![merlin, morgana];
                }
            }
        }
    }

    /// Move to another phase, recording the transition.
    pub fn transition(&mut self, to: GamePhase, reason: &str) -> Result<(), TransitionError> {
        let from = self.phase;
        if !from.can_transition_to(to) {
            return Err(TransitionError { from, to });
        }
        self.phase = to;
        self.transitions.push(PhaseTransition {
            from,
            to,
            timestamp: chrono::Utc::now(),
            reason: reason.to_string(),
        });
        Ok(())
    }

    /// Start a round: record the number and reset the reject counter.
    pub fn start_round(&mut self, round: usize) {
        self.round = round;
        self.consecutive_rejects = 0;
    }

    /// Advance the leader by one seat, cyclically.
    pub fn rotate_leader(&mut self) {
        self.leader = (self.leader + 1) % self.participants.len();
        let leader = self.leader;
        for p in self.participants.iter_mut() {
            p.is_leader = p.id == leader;
        }
    }

    pub fn good_wins(&self) -> usize {
        self.mission_results.iter().filter(|r| **r).count()
    }

    pub fn evil_wins(&self) -> usize {
        self.mission_results.iter().filter(|r| !**r).count()
    }

    /// Record a mission outcome on the latest round record and the results
    /// list together so the two never drift.
    pub fn record_mission(&mut self, success: bool) {
        if let Some(record) = self.records.last_mut() {
            record.success = Some(success);
        }
        self.mission_results.push(success);
    }

    /// `mission_results` matches the round records that carry an outcome.
    pub fn outcomes_consistent(&self) -> bool {
        let decided = self.records.iter().filter(|r| r.success.is_some()).count();
        decided == self.mission_results.len()
    }

    /// Mark the game over. Callers move the phase to
    /// [`GamePhase::Terminal`] themselves.
    pub fn finish(&mut self, reason: EndReason) {
        self.game_over = true;
        self.winner = Some(reason.winner());
        self.end_reason = Some(reason);
    }

    /// Records for the current round, rejected attempts included.
    pub fn records_for_round(&self, round: usize) -> impl Iterator<Item = &RoundRecord> {
        self.records.iter().filter(move |r| r.round == round)
    }

    /// History every seat may see: leaders, teams, aggregate tallies and
    /// transcripts. Individual votes and mission choices never appear.
    pub fn public_history(&self) -> String {
        if self.records.is_empty() {
            return "This is the first round; there is no history yet.".to_string();
        }

        let mut lines = Vec::new();
        for record in &self.records {
            let team: Vec<String> = record.team.iter().map(|&id| player_name(id)).collect();
            lines.push(format!("\n--- Round {} ---", record.round));
            lines.push(format!("Leader: {}", player_name(record.leader)));
            lines.push(format!("Team: {}", team.join(", ")));
            lines.push(format!(
                "Team vote: {} approve, {} reject",
                record.approve_count(),
                record.reject_count()
            ));

            if !record.speeches.is_empty() {
                lines.push("Statements:".to_string());
                for (id, speech) in &record.speeches {
                    lines.push(format!("  {}: {}", player_name(*id), speech));
                }
            }

            match record.success {
                Some(success) => {
                    let fails = record.fail_count();
                    lines.push(format!(
                        "Mission: {}",
                        if success { "success" } else { "failure" }
                    ));
                    if fails > 0 {
                        lines.push(format!("  ({} failure signal(s))", fails));
                    } else {
                        lines.push("  (all success signals)".to_string());
                    }
                }
                None => lines.push("Team rejected; no mission was run".to_string()),
            }
        }

        lines.push(format!(
            "\nScore: good {} : {} evil",
            self.good_wins(),
            self.evil_wins()
        ));
        lines.join("\n")
    }

    /// Reminder of how many proposals this round has already burned.
    pub fn reject_warning(&self, max_team_votes: u32) -> Option<String> {
        if self.consecutive_rejects == 0 {
            return None;
        }
        Some(format!(
            "{} team proposal(s) have already been rejected this round. If {} in a row are \
             rejected, the evil side wins immediately.",
            self.consecutive_rejects, max_team_votes
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seated() -> GameState {
        let participants = Role::STANDARD_SIX
            .iter()
            .enumerate()
            .map(|(id, &role)| Participant {
                id,
                name: player_name(id),
                role,
                is_leader: false,
                knowledge: Knowledge::default(),
            })
            .collect();
        GameState::from_participants(participants, 0)
    }

    #[test]
    fn test_new_deals_every_role_once() {
        let mut rng = StdRng::seed_from_u64(7);
        let state = GameState::new(&GameConfig::default(), &mut rng);
        let mut roles: Vec<&str> = state.participants.iter().map(|p| p.role.id()).collect();
        roles.sort();
        roles.dedup();
        assert_eq!(roles.len(), 6);
        assert_eq!(
            state.participants.iter().filter(|p| p.is_leader).count(),
            1
        );
        assert!(state.leader < 6);
    }

    #[test]
    fn test_seating_is_reproducible_per_seed() {
        let config = GameConfig::default();
        let a = GameState::new(&config, &mut StdRng::seed_from_u64(42));
        let b = GameState::new(&config, &mut StdRng::seed_from_u64(42));
        let roles = |s: &GameState| s.participants.iter().map(|p| p.role).collect::<Vec<_>>();
        assert_eq!(roles(&a), roles(&b));
        assert_eq!(a.leader, b.leader);
    }

    #[test]
    fn test_night_knowledge() {
        let mut state = seated();
        state.reveal_night_knowledge();

        // Seats follow STANDARD_SIX: 0 Merlin, 1 Percival, 4 Morgana, 5 Assassin.
        assert_eq!(state.participant(0).knowledge.known_evil, vec![4, 5]);
        assert_eq!(
            state.participant(1).knowledge.known_merlin_or_morgana,
            vec![0, 4]
        );
        assert_eq!(state.participant(4).knowledge.known_allies, vec![5]);
        assert_eq!(state.participant(5).knowledge.known_allies, vec![4]);
        assert_eq!(state.participant(2).knowledge, Knowledge::default());
    }

    #[test]
    fn test_rotation_over_n_rejects_returns_to_start() {
        let mut state = seated();
        let start = state.leader;
        for _ in 0..state.player_count() {
            state.rotate_leader();
            assert_eq!(
                state.participants.iter().filter(|p| p.is_leader).count(),
                1
            );
        }
        assert_eq!(state.leader, start);
    }

    #[test]
    fn test_tie_vote_rejects() {
        let mut record = RoundRecord::new(1, 0, vec![0, 1]);
        for id in 0..3 {
            record.team_votes.insert(id, true);
        }
        for id in 3..6 {
            record.team_votes.insert(id, false);
        }
        assert!(!record.approved());
        record.team_votes.insert(5, true);
        assert!(record.approved());
    }

    #[test]
    fn test_public_history_hides_individual_votes() {
        let mut state = seated();
        let mut record = RoundRecord::new(1, 0, vec![0, 4]);
        record.team_votes.insert(0, true);
        record.team_votes.insert(4, false);
        record.speeches.push((0, "trust me".to_string()));
        record.mission_votes.insert(0, true);
        record.mission_votes.insert(4, false);
        state.records.push(record);
        state.record_mission(false);

        let history = state.public_history();
        assert!(history.contains("1 approve, 1 reject"));
        assert!(history.contains("Player 1: trust me"));
        assert!(history.contains("(1 failure signal(s))"));
        assert!(!history.contains("Player 5 voted"));
        assert!(state.outcomes_consistent());
        assert_eq!(state.evil_wins(), 1);
    }

    #[test]
    fn test_transition_records_history() {
        let mut state = seated();
        assert_eq!(state.phase, GamePhase::Setup);
        state.transition(GamePhase::Night, "night falls").unwrap();
        let err = state.transition(GamePhase::Vote, "skip ahead").unwrap_err();
        assert_eq!(err.from, GamePhase::Night);
        assert_eq!(state.phase, GamePhase::Night);
        assert_eq!(state.transitions.len(), 1);
        assert_eq!(state.transitions[0].reason, "night falls");
    }

    #[test]
    fn test_finish_sets_winner_from_reason() {
        let mut state = seated();
        state.finish(EndReason::MaxRejections);
        assert!(state.game_over);
        assert_eq!(state.winner, Some(Team::Evil));
        assert_eq!(state.end_reason.map(|r| r.tag()), Some("max_rejections"));
    }
}
