//! Prompt construction for every decision a seat can be asked to make.
//!
//! All player references are 1-based ("Player 3"). Decision prompts end
//! with a strict JSON reply format introduced by
//! [`RESPONSE_FORMAT_MARKER`], which the memory summarizer strips.

use crate::game::{player_name, GameConfig, GameState, Participant, ParticipantId, Role, Team};
use crate::memory::summarizer::RESPONSE_FORMAT_MARKER;

/// Render a list of seats as "Player 1, Player 4".
pub fn names(ids: &[ParticipantId]) -> String {
    ids.iter()
        .map(|&id| player_name(id))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Table rules, rendered from the active configuration.
pub fn game_rules(config: &GameConfig) -> String {
    let sizes: Vec<String> = config
        .team_sizes
        .iter()
        .enumerate()
        .map(|(i, size)| format!("round {}: {}", i + 1, size))
        .collect();
    let good = config.roles.iter().filter(|r| r.team() == Team::Good).count();
    let evil = config.roles.len() - good;

    format!(
        "## Rules\n\
         You are playing a {players}-player hidden-role game: {good} good, {evil} evil.\n\
         1. There are {rounds} missions. Each round the leader picks a team ({sizes}).\n\
         2. Everyone votes on the team; it goes only with strictly more approvals than rejections.\n\
         3. {max} rejected teams in a row within one round hand the game to evil.\n\
         4. On a mission good players can only play success; evil players may play success or fail.\n\
         5. A mission fails when the failure signals reach the round's threshold.\n\
         6. {wins} successes win for good, but the Assassin then gets one shot at Merlin.\n\
         7. {wins} failures win for evil.\n\n\
         ## Roles\n\
         - Merlin (good): knows every evil player, must stay hidden\n\
         - Percival (good): sees Merlin and Morgana but cannot tell them apart\n\
         - Loyal Servant (good): no special knowledge\n\
         - Morgana (evil): looks like Merlin to Percival\n\
         - Assassin (evil): may kill Merlin after good wins three missions",
        players = config.player_count(),
        good = good,
        evil = evil,
        rounds = config.rounds(),
        sizes = sizes.join(", "),
        max = config.max_team_votes,
        wins = config.wins_needed,
    )
}

/// What the seat learned during the night.
pub fn night_info(participant: &Participant) -> String {
    let knowledge = &participant.knowledge;
    match participant.role {
        Role::Merlin => format!(
            "The evil players are: {}.",
            names(&knowledge.known_evil)
        ),
        Role::Percival if knowledge.known_merlin_or_morgana.is_empty() => {
            "You saw no one during the night.".to_string()
        }
        Role::Percival => format!(
            "Merlin and Morgana are {}, but you cannot tell which is which.",
            names(&knowledge.known_merlin_or_morgana)
        ),
        Role::Morgana | Role::Assassin if !knowledge.known_allies.is_empty() => {
            format!("Your evil allies: {}.", names(&knowledge.known_allies))
        }
        _ => "You have no special information.".to_string(),
    }
}

/// Role-scoped system prompt: identity, night knowledge, rules, strategy and
/// reply style.
pub fn system_prompt(participant: &Participant, config: &GameConfig) -> String {
    let team = participant.team();
    let mut parts = vec![
        format!(
            "You are {}. Your secret role is {} on the {} side.",
            participant.name,
            participant.role.display_name(),
            team
        ),
        String::new(),
        participant.role.description().to_string(),
        String::new(),
        "## What you learned at night".to_string(),
        night_info(participant),
        String::new(),
        game_rules(config),
        String::new(),
        "## Strategy".to_string(),
    ];

    match team {
        Team::Good => parts.extend([
            "- You can only play success on missions".to_string(),
            "- Read statements and votes to find the evil players".to_string(),
            "- As Merlin, guide the table without revealing what you know".to_string(),
            "- As Percival, work out which of your two is the real Merlin".to_string(),
        ]),
        Team::Evil => parts.extend([
            "- Pass yourself off as good".to_string(),
            "- Fail missions when it pays, succeed when you need cover".to_string(),
            "- Watch for whoever seems too sure about the evil players: that is Merlin"
                .to_string(),
            "- As Morgana, impersonate Merlin to mislead Percival".to_string(),
        ]),
    }

    parts.extend([
        String::new(),
        "## Style".to_string(),
        "- Talk like a real player, keep statements under 100 words".to_string(),
        "- Never state your true role".to_string(),
        "- No markdown".to_string(),
    ]);
    parts.join("\n")
}

fn reject_note(state: &GameState, config: &GameConfig) -> Option<String> {
    state
        .reject_warning(config.max_team_votes)
        .map(|warning| format!("\nWarning: {}", warning))
}

/// Context handed to the leader before the proposal.
pub fn proposal_context(state: &GameState, config: &GameConfig, team_size: usize) -> String {
    let mut parts = vec![
        format!(
            "Round {}: the team needs {} players.",
            state.round, team_size
        ),
        format!("You ({}) are the leader this round.", state.leader().name),
        String::new(),
        "History:".to_string(),
        state.public_history(),
    ];
    parts.extend(reject_note(state, config));
    parts.join("\n")
}

pub fn proposal_prompt(context: &str, team_size: usize, players: usize) -> String {
    let all: Vec<ParticipantId> = (0..players).collect();
    format!(
        "{context}\n\n\
         Choose {team_size} players for the team (you may include yourself).\n\
         Available: {available}\n\n\
         {marker}, nothing else:\n\
         {{\"team\": [player numbers]}}\n\
         For example Player 1 and Player 3: {{\"team\": [1, 3]}}",
        available = names(&all),
        marker = RESPONSE_FORMAT_MARKER,
    )
}

/// Context for a speaker, including the statements made so far this
/// proposal.
pub fn discussion_context(state: &GameState, speeches: &[(ParticipantId, String)]) -> String {
    let mut parts = vec![
        format!("Round {}.", state.round),
        format!(
            "Leader {} proposed: {}",
            state.leader().name,
            names(&state.proposed_team)
        ),
        String::new(),
        state.public_history(),
    ];
    if !speeches.is_empty() {
        parts.push("\nStatements so far:".to_string());
        for (id, text) in speeches {
            parts.push(format!("  {}: {}", player_name(*id), text));
        }
    }
    parts.join("\n")
}

pub fn speech_prompt(context: &str) -> String {
    format!(
        "{context}\n\n\
         It is your turn to speak. Analyse the situation and give your view on the team.\n\
         Do not reveal your true role.\n\
         Say your statement directly (under 100 words)."
    )
}

pub fn vote_context(
    state: &GameState,
    config: &GameConfig,
    speeches: &[(ParticipantId, String)],
) -> String {
    let mut parts = vec![
        format!("Round {}.", state.round),
        format!(
            "Leader {} proposed: {}",
            state.leader().name,
            names(&state.proposed_team)
        ),
        String::new(),
        state.public_history(),
    ];
    if !speeches.is_empty() {
        parts.push("\nThis round's statements:".to_string());
        for (id, text) in speeches {
            parts.push(format!("  {}: {}", player_name(*id), text));
        }
    }
    parts.extend(reject_note(state, config));
    if state.consecutive_rejects + 1 >= config.max_team_votes {
        parts.push(
            "\nURGENT: this is the last vote of the round. If it fails, evil wins immediately."
                .to_string(),
        );
    }
    parts.join("\n")
}

pub fn vote_prompt(context: &str) -> String {
    format!(
        "{context}\n\n\
         Vote on this team. It goes with strictly more approvals than rejections; otherwise \
         the next leader proposes.\n\n\
         {RESPONSE_FORMAT_MARKER}, nothing else:\n\
         {{\"vote\": \"approve\"}} to approve\n\
         {{\"vote\": \"reject\"}} to reject"
    )
}

pub fn mission_context(state: &GameState) -> String {
    let mut parts = vec![
        format!("You are on the round {} mission.", state.round),
        format!("Team: {}", names(&state.proposed_team)),
        format!(
            "Score: good {} : {} evil",
            state.good_wins(),
            state.evil_wins()
        ),
    ];
    if !state.mission_results.is_empty() {
        parts.push("\nHistory:".to_string());
        parts.push(state.public_history());
    }
    parts.join("\n")
}

pub fn mission_prompt(context: &str) -> String {
    format!(
        "{context}\n\n\
         You are evil: play success to stay hidden or fail to sabotage the mission.\n\n\
         {RESPONSE_FORMAT_MARKER}, nothing else:\n\
         {{\"action\": \"success\"}} to play success\n\
         {{\"action\": \"fail\"}} to play fail"
    )
}

/// Memory line for a choice the seat did not get to make.
pub fn forced_mission_note(context: &str) -> String {
    format!("{context}\nYou are good, so you played success.")
}

pub fn advice_prompt(state: &GameState) -> String {
    format!(
        "Good has completed three missions. Work out with the Assassin who Merlin is.\n\
         Look back over every statement and vote, especially:\n\
         - who seemed certain about the evil players\n\
         - whose reasoning was suspiciously accurate\n\
         - who steered the good players toward the right calls\n\n\
         Game history:\n{}\n\n\
         Give your analysis and say who you think Merlin is.",
        state.public_history()
    )
}

pub fn assassination_prompt(state: &GameState, candidates: &[ParticipantId]) -> String {
    format!(
        "Game history:\n{history}\n\n\
         Good completed three missions, but you get one last chance.\n\
         Find Merlin among: {candidates}\n\
         Recall how each of them played.\n\n\
         {RESPONSE_FORMAT_MARKER}, nothing else:\n\
         {{\"target\": player number}}\n\
         For example Player 3: {{\"target\": 3}}",
        history = state.public_history(),
        candidates = names(candidates),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Knowledge;

    fn participant(id: ParticipantId, role: Role, knowledge: Knowledge) -> Participant {
        Participant {
            id,
            name: player_name(id),
            role,
            is_leader: false,
            knowledge,
        }
    }

    #[test]
    fn test_names_are_one_based() {
        assert_eq!(names(&[0, 3]), "Player 1, Player 4");
        assert_eq!(names(&[]), "");
    }

    #[test]
    fn test_night_info_per_role() {
        let merlin = participant(
            0,
            Role::Merlin,
            Knowledge {
                known_evil: vec![4, 5],
                ..Default::default()
            },
        );
        assert!(night_info(&merlin).contains("Player 5, Player 6"));

        let percival = participant(
            1,
            Role::Percival,
            Knowledge {
                known_merlin_or_morgana: vec![0, 4],
                ..Default::default()
            },
        );
        assert!(night_info(&percival).contains("cannot tell"));

        let servant = participant(2, Role::LoyalServant1, Knowledge::default());
        assert_eq!(night_info(&servant), "You have no special information.");
    }

    #[test]
    fn test_system_prompt_carries_identity_and_rules() {
        let config = GameConfig::default();
        let assassin = participant(
            5,
            Role::Assassin,
            Knowledge {
                known_allies: vec![4],
                ..Default::default()
            },
        );
        let prompt = system_prompt(&assassin, &config);
        assert!(prompt.contains("You are Player 6"));
        assert!(prompt.contains("Player 5"));
        assert!(prompt.contains("round 3: 4"));
        assert!(prompt.contains("Pass yourself off as good"));
    }

    #[test]
    fn test_decision_prompts_end_with_reply_format() {
        for prompt in [
            proposal_prompt("ctx", 2, 6),
            vote_prompt("ctx"),
            mission_prompt("ctx"),
        ] {
            assert!(prompt.starts_with("ctx"));
            assert!(prompt.contains(RESPONSE_FORMAT_MARKER));
        }
        assert!(!speech_prompt("ctx").contains(RESPONSE_FORMAT_MARKER));
    }
}
