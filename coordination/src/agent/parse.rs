//! Coercion of free-form replies into structured choices.
//!
//! Every parser tries the JSON reply format first, then falls back to
//! textual heuristics, then to a deterministic default. None of them can
//! fail. A failure sentinel from the oracle skips straight to the default
//! so the digits in the sentinel are never read as player numbers.

use std::sync::LazyLock;

use rand::seq::IndexedRandom;
use rand::Rng;
use regex::Regex;
use serde_json::Value;

use crate::game::{correct_team, ParticipantId};
use crate::oracle::is_failure;

static JSON_OBJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{.*?\}").unwrap());

static PLAYER_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)player\s*#?\s*(\d+)").unwrap());

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// First `{…}` block in the reply that parses as a JSON object.
fn json_object(text: &str) -> Option<Value> {
    JSON_OBJECT
        .find_iter(text)
        .find_map(|m| serde_json::from_str::<Value>(m.as_str()).ok())
        .filter(Value::is_object)
}

fn json_string(text: &str, key: &str) -> Option<String> {
    json_object(text)?
        .get(key)?
        .as_str()
        .map(|s| s.trim().to_lowercase())
}

/// 1-based player number from a JSON value (`3` or `"3"`).
fn player_number(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Convert a 1-based number to a seat id if it is in range.
fn seat(number: u64, players: usize) -> Option<ParticipantId> {
    let number = usize::try_from(number).ok()?;
    (1..=players).contains(&number).then(|| number - 1)
}

/// Seat ids mentioned as "Player N", or failing that any bare numbers, in
/// order of appearance.
fn mentioned_seats(text: &str, players: usize) -> Vec<ParticipantId> {
    let mut numbers: Vec<u64> = PLAYER_MENTION
        .captures_iter(text)
        .filter_map(|c| c.get(1)?.as_str().parse().ok())
        .collect();
    if numbers.is_empty() {
        numbers = NUMBER
            .find_iter(text)
            .filter_map(|m| m.as_str().parse().ok())
            .collect();
    }
    numbers.into_iter().filter_map(|n| seat(n, players)).collect()
}

fn dedup(ids: Vec<ParticipantId>) -> Vec<ParticipantId> {
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

/// Team of exactly `team_size` distinct seats.
pub fn parse_team<R: Rng>(
    text: &str,
    team_size: usize,
    players: usize,
    rng: &mut R,
) -> Vec<ParticipantId> {
    if is_failure(text) {
        return correct_team(&[], team_size, players, rng);
    }

    if let Some(team) = json_object(text)
        .as_ref()
        .and_then(|v| v.get("team"))
        .and_then(Value::as_array)
    {
        let ids = dedup(
            team.iter()
                .filter_map(player_number)
                .filter_map(|n| seat(n, players))
                .collect(),
        );
        if ids.len() == team_size {
            return ids;
        }
    }

    let ids = dedup(mentioned_seats(text, players));
    correct_team(&ids, team_size, players, rng)
}

/// `true` approves. `default` applies when the reply says neither.
pub fn parse_vote(text: &str, default: bool) -> bool {
    if is_failure(text) {
        return default;
    }
    match json_string(text, "vote").as_deref() {
        Some("approve") => return true,
        Some("reject") => return false,
        _ => {}
    }

    let lower = text.to_lowercase();
    if lower.contains("approve") {
        true
    } else if lower.contains("reject") {
        false
    } else {
        default
    }
}

/// `true` plays success.
pub fn parse_mission(text: &str) -> bool {
    if is_failure(text) {
        return true;
    }
    match json_string(text, "action").as_deref() {
        Some("success") => return true,
        Some("fail") => return false,
        _ => {}
    }
    !text.to_lowercase().contains("fail")
}

/// A target among `candidates`. `None` only when there are no candidates.
pub fn parse_target<R: Rng>(
    text: &str,
    candidates: &[ParticipantId],
    players: usize,
    rng: &mut R,
) -> Option<ParticipantId> {
    if !is_failure(text) {
        let from_json = json_object(text)
            .as_ref()
            .and_then(|v| v.get("target"))
            .and_then(player_number)
            .and_then(|n| seat(n, players))
            .filter(|id| candidates.contains(id));
        if from_json.is_some() {
            return from_json;
        }

        if let Some(id) = mentioned_seats(text, players)
            .into_iter()
            .find(|id| candidates.contains(id))
        {
            return Some(id);
        }
    }
    candidates.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(3)
    }

    #[test]
    fn test_team_from_json() {
        let team = parse_team(r#"I pick {"team": [1, 3]}"#, 2, 6, &mut rng());
        assert_eq!(team, vec![0, 2]);
    }

    #[test]
    fn test_team_json_with_strings_and_duplicates() {
        let team = parse_team(r#"{"team": ["2", 2, 5]}"#, 2, 6, &mut rng());
        assert_eq!(team, vec![1, 4]);
    }

    #[test]
    fn test_team_from_mentions() {
        let team = parse_team("I trust Player 4 and player 6 most.", 2, 6, &mut rng());
        assert_eq!(team, vec![3, 5]);
    }

    #[test]
    fn test_team_padding_never_fails() {
        let team = parse_team("no idea", 4, 6, &mut rng());
        assert_eq!(team.len(), 4);
        let mut sorted = team.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 4);
        assert!(team.iter().all(|&id| id < 6));
    }

    #[test]
    fn test_team_out_of_range_dropped() {
        let team = parse_team(r#"{"team": [0, 9, 2]}"#, 3, 6, &mut rng());
        assert_eq!(team.len(), 3);
        assert_eq!(team[0], 1);
    }

    #[test]
    fn test_team_ignores_sentinel_digits() {
        let team = parse_team(
            "[oracle call failed (3 attempts): timeout]",
            2,
            6,
            &mut StdRng::seed_from_u64(0),
        );
        assert_eq!(team.len(), 2);
    }

    #[test]
    fn test_vote_variants() {
        assert!(parse_vote(r#"{"vote": "approve"}"#, false));
        assert!(!parse_vote(r#"{"vote": "REJECT"}"#, true));
        assert!(parse_vote("I approve of this team", false));
        assert!(!parse_vote("I have to reject it", true));
        assert!(parse_vote("hmm", true));
        assert!(!parse_vote("hmm", false));
        assert!(!parse_vote("[oracle call failed (3 attempts): x]", false));
    }

    #[test]
    fn test_mission_variants() {
        assert!(parse_mission(r#"{"action": "success"}"#));
        assert!(!parse_mission(r#"{"action": "fail"}"#));
        assert!(!parse_mission("I will make it FAIL"));
        assert!(parse_mission("whatever"));
    }

    #[test]
    fn test_target_restricted_to_candidates() {
        let candidates = [0, 1, 2, 3];
        assert_eq!(
            parse_target(r#"{"target": 2}"#, &candidates, 6, &mut rng()),
            Some(1)
        );
        // Player 5 is an ally, fall through to the next mention.
        assert_eq!(
            parse_target("Player 5 or Player 3", &candidates, 6, &mut rng()),
            Some(2)
        );
        let random = parse_target("no clue", &candidates, 6, &mut rng()).unwrap();
        assert!(candidates.contains(&random));
        assert_eq!(parse_target("x", &[], 6, &mut rng()), None);
    }
}
