//! Pure protocol rules. No I/O, no oracle calls; randomness comes in
//! through the caller's RNG.

use rand::seq::IndexedRandom;
use rand::Rng;

use super::state::{GameState, ParticipantId};

/// Approve iff strictly more approvals than rejections.
pub fn tally(approve: usize, reject: usize) -> bool {
    approve > reject
}

/// A mission fails when the failure signals reach the round's threshold.
pub fn mission_failed(fail_count: usize, threshold: usize) -> bool {
    fail_count >= threshold
}

/// Discussion order: the seat after the leader first, cyclically, with the
/// leader speaking last.
pub fn speaking_order(leader: ParticipantId, players: usize) -> Vec<ParticipantId> {
    (1..=players).map(|offset| (leader + offset) % players).collect()
}

/// Coerce a proposed team into exactly `size` distinct in-range ids.
///
/// Out-of-range ids are dropped, duplicates keep their first occurrence,
/// excess members are truncated and a short team is padded with random
/// unused seats (the leader included). Never fails as long as
/// `size <= players`.
pub fn correct_team<R: Rng>(
    proposed: &[ParticipantId],
    size: usize,
    players: usize,
    rng: &mut R,
) -> Vec<ParticipantId> {
    let mut team: Vec<ParticipantId> = Vec::with_capacity(size);
    for &id in proposed {
        if id < players && !team.contains(&id) {
            team.push(id);
        }
    }
    team.truncate(size);

    while team.len() < size {
        let unused: Vec<ParticipantId> = (0..players).filter(|id| !team.contains(id)).collect();
        match unused.choose(rng) {
            Some(&id) => team.push(id),
            None => break,
        }
    }
    team
}

/// Seats the assassin may target: everyone except the assassin and the
/// assassin's known allies.
pub fn assassin_candidates(state: &GameState, assassin: ParticipantId) -> Vec<ParticipantId> {
    let allies = &state.participant(assassin).knowledge.known_allies;
    (0..state.player_count())
        .filter(|id| *id != assassin && !allies.contains(id))
        .collect()
}
