//! Team vote.

use std::collections::BTreeMap;

use tracing::info;

use super::PhaseContext;
use crate::agent::{parse_vote, prompts};
use crate::events::{GameEvent, ThinkingAction};
use crate::game::{tally, GamePhase};
use crate::orchestrator::RunError;

/// What the vote did to the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Approved,
    /// Rejected; the leader has already rotated.
    Rejected,
    /// Rejected for the last allowed time this round. The game is over.
    MaxRejections,
}

/// Every seat votes once, in seat order. A tie rejects.
pub async fn run_vote(ctx: &mut PhaseContext) -> Result<VoteOutcome, RunError> {
    ctx.checkpoint().await?;
    ctx.enter(GamePhase::Vote, "discussion finished")?;

    let round = ctx.state.round;
    let speeches = ctx
        .state
        .records
        .last()
        .map(|r| r.speeches.clone())
        .unwrap_or_default();

    let mut votes = BTreeMap::new();
    for id in 0..ctx.state.player_count() {
        ctx.checkpoint().await?;

        let context = prompts::vote_context(&ctx.state, &ctx.config, &speeches);
        let reply = ctx
            .decide(id, ThinkingAction::Voting, prompts::vote_prompt(&context))
            .await;
        let approved = parse_vote(&reply, ctx.agent(id).is_good());
        votes.insert(id, approved);

        ctx.emit(GameEvent::AgentVote {
            player_id: id,
            player_name: ctx.state.participant(id).name.clone(),
            approved,
        });
    }

    let approve_count = votes.values().filter(|v| **v).count();
    let reject_count = votes.len() - approve_count;
    let approved = tally(approve_count, reject_count);

    if let Some(record) = ctx.state.records.last_mut() {
        record.team_votes = votes.clone();
    }
    if !approved {
        ctx.state.consecutive_rejects += 1;
    }

    info!(
        round,
        approved,
        approve_count,
        reject_count,
        consecutive_rejects = ctx.state.consecutive_rejects,
        "Vote tallied"
    );
    ctx.emit(GameEvent::VoteResult {
        approved,
        approve_count,
        reject_count,
        votes,
        round,
        consecutive_rejects: ctx.state.consecutive_rejects,
    });
    ctx.complete(GamePhase::Vote);

    let summary = format!(
        "Team vote {} ({} approve / {} reject). Team: {}",
        if approved { "passed" } else { "failed" },
        approve_count,
        reject_count,
        prompts::names(&ctx.state.proposed_team)
    );
    ctx.broadcast(&summary, None).await;

    if approved {
        return Ok(VoteOutcome::Approved);
    }
    if ctx.state.consecutive_rejects >= ctx.config.max_team_votes {
        return Ok(VoteOutcome::MaxRejections);
    }

    ctx.state.rotate_leader();
    ctx.emit(GameEvent::LeaderChanged {
        new_leader_id: ctx.state.leader,
        consecutive_rejects: ctx.state.consecutive_rejects,
    });
    Ok(VoteOutcome::Rejected)
}
