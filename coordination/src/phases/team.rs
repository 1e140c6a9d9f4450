//! Team proposal.

use tracing::info;

use super::PhaseContext;
use crate::agent::{parse_team, prompts};
use crate::events::{GameEvent, ThinkingAction};
use crate::game::{GamePhase, ParticipantId, RoundRecord};
use crate::orchestrator::RunError;

/// The leader proposes a team of exactly the scheduled size. Opens a new
/// round record.
pub async fn propose_team(ctx: &mut PhaseContext) -> Result<Vec<ParticipantId>, RunError> {
    ctx.checkpoint().await?;
    ctx.enter(GamePhase::TeamProposal, "leader proposes")?;

    let round = ctx.state.round;
    let leader = ctx.state.leader;
    let players = ctx.state.player_count();
    let size = ctx.config.team_size(round);

    let context = prompts::proposal_context(&ctx.state, &ctx.config, size);
    let reply = ctx
        .decide(
            leader,
            ThinkingAction::ProposingTeam,
            prompts::proposal_prompt(&context, size, players),
        )
        .await;
    let team = parse_team(&reply, size, players, &mut ctx.rng);

    ctx.state.proposed_team = team.clone();
    ctx.state
        .records
        .push(RoundRecord::new(round, leader, team.clone()));

    info!(round, leader, team = ?team, "Team proposed");
    ctx.emit(GameEvent::TeamProposed {
        leader_id: leader,
        team: team.clone(),
        round,
    });

    let announcement = format!(
        "Leader {} proposed {} (round {}, {} players needed)",
        ctx.state.leader().name,
        prompts::names(&team),
        round,
        size
    );
    ctx.broadcast(&announcement, None).await;
    ctx.complete(GamePhase::TeamProposal);
    Ok(team)
}
