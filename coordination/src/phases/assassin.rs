//! Assassination after good completes its missions.

use tracing::{info, warn};

use super::PhaseContext;
use crate::agent::{parse_target, prompts};
use crate::events::{GameEvent, ThinkingAction};
use crate::game::{assassin_candidates, AssassinOutcome, GamePhase, Role};
use crate::orchestrator::RunError;

/// Morgana (if seated) advises the Assassin privately, then the Assassin
/// names a target among the seats it does not know to be allies.
///
/// Returns `None` when the table has no Assassin, no Merlin or no possible
/// target; the caller treats that as Merlin surviving.
pub async fn run_assassination(
    ctx: &mut PhaseContext,
) -> Result<Option<AssassinOutcome>, RunError> {
    ctx.checkpoint().await?;
    ctx.enter(GamePhase::Assassin, "good completed its missions")?;

    let (Some(assassin), Some(merlin)) = (ctx.state.assassin(), ctx.state.find_role(Role::Merlin))
    else {
        warn!("No assassin or no Merlin seated, skipping assassination");
        ctx.complete(GamePhase::Assassin);
        return Ok(None);
    };

    let mut morgana_advice = None;
    if let Some(morgana) = ctx
        .state
        .find_role(Role::Morgana)
        .filter(|&id| id != assassin)
    {
        ctx.checkpoint().await?;
        let advice = ctx
            .decide(
                morgana,
                ThinkingAction::Advising,
                prompts::advice_prompt(&ctx.state),
            )
            .await;
        ctx.emit(GameEvent::MorganaAdvice {
            player_id: morgana,
            text: advice.clone(),
        });
        let note = format!(
            "Your ally {} (Morgana) thinks: {}",
            ctx.state.participant(morgana).name,
            advice
        );
        ctx.agent(assassin).observe(&note).await;
        morgana_advice = Some(advice);
    }

    ctx.checkpoint().await?;
    let candidates = assassin_candidates(&ctx.state, assassin);
    let reply = ctx
        .decide(
            assassin,
            ThinkingAction::Assassinating,
            prompts::assassination_prompt(&ctx.state, &candidates),
        )
        .await;
    let players = ctx.state.player_count();
    let Some(target) = parse_target(&reply, &candidates, players, &mut ctx.rng) else {
        warn!(assassin, "Assassin has no possible target");
        ctx.complete(GamePhase::Assassin);
        return Ok(None);
    };

    let merlin_killed = target == merlin;
    info!(assassin, target, merlin_killed, "Assassination resolved");
    ctx.emit(GameEvent::AssassinResult {
        merlin_killed,
        assassin_id: assassin,
        target_id: target,
    });
    ctx.complete(GamePhase::Assassin);

    Ok(Some(AssassinOutcome {
        merlin_killed,
        assassin_id: assassin,
        target_id: target,
        morgana_advice,
    }))
}
