//! Discussion: one statement per seat, leader last.

use tracing::debug;

use super::PhaseContext;
use crate::agent::prompts;
use crate::events::{GameEvent, ThinkingAction};
use crate::game::{speaking_order, GamePhase};
use crate::orchestrator::RunError;

pub async fn run_discussion(ctx: &mut PhaseContext) -> Result<(), RunError> {
    ctx.checkpoint().await?;
    ctx.enter(GamePhase::Discussion, "team proposed")?;

    let round = ctx.state.round;
    let mut speeches = Vec::new();

    for id in speaking_order(ctx.state.leader, ctx.state.player_count()) {
        ctx.checkpoint().await?;

        let context = prompts::discussion_context(&ctx.state, &speeches);
        let text = ctx
            .decide(id, ThinkingAction::Speaking, prompts::speech_prompt(&context))
            .await;

        if let Some(record) = ctx.state.records.last_mut() {
            record.speeches.push((id, text.clone()));
        }
        speeches.push((id, text.clone()));

        let name = ctx.state.participant(id).name.clone();
        debug!(round, player = id, chars = text.len(), "Statement");
        ctx.emit(GameEvent::AgentSpeech {
            player_id: id,
            player_name: name.clone(),
            text: text.clone(),
            round,
        });
        ctx.broadcast(&format!("{} said: {}", name, text), Some(id))
            .await;
    }

    ctx.complete(GamePhase::Discussion);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::ScriptedOracle;
    use crate::phases::{propose_team, testing};

    #[tokio::test]
    async fn test_leader_speaks_last() {
        let (mut ctx, log) = testing::context(ScriptedOracle::constant("{\"team\": [1, 2]}"));
        testing::at_round(&mut ctx, 1);
        ctx.state.rotate_leader();
        ctx.state.rotate_leader();
        propose_team(&mut ctx).await.unwrap();

        run_discussion(&mut ctx).await.unwrap();

        let speakers: Vec<usize> = ctx.state.records[0]
            .speeches
            .iter()
            .map(|(id, _)| *id)
            .collect();
        assert_eq!(speakers, vec![3, 4, 5, 0, 1, 2]);
        assert_eq!(log.of_type("agent_speech").len(), 6);
    }

    #[tokio::test]
    async fn test_speaker_does_not_observe_itself() {
        let (mut ctx, _log) = testing::context(ScriptedOracle::constant("hello"));
        testing::at_round(&mut ctx, 1);
        propose_team(&mut ctx).await.unwrap();
        run_discussion(&mut ctx).await.unwrap();

        let memory = ctx.agents[3].memory().lock().await;
        let observed = memory
            .recent()
            .iter()
            .filter(|m| m.content.contains("said:"))
            .count();
        assert_eq!(observed, 5);
    }
}
