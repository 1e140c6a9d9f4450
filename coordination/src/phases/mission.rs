//! Mission execution.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::PhaseContext;
use crate::agent::{parse_mission, prompts};
use crate::events::{GameEvent, ThinkingAction};
use crate::game::{mission_failed, GamePhase};
use crate::orchestrator::RunError;

/// Team members play success or fail. Seats without a free choice play
/// success without consulting the oracle. Returns whether the mission
/// succeeded.
pub async fn run_mission(ctx: &mut PhaseContext) -> Result<bool, RunError> {
    ctx.checkpoint().await?;
    ctx.enter(GamePhase::Mission, "team approved")?;

    let round = ctx.state.round;
    let threshold = ctx.config.fail_threshold(round);
    let team = ctx.state.proposed_team.clone();
    let context = prompts::mission_context(&ctx.state);

    let mut votes = BTreeMap::new();
    for id in team {
        ctx.checkpoint().await?;

        let success = if ctx.state.participant(id).role.free_mission_choice() {
            let reply = ctx
                .decide(
                    id,
                    ThinkingAction::MissionVote,
                    prompts::mission_prompt(&context),
                )
                .await;
            parse_mission(&reply)
        } else {
            ctx.agent(id)
                .record_mission(&prompts::forced_mission_note(&context))
                .await;
            true
        };
        debug!(round, player = id, success, "Mission card");
        votes.insert(id, success);
        ctx.emit(GameEvent::AgentMissionVote {
            player_id: id,
            success,
        });
    }

    let fail_count = votes.values().filter(|v| !**v).count();
    let success_count = votes.len() - fail_count;
    let success = !mission_failed(fail_count, threshold);

    if let Some(record) = ctx.state.records.last_mut() {
        record.mission_votes = votes;
    }
    ctx.state.record_mission(success);

    info!(
        round,
        success,
        fail_count,
        good_wins = ctx.state.good_wins(),
        evil_wins = ctx.state.evil_wins(),
        "Mission resolved"
    );
    ctx.emit(GameEvent::MissionResult {
        success,
        success_count,
        fail_count,
        round,
    });
    ctx.emit(GameEvent::ScoreUpdate {
        good_wins: ctx.state.good_wins(),
        evil_wins: ctx.state.evil_wins(),
    });
    ctx.complete(GamePhase::Mission);

    let summary = format!(
        "Round {} mission {} ({} success, {} fail). Score: good {} : {} evil",
        round,
        if success { "succeeded" } else { "failed" },
        success_count,
        fail_count,
        ctx.state.good_wins(),
        ctx.state.evil_wins()
    );
    ctx.broadcast(&summary, None).await;
    Ok(success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::RoundRecord;
    use crate::memory::MISSION_PREFIX;
    use crate::oracle::ScriptedOracle;
    use crate::phases::testing;

    fn approved(ctx: &mut PhaseContext, team: Vec<usize>) {
        testing::at_round(ctx, 1);
        ctx.state.phase = GamePhase::Vote;
        ctx.state.proposed_team = team.clone();
        ctx.state.records.push(RoundRecord::new(1, 0, team));
    }

    #[tokio::test]
    async fn test_good_team_succeeds_without_oracle() {
        let (mut ctx, log) = testing::context(ScriptedOracle::constant(r#"{"action": "fail"}"#));
        approved(&mut ctx, vec![0, 1]);

        assert!(run_mission(&mut ctx).await.unwrap());
        assert!(log.of_type("agent_thinking").is_empty());
        assert_eq!(ctx.state.records[0].success, Some(true));
        assert!(ctx.state.outcomes_consistent());

        let memory = ctx.agents[0].memory().lock().await;
        assert!(memory.recent()[0].content.starts_with(MISSION_PREFIX));
    }

    #[tokio::test]
    async fn test_single_fail_fails_mission() {
        let (mut ctx, log) = testing::context(ScriptedOracle::constant(r#"{"action": "fail"}"#));
        approved(&mut ctx, vec![0, 5]);

        assert!(!run_mission(&mut ctx).await.unwrap());
        assert_eq!(ctx.state.evil_wins(), 1);
        assert_eq!(ctx.state.records[0].fail_count(), 1);
        assert_eq!(
            log.types(),
            vec![
                "phase_started",
                "agent_mission_vote",
                "agent_thinking",
                "agent_mission_vote",
                "mission_result",
                "score_update",
                "phase_completed"
            ]
        );
    }

    #[tokio::test]
    async fn test_threshold_two_tolerates_one_fail() {
        let (mut ctx, _log) = testing::context(ScriptedOracle::constant(r#"{"action": "fail"}"#));
        ctx.config.fail_thresholds = vec![2, 1, 1, 1, 1];
        approved(&mut ctx, vec![4, 1]);

        assert!(run_mission(&mut ctx).await.unwrap());
        assert_eq!(ctx.state.records[0].fail_count(), 1);
    }
}
