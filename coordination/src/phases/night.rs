//! Night reveal and seating.

use tracing::info;

use super::PhaseContext;
use crate::agent::Agent;
use crate::events::GameEvent;
use crate::game::{GameConfig, GamePhase, Participant};
use crate::orchestrator::RunError;

/// Hand out night knowledge, seat one agent per participant and announce
/// the game.
///
/// `seat` builds an agent once its participant knows everything it will
/// ever know, so system prompts can include the night information.
pub async fn run_night<F>(ctx: &mut PhaseContext, mut seat: F) -> Result<(), RunError>
where
    F: FnMut(&Participant, &GameConfig) -> Agent,
{
    ctx.enter(GamePhase::Night, "setup complete")?;
    ctx.state.reveal_night_knowledge();

    ctx.agents = ctx
        .state
        .participants
        .iter()
        .map(|p| seat(p, &ctx.config))
        .collect();
    ctx.complete(GamePhase::Night);

    info!(
        game_id = %ctx.state.game_id,
        players = ctx.state.player_count(),
        leader = ctx.state.leader,
        "Game started"
    );
    ctx.emit(GameEvent::GameStarted {
        game_id: ctx.state.game_id.to_string(),
        players: ctx.players(),
        leader_id: ctx.state.leader,
    });
    Ok(())
}
