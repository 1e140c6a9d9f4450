//! Phase functions: one protocol step each.
//!
//! Every function takes the [`PhaseContext`], calls the checkpoint before
//! each participant action, runs the decision on a spawned task and
//! publishes events in protocol order. A `stop` surfaces as
//! [`RunError::Stopped`] and unwinds through `?`.

pub mod assassin;
pub mod discussion;
pub mod mission;
pub mod night;
pub mod team;
pub mod vote;

use futures::future::join_all;
use rand::rngs::StdRng;
use tracing::warn;

use crate::agent::Agent;
use crate::events::{GameEvent, PlayerInfo, SharedEventBus, ThinkingAction};
use crate::game::{GameConfig, GamePhase, GameState, ParticipantId};
use crate::oracle::FAILURE_SENTINEL;
use crate::orchestrator::{RunError, SharedControl, Stopped};

pub use assassin::run_assassination;
pub use discussion::run_discussion;
pub use mission::run_mission;
pub use night::run_night;
pub use team::propose_team;
pub use vote::{run_vote, VoteOutcome};

/// Everything a phase function touches.
pub struct PhaseContext {
    pub config: GameConfig,
    pub state: GameState,
    /// Indexed by seat id; seated by [`run_night`].
    pub agents: Vec<Agent>,
    pub bus: SharedEventBus,
    pub control: SharedControl,
    pub rng: StdRng,
}

impl PhaseContext {
    pub fn new(
        config: GameConfig,
        state: GameState,
        bus: SharedEventBus,
        control: SharedControl,
        rng: StdRng,
    ) -> Self {
        Self {
            config,
            state,
            agents: Vec::new(),
            bus,
            control,
            rng,
        }
    }

    pub fn emit(&self, event: GameEvent) {
        self.bus.publish(event);
    }

    pub async fn checkpoint(&self) -> Result<(), Stopped> {
        self.control.checkpoint(&self.bus).await
    }

    pub fn agent(&self, id: ParticipantId) -> &Agent {
        &self.agents[id]
    }

    /// Move to `phase` and announce it.
    pub fn enter(&mut self, phase: GamePhase, reason: &str) -> Result<(), RunError> {
        self.state.transition(phase, reason)?;
        let (round, leader_id) = match phase {
            GamePhase::Night | GamePhase::Assassin => (None, None),
            _ => (Some(self.state.round), Some(self.state.leader)),
        };
        self.emit(GameEvent::PhaseStarted {
            phase,
            round,
            leader_id,
        });
        Ok(())
    }

    pub fn complete(&self, phase: GamePhase) {
        let round = (self.state.round > 0).then_some(self.state.round);
        self.emit(GameEvent::PhaseCompleted { phase, round });
    }

    /// Ask one seat for a decision. The oracle call runs on its own task so
    /// the control loop is never the one blocked on I/O.
    pub async fn decide(
        &self,
        id: ParticipantId,
        action: ThinkingAction,
        prompt: String,
    ) -> String {
        self.emit(GameEvent::AgentThinking {
            player_id: id,
            action,
        });
        let agent = self.agent(id).clone();
        match tokio::spawn(async move { agent.respond(&prompt).await }).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(player = id, error = %e, "Decision task failed");
                format!("{} (decision task): {}]", FAILURE_SENTINEL, e)
            }
        }
    }

    /// Every seat except `except` observes `text`. Each append, and any
    /// compression it triggers, runs on its own task.
    pub async fn broadcast(&self, text: &str, except: Option<ParticipantId>) {
        let tasks = self
            .agents
            .iter()
            .filter(|a| Some(a.id()) != except)
            .map(|a| {
                let agent = a.clone();
                let text = text.to_string();
                tokio::spawn(async move { agent.observe(&text).await })
            });
        for (i, result) in join_all(tasks).await.into_iter().enumerate() {
            if let Err(e) = result {
                warn!(task = i, error = %e, "Observe task failed");
            }
        }
    }

    /// Seat summaries with roles, for start and end events.
    pub fn players(&self) -> Vec<PlayerInfo> {
        self.state
            .participants
            .iter()
            .map(|p| PlayerInfo {
                player_id: p.id,
                player_name: p.name.clone(),
                role: p.role,
                team: p.team(),
            })
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::EVENT_PREFIX;
    use crate::oracle::ScriptedOracle;

    #[tokio::test]
    async fn test_broadcast_reaches_every_other_seat() {
        let (ctx, _log) = testing::context(ScriptedOracle::constant("ok"));

        ctx.broadcast("Player 3 said: trust me", Some(2)).await;

        for agent in &ctx.agents {
            let memory = agent.memory().lock().await;
            if agent.id() == 2 {
                assert!(memory.recent().is_empty());
            } else {
                assert_eq!(memory.recent().len(), 1);
                assert_eq!(
                    memory.recent()[0].content,
                    format!("{} Player 3 said: trust me", EVENT_PREFIX)
                );
            }
        }
    }

    #[tokio::test]
    async fn test_broadcast_to_everyone() {
        let (ctx, _log) = testing::context(ScriptedOracle::constant("ok"));
        ctx.broadcast("Round 1 begins", None).await;
        ctx.broadcast("Team proposed", None).await;

        for agent in &ctx.agents {
            assert_eq!(agent.memory().lock().await.recent().len(), 2);
        }
    }
}
