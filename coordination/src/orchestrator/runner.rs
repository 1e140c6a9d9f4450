//! Game runner: drives one game from setup to its single terminal event.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::control::{RunError, SharedControl};
use crate::agent::Agent;
use crate::events::{GameEvent, SharedEventBus};
use crate::game::{
    AssassinOutcome, ConfigError, EndReason, GameConfig, GameExport, GamePhase, GameState, Team,
};
use crate::memory::{CompressionPolicy, MemoryStore, Summarizer};
use crate::oracle::{SamplingParams, SharedOracle};
use crate::phases::{
    propose_team, run_assassination, run_discussion, run_mission, run_night, run_vote,
    PhaseContext, VoteOutcome,
};

/// Oracles per team plus the summarizer used for memory compression.
#[derive(Clone)]
pub struct OracleSet {
    pub good: SharedOracle,
    pub evil: SharedOracle,
    pub summarizer: Arc<dyn Summarizer>,
}

impl OracleSet {
    /// Both teams share one oracle.
    pub fn uniform(oracle: SharedOracle, summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            good: Arc::clone(&oracle),
            evil: oracle,
            summarizer,
        }
    }

    pub fn for_team(&self, team: Team) -> SharedOracle {
        match team {
            Team::Good => Arc::clone(&self.good),
            Team::Evil => Arc::clone(&self.evil),
        }
    }
}

/// What a finished (or stopped) game left behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameReport {
    pub state: GameState,
    pub assassination: Option<AssassinOutcome>,
    /// The game ended with `session_stopped` rather than `game_ended`.
    pub stopped: bool,
}

impl GameReport {
    pub fn winner(&self) -> Option<Team> {
        self.state.winner
    }

    pub fn export(&self, config: &GameConfig) -> GameExport {
        GameExport::new(config, &self.state, self.assassination.as_ref())
    }
}

pub struct GameRunner {
    config: GameConfig,
    oracles: OracleSet,
    memory_policy: CompressionPolicy,
    sampling: SamplingParams,
    bus: SharedEventBus,
    control: SharedControl,
    rng: StdRng,
}

impl GameRunner {
    pub fn new(
        config: GameConfig,
        oracles: OracleSet,
        bus: SharedEventBus,
        control: SharedControl,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            oracles,
            memory_policy: CompressionPolicy::default(),
            sampling: SamplingParams::default(),
            bus,
            control,
            rng: StdRng::from_os_rng(),
        })
    }

    /// Make seating, leader draws and fallbacks reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Rejects policies that could never shrink the window.
    pub fn with_memory_policy(mut self, policy: CompressionPolicy) -> Result<Self, ConfigError> {
        policy.validate()?;
        self.memory_policy = policy;
        Ok(self)
    }

    pub fn with_sampling(mut self, params: SamplingParams) -> Self {
        self.sampling = params;
        self
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn bus(&self) -> &SharedEventBus {
        &self.bus
    }

    pub fn control(&self) -> &SharedControl {
        &self.control
    }

    /// Play one game. Emits exactly one terminal event (`game_ended` or
    /// `session_stopped`) and leaves the control block `Finished`. After an
    /// operator stop the game ends with `session_stopped` before the night
    /// phase, until `RunnerControl::new_session` is called.
    pub async fn run_game(&mut self) -> GameReport {
        self.control.begin();

        let state = GameState::new(&self.config, &mut self.rng);
        let game_rng = StdRng::seed_from_u64(self.rng.random());
        info!(game_id = %state.game_id, leader = state.leader, "Game setup");

        let mut ctx = PhaseContext::new(
            self.config.clone(),
            state,
            Arc::clone(&self.bus),
            Arc::clone(&self.control),
            game_rng,
        );

        let mut assassination = None;
        let stopped = match self.play(&mut ctx, &mut assassination).await {
            Ok(reason) => {
                end_game(&mut ctx, reason);
                false
            }
            Err(RunError::Stopped) => {
                info!(round = ctx.state.round, "Game stopped");
                ctx.emit(GameEvent::SessionStopped {
                    reason: "stop requested".to_string(),
                    round: ctx.state.round,
                });
                true
            }
            Err(e @ RunError::Transition(_)) => {
                error!(round = ctx.state.round, error = %e, "Game aborted");
                ctx.emit(GameEvent::SessionStopped {
                    reason: e.to_string(),
                    round: ctx.state.round,
                });
                true
            }
        };

        self.control.finish();
        GameReport {
            state: ctx.state,
            assassination,
            stopped,
        }
    }

    async fn play(
        &self,
        ctx: &mut PhaseContext,
        assassination: &mut Option<AssassinOutcome>,
    ) -> Result<EndReason, RunError> {
        if self.control.flags().stop_requested {
            info!("Session already stopped; game not played");
            return Err(RunError::Stopped);
        }

        let oracles = &self.oracles;
        let policy = self.memory_policy;
        let sampling = self.sampling;
        run_night(ctx, |participant, config| {
            let memory = MemoryStore::new(
                &participant.name,
                policy,
                Arc::clone(&oracles.summarizer),
            )
            .shared();
            Agent::new(
                participant,
                config,
                oracles.for_team(participant.team()),
                memory,
            )
            .with_params(sampling)
        })
        .await?;

        let wins_needed = ctx.config.wins_needed;
        for round in 1..=ctx.config.rounds() {
            ctx.checkpoint().await?;
            ctx.state.start_round(round);
            info!(round, leader = ctx.state.leader, "Round started");
            ctx.emit(GameEvent::RoundStarted {
                round,
                team_size: ctx.config.team_size(round),
                leader_id: ctx.state.leader,
            });

            loop {
                propose_team(ctx).await?;
                run_discussion(ctx).await?;
                match run_vote(ctx).await? {
                    VoteOutcome::Approved => break,
                    VoteOutcome::Rejected => continue,
                    VoteOutcome::MaxRejections => return Ok(EndReason::MaxRejections),
                }
            }

            run_mission(ctx).await?;

            if ctx.state.good_wins() >= wins_needed {
                *assassination = run_assassination(ctx).await?;
                let killed = assassination.as_ref().is_some_and(|o| o.merlin_killed);
                return Ok(if killed {
                    EndReason::MerlinAssassinated
                } else {
                    EndReason::MerlinSurvived
                });
            }
            if ctx.state.evil_wins() >= wins_needed {
                return Ok(EndReason::ThreeFailures);
            }

            ctx.state.rotate_leader();
            ctx.emit(GameEvent::LeaderChanged {
                new_leader_id: ctx.state.leader,
                consecutive_rejects: ctx.state.consecutive_rejects,
            });
        }

        // A validated schedule always produces a winner above.
        warn!("Rounds exhausted without a winner");
        Ok(if ctx.state.good_wins() > ctx.state.evil_wins() {
            EndReason::MerlinSurvived
        } else {
            EndReason::ThreeFailures
        })
    }
}

fn end_game(ctx: &mut PhaseContext, reason: EndReason) {
    ctx.state.finish(reason);
    if let Err(e) = ctx.state.transition(GamePhase::Terminal, reason.tag()) {
        warn!(error = %e, "Terminal transition rejected");
    }
    info!(
        winner = %reason.winner(),
        reason = reason.tag(),
        good_wins = ctx.state.good_wins(),
        evil_wins = ctx.state.evil_wins(),
        "Game ended"
    );
    ctx.emit(GameEvent::GameEnded {
        winner: reason.winner(),
        reason: reason.tag().to_string(),
        description: reason.description().to_string(),
        players: ctx.players(),
    });
}
