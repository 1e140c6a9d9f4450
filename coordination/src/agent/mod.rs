//! Decision-making seats.
//!
//! An [`Agent`] ties a participant to its team's oracle and its own memory
//! store. Cloning is cheap (everything behind `Arc`), so a decision can be
//! moved onto a spawned task while the control loop keeps running.

pub mod parse;
pub mod prompts;

use std::sync::Arc;

use tracing::debug;

use crate::game::{GameConfig, Participant, ParticipantId, Role, Team};
use crate::memory::{CompressionOutcome, SharedMemory, EVENT_PREFIX, MISSION_PREFIX};
use crate::oracle::{MessageRole, OracleRequest, SamplingParams, SharedOracle};

pub use parse::{parse_mission, parse_target, parse_team, parse_vote};

#[derive(Clone)]
pub struct Agent {
    id: ParticipantId,
    name: Arc<str>,
    role: Role,
    system_prompt: Arc<str>,
    oracle: SharedOracle,
    memory: SharedMemory,
    params: SamplingParams,
}

impl Agent {
    /// Build an agent once night knowledge has been revealed; the system
    /// prompt is fixed from then on.
    pub fn new(
        participant: &Participant,
        config: &GameConfig,
        oracle: SharedOracle,
        memory: SharedMemory,
    ) -> Self {
        Self {
            id: participant.id,
            name: Arc::from(participant.name.as_str()),
            role: participant.role,
            system_prompt: Arc::from(prompts::system_prompt(participant, config)),
            oracle,
            memory,
            params: SamplingParams::default(),
        }
    }

    pub fn with_params(mut self, params: SamplingParams) -> Self {
        self.params = params;
        self
    }

    pub fn id(&self) -> ParticipantId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn team(&self) -> Team {
        self.role.team()
    }

    pub fn is_good(&self) -> bool {
        self.team() == Team::Good
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn memory(&self) -> &SharedMemory {
        &self.memory
    }

    /// Ask the oracle with the assembled memory context, then remember the
    /// exchange. Returns the reply or the failure sentinel.
    pub async fn respond(&self, prompt: &str) -> String {
        let history = self.memory.lock().await.messages_for_oracle();
        let request = OracleRequest::new(&*self.system_prompt, prompt)
            .with_history(history)
            .with_params(self.params);

        let reply = self.oracle.ask(&request).await;
        debug!(player = self.id, chars = reply.len(), "Decision received");

        let mut memory = self.memory.lock().await;
        memory.append(MessageRole::User, prompt).await;
        memory.append(MessageRole::Assistant, reply.as_str()).await;
        reply
    }

    /// Remember a public event without replying.
    pub async fn observe(&self, event: &str) -> Option<CompressionOutcome> {
        self.memory
            .lock()
            .await
            .append(MessageRole::User, format!("{} {}", EVENT_PREFIX, event))
            .await
    }

    /// Remember a mission choice made without consulting the oracle.
    pub async fn record_mission(&self, note: &str) -> Option<CompressionOutcome> {
        self.memory
            .lock()
            .await
            .append(MessageRole::User, format!("{} {}", MISSION_PREFIX, note))
            .await
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("oracle", &self.oracle.name())
            .finish()
    }
}
