//! Arena Coordination Library
//!
//! Runs a six-seat hidden-role negotiation game between oracle-backed
//! agents:
//! - Game model and pure protocol rules (roles, schedules, tallies)
//! - Decision oracle seam with retry and a never-failing reply contract
//! - Per-agent memory bounded by rolling summaries
//! - Ordered fan-out event streaming to any number of observers
//! - Checkpointed orchestration with pause, single-step, resume and stop
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use arena_coordination::{
//!     EventBus, GameConfig, GameRunner, MockSummarizer, OracleSet, RetryPolicy,
//!     RetryingOracle, RunnerControl, ScriptedOracle,
//! };
//!
//! let oracle = RetryingOracle::new(
//!     Arc::new(ScriptedOracle::constant(r#"{"vote": "approve"}"#)),
//!     RetryPolicy::default(),
//! )
//! .shared();
//! let mut runner = GameRunner::new(
//!     GameConfig::default(),
//!     OracleSet::uniform(oracle, Arc::new(MockSummarizer::new())),
//!     EventBus::new().shared(),
//!     RunnerControl::new().shared(),
//! )?
//! .with_seed(7);
//!
//! let report = runner.run_game().await;
//! println!("winner: {:?}", report.winner());
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod agent;
pub mod events;
pub mod game;
pub mod memory;
pub mod oracle;
pub mod orchestrator;
pub mod phases;

// Re-export key game types
pub use game::{
    AssassinOutcome, ConfigError, EndReason, GameConfig, GameExport, GamePhase, GameState,
    PersistenceError, Role, RoundRecord, Team,
};

// Re-export key oracle types
pub use oracle::{
    DecisionOracle, OpenAiOracle, OracleError, OracleRequest, RetryPolicy, RetryingOracle,
    SamplingParams, ScriptedOracle, SharedOracle,
};

// Re-export key memory types
pub use memory::{
    CompressionOutcome, CompressionPolicy, MemoryStore, MockSummarizer, OracleSummarizer,
    SharedMemory, Summarizer,
};

// Re-export key event types
pub use events::{
    EventBus, EventEnvelope, EventFilter, EventLog, EventSubscription, GameEvent, SharedEventBus,
};

// Re-export orchestration types
pub use agent::Agent;
pub use orchestrator::{
    ControlState, GameReport, GameRunner, OracleSet, RunError, RunnerControl, SharedControl,
    Stopped,
};
