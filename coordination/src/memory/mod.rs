//! Agent memory: bounded per-participant context with rolling summaries.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ MemoryStore                             │
//! │  summary: merged digest of older turns  │
//! │  recent:  last messages, verbatim       │
//! └─────────────────────────────────────────┘
//! ```
//!
//! When `recent` reaches the policy threshold, everything but the last
//! `keep_recent` messages is folded into the summary by a low-temperature
//! oracle call. A failed merge drops the fold segment rather than letting
//! the window grow.
//!
//! # Modules
//!
//! - [`store`]: MemoryStore, append and read contracts
//! - [`compactor`]: fold/keep split and the merge pass
//! - [`summarizer`]: Summarizer trait, oracle-backed and mock implementations
//! - [`errors`]: Typed error taxonomy for compaction

pub mod compactor;
pub mod errors;
pub mod store;
pub mod summarizer;

/// Prefix for publicly observed game events.
pub const EVENT_PREFIX: &str = "[game event]";
/// Prefix for forced mission choices recorded without an oracle call.
pub const MISSION_PREFIX: &str = "[mission]";
/// Prefix of the synthetic message carrying the summary.
pub const SUMMARY_PREFIX: &str = "[memory summary]";
/// Assistant acknowledgement that follows the summary message.
pub const SUMMARY_ACK: &str =
    "Understood. I know how the game has gone so far and will keep it in mind.";

pub use compactor::{compact, CompactionResult, CompressionOutcome, CompressionPolicy};
pub use errors::{CompactionError, CompactionErrorKind};
pub use store::{MemoryStats, MemoryStore, SharedMemory};
pub use summarizer::{
    render_transcript, MockSummarizer, OracleSummarizer, Summarizer, SummaryRequest,
    RESPONSE_FORMAT_MARKER,
};
