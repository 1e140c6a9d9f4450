//! Per-participant bounded context store.
//!
//! A rolling summary plus a capped window of recent messages. Appends are
//! serialized per store by wrapping it in [`SharedMemory`]; a compression
//! pass runs while the append holds the lock, so at most one is ever in
//! flight for a participant.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::compactor::{compact, CompressionOutcome, CompressionPolicy};
use super::errors::CompactionErrorKind;
use super::summarizer::Summarizer;
use super::{SUMMARY_ACK, SUMMARY_PREFIX};
use crate::oracle::{ChatMessage, MessageRole};

/// Shared, lock-serialized memory store.
pub type SharedMemory = Arc<Mutex<MemoryStore>>;

/// Point-in-time view of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub summary_len: usize,
    pub recent_count: usize,
    pub compress_count: u32,
    pub has_summary: bool,
}

pub struct MemoryStore {
    owner: String,
    summary: String,
    recent: Vec<ChatMessage>,
    compress_count: u32,
    policy: CompressionPolicy,
    summarizer: Arc<dyn Summarizer>,
}

impl MemoryStore {
    pub fn new(owner: &str, policy: CompressionPolicy, summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            owner: owner.to_string(),
            summary: String::new(),
            recent: Vec::new(),
            compress_count: 0,
            policy,
            summarizer,
        }
    }

    pub fn shared(self) -> SharedMemory {
        Arc::new(Mutex::new(self))
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn recent(&self) -> &[ChatMessage] {
        &self.recent
    }

    pub fn compress_count(&self) -> u32 {
        self.compress_count
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            summary_len: self.summary.len(),
            recent_count: self.recent.len(),
            compress_count: self.compress_count,
            has_summary: !self.summary.is_empty(),
        }
    }

    /// Append a message; compress before returning if the window reached
    /// the threshold.
    pub async fn append(
        &mut self,
        role: MessageRole,
        content: impl Into<String>,
    ) -> Option<CompressionOutcome> {
        self.recent.push(ChatMessage {
            role,
            content: content.into(),
        });
        debug!(owner = %self.owner, recent = self.recent.len(), "Memory append");

        if self.recent.len() >= self.policy.threshold {
            Some(self.compress().await)
        } else {
            None
        }
    }

    /// Context for a decision call: the summary as a synthetic exchange,
    /// then the recent window in insertion order. The live prompt is not
    /// included.
    pub fn messages_for_oracle(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.recent.len() + 2);
        if !self.summary.is_empty() {
            messages.push(ChatMessage::user(format!(
                "{}\n{}",
                SUMMARY_PREFIX, self.summary
            )));
            messages.push(ChatMessage::assistant(SUMMARY_ACK));
        }
        messages.extend(self.recent.iter().cloned());
        messages
    }

    async fn compress(&mut self) -> CompressionOutcome {
        let split = self.policy.split_point(self.recent.len());
        let keep = self.recent.split_off(split);
        let fold = std::mem::replace(&mut self.recent, keep);

        match compact(
            &self.owner,
            &self.summary,
            &fold,
            &self.policy,
            self.summarizer.as_ref(),
        )
        .await
        {
            Ok(result) => {
                self.summary = result.summary;
                self.compress_count += 1;
                info!(
                    owner = %self.owner,
                    folded = result.folded,
                    summary_chars = self.summary.len(),
                    compress_count = self.compress_count,
                    "Memory compressed"
                );
                CompressionOutcome::Compressed {
                    folded: result.folded,
                    summary_chars: self.summary.len(),
                }
            }
            Err(e) if e.kind == CompactionErrorKind::EmptyInput => {
                debug!(owner = %self.owner, dropped = fold.len(), "Nothing to fold, trimmed window");
                CompressionOutcome::Skipped {
                    dropped: fold.len(),
                }
            }
            Err(e) => {
                warn!(
                    owner = %self.owner,
                    dropped = fold.len(),
                    error = %e,
                    "Memory summary failed, truncating instead"
                );
                CompressionOutcome::Degraded {
                    dropped: fold.len(),
                    reason: e.detail,
                }
            }
        }
    }
}
