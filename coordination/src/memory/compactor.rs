//! Memory compactor: folds the older part of the recent window into the
//! rolling summary.
//!
//! The window is split into a fold segment (everything but the last
//! `keep_recent` messages) and a keep segment. The fold segment is rendered,
//! merged with the previous summary by the summarizer, and discarded.

use serde::{Deserialize, Serialize};

use super::errors::{CompactionError, CompactionErrorKind};
use super::summarizer::{render_transcript, Summarizer, SummaryRequest};
use crate::oracle::{is_failure, ChatMessage};

/// When to compress and how much to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionPolicy {
    /// Window length that triggers a compression pass.
    pub threshold: usize,
    /// Messages kept verbatim after a pass.
    pub keep_recent: usize,
    /// Token cap for the merged summary.
    pub max_summary_tokens: u32,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self {
            threshold: 30,
            keep_recent: 10,
            max_summary_tokens: 512,
        }
    }
}

impl CompressionPolicy {
    pub fn new(threshold: usize, keep_recent: usize) -> Self {
        Self {
            threshold,
            keep_recent,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), CompactionError> {
        if self.keep_recent == 0 || self.keep_recent >= self.threshold {
            return Err(CompactionError::new(
                CompactionErrorKind::InvalidPolicy,
                &format!(
                    "keep_recent {} must be in 1..{}",
                    self.keep_recent, self.threshold
                ),
            ));
        }
        Ok(())
    }

    /// Index where the keep segment starts.
    pub fn split_point(&self, len: usize) -> usize {
        len.saturating_sub(self.keep_recent)
    }
}

/// What a compression pass did to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CompressionOutcome {
    /// The fold segment was merged into a new summary.
    Compressed { folded: usize, summary_chars: usize },
    /// Nothing substantive to fold; the window was trimmed.
    Skipped { dropped: usize },
    /// The summarizer failed; the fold segment was dropped unsummarized.
    Degraded { dropped: usize, reason: String },
}

/// A successful merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactionResult {
    pub summary: String,
    pub folded: usize,
}

/// Merge `fold` into `summary`.
///
/// Fails with [`CompactionErrorKind::EmptyInput`] when the fold renders to
/// nothing and with [`CompactionErrorKind::SummarizationFailed`] when the
/// summarizer answers with the oracle failure sentinel.
pub async fn compact(
    owner: &str,
    summary: &str,
    fold: &[ChatMessage],
    policy: &CompressionPolicy,
    summarizer: &dyn Summarizer,
) -> Result<CompactionResult, CompactionError> {
    let transcript = render_transcript(owner, fold);
    if fold.is_empty() || transcript.trim().is_empty() {
        return Err(CompactionError::new(
            CompactionErrorKind::EmptyInput,
            "fold segment has no substantive content",
        )
        .with_folded(fold.len()));
    }

    let request = SummaryRequest {
        owner: owner.to_string(),
        previous_summary: (!summary.is_empty()).then(|| summary.to_string()),
        transcript,
        max_output_tokens: policy.max_summary_tokens,
    };

    let merged = summarizer.summarize(&request).await;
    if is_failure(&merged) {
        return Err(
            CompactionError::new(CompactionErrorKind::SummarizationFailed, &merged)
                .with_folded(fold.len()),
        );
    }

    Ok(CompactionResult {
        summary: merged,
        folded: fold.len(),
    })
}
