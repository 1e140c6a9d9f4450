//! Compaction error taxonomy.
//!
//! Neither kind is fatal to a game: an empty fold is skipped and a failed
//! summarization degrades to truncation. The kinds exist so callers and
//! logs can tell the two apart.

use serde::{Deserialize, Serialize};

/// High-level error kind for compaction failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompactionErrorKind {
    /// The fold segment is empty or has no substantive text.
    EmptyInput,
    /// The summarizer returned the oracle failure sentinel.
    SummarizationFailed,
    /// The compression policy cannot work (`keep_recent >= threshold`, …).
    InvalidPolicy,
}

impl CompactionErrorKind {
    /// Whether a later pass may succeed where this one failed.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::SummarizationFailed)
    }

    /// Suggested action for this error kind.
    pub fn suggested_action(self) -> &'static str {
        match self {
            Self::EmptyInput => "skip compaction, keep the recent window",
            Self::SummarizationFailed => "drop the fold segment, keep the old summary",
            Self::InvalidPolicy => "require 0 < keep_recent < threshold",
        }
    }
}

impl std::fmt::Display for CompactionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "empty_input"),
            Self::SummarizationFailed => write!(f, "summarization_failed"),
            Self::InvalidPolicy => write!(f, "invalid_policy"),
        }
    }
}

/// Compaction error with context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactionError {
    pub kind: CompactionErrorKind,
    pub detail: String,
    /// Messages in the fold segment when the error occurred.
    pub folded: Option<usize>,
}

impl CompactionError {
    pub fn new(kind: CompactionErrorKind, detail: &str) -> Self {
        Self {
            kind,
            detail: detail.to_string(),
            folded: None,
        }
    }

    pub fn with_folded(mut self, folded: usize) -> Self {
        self.folded = Some(folded);
        self
    }
}

impl std::fmt::Display for CompactionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.detail)?;
        if let Some(folded) = self.folded {
            write!(f, " (fold of {} messages)", folded)?;
        }
        Ok(())
    }
}

impl std::error::Error for CompactionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_fold() {
        let err = CompactionError::new(CompactionErrorKind::SummarizationFailed, "oracle down")
            .with_folded(20);
        assert_eq!(
            err.to_string(),
            "[summarization_failed] oracle down (fold of 20 messages)"
        );
        assert!(err.kind.is_retryable());
        assert!(!CompactionErrorKind::EmptyInput.is_retryable());
    }
}
