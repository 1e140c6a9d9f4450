//! Summarizer seam for memory compression.
//!
//! The real implementation asks the decision oracle for a merged summary at
//! low temperature. [`MockSummarizer`] is deterministic and can be told to
//! fail, for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::oracle::{
    ChatMessage, MessageRole, OracleRequest, SamplingParams, SharedOracle, FAILURE_SENTINEL,
};

use super::{EVENT_PREFIX, MISSION_PREFIX};

/// Lines from this marker on are reply-format boilerplate.
pub const RESPONSE_FORMAT_MARKER: &str = "Reply strictly in this JSON format";

/// Prompt lines that carry no game information.
const BOILERPLATE_LINES: [&str; 2] = ["Say your statement directly", "Do not reveal your true"];

/// Decision prompts keep at most this many useful lines in a summary input.
const PROMPT_LINES_KEPT: usize = 5;

const SUMMARY_SYSTEM_PROMPT: &str = "\
You are the memory assistant of a player in a hidden-role negotiation game. Compress the \
game record into a structured summary.

Cover, when present:
1. Key events: each round's leader, team, vote outcome, mission result and failure count
2. Player profiles: each player's stance in statements, voting tendencies, suspicious or \
trustworthy behavior
3. Relations: who suspects or trusts whom, who agrees or clashes with whom
4. My own decisions: what I said, proposed and voted

Rules:
- Be concise; keep what matters for later decisions
- Do not drop any player's key behavior
- Do not invent events
- Stay under 300 words";

/// Input for one merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRequest {
    /// Seat name whose perspective the record is written from.
    pub owner: String,
    /// The rolling summary so far, if any.
    pub previous_summary: Option<String>,
    /// Rendered fold segment.
    pub transcript: String,
    pub max_output_tokens: u32,
}

impl SummaryRequest {
    /// The user message sent to the oracle.
    pub fn prompt(&self) -> String {
        match &self.previous_summary {
            Some(previous) => format!(
                "Here is the previous memory summary:\n---\n{}\n---\n\n\
                 Here are the new game records (from {}'s perspective):\n---\n{}\n---\n\n\
                 Merge the old summary and the new records into one updated summary.",
                previous, self.owner, self.transcript
            ),
            None => format!(
                "Here are the game records (from {}'s perspective):\n---\n{}\n---\n\n\
                 Write a structured summary.",
                self.owner, self.transcript
            ),
        }
    }
}

/// Produces a merged summary. Returns the oracle failure sentinel rather
/// than an error when the merge could not be produced.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, request: &SummaryRequest) -> String;
}

/// Summarizer backed by the decision oracle.
pub struct OracleSummarizer {
    oracle: SharedOracle,
}

impl OracleSummarizer {
    pub fn new(oracle: SharedOracle) -> Self {
        Self { oracle }
    }
}

#[async_trait]
impl Summarizer for OracleSummarizer {
    async fn summarize(&self, request: &SummaryRequest) -> String {
        let call = OracleRequest::new(SUMMARY_SYSTEM_PROMPT, request.prompt())
            .with_params(SamplingParams::summary(request.max_output_tokens));
        self.oracle.ask(&call).await
    }
}

/// Deterministic summarizer for tests.
pub struct MockSummarizer {
    pub should_fail: bool,
}

impl MockSummarizer {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    /// A summarizer whose every call returns the failure sentinel.
    pub fn failing() -> Self {
        Self { should_fail: true }
    }
}

impl Default for MockSummarizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, request: &SummaryRequest) -> String {
        if self.should_fail {
            return format!("{} (1 attempts): simulated failure]", FAILURE_SENTINEL);
        }
        let lines = request.transcript.lines().count();
        match &request.previous_summary {
            Some(previous) => format!("{}\n+ {} line(s) for {}", previous, lines, request.owner),
            None => format!("summary for {}: {} line(s)", request.owner, lines),
        }
    }
}

/// Render a fold segment as readable text for the summarizer.
///
/// Event and mission lines are kept verbatim, decision prompts are reduced
/// to their first few informative lines, replies are attributed to the
/// owner. Returns an empty string when nothing substantive remains.
pub fn render_transcript(owner: &str, messages: &[ChatMessage]) -> String {
    let mut lines = Vec::new();
    for message in messages {
        match message.role {
            MessageRole::User => {
                if message.content.starts_with(EVENT_PREFIX)
                    || message.content.starts_with(MISSION_PREFIX)
                {
                    lines.push(message.content.clone());
                } else {
                    let simplified = simplify_prompt(&message.content);
                    if !simplified.is_empty() {
                        lines.push(format!("[decision request] {}", simplified));
                    }
                }
            }
            MessageRole::Assistant => {
                if !message.content.trim().is_empty() {
                    lines.push(format!("[{} replied] {}", owner, message.content));
                }
            }
        }
    }
    lines.join("\n")
}

/// Strip reply-format instructions and boilerplate from a decision prompt.
fn simplify_prompt(prompt: &str) -> String {
    let mut useful = Vec::new();
    let mut in_format_block = false;

    for line in prompt.lines() {
        let trimmed = line.trim();
        if trimmed.contains(RESPONSE_FORMAT_MARKER) {
            in_format_block = true;
            continue;
        }
        if BOILERPLATE_LINES.iter().any(|b| trimmed.contains(b)) {
            continue;
        }
        if in_format_block {
            if trimmed.starts_with('{') || trimmed.starts_with("For example") {
                continue;
            }
            in_format_block = false;
        }
        if !trimmed.is_empty() {
            useful.push(trimmed);
        }
    }

    useful.truncate(PROMPT_LINES_KEPT);
    useful.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_keeps_events_and_attributes_replies() {
        let messages = vec![
            ChatMessage::user(format!("{} Player 2 said: hi", EVENT_PREFIX)),
            ChatMessage::user(format!("{} you signalled success", MISSION_PREFIX)),
            ChatMessage::assistant("I approve"),
        ];
        let text = render_transcript("Player 1", &messages);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with(EVENT_PREFIX));
        assert_eq!(lines[2], "[Player 1 replied] I approve");
    }

    #[test]
    fn test_simplify_strips_format_block() {
        let prompt = format!(
            "Round 2.\nLeader Player 3 proposed: Player 1, Player 4\n\n{}:\n{{\"vote\": \"approve\"}}\n{{\"vote\": \"reject\"}}\nThanks",
            RESPONSE_FORMAT_MARKER
        );
        assert_eq!(
            simplify_prompt(&prompt),
            "Round 2. Leader Player 3 proposed: Player 1, Player 4 Thanks"
        );
    }

    #[test]
    fn test_simplify_keeps_five_lines() {
        let prompt = "a\nb\nc\nd\ne\nf\ng";
        assert_eq!(simplify_prompt(prompt), "a b c d e");
    }

    #[test]
    fn test_blank_fold_renders_empty() {
        let messages = vec![ChatMessage::user("   "), ChatMessage::assistant("")];
        assert!(render_transcript("Player 1", &messages).trim().is_empty());
    }

    #[test]
    fn test_prompt_mentions_previous_summary() {
        let request = SummaryRequest {
            owner: "Player 4".into(),
            previous_summary: Some("old".into()),
            transcript: "new".into(),
            max_output_tokens: 512,
        };
        let prompt = request.prompt();
        assert!(prompt.contains("old"));
        assert!(prompt.contains("Player 4's perspective"));
        assert!(prompt.contains("Merge"));
    }

    #[tokio::test]
    async fn test_mock_summarizer() {
        let request = SummaryRequest {
            owner: "Player 1".into(),
            previous_summary: None,
            transcript: "x\ny".into(),
            max_output_tokens: 64,
        };
        assert_eq!(
            MockSummarizer::new().summarize(&request).await,
            "summary for Player 1: 2 line(s)"
        );
        let failed = MockSummarizer::failing().summarize(&request).await;
        assert!(crate::oracle::is_failure(&failed));
    }
}
