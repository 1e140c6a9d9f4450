//! Memory compression integration tests: the append and read contracts of
//! a participant's store.
//!
//! Tests verify:
//! - Threshold/keep arithmetic (T=4, K=2)
//! - A failed merge degrades to truncation without touching the summary
//! - Blank fold segments skip the merge entirely
//! - The read contract leads with the summary exchange
//! - Concurrent appends to one store are serialized

use std::sync::Arc;

use arena_coordination::memory::{
    CompressionOutcome, CompressionPolicy, MemoryStore, MockSummarizer, OracleSummarizer,
    SUMMARY_ACK, SUMMARY_PREFIX,
};
use arena_coordination::oracle::{
    MessageRole, RetryPolicy, RetryingOracle, ScriptedOracle,
};

fn store(policy: CompressionPolicy) -> MemoryStore {
    MemoryStore::new("Player 1", policy, Arc::new(MockSummarizer::new()))
}

#[tokio::test]
async fn threshold_four_keep_two() {
    let mut store = store(CompressionPolicy::new(4, 2));

    for i in 0..3 {
        let outcome = store
            .append(MessageRole::User, format!("[game event] event {}", i))
            .await;
        assert!(outcome.is_none());
    }
    let outcome = store
        .append(MessageRole::User, "[game event] event 3")
        .await;
    assert!(matches!(outcome, Some(CompressionOutcome::Compressed { .. })));
    assert_eq!(store.recent().len(), 2);
    assert!(!store.summary().is_empty());
    assert_eq!(store.compress_count(), 1);

    assert!(store
        .append(MessageRole::User, "[game event] event 4")
        .await
        .is_none());
    assert_eq!(store.recent().len(), 3);
    assert_eq!(store.compress_count(), 1);

    let outcome = store
        .append(MessageRole::User, "[game event] event 5")
        .await;
    assert!(matches!(outcome, Some(CompressionOutcome::Compressed { .. })));
    assert_eq!(store.compress_count(), 2);
    assert_eq!(store.recent().len(), 2);
    assert_eq!(store.recent()[1].content, "[game event] event 5");
}

#[tokio::test]
async fn failed_merge_truncates() {
    let mut store = MemoryStore::new(
        "Player 2",
        CompressionPolicy::new(4, 2),
        Arc::new(MockSummarizer::failing()),
    );
    for i in 0..4 {
        store
            .append(MessageRole::User, format!("[game event] event {}", i))
            .await;
    }

    assert_eq!(store.recent().len(), 2);
    assert!(store.summary().is_empty());
    assert_eq!(store.compress_count(), 0);
    assert_eq!(store.recent()[0].content, "[game event] event 2");
}

#[tokio::test]
async fn oracle_summarizer_failure_degrades() {
    let oracle =
        RetryingOracle::new(Arc::new(ScriptedOracle::failing()), RetryPolicy::immediate(1)).shared();
    let mut store = MemoryStore::new(
        "Player 3",
        CompressionPolicy::new(4, 2),
        Arc::new(OracleSummarizer::new(oracle)),
    );
    let mut last = None;
    for i in 0..4 {
        last = store
            .append(MessageRole::User, format!("[game event] event {}", i))
            .await;
    }
    assert!(matches!(last, Some(CompressionOutcome::Degraded { .. })));
    assert_eq!(store.recent().len(), 2);
}

#[tokio::test]
async fn oracle_summarizer_uses_low_temperature() {
    let oracle = Arc::new(ScriptedOracle::constant("Player 1 proposed twice."));
    let retrying = RetryingOracle::new(oracle.clone(), RetryPolicy::immediate(0)).shared();
    let mut store = MemoryStore::new(
        "Player 3",
        CompressionPolicy::new(4, 2),
        Arc::new(OracleSummarizer::new(retrying)),
    );
    for i in 0..4 {
        store
            .append(MessageRole::User, format!("[game event] event {}", i))
            .await;
    }

    assert_eq!(store.summary(), "Player 1 proposed twice.");
    let requests = oracle.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].params.temperature < 0.5);
    assert!(requests[0].prompt.contains("[game event] event 0"));
    assert!(!requests[0].prompt.contains("[game event] event 3"));
}

#[tokio::test]
async fn blank_fold_is_skipped() {
    let mut store = store(CompressionPolicy::new(4, 2));
    store.append(MessageRole::Assistant, "   ").await;
    store.append(MessageRole::Assistant, "").await;
    store.append(MessageRole::User, "[game event] a").await;
    let outcome = store.append(MessageRole::User, "[game event] b").await;

    assert!(matches!(outcome, Some(CompressionOutcome::Skipped { .. })));
    assert!(store.summary().is_empty());
    assert_eq!(store.recent().len(), 2);
}

#[tokio::test]
async fn read_contract_leads_with_summary() {
    let mut store = store(CompressionPolicy::new(4, 2));
    assert!(store.messages_for_oracle().is_empty());

    for i in 0..5 {
        store
            .append(MessageRole::User, format!("[game event] event {}", i))
            .await;
    }
    let messages = store.messages_for_oracle();
    assert_eq!(messages.len(), 2 + 3);
    assert_eq!(messages[0].role, MessageRole::User);
    assert!(messages[0].content.starts_with(SUMMARY_PREFIX));
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert_eq!(messages[1].content, SUMMARY_ACK);
    assert_eq!(messages[4].content, "[game event] event 4");
}

#[tokio::test]
async fn concurrent_appends_are_serialized() {
    let shared = store(CompressionPolicy::new(6, 2)).shared();
    let mut handles = Vec::new();
    for i in 0..40 {
        let shared = Arc::clone(&shared);
        handles.push(tokio::spawn(async move {
            shared
                .lock()
                .await
                .append(MessageRole::User, format!("[game event] {}", i))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let store = shared.lock().await;
    assert!(store.recent().len() < 6);
    // 40 appends, every pass keeps 2: first pass after 6, then every 4.
    assert_eq!(store.compress_count(), 9);
    assert_eq!(store.recent().len(), 4);
}
