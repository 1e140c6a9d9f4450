//! Control commands applied to a live game.

use std::sync::Arc;
use std::time::Duration;

use arena_coordination::{
    ControlState, EventBus, GameConfig, GameRunner, MockSummarizer, OracleSet, RetryPolicy,
    RetryingOracle, RunnerControl, ScriptedOracle,
};
use arena_runner::{handle, handle_line, Command};

const WAIT: Duration = Duration::from_secs(10);

fn slow_runner() -> GameRunner {
    let oracle = ScriptedOracle::constant(r#"{"vote": "approve", "team": [1, 2]}"#)
        .with_latency(Duration::from_millis(5));
    let oracle = RetryingOracle::new(Arc::new(oracle), RetryPolicy::immediate(0)).shared();
    GameRunner::new(
        GameConfig::default(),
        OracleSet::uniform(oracle, Arc::new(MockSummarizer::new())),
        EventBus::new().shared(),
        RunnerControl::new().shared(),
    )
    .unwrap()
    .with_seed(3)
}

async fn wait_for_state(control: &RunnerControl, want: ControlState) {
    let mut rx = control.watch();
    tokio::time::timeout(WAIT, rx.wait_for(|f| f.state == want))
        .await
        .expect("timed out waiting for state")
        .expect("control dropped");
}

#[test]
fn test_commands_on_idle_block() {
    let control = RunnerControl::new();

    for command in [Command::Pause, Command::Resume, Command::Step] {
        let response = handle(&control, command);
        assert!(!response.ok);
        assert_eq!(response.state, ControlState::Idle);
    }
    assert_eq!(
        handle(&control, Command::Pause).error.as_deref(),
        Some("cannot pause while idle")
    );

    let response = handle(&control, Command::Stop);
    assert!(response.ok);
    assert_eq!(response.state, ControlState::Finished);

    let again = handle(&control, Command::Stop);
    assert!(again.ok);
    assert_eq!(again.state, ControlState::Finished);
    assert!(control.session_stopped());
}

#[tokio::test]
async fn test_stop_between_games_is_accepted_and_remembered() {
    let mut runner = slow_runner();
    let control = Arc::clone(runner.control());
    let first = runner.run_game().await;
    assert!(!first.stopped);

    let response = handle_line(&control, "stop");
    assert!(response.ok);
    assert_eq!(response.state, ControlState::Finished);

    let second = runner.run_game().await;
    assert!(second.stopped);
    assert!(second.state.records.is_empty());
}

#[test]
fn test_unknown_line_leaves_control_untouched() {
    let control = RunnerControl::new();
    let before = control.flags();

    let response = handle_line(&control, "rewind");

    assert!(!response.ok);
    assert_eq!(response.state, ControlState::Idle);
    assert_eq!(response.error.as_deref(), Some("unknown command: rewind"));
    assert_eq!(control.flags(), before);
}

#[tokio::test]
async fn test_pause_status_resume_stop_during_game() {
    let mut runner = slow_runner();
    let control = Arc::clone(runner.control());
    let game = tokio::spawn(async move { runner.run_game().await });

    wait_for_state(&control, ControlState::Running).await;

    let paused = handle_line(&control, "pause");
    assert!(paused.ok);
    assert_eq!(paused.state, ControlState::Paused);
    assert_eq!(handle_line(&control, "status").state, ControlState::Paused);

    assert!(!handle_line(&control, "pause").ok);

    let resumed = handle_line(&control, "resume");
    assert!(resumed.ok);
    assert_eq!(resumed.state, ControlState::Running);

    assert!(handle_line(&control, "stop").ok);

    let report = tokio::time::timeout(WAIT, game)
        .await
        .expect("game did not stop")
        .unwrap();
    assert!(report.stopped);
    assert_eq!(control.state(), ControlState::Finished);
}
