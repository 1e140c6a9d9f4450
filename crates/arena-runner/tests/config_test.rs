//! Layering of file and CLI settings over the defaults.

use std::path::PathBuf;
use std::sync::Arc;

use arena_runner::{ArenaConfig, Cli};
use clap::Parser;

const FILE: &str = r#"
seed = 42
games = 2

[endpoint]
base_url = "http://inference.local:9000/v1"
good_model = "judge-large"
evil_model = "judge-large"
summary_model = "judge-small"

[game]
max_team_votes = 4

[memory]
threshold = 12
keep_recent = 4

[retry]
max_retries = 1
initial_backoff_ms = 100

[sampling]
temperature = 0.5
"#;

#[test]
fn test_file_overrides_defaults_and_keeps_the_rest() {
    let config = ArenaConfig::from_toml(FILE).unwrap();

    assert_eq!(config.seed, Some(42));
    assert_eq!(config.games, 2);
    assert_eq!(config.endpoint.base_url, "http://inference.local:9000/v1");
    assert_eq!(config.game.max_team_votes, 4);
    assert_eq!(config.game.team_sizes, vec![2, 3, 4, 3, 4]);
    assert_eq!(config.memory.threshold, 12);
    assert_eq!(config.memory.keep_recent, 4);
    assert_eq!(config.memory.max_summary_tokens, 512);
    assert_eq!(config.retry.max_retries, 1);
    assert_eq!(config.retry.initial_backoff_ms, 100);
    assert_eq!(config.sampling.temperature, 0.5);
    assert_eq!(config.sampling.max_tokens, 1024);
    assert!(config.validate().is_ok());
}

#[test]
fn test_cli_flags_win_over_file() {
    let cli = Cli::try_parse_from([
        "arena-runner",
        "--games",
        "5",
        "--seed",
        "7",
        "--export-dir",
        "/tmp/replays",
    ])
    .unwrap();
    let config = ArenaConfig::from_toml(FILE).unwrap().with_cli(&cli);

    assert_eq!(config.games, 5);
    assert_eq!(config.seed, Some(7));
    assert_eq!(config.export_dir, Some(PathBuf::from("/tmp/replays")));
}

#[test]
fn test_absent_flags_leave_file_values() {
    let cli = Cli::try_parse_from(["arena-runner"]).unwrap();
    let config = ArenaConfig::from_toml(FILE).unwrap().with_cli(&cli);
    assert_eq!(config.games, 2);
    assert_eq!(config.seed, Some(42));
}

#[test]
fn test_validate_rejects_bad_schedule() {
    let config = ArenaConfig::from_toml(
        r#"
[game]
team_sizes = [2, 3, 4]
"#,
    )
    .unwrap();
    let err = config.validate().unwrap_err();
    assert!(format!("{err:#}").contains("Invalid game config"));
}

#[test]
fn test_validate_rejects_bad_memory_policy() {
    let config = ArenaConfig::from_toml(
        r#"
[memory]
threshold = 4
keep_recent = 4
"#,
    )
    .unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_zero_games() {
    let config = ArenaConfig::from_toml("games = 0").unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_unknown_role_fails_to_parse() {
    let result = ArenaConfig::from_toml(
        r#"
[game]
roles = ["merlin", "jester"]
"#,
    );
    assert!(result.is_err());
}

#[test]
fn test_load_reports_missing_file() {
    let err = ArenaConfig::load(Some(std::path::Path::new("/nonexistent/arena.toml")))
        .unwrap_err();
    assert!(format!("{err:#}").contains("Failed to read config"));
}

#[test]
fn test_load_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("arena.toml");
    std::fs::write(&path, FILE).unwrap();
    let config = ArenaConfig::load(Some(&path)).unwrap();
    assert_eq!(config.endpoint.summary_model, "judge-small");
}

#[test]
fn test_shared_model_shares_one_oracle() {
    let config = ArenaConfig::from_toml(FILE).unwrap();
    let oracles = config.build_oracles().unwrap();

    assert!(Arc::ptr_eq(&oracles.good, &oracles.evil));
    assert_eq!(oracles.good.name(), "judge-large");
    assert_eq!(oracles.good.policy().max_retries, 1);
}
