//! Layered runner configuration: environment defaults, then an optional
//! TOML file, then CLI flags.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arena_coordination::{
    CompressionPolicy, GameConfig, OpenAiOracle, OracleSet, OracleSummarizer, RetryPolicy,
    RetryingOracle, SamplingParams, SharedOracle,
};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

/// OpenAI-compatible endpoint and the model used by each side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub good_model: String,
    pub evil_model: String,
    pub summary_model: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        let default_model =
            std::env::var("ARENA_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        Self {
            base_url: std::env::var("ARENA_API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080/v1".into()),
            api_key: std::env::var("ARENA_API_KEY").ok(),
            good_model: std::env::var("ARENA_GOOD_MODEL")
                .unwrap_or_else(|_| default_model.clone()),
            evil_model: std::env::var("ARENA_EVIL_MODEL")
                .unwrap_or_else(|_| default_model.clone()),
            summary_model: std::env::var("ARENA_SUMMARY_MODEL").unwrap_or(default_model),
        }
    }
}

/// Everything the binary needs to play a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub endpoint: EndpointConfig,
    pub game: GameConfig,
    pub memory: CompressionPolicy,
    pub retry: RetryPolicy,
    pub sampling: SamplingParams,
    pub seed: Option<u64>,
    pub games: u32,
    pub export_dir: Option<PathBuf>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            game: GameConfig::default(),
            memory: CompressionPolicy::default(),
            retry: RetryPolicy::default(),
            sampling: SamplingParams::default(),
            seed: None,
            games: 1,
            export_dir: std::env::var("ARENA_EXPORT_DIR").ok().map(PathBuf::from),
        }
    }
}

impl ArenaConfig {
    /// Environment defaults, overlaid by `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                Self::from_toml(&raw)
                    .with_context(|| format!("Failed to parse config {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Keys missing from `raw` keep their environment defaults.
    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply CLI flags on top.
    pub fn with_cli(mut self, cli: &Cli) -> Self {
        if let Some(games) = cli.games {
            self.games = games;
        }
        if let Some(seed) = cli.seed {
            self.seed = Some(seed);
        }
        if let Some(ref dir) = cli.export_dir {
            self.export_dir = Some(dir.clone());
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.game.validate().context("Invalid game config")?;
        self.memory.validate().context("Invalid memory policy")?;
        anyhow::ensure!(self.games > 0, "games must be at least 1");
        anyhow::ensure!(
            !self.endpoint.base_url.trim().is_empty(),
            "endpoint base_url is empty"
        );
        Ok(())
    }

    /// One retrying HTTP oracle per distinct model.
    pub fn build_oracles(&self) -> Result<OracleSet> {
        let good = self.oracle_for(&self.endpoint.good_model)?;
        let evil = if self.endpoint.evil_model == self.endpoint.good_model {
            Arc::clone(&good)
        } else {
            self.oracle_for(&self.endpoint.evil_model)?
        };
        let summary = if self.endpoint.summary_model == self.endpoint.good_model {
            Arc::clone(&good)
        } else {
            self.oracle_for(&self.endpoint.summary_model)?
        };

        Ok(OracleSet {
            good,
            evil,
            summarizer: Arc::new(OracleSummarizer::new(summary)),
        })
    }

    fn oracle_for(&self, model: &str) -> Result<SharedOracle> {
        let oracle = OpenAiOracle::new(
            &self.endpoint.base_url,
            self.endpoint.api_key.clone(),
            model,
        )
        .with_context(|| format!("Failed to build oracle for model {model}"))?;
        Ok(RetryingOracle::new(Arc::new(oracle), self.retry.clone()).shared())
    }
}
