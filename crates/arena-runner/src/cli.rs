use std::path::PathBuf;

use arena_coordination::EventFilter;
use clap::Parser;

/// Command-line arguments
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML file overlaid on the environment defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of games to play back to back (overrides the config file)
    #[arg(long)]
    pub games: Option<u32>,

    /// Seed for seating, leader draws and fallback picks
    #[arg(long)]
    pub seed: Option<u64>,

    /// Start in single-step mode: pause at the first checkpoint
    #[arg(long, default_value_t = false)]
    pub step: bool,

    /// Directory for replay files (overrides ARENA_EXPORT_DIR)
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Only print these event types, comma separated
    #[arg(long, value_delimiter = ',')]
    pub events: Vec<String>,

    /// Do not read control commands from stdin
    #[arg(long, default_value_t = false)]
    pub no_stdin: bool,
}

impl Cli {
    /// Subscription filter for the stdout event stream.
    pub fn event_filter(&self) -> EventFilter {
        let types: Vec<&str> = self
            .events
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if types.is_empty() {
            EventFilter::new()
        } else {
            EventFilter::new().types(types)
        }
    }
}
