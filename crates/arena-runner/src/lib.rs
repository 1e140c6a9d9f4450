//! Operator surface for the negotiation arena.
//!
//! Layered configuration, the stdin control-command protocol and replay
//! export used by the `arena-runner` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod export;

pub use cli::Cli;
pub use commands::{handle, handle_line, Command, CommandError, CommandResponse};
pub use config::{ArenaConfig, EndpointConfig};
pub use export::{replay_file_name, write_export};
