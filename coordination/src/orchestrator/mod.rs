//! Checkpointed orchestration of whole games.
//!
//! [`GameRunner`] drives the phase functions in protocol order;
//! [`RunnerControl`] lets other tasks pause, step, resume or stop it at
//! the checkpoints the phase functions insert.

pub mod control;
pub mod runner;

pub use control::{ControlFlags, ControlState, RunError, RunnerControl, SharedControl, Stopped};
pub use runner::{GameReport, GameRunner, OracleSet};
