//! Line-oriented control commands.
//!
//! One command per line: `pause`, `resume`, `step`, `stop` or `status`.
//! Each line gets a [`CommandResponse`] carrying the control state after
//! the command was applied.

use std::str::FromStr;

use arena_coordination::{ControlState, RunnerControl};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Pause,
    Resume,
    Step,
    Stop,
    Status,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("cannot {command} while {state}")]
    NotApplicable {
        command: Command,
        state: ControlState,
    },
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let word = match self {
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Step => "step",
            Self::Stop => "stop",
            Self::Status => "status",
        };
        f.write_str(word)
    }
}

impl Command {
    /// Whether the command does anything in `state`.
    pub fn applies_in(self, state: ControlState) -> bool {
        match self {
            Self::Pause => state == ControlState::Running,
            Self::Resume | Self::Step => state == ControlState::Paused,
            Self::Stop | Self::Status => true,
        }
    }

    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let word = line.trim().to_ascii_lowercase();
        match word.as_str() {
            "" => Err(CommandError::Empty),
            "pause" => Ok(Self::Pause),
            "resume" => Ok(Self::Resume),
            "step" => Ok(Self::Step),
            "stop" => Ok(Self::Stop),
            "status" => Ok(Self::Status),
            _ => Err(CommandError::Unknown(line.trim().to_string())),
        }
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Reply to one control line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub ok: bool,
    pub state: ControlState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResponse {
    pub fn rejected(control: &RunnerControl, error: &CommandError) -> Self {
        Self {
            ok: false,
            state: control.state(),
            error: Some(error.to_string()),
        }
    }

    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"ok\":{}}}", self.ok))
    }
}

/// Apply a command to the control block.
///
/// A command that does not apply in the current state is rejected and the
/// block is left as it was.
pub fn handle(control: &RunnerControl, command: Command) -> CommandResponse {
    let current = control.state();
    if !command.applies_in(current) {
        return CommandResponse::rejected(
            control,
            &CommandError::NotApplicable {
                command,
                state: current,
            },
        );
    }

    let state = match command {
        Command::Pause => control.pause(),
        Command::Resume => control.resume(),
        Command::Step => control.step(),
        Command::Stop => control.stop(),
        Command::Status => control.state(),
    };
    CommandResponse {
        ok: true,
        state,
        error: None,
    }
}

/// Parse and apply one raw line. Unknown input leaves the control block
/// untouched.
pub fn handle_line(control: &RunnerControl, line: &str) -> CommandResponse {
    match Command::parse(line) {
        Ok(command) => handle(control, command),
        Err(e) => CommandResponse::rejected(control, &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_and_space_insensitive() {
        assert_eq!(Command::parse("pause").unwrap(), Command::Pause);
        assert_eq!(Command::parse("  RESUME\n").unwrap(), Command::Resume);
        assert_eq!("step".parse::<Command>().unwrap(), Command::Step);
        assert_eq!(Command::parse("Stop").unwrap(), Command::Stop);
        assert_eq!(Command::parse("status").unwrap(), Command::Status);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(Command::parse("   "), Err(CommandError::Empty));
        assert_eq!(
            Command::parse("restart"),
            Err(CommandError::Unknown("restart".into()))
        );
    }

    #[test]
    fn test_applicability_table() {
        assert!(Command::Pause.applies_in(ControlState::Running));
        assert!(!Command::Pause.applies_in(ControlState::Paused));
        assert!(Command::Step.applies_in(ControlState::Paused));
        assert!(!Command::Resume.applies_in(ControlState::Idle));
        assert!(Command::Stop.applies_in(ControlState::Idle));
        assert!(Command::Stop.applies_in(ControlState::Finished));
        assert!(Command::Status.applies_in(ControlState::Finished));
    }

    #[test]
    fn test_response_serialization_omits_missing_error() {
        let control = RunnerControl::new();
        let json = handle(&control, Command::Status).to_json_line();
        assert_eq!(json, r#"{"ok":true,"state":"idle"}"#);
    }
}
