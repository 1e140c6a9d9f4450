//! Cooperative run control: pause, single-step, resume and stop.
//!
//! The control block is a `tokio::sync::watch` channel carrying the current
//! [`ControlState`] plus the stop and step intents. Commands mutate it from
//! any task; the game loop only reacts at [`RunnerControl::checkpoint`],
//! where it either proceeds, suspends on the channel, or unwinds with
//! [`Stopped`].
//!
//! ```text
//!            pause              step / resume
//!   Running ───────▶ Paused ◀───────────────┐
//!      ▲               │                    │
//!      └───────────────┘                    │
//!          resume / step    step mode: re-pause at next checkpoint
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::events::{EventBus, GameEvent, PauseReason};
use crate::game::TransitionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlState {
    Idle,
    Running,
    Paused,
    Finished,
}

impl std::fmt::Display for ControlState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// Snapshot of the control block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFlags {
    pub state: ControlState,
    /// The current game unwinds at its next checkpoint.
    pub stop_requested: bool,
    pub step_mode: bool,
    /// An operator stop ends the session: no further game may start until
    /// [`RunnerControl::new_session`].
    pub session_stopped: bool,
}

impl Default for ControlFlags {
    fn default() -> Self {
        Self {
            state: ControlState::Idle,
            stop_requested: false,
            step_mode: false,
            session_stopped: false,
        }
    }
}

/// Cancellation signal raised at a checkpoint after `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("stop requested")]
pub struct Stopped;

/// Why a game did not reach a natural end.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("stop requested")]
    Stopped,

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl From<Stopped> for RunError {
    fn from(_: Stopped) -> Self {
        Self::Stopped
    }
}

/// Shared reference to a control block.
pub type SharedControl = Arc<RunnerControl>;

pub struct RunnerControl {
    flags: watch::Sender<ControlFlags>,
    checkpoints: AtomicU64,
}

impl RunnerControl {
    pub fn new() -> Self {
        let (flags, _) = watch::channel(ControlFlags::default());
        Self {
            flags,
            checkpoints: AtomicU64::new(0),
        }
    }

    /// Control block that pauses at the first checkpoint.
    pub fn stepping() -> Self {
        let control = Self::new();
        control.set_step_mode(true);
        control
    }

    pub fn shared(self) -> SharedControl {
        Arc::new(self)
    }

    pub fn flags(&self) -> ControlFlags {
        *self.flags.borrow()
    }

    pub fn state(&self) -> ControlState {
        self.flags.borrow().state
    }

    /// Checkpoints passed since construction.
    pub fn checkpoints_passed(&self) -> u64 {
        self.checkpoints.load(Ordering::SeqCst)
    }

    /// Watch the control block, e.g. to wait until the runner is paused.
    pub fn watch(&self) -> watch::Receiver<ControlFlags> {
        self.flags.subscribe()
    }

    /// Valid only while running.
    pub fn pause(&self) -> ControlState {
        self.flags.send_if_modified(|f| {
            if f.state == ControlState::Running {
                f.state = ControlState::Paused;
                true
            } else {
                false
            }
        });
        self.log_command("pause")
    }

    /// Valid only while paused. Leaves single-step mode.
    pub fn resume(&self) -> ControlState {
        self.flags.send_if_modified(|f| {
            if f.state == ControlState::Paused {
                f.state = ControlState::Running;
                f.step_mode = false;
                true
            } else {
                false
            }
        });
        self.log_command("resume")
    }

    /// Valid only while paused. Runs to the next checkpoint, then pauses
    /// again.
    pub fn step(&self) -> ControlState {
        self.flags.send_if_modified(|f| {
            if f.state == ControlState::Paused {
                f.state = ControlState::Running;
                f.step_mode = true;
                true
            } else {
                false
            }
        });
        self.log_command("step")
    }

    /// Valid from any state; ends the session. An idle block finishes at
    /// once, a running game unwinds at its next checkpoint, and between
    /// games the intent is kept so the next game never plays.
    pub fn stop(&self) -> ControlState {
        self.flags.send_if_modified(|f| {
            let mut changed = !f.session_stopped;
            f.session_stopped = true;
            match f.state {
                ControlState::Finished => {}
                ControlState::Idle => {
                    f.state = ControlState::Finished;
                    changed = true;
                }
                ControlState::Running | ControlState::Paused => {
                    changed |= !f.stop_requested;
                    f.stop_requested = true;
                }
            }
            changed
        });
        self.log_command("stop")
    }

    pub fn session_stopped(&self) -> bool {
        self.flags.borrow().session_stopped
    }

    /// Forget a previous session's stop so games may run again. Ignored
    /// while a game is in progress.
    pub fn new_session(&self) {
        self.flags.send_if_modified(|f| match f.state {
            ControlState::Running | ControlState::Paused => false,
            ControlState::Idle | ControlState::Finished => {
                let changed = f.session_stopped || f.state != ControlState::Idle;
                f.session_stopped = false;
                f.stop_requested = false;
                f.state = ControlState::Idle;
                changed
            }
        });
        self.log_command("new_session");
    }

    /// Arm or disarm single-step mode without changing state.
    pub fn set_step_mode(&self, enabled: bool) {
        self.flags.send_if_modified(|f| {
            let changed = f.step_mode != enabled;
            f.step_mode = enabled;
            changed
        });
    }

    fn log_command(&self, command: &str) -> ControlState {
        let flags = self.flags();
        debug!(
            command,
            state = %flags.state,
            stop_requested = flags.stop_requested,
            step_mode = flags.step_mode,
            session_stopped = flags.session_stopped,
            "Control command"
        );
        flags.state
    }

    /// Enter `Running` for a new game. A stopped session carries its stop
    /// into the game, which then unwinds before playing anything.
    pub(crate) fn begin(&self) {
        self.flags.send_modify(|f| {
            if matches!(f.state, ControlState::Idle | ControlState::Finished) {
                f.stop_requested = f.session_stopped;
            }
            f.state = ControlState::Running;
        });
    }

    pub(crate) fn finish(&self) {
        self.flags.send_modify(|f| {
            f.state = ControlState::Finished;
            f.stop_requested = false;
        });
    }

    /// Suspension point between protocol steps.
    ///
    /// In order: a pending stop unwinds; step mode re-pauses; a paused
    /// block waits for resume, step or stop. Pausing publishes
    /// `runner_paused`, waking publishes `runner_resumed`.
    pub async fn checkpoint(&self, bus: &EventBus) -> Result<(), Stopped> {
        let flags = self.flags();
        if flags.stop_requested {
            return Err(Stopped);
        }

        let reason = if flags.step_mode && flags.state == ControlState::Running {
            self.flags.send_if_modified(|f| {
                if f.state == ControlState::Running {
                    f.state = ControlState::Paused;
                    true
                } else {
                    false
                }
            });
            Some(PauseReason::Step)
        } else if flags.state == ControlState::Paused {
            Some(PauseReason::Pause)
        } else {
            None
        };

        if let Some(reason) = reason {
            info!(%reason, checkpoint = self.checkpoints_passed(), "Runner paused");
            bus.publish(GameEvent::RunnerPaused { reason });

            let mut rx = self.flags.subscribe();
            let (stop_requested, step_mode) = match rx
                .wait_for(|f| f.state != ControlState::Paused || f.stop_requested)
                .await
            {
                Ok(f) => (f.stop_requested, f.step_mode),
                Err(_) => (true, false),
            };

            if stop_requested {
                return Err(Stopped);
            }
            info!(step_mode, "Runner resumed");
            bus.publish(GameEvent::RunnerResumed { step_mode });
        }

        self.checkpoints.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Default for RunnerControl {
    fn default() -> Self {
        Self::new()
    }
}
