use serde::{Deserialize, Serialize};

/// Identifier of a spawned child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessId(pub u32);

impl From<u32> for ProcessId {
    fn from(pid: u32) -> Self {
        ProcessId(pid)
    }
}

impl std::fmt::Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of a child process.
///
/// `Unknown` is only the pre-first-poll default; a handle records `Running`
/// as soon as the spawn succeeds, so no wait call ever reports `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessState {
    #[default]
    Unknown,
    Running,
    /// Exited normally with the given exit code.
    Exited(i32),
    /// Terminated by the given signal number.
    Signaled(i32),
}

impl ProcessState {
    pub fn is_running(self) -> bool {
        matches!(self, ProcessState::Running)
    }

    /// Terminal states are never left once entered.
    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessState::Exited(_) | ProcessState::Signaled(_))
    }

    /// Exit code, or the terminating signal's number per the wait-status
    /// convention. `None` while the process has not been seen to terminate.
    pub fn exit_status(self) -> Option<i32> {
        match self {
            ProcessState::Exited(code) => Some(code),
            ProcessState::Signaled(signal) => Some(signal),
            ProcessState::Running | ProcessState::Unknown => None,
        }
    }
}

/// Latched process state.
///
/// Invariant: once a terminal state is recorded it is never overwritten by a
/// later stale poll.
#[derive(Debug, Default)]
pub struct StateCell {
    state: ProcessState,
}

impl StateCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> ProcessState {
        self.state
    }

    /// Record an observation and return the resulting state.
    pub fn record(&mut self, observed: ProcessState) -> ProcessState {
        if !self.state.is_terminal() {
            self.state = observed;
        }
        self.state
    }
}

/// The readable standard streams of a child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StdStream {
    Stdout,
    Stderr,
}
