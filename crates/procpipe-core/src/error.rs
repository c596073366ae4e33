use thiserror::Error;

use crate::ProcessId;

/// Errors raised while creating a child process.
///
/// No partial handle ever escapes a failed spawn; pipe descriptors created
/// before the failure are closed when their owners drop.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("executable not found: {0}")]
    ExecutableNotFound(String),

    #[error("permission denied executing {0}")]
    PermissionDenied(String),

    #[error("process or pipe resources exhausted: {0}")]
    ResourceExhausted(#[source] std::io::Error),

    #[error("operating system failed to spawn process: {0}")]
    Os(#[source] std::io::Error),
}

impl SpawnError {
    /// Map an OS spawn failure onto the error taxonomy.
    pub fn classify(program: &str, err: std::io::Error) -> SpawnError {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::NotFound => SpawnError::ExecutableNotFound(program.to_string()),
            ErrorKind::PermissionDenied => SpawnError::PermissionDenied(program.to_string()),
            ErrorKind::WouldBlock | ErrorKind::OutOfMemory => SpawnError::ResourceExhausted(err),
            _ => SpawnError::Os(err),
        }
    }

    /// Whether retrying the spawn later could reasonably succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, SpawnError::ResourceExhausted(_))
    }
}

/// I/O failure on a pipe read. Timeouts and EOF are ordinary
/// [`ReadChunk`](crate::ReadChunk) values, never errors.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("pipe read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// I/O failure on a pipe write.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The child closed its stdin; distinct from EOF on the read side.
    #[error("child stdin is closed")]
    Closed,

    #[error("pipe write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure delivering a signal to a child process.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("signal {0} is not supported on this platform")]
    UnsupportedOnPlatform(String),

    #[error("process {0} has already exited")]
    NoSuchProcess(ProcessId),

    #[error("failed to deliver signal: {0}")]
    Os(#[source] std::io::Error),
}

/// Failure querying the OS wait primitive. A child that simply has not
/// exited yet is reported through [`ProcessState`](crate::ProcessState),
/// not through this error.
#[derive(Debug, Error)]
pub enum WaitError {
    #[error("failed to wait on process {pid}: {source}")]
    Os {
        pid: ProcessId,
        #[source]
        source: std::io::Error,
    },
}

/// Aggregate error for callers who want a single type across operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error(transparent)]
    Wait(#[from] WaitError),
}

impl Error {
    /// Whether the failure reflects resource pressure rather than a
    /// programming error or permanent condition.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Spawn(e) => e.is_transient(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    #[test]
    fn classify_maps_not_found() {
        let err = SpawnError::classify("frobnicate", ErrorKind::NotFound.into());
        assert!(matches!(err, SpawnError::ExecutableNotFound(p) if p == "frobnicate"));
    }

    #[test]
    fn classify_maps_permission_denied() {
        let err = SpawnError::classify("/etc/shadow", ErrorKind::PermissionDenied.into());
        assert!(matches!(err, SpawnError::PermissionDenied(_)));
    }

    #[test]
    fn classify_maps_resource_pressure() {
        let err = SpawnError::classify("cat", ErrorKind::OutOfMemory.into());
        assert!(matches!(err, SpawnError::ResourceExhausted(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn classify_falls_back_to_os() {
        let err = SpawnError::classify("cat", ErrorKind::BrokenPipe.into());
        assert!(matches!(err, SpawnError::Os(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn aggregate_error_display() {
        let err = Error::from(SignalError::UnsupportedOnPlatform("SIGUSR1".into()));
        let display = format!("{err}");
        assert!(display.contains("SIGUSR1"));
        assert!(display.contains("not supported"));
    }

    #[test]
    fn aggregate_transient_only_for_resource_exhaustion() {
        let transient = Error::from(SpawnError::ResourceExhausted(ErrorKind::WouldBlock.into()));
        assert!(transient.is_transient());

        let permanent = Error::from(WriteError::Closed);
        assert!(!permanent.is_transient());
    }
}
