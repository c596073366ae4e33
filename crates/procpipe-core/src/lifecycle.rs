use async_trait::async_trait;
use std::time::Duration;

use crate::{
    ProcessId, ProcessState, ReadChunk, ReadError, SignalError, SpawnConfig, SpawnError, StdStream,
    WaitError, WriteError,
};

/// Handle to a spawned child process and its three standard streams.
///
/// A handle exclusively owns its pipe transports and the right to wait on and
/// signal the child. Dropping a handle releases every OS resource it holds;
/// a child still running at that point is force-killed and reaped.
#[async_trait]
pub trait ChildHandle: Send + Sync {
    fn pid(&self) -> ProcessId;

    /// Last recorded state. Does not consult the OS; use [`wait`] with a zero
    /// timeout for a fresh poll.
    ///
    /// [`wait`]: ChildHandle::wait
    fn state(&self) -> ProcessState;

    /// Recorded exit code, or terminating signal number for signaled exits.
    /// `None` until termination has been observed by a wait.
    fn exit_status(&self) -> Option<i32>;

    /// Poll the OS wait primitive at bounded intervals until the child exits
    /// or the timeout elapses, and return the best-known state. A hung child
    /// yields `Running` after the timeout.
    async fn wait(&mut self, timeout: Option<Duration>) -> Result<ProcessState, WaitError>;

    /// Request graceful shutdown (SIGTERM on POSIX; equivalent to [`kill`] on
    /// platforms without a graceful primitive). No-op once the child exited.
    ///
    /// [`kill`]: ChildHandle::kill
    async fn terminate(&mut self) -> Result<(), SignalError>;

    /// Force immediate termination. The only guaranteed-successful
    /// termination path. No-op once the child exited.
    async fn kill(&mut self) -> Result<(), SignalError>;

    /// Deliver an arbitrary signal by its registry name.
    async fn send_signal(&mut self, signal: &str) -> Result<(), SignalError>;

    /// Read from the child's stdout or stderr with the shared timeout
    /// convention of [`PipeReader`](crate::PipeReader).
    async fn read(
        &mut self,
        stream: StdStream,
        timeout: Option<Duration>,
    ) -> Result<ReadChunk, ReadError>;

    /// Write to the child's stdin; returns the number of bytes accepted.
    async fn write_stdin(&mut self, bytes: &[u8]) -> Result<usize, WriteError>;
}

/// Spawns child processes wired to pipe transports.
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    type Handle: ChildHandle;

    /// Create the child with stdin/stdout/stderr redirected to fresh pipes
    /// and return its handle. On failure no partial handle is returned and
    /// any pipes already created are closed.
    async fn spawn(&self, config: &SpawnConfig) -> Result<Self::Handle, SpawnError>;
}

#[async_trait]
impl ChildHandle for Box<dyn ChildHandle> {
    fn pid(&self) -> ProcessId {
        (**self).pid()
    }

    fn state(&self) -> ProcessState {
        (**self).state()
    }

    fn exit_status(&self) -> Option<i32> {
        (**self).exit_status()
    }

    async fn wait(&mut self, timeout: Option<Duration>) -> Result<ProcessState, WaitError> {
        (**self).wait(timeout).await
    }

    async fn terminate(&mut self) -> Result<(), SignalError> {
        (**self).terminate().await
    }

    async fn kill(&mut self) -> Result<(), SignalError> {
        (**self).kill().await
    }

    async fn send_signal(&mut self, signal: &str) -> Result<(), SignalError> {
        (**self).send_signal(signal).await
    }

    async fn read(
        &mut self,
        stream: StdStream,
        timeout: Option<Duration>,
    ) -> Result<ReadChunk, ReadError> {
        (**self).read(stream, timeout).await
    }

    async fn write_stdin(&mut self, bytes: &[u8]) -> Result<usize, WriteError> {
        (**self).write_stdin(bytes).await
    }
}
