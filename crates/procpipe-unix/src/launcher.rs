use async_trait::async_trait;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid as NixPid;
use procpipe_core::{
    ChildHandle, PipeReader, PipeWriter, PollBudget, ProcessId, ProcessLauncher, ProcessState,
    ReadChunk, ReadError, SignalError, SpawnConfig, SpawnError, StateCell, StdStream, WaitError,
    WriteError, registry,
};
use std::os::fd::OwnedFd;
use std::os::unix::process::ExitStatusExt;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;
use tracing::{debug, warn};

use crate::pipe::{BlockingWriter, NonBlockingReader, set_nonblocking};
use crate::signals;

/// Spawns children with all three standard streams redirected to pipes whose
/// parent-held read ends run in non-blocking mode.
#[derive(Debug, Default)]
pub struct UnixLauncher;

impl UnixLauncher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessLauncher for UnixLauncher {
    type Handle = UnixChild;

    async fn spawn(&self, config: &SpawnConfig) -> Result<UnixChild, SpawnError> {
        let mut cmd = Command::new(&config.program);
        cmd.args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = &config.working_directory {
            cmd.current_dir(dir);
        }
        for (key, value) in &config.env {
            cmd.env(key, value);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| SpawnError::classify(&config.program, e))?;
        let pid = ProcessId(child.id());

        let (stdin, stdout, stderr) = match wire_pipes(&mut child, config) {
            Ok(pipes) => pipes,
            Err(e) => {
                // the child must not outlive a failed spawn
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        };

        registry::register(pid);
        debug!(pid = pid.0, program = %config.program, args = ?config.args, "spawned child process");

        let mut state = StateCell::new();
        state.record(ProcessState::Running);

        Ok(UnixChild {
            pid,
            child,
            state,
            poll_interval: config.poll_interval(),
            stdin,
            stdout,
            stderr,
        })
    }
}

fn wire_pipes(
    child: &mut Child,
    config: &SpawnConfig,
) -> Result<(BlockingWriter, NonBlockingReader, NonBlockingReader), SpawnError> {
    let stdin = child.stdin.take().ok_or_else(|| missing_pipe("stdin"))?;
    let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
    let stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;

    let stdout_fd = OwnedFd::from(stdout);
    set_nonblocking(&stdout_fd).map_err(SpawnError::Os)?;
    let stderr_fd = OwnedFd::from(stderr);
    set_nonblocking(&stderr_fd).map_err(SpawnError::Os)?;

    Ok((
        BlockingWriter::new(OwnedFd::from(stdin)),
        NonBlockingReader::new(stdout_fd, config.poll_interval(), config.read_chunk_size),
        NonBlockingReader::new(stderr_fd, config.poll_interval(), config.read_chunk_size),
    ))
}

fn missing_pipe(stream: &str) -> SpawnError {
    SpawnError::Os(std::io::Error::other(format!(
        "spawned child had no {stream} pipe"
    )))
}

fn state_from(status: ExitStatus) -> ProcessState {
    if let Some(code) = status.code() {
        ProcessState::Exited(code)
    } else if let Some(sig) = status.signal() {
        ProcessState::Signaled(sig)
    } else {
        // stop/continue notifications never reach try_wait
        ProcessState::Exited(-1)
    }
}

/// Handle to a child spawned by [`UnixLauncher`].
pub struct UnixChild {
    pid: ProcessId,
    child: Child,
    state: StateCell,
    poll_interval: Duration,
    stdin: BlockingWriter,
    stdout: NonBlockingReader,
    stderr: NonBlockingReader,
}

impl UnixChild {
    /// One non-blocking poll of the OS wait primitive, latching the result.
    fn observe(&mut self) -> Result<ProcessState, WaitError> {
        if self.state.get().is_terminal() {
            return Ok(self.state.get());
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                registry::release(self.pid);
                let state = self.state.record(state_from(status));
                debug!(pid = self.pid.0, ?state, "child termination observed");
                Ok(state)
            }
            Ok(None) => Ok(self.state.record(ProcessState::Running)),
            Err(source) => Err(WaitError::Os {
                pid: self.pid,
                source,
            }),
        }
    }

    /// Deliver a signal; `Ok(false)` means the process was already gone.
    fn deliver(&self, sig: Signal) -> Result<bool, SignalError> {
        match signal::kill(NixPid::from_raw(self.pid.0 as i32), sig) {
            Ok(()) => Ok(true),
            Err(nix::errno::Errno::ESRCH) => Ok(false),
            Err(e) => Err(SignalError::Os(e.into())),
        }
    }
}

#[async_trait]
impl ChildHandle for UnixChild {
    fn pid(&self) -> ProcessId {
        self.pid
    }

    fn state(&self) -> ProcessState {
        self.state.get()
    }

    fn exit_status(&self) -> Option<i32> {
        self.state.get().exit_status()
    }

    async fn wait(&mut self, timeout: Option<Duration>) -> Result<ProcessState, WaitError> {
        let budget = PollBudget::new(timeout, self.poll_interval);
        loop {
            let state = self.observe()?;
            if state.is_terminal() {
                return Ok(state);
            }
            if !budget.sleep().await {
                return Ok(state);
            }
        }
    }

    async fn terminate(&mut self) -> Result<(), SignalError> {
        if self.state.get().is_terminal() {
            return Ok(());
        }
        debug!(pid = self.pid.0, "sending SIGTERM");
        self.deliver(Signal::SIGTERM).map(|_| ())
    }

    async fn kill(&mut self) -> Result<(), SignalError> {
        if self.state.get().is_terminal() {
            return Ok(());
        }
        debug!(pid = self.pid.0, "sending SIGKILL");
        self.deliver(Signal::SIGKILL).map(|_| ())
    }

    async fn send_signal(&mut self, name: &str) -> Result<(), SignalError> {
        let Some(sig) = signals::parse(name) else {
            return Err(SignalError::UnsupportedOnPlatform(name.to_string()));
        };
        // refresh first so signaling an already-exited child reports
        // NoSuchProcess instead of poking a zombie
        let state = self
            .observe()
            .map_err(|WaitError::Os { source, .. }| SignalError::Os(source))?;
        if state.is_terminal() {
            return Err(SignalError::NoSuchProcess(self.pid));
        }
        if !self.deliver(sig)? {
            return Err(SignalError::NoSuchProcess(self.pid));
        }
        debug!(pid = self.pid.0, signal = name, "delivered signal");
        Ok(())
    }

    async fn read(
        &mut self,
        stream: StdStream,
        timeout: Option<Duration>,
    ) -> Result<ReadChunk, ReadError> {
        match stream {
            StdStream::Stdout => self.stdout.read(timeout).await,
            StdStream::Stderr => self.stderr.read(timeout).await,
        }
    }

    async fn write_stdin(&mut self, bytes: &[u8]) -> Result<usize, WriteError> {
        self.stdin.write(bytes).await
    }
}

impl Drop for UnixChild {
    fn drop(&mut self) {
        if !self.state.get().is_terminal() {
            // the child must neither outlive its handle nor linger as a zombie
            if let Ok(true) = self.deliver(Signal::SIGKILL) {
                warn!(pid = self.pid.0, "killed still-running child on handle drop");
            }
            let _ = self.child.wait();
        }
        registry::release(self.pid);
    }
}
