use async_trait::async_trait;
use procpipe_core::{
    ChildHandle, PipeReader, PipeWriter, PollBudget, ProcessId, ProcessLauncher, ProcessState,
    ReadChunk, ReadError, SignalError, SpawnConfig, SpawnError, StateCell, StdStream, WaitError,
    WriteError, registry,
};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::time::Duration;
use tracing::{debug, warn};

use crate::pipe::{StdinWriter, ThreadedReader};

/// Spawns children with piped standard streams, starting one reader thread
/// per readable stream whose lifetime is tied to the returned handle.
#[derive(Debug, Default)]
pub struct WindowsLauncher;

impl WindowsLauncher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessLauncher for WindowsLauncher {
    type Handle = WindowsChild;

    async fn spawn(&self, config: &SpawnConfig) -> Result<WindowsChild, SpawnError> {
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

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            // CREATE_NO_WINDOW (0x08000000) - no console popup for
            // background children
            cmd.creation_flags(0x08000000);
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

        Ok(WindowsChild {
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
) -> Result<(StdinWriter<ChildStdin>, ThreadedReader, ThreadedReader), SpawnError> {
    let stdin = child.stdin.take().ok_or_else(|| missing_pipe("stdin"))?;
    let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
    let stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;

    let stdout = ThreadedReader::spawn(stdout, config.read_chunk_size, "stdout")
        .map_err(SpawnError::ResourceExhausted)?;
    let stderr = ThreadedReader::spawn(stderr, config.read_chunk_size, "stderr")
        .map_err(SpawnError::ResourceExhausted)?;

    Ok((StdinWriter::new(stdin), stdout, stderr))
}

fn missing_pipe(stream: &str) -> SpawnError {
    SpawnError::Os(std::io::Error::other(format!(
        "spawned child had no {stream} pipe"
    )))
}

fn state_from(status: ExitStatus) -> ProcessState {
    // no signal exits here; a forced termination surfaces as its exit code
    ProcessState::Exited(status.code().unwrap_or(-1))
}

/// Handle to a child spawned by [`WindowsLauncher`].
pub struct WindowsChild {
    pid: ProcessId,
    child: Child,
    state: StateCell,
    poll_interval: Duration,
    stdin: StdinWriter<ChildStdin>,
    stdout: ThreadedReader,
    stderr: ThreadedReader,
}

impl WindowsChild {
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

    #[cfg(windows)]
    fn force_kill(&mut self) -> Result<(), SignalError> {
        use std::os::windows::io::AsRawHandle;
        use windows::Win32::Foundation::HANDLE;
        use windows::Win32::System::Threading::TerminateProcess;

        let result = unsafe { TerminateProcess(HANDLE(self.child.as_raw_handle()), 1) };
        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                // termination of an already-dead process reports access
                // denied; confirm before treating it as a failure
                if matches!(self.child.try_wait(), Ok(Some(_))) {
                    return Ok(());
                }
                Err(SignalError::Os(std::io::Error::other(e)))
            }
        }
    }

    #[cfg(not(windows))]
    fn force_kill(&mut self) -> Result<(), SignalError> {
        self.child.kill().map_err(SignalError::Os)
    }
}

#[async_trait]
impl ChildHandle for WindowsChild {
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

    /// No graceful termination primitive exists here; defined to behave
    /// identically to [`kill`](ChildHandle::kill).
    async fn terminate(&mut self) -> Result<(), SignalError> {
        self.kill().await
    }

    async fn kill(&mut self) -> Result<(), SignalError> {
        if self.state.get().is_terminal() {
            return Ok(());
        }
        debug!(pid = self.pid.0, "terminating child process");
        self.force_kill()
    }

    async fn send_signal(&mut self, name: &str) -> Result<(), SignalError> {
        // every registry name is absent on this platform
        Err(SignalError::UnsupportedOnPlatform(name.to_string()))
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

impl Drop for WindowsChild {
    fn drop(&mut self) {
        if !self.state.get().is_terminal() {
            // killing the child closes its pipe ends, which in turn lets the
            // reader threads run to completion
            if self.force_kill().is_ok() {
                warn!(pid = self.pid.0, "killed still-running child on handle drop");
            }
            let _ = self.child.wait();
        }
        registry::release(self.pid);
    }
}
