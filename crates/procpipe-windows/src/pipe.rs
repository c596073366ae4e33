use async_trait::async_trait;
use procpipe_core::{PipeReader, PipeWriter, ReadChunk, ReadError, WriteError};
use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tracing::debug;

struct Buffered {
    data: Vec<u8>,
    eof: bool,
    error: Option<std::io::Error>,
}

struct Shared {
    state: Mutex<Buffered>,
    notify: Notify,
}

/// Read end of a child stream serviced by a background reader thread.
///
/// The thread loops on blocking reads and deposits bytes into the shared
/// buffer; it touches nothing else, so the rest of the system keeps its
/// single-logical-thread execution model. The thread exits on EOF or error,
/// which the OS delivers once the child side of the pipe closes.
pub struct ThreadedReader {
    shared: Arc<Shared>,
}

impl ThreadedReader {
    /// Start the reader thread for `source`. Thread creation failure is a
    /// resource-exhaustion condition surfaced to the spawn path.
    pub fn spawn<R: Read + Send + 'static>(
        mut source: R,
        chunk_size: usize,
        label: &'static str,
    ) -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(Buffered {
                data: Vec::new(),
                eof: false,
                error: None,
            }),
            notify: Notify::new(),
        });
        let worker = Arc::clone(&shared);

        std::thread::Builder::new()
            .name(format!("procpipe-{label}-reader"))
            .spawn(move || {
                let mut buf = vec![0u8; chunk_size];
                loop {
                    match source.read(&mut buf) {
                        Ok(0) => break,
                        Ok(n) => {
                            let mut st = worker.state.lock().expect("pipe buffer lock poisoned");
                            st.data.extend_from_slice(&buf[..n]);
                            drop(st);
                            worker.notify.notify_one();
                        }
                        Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                        Err(e) => {
                            worker
                                .state
                                .lock()
                                .expect("pipe buffer lock poisoned")
                                .error = Some(e);
                            break;
                        }
                    }
                }
                let mut st = worker.state.lock().expect("pipe buffer lock poisoned");
                st.eof = true;
                drop(st);
                worker.notify.notify_one();
                debug!(stream = label, "reader thread finished");
            })?;

        Ok(Self { shared })
    }

    /// Drain whatever the reader thread has buffered so far.
    fn take_buffered(&self) -> Result<Option<ReadChunk>, ReadError> {
        let mut st = self.shared.state.lock().expect("pipe buffer lock poisoned");
        if !st.data.is_empty() {
            return Ok(Some(ReadChunk::Data(std::mem::take(&mut st.data))));
        }
        if let Some(e) = st.error.take() {
            return Err(ReadError::Io(e));
        }
        if st.eof {
            return Ok(Some(ReadChunk::Eof));
        }
        Ok(None)
    }
}

#[async_trait]
impl PipeReader for ThreadedReader {
    async fn read(&mut self, timeout: Option<Duration>) -> Result<ReadChunk, ReadError> {
        let deadline = timeout.map(|limit| Instant::now() + limit);
        loop {
            // register for wakeup before checking, so a deposit between the
            // check and the await is not lost
            let notified = self.shared.notify.notified();
            if let Some(chunk) = self.take_buffered()? {
                return Ok(chunk);
            }
            match deadline {
                None => notified.await,
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(ReadChunk::Pending);
                    }
                    if tokio::time::timeout(deadline - now, notified).await.is_err() {
                        return Ok(ReadChunk::Pending);
                    }
                }
            }
        }
    }
}

/// Write end of the child's stdin, kept blocking: a full pipe buffer blocks
/// the caller until the child drains its input.
pub struct StdinWriter<W: Write + Send + Sync> {
    inner: W,
}

impl<W: Write + Send + Sync> StdinWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<W: Write + Send + Sync> PipeWriter for StdinWriter<W> {
    async fn write(&mut self, bytes: &[u8]) -> Result<usize, WriteError> {
        loop {
            match self.inner.write(bytes) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::BrokenPipe => return Err(WriteError::Closed),
                Err(e) => return Err(WriteError::Io(e)),
            }
        }
    }
}
