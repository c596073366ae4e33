use async_trait::async_trait;
use procpipe_core::{PipeReader, PipeWriter, PollBudget, ReadChunk, ReadError, WriteError};
use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::os::fd::{AsRawFd, OwnedFd};
use std::time::Duration;

/// Flip a pipe descriptor into non-blocking mode for polled reads.
///
/// Safety: fcntl with F_GETFL/F_SETFL on an owned, open descriptor.
pub(crate) fn set_nonblocking(fd: &OwnedFd) -> std::io::Result<()> {
    let flags = unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_GETFL) };
    if flags < 0 {
        return Err(std::io::Error::last_os_error());
    }
    let ret = unsafe { libc::fcntl(fd.as_raw_fd(), libc::F_SETFL, flags | libc::O_NONBLOCK) };
    if ret < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

/// Read end of a child stream, descriptor in `O_NONBLOCK` mode.
///
/// A read that finds no data sleeps in bounded increments instead of issuing
/// an indefinite blocking syscall, so finite timeouts are honored precisely.
/// Once the peer closes and the pipe drains, every further read reports
/// [`ReadChunk::Eof`].
pub struct NonBlockingReader {
    file: File,
    poll_interval: Duration,
    chunk_size: usize,
    eof: bool,
}

impl NonBlockingReader {
    pub fn new(fd: OwnedFd, poll_interval: Duration, chunk_size: usize) -> Self {
        Self {
            file: File::from(fd),
            poll_interval,
            chunk_size,
            eof: false,
        }
    }

    /// One poll of the descriptor. `None` means no data yet.
    fn try_read(&mut self) -> Result<Option<ReadChunk>, ReadError> {
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            match self.file.read(&mut buf) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(Some(ReadChunk::Eof));
                }
                Ok(n) => {
                    buf.truncate(n);
                    return Ok(Some(ReadChunk::Data(buf)));
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(None),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ReadError::Io(e)),
            }
        }
    }
}

#[async_trait]
impl PipeReader for NonBlockingReader {
    async fn read(&mut self, timeout: Option<Duration>) -> Result<ReadChunk, ReadError> {
        if self.eof {
            return Ok(ReadChunk::Eof);
        }
        let budget = PollBudget::new(timeout, self.poll_interval);
        loop {
            if let Some(chunk) = self.try_read()? {
                return Ok(chunk);
            }
            if !budget.sleep().await {
                return Ok(ReadChunk::Pending);
            }
        }
    }
}

/// Write end of the child's stdin.
///
/// Left in blocking mode on purpose: a full pipe buffer blocks the caller
/// until the child drains its input, per normal pipe back-pressure.
pub struct BlockingWriter {
    file: File,
}

impl BlockingWriter {
    pub fn new(fd: OwnedFd) -> Self {
        Self {
            file: File::from(fd),
        }
    }
}

#[async_trait]
impl PipeWriter for BlockingWriter {
    async fn write(&mut self, bytes: &[u8]) -> Result<usize, WriteError> {
        loop {
            match self.file.write(bytes) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::BrokenPipe => return Err(WriteError::Closed),
                Err(e) => return Err(WriteError::Io(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn pipe_pair() -> (OwnedFd, OwnedFd) {
        let (read, write) = std::io::pipe().expect("failed to create pipe");
        (read.into(), write.into())
    }

    fn reader(fd: OwnedFd) -> NonBlockingReader {
        set_nonblocking(&fd).unwrap();
        NonBlockingReader::new(fd, Duration::from_millis(2), 8192)
    }

    #[tokio::test]
    async fn delivers_written_bytes_in_order() {
        let (rx, tx) = pipe_pair();
        let mut writer = BlockingWriter::new(tx);
        let mut reader = reader(rx);

        assert_eq!(writer.write(b"hello ").await.unwrap(), 6);
        assert_eq!(writer.write(b"world").await.unwrap(), 5);

        let chunk = reader.read(Some(Duration::from_millis(500))).await.unwrap();
        assert_eq!(chunk, ReadChunk::Data(b"hello world".to_vec()));
    }

    #[tokio::test]
    async fn zero_timeout_read_returns_pending_immediately() {
        let (rx, _tx) = pipe_pair();
        let mut reader = reader(rx);

        let start = Instant::now();
        let chunk = reader.read(Some(Duration::ZERO)).await.unwrap();
        assert_eq!(chunk, ReadChunk::Pending);
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn finite_timeout_read_returns_pending_after_deadline() {
        let (rx, _tx) = pipe_pair();
        let mut reader = reader(rx);

        let start = Instant::now();
        let chunk = reader.read(Some(Duration::from_millis(30))).await.unwrap();
        assert_eq!(chunk, ReadChunk::Pending);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn closed_peer_reports_persistent_eof() {
        let (rx, tx) = pipe_pair();
        let mut writer = BlockingWriter::new(tx);
        let mut reader = reader(rx);

        writer.write(b"last").await.unwrap();
        drop(writer);

        // buffered bytes drain before EOF is reported
        let chunk = reader.read(Some(Duration::from_millis(500))).await.unwrap();
        assert_eq!(chunk, ReadChunk::Data(b"last".to_vec()));

        let eof = reader.read(Some(Duration::from_millis(500))).await.unwrap();
        assert_eq!(eof, ReadChunk::Eof);

        // EOF is an ordinary value and it sticks
        let again = reader.read(Some(Duration::ZERO)).await.unwrap();
        assert_eq!(again, ReadChunk::Eof);
    }

    #[tokio::test]
    async fn write_to_closed_reader_reports_closed() {
        let (rx, tx) = pipe_pair();
        drop(rx);
        let mut writer = BlockingWriter::new(tx);

        let err = writer.write(b"nobody listening").await.unwrap_err();
        assert!(matches!(err, WriteError::Closed));
    }
}
