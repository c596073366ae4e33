use async_trait::async_trait;
use std::time::{Duration, Instant};

use crate::{ReadError, WriteError};

/// Result of a pipe read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadChunk {
    /// Bytes the child wrote, in write order. Never empty.
    Data(Vec<u8>),
    /// No data arrived within the timeout; the stream is still open.
    Pending,
    /// The peer end is closed and all buffered bytes have been drained.
    /// Returned persistently from then on.
    Eof,
}

impl ReadChunk {
    pub fn is_eof(&self) -> bool {
        matches!(self, ReadChunk::Eof)
    }

    /// The delivered bytes, empty for `Pending` and `Eof`.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            ReadChunk::Data(bytes) => bytes,
            ReadChunk::Pending | ReadChunk::Eof => Vec::new(),
        }
    }
}

/// Read end of a child's standard stream.
///
/// Timeout convention, shared by every implementation:
/// `Some(Duration::ZERO)` is a single non-blocking poll, `Some(d)` polls for
/// at most `d`, `None` blocks cooperatively until data or EOF.
#[async_trait]
pub trait PipeReader: Send + Sync {
    async fn read(&mut self, timeout: Option<Duration>) -> Result<ReadChunk, ReadError>;
}

/// Write end of a child's stdin.
///
/// Writes follow normal OS pipe back-pressure: a full pipe buffer blocks the
/// caller until the child drains its input.
#[async_trait]
pub trait PipeWriter: Send + Sync {
    async fn write(&mut self, bytes: &[u8]) -> Result<usize, WriteError>;
}

enum Deadline {
    Unbounded,
    At(Instant),
}

/// Slices a read/wait timeout into bounded sleep increments so a deadline is
/// honored without an indefinite blocking syscall.
pub struct PollBudget {
    deadline: Deadline,
    interval: Duration,
}

impl PollBudget {
    pub fn new(timeout: Option<Duration>, interval: Duration) -> Self {
        let deadline = match timeout {
            None => Deadline::Unbounded,
            Some(limit) => Deadline::At(Instant::now() + limit),
        };
        Self { deadline, interval }
    }

    /// Sleep one increment. Returns `false` without sleeping once the budget
    /// is spent; a zero timeout therefore allows exactly one poll attempt.
    pub async fn sleep(&self) -> bool {
        match self.deadline {
            Deadline::Unbounded => {
                tokio::time::sleep(self.interval).await;
                true
            }
            Deadline::At(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return false;
                }
                tokio::time::sleep((deadline - now).min(self.interval)).await;
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_bytes_accessors() {
        assert_eq!(ReadChunk::Data(b"ok".to_vec()).into_bytes(), b"ok");
        assert!(ReadChunk::Pending.into_bytes().is_empty());
        assert!(ReadChunk::Eof.is_eof());
        assert!(!ReadChunk::Pending.is_eof());
    }

    #[tokio::test]
    async fn zero_timeout_budget_allows_one_attempt() {
        let budget = PollBudget::new(Some(Duration::ZERO), Duration::from_millis(10));
        assert!(!budget.sleep().await);
    }

    #[tokio::test]
    async fn bounded_budget_expires() {
        let budget = PollBudget::new(Some(Duration::from_millis(30)), Duration::from_millis(5));
        let start = Instant::now();
        let mut slept = 0;
        while budget.sleep().await {
            slept += 1;
            assert!(slept < 1000, "budget never expired");
        }
        assert!(slept >= 1);
        assert!(start.elapsed() >= Duration::from_millis(30));
        // Bounded increments: the overshoot is at most one interval plus
        // scheduler noise, not a full extra timeout.
        assert!(start.elapsed() < Duration::from_millis(300));
    }

    #[tokio::test]
    async fn unbounded_budget_keeps_sleeping() {
        let budget = PollBudget::new(None, Duration::from_millis(1));
        assert!(budget.sleep().await);
        assert!(budget.sleep().await);
    }
}
