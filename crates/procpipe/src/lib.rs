//! procpipe - cross-platform child process lifecycle and stdio transport.
//!
//! Spawn a child process, read and write its three standard streams with
//! timeout semantics, track its run state, and terminate it cooperatively or
//! forcibly. The platform-appropriate backend (non-blocking pipes on POSIX,
//! reader threads where anonymous pipes only block) is selected at compile
//! time; callers only see the traits from `procpipe-core`.
//!
//! ```no_run
//! use procpipe::{ChildHandle, SpawnConfig, StdStream};
//! use std::time::Duration;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = SpawnConfig::builder().program("cat").build()?;
//! let mut child = procpipe::spawn(&config).await?;
//!
//! child.write_stdin(b"hello\n").await?;
//! let chunk = child
//!     .read(StdStream::Stdout, Some(Duration::from_secs(1)))
//!     .await?;
//! println!("{:?}", chunk);
//!
//! child.terminate().await?;
//! child.wait(Some(Duration::from_secs(1))).await?;
//! # Ok(())
//! # }
//! ```

mod platform;

pub use platform::*;

// Re-export core functionality
pub use procpipe_core::*;
