//! Windows backend for procpipe.
//!
//! Anonymous pipes have no non-blocking mode here, so each readable stream
//! gets a dedicated reader thread that drains blocking reads into a
//! lock-protected buffer the control flow polls without blocking. Lifecycle
//! control uses the native forced-termination primitive; there is no
//! graceful signal, so terminate and kill coincide.

mod launcher;
mod pipe;
mod signals;

pub use launcher::{WindowsChild, WindowsLauncher};
pub use pipe::{StdinWriter, ThreadedReader};
pub use signals::resolve_signal;
