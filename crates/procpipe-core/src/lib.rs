//! procpipe core - platform-independent abstractions and configuration
//!
//! This crate provides the process handle and pipe transport traits, the
//! process state machine, the error taxonomy, and the signal-table
//! scaffolding shared across platform-specific implementations.

mod config;
mod error;
mod lifecycle;
mod process;
pub mod registry;
mod signals;
mod transport;

pub use config::*;
pub use error::*;
pub use lifecycle::*;
pub use process::*;
pub use signals::*;
pub use transport::*;
