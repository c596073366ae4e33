use nix::sys::signal::Signal;
use std::str::FromStr;

/// Resolve a symbolic name to the platform's signal, if defined here.
pub(crate) fn parse(name: &str) -> Option<Signal> {
    Signal::from_str(name).ok()
}

/// Numeric signal value for the process-wide signal table; `None` marks the
/// name absent on this platform.
pub fn resolve_signal(name: &str) -> Option<i32> {
    parse(name).map(|sig| sig as i32)
}
