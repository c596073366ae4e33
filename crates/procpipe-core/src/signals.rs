use std::collections::HashMap;

/// The fixed symbolic signal names the registry enumerates.
///
/// Platforms resolve each name to its numeric value or mark it absent;
/// the list itself is the same everywhere.
pub const SIGNAL_NAMES: &[&str] = &[
    "SIGHUP", "SIGINT", "SIGQUIT", "SIGILL", "SIGABRT", "SIGFPE", "SIGKILL", "SIGSEGV", "SIGPIPE",
    "SIGALRM", "SIGTERM", "SIGUSR1", "SIGUSR2", "SIGCHLD", "SIGCONT", "SIGSTOP", "SIGTSTP",
    "SIGTTIN", "SIGTTOU", "SIGBUS", "SIGPROF", "SIGSYS", "SIGTRAP", "SIGURG", "SIGVTALRM",
    "SIGXCPU", "SIGXFSZ", "SIGWINCH",
];

/// Process-wide table of signal name to numeric value, with unsupported
/// signals marked absent. Built once at startup and immutable afterwards;
/// thread-safe by construction.
#[derive(Debug)]
pub struct SignalTable {
    values: HashMap<&'static str, Option<i32>>,
}

impl SignalTable {
    /// Enumerate [`SIGNAL_NAMES`] through a platform resolver.
    pub fn from_resolver(resolve: impl Fn(&str) -> Option<i32>) -> Self {
        let values = SIGNAL_NAMES
            .iter()
            .map(|name| (*name, resolve(name)))
            .collect();
        Self { values }
    }

    /// Numeric value of a signal, `None` when the signal is absent on this
    /// platform or the name is not in the registry at all.
    pub fn value(&self, name: &str) -> Option<i32> {
        self.values.get(name).copied().flatten()
    }

    /// Whether the name is part of the registry, supported or not.
    pub fn is_known(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Names resolved to a value on this platform.
    pub fn supported(&self) -> impl Iterator<Item = (&'static str, i32)> + '_ {
        self.values
            .iter()
            .filter_map(|(name, value)| value.map(|v| (*name, v)))
    }
}
