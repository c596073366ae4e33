use async_trait::async_trait;
use procpipe_core::{ChildHandle, ProcessLauncher, SignalTable, SpawnConfig, SpawnError};
use std::sync::OnceLock;
use tracing::info;

/// Platform-specific launcher implementations, selected at compile time.
pub enum PlatformLauncher {
    #[cfg(unix)]
    Unix(procpipe_unix::UnixLauncher),
    #[cfg(windows)]
    Windows(procpipe_windows::WindowsLauncher),
}

impl PlatformLauncher {
    pub fn new() -> Self {
        #[cfg(unix)]
        {
            info!("creating unix launcher");
            Self::Unix(procpipe_unix::UnixLauncher::new())
        }

        #[cfg(windows)]
        {
            info!("creating windows launcher");
            Self::Windows(procpipe_windows::WindowsLauncher::new())
        }

        #[cfg(not(any(unix, windows)))]
        {
            compile_error!("unsupported platform: only unix and windows are currently supported");
        }
    }

    pub fn platform_name() -> &'static str {
        #[cfg(unix)]
        return "unix";

        #[cfg(windows)]
        return "windows";
    }
}

impl Default for PlatformLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessLauncher for PlatformLauncher {
    type Handle = Box<dyn ChildHandle>;

    async fn spawn(&self, config: &SpawnConfig) -> Result<Box<dyn ChildHandle>, SpawnError> {
        match self {
            #[cfg(unix)]
            Self::Unix(launcher) => Ok(Box::new(launcher.spawn(config).await?)),
            #[cfg(windows)]
            Self::Windows(launcher) => Ok(Box::new(launcher.spawn(config).await?)),
        }
    }
}

/// Spawn a child through the platform launcher.
pub async fn spawn(config: &SpawnConfig) -> Result<Box<dyn ChildHandle>, SpawnError> {
    PlatformLauncher::new().spawn(config).await
}

static SIGNALS: OnceLock<SignalTable> = OnceLock::new();

/// Process-wide signal table: symbolic name to numeric value, unsupported
/// signals absent. Built once on first use, immutable afterwards.
pub fn signals() -> &'static SignalTable {
    SIGNALS.get_or_init(|| {
        #[cfg(unix)]
        return SignalTable::from_resolver(procpipe_unix::resolve_signal);

        #[cfg(windows)]
        return SignalTable::from_resolver(procpipe_windows::resolve_signal);
    })
}
