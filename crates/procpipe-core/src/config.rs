use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for spawning a child process.
///
/// Arguments are passed verbatim, no shell expansion. Environment entries
/// are overrides on top of the inherited environment.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into, strip_option))]
#[serde(rename_all = "camelCase")]
pub struct SpawnConfig {
    pub program: String,

    #[builder(default)]
    #[builder(setter(custom))]
    #[serde(default)]
    pub args: Vec<String>,

    #[builder(default)]
    #[builder(setter(custom))]
    #[serde(default)]
    pub env: HashMap<String, String>,

    #[builder(default)]
    #[serde(default)]
    pub working_directory: Option<PathBuf>,

    /// Sleep increment for non-blocking read and wait polling (in
    /// milliseconds)
    #[builder(default = "default_poll_interval_ms()")]
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Largest number of bytes moved per pipe read
    #[builder(default = "default_read_chunk_size()")]
    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,
}

impl SpawnConfig {
    pub fn builder() -> SpawnConfigBuilder {
        SpawnConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.program.is_empty() {
            return Err(anyhow::anyhow!("program must not be empty"));
        }

        if self.poll_interval_ms == 0 {
            return Err(anyhow::anyhow!("poll_interval_ms must be at least 1"));
        }

        if self.poll_interval_ms > 1_000 {
            return Err(anyhow::anyhow!(
                "poll_interval_ms above one second defeats timeout precision"
            ));
        }

        if self.read_chunk_size == 0 {
            return Err(anyhow::anyhow!("read_chunk_size must be at least 1"));
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl SpawnConfigBuilder {
    pub fn args<S: ToString, I: IntoIterator<Item = S>>(&mut self, iter: I) -> &mut Self {
        let args: Vec<String> = iter.into_iter().map(|s| s.to_string()).collect();
        self.args = Some(args);
        self
    }

    pub fn env<T: ToString>(&mut self, key: T, value: T) -> &mut Self {
        let map = self.env.get_or_insert_with(HashMap::new);
        map.insert(key.to_string(), value.to_string());

        self
    }

    pub fn env_multi<T: ToString, I: IntoIterator<Item = (T, T)>>(&mut self, iter: I) -> &mut Self {
        let env = self.env.get_or_insert_with(HashMap::new);
        for (key, value) in iter {
            env.insert(key.to_string(), value.to_string());
        }
        self
    }
}

// Default value functions for serde and the builder
fn default_poll_interval_ms() -> u64 {
    10
}
fn default_read_chunk_size() -> usize {
    8192
}
