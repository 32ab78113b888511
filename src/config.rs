use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::utils::constants::{
    DEFAULT_ATTEMPTS, ENV_ATTEMPTS, ENV_FAITH_MS, ENV_PATIENCE_MS, FAITH_DEFAULT_MS,
    PATIENCE_DEFAULT_MS,
};


#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub faith_ms: u64,
    pub patience_ms: u64,
    pub attempts: u32,
}


// Store the process-wide worker config
pub static WORKER_CONFIG: OnceLock<WorkerConfig> = OnceLock::new();


impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            faith_ms: FAITH_DEFAULT_MS,
            patience_ms: PATIENCE_DEFAULT_MS,
            attempts: DEFAULT_ATTEMPTS,
        }
    }
}

impl WorkerConfig {
    pub fn new(faith_ms: u64, patience_ms: u64, attempts: u32) -> Self {
        Self {
            faith_ms,
            patience_ms,
            attempts,
        }
    }

    /// Builds a config from `SERIAL_WORKER_*` variables, keeping defaults for
    /// the ones that are not set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_FAITH_MS) {
            config.faith_ms = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_FAITH_MS} must be a number of milliseconds, got {raw:?}"))?;
        }
        if let Some(raw) = lookup(ENV_PATIENCE_MS) {
            config.patience_ms = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_PATIENCE_MS} must be a number of milliseconds, got {raw:?}"))?;
        }
        if let Some(raw) = lookup(ENV_ATTEMPTS) {
            config.attempts = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_ATTEMPTS} must be a positive integer, got {raw:?}"))?;
        }

        config.validate()?;
        debug!(?config, "Worker config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.attempts == 0 {
            return Err(anyhow!("attempts must be at least 1"));
        }
        Ok(())
    }

    pub fn faith(&self) -> Duration {
        Duration::from_millis(self.faith_ms)
    }

    pub fn patience(&self) -> Duration {
        Duration::from_millis(self.patience_ms)
    }
}



/// Active config, or the built-in defaults when none was installed.
pub fn get_worker_config() -> WorkerConfig {
    WORKER_CONFIG.get().cloned().unwrap_or_default()
}

pub fn set_worker_config(config: WorkerConfig) -> Result<()> {
    config.validate()?;
    info!(
        faith_ms = config.faith_ms,
        patience_ms = config.patience_ms,
        attempts = config.attempts,
        "Worker config installed"
    );
    WORKER_CONFIG
        .set(config)
        .map_err(|_| anyhow!("Worker config already set"))
}
