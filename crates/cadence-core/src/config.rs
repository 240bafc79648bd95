//! Scheduler configuration.

use std::time::Duration;

use crate::error::{CadenceError, Result};

/// Default tick period. A full 32-phase cycle lasts four seconds.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(125);

/// Default bound on how long stopping waits for the ticker to exit.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_millis(200);

/// Default name for the ticker thread.
pub const DEFAULT_THREAD_NAME: &str = "cadence-ticker";

/// Configuration for a [`CadenceScheduler`](crate::CadenceScheduler).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CadenceConfig {
    /// Time between ticks.
    pub tick_interval: Duration,
    /// How long stopping waits for the ticker to exit before giving up.
    pub stop_timeout: Duration,
    /// Name for the ticker thread.
    pub thread_name: String,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

impl CadenceConfig {
    /// Start building a configuration from the defaults.
    pub fn builder() -> CadenceConfigBuilder {
        CadenceConfigBuilder::new()
    }

    /// Check the configuration for values the ticker cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval.is_zero() {
            return Err(CadenceError::InvalidConfig(
                "tick interval must be greater than zero".into(),
            ));
        }
        if self.thread_name.is_empty() {
            return Err(CadenceError::InvalidConfig(
                "thread name must not be empty".into(),
            ));
        }
        if self.thread_name.contains('\0') {
            return Err(CadenceError::InvalidConfig(
                "thread name must not contain NUL bytes".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`CadenceConfig`].
#[derive(Debug, Default)]
pub struct CadenceConfigBuilder {
    config: CadenceConfig,
}

impl CadenceConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tick period.
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.config.tick_interval = interval;
        self
    }

    /// Set the stop timeout.
    pub fn stop_timeout(mut self, timeout: Duration) -> Self {
        self.config.stop_timeout = timeout;
        self
    }

    /// Set the ticker thread name.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<CadenceConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
