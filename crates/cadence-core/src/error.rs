//! Error types for cadence scheduling.

use std::time::Duration;

/// A specialized Result type for cadence operations.
pub type Result<T> = std::result::Result<T, CadenceError>;

/// Errors raised by the scheduler, its tick drivers and configuration.
///
/// None of these ever escape [`CadenceScheduler::add`] or
/// [`CadenceScheduler::remove`]; those report and recover. They surface from
/// the lower-level driver API and from parsing/configuration.
///
/// [`CadenceScheduler::add`]: crate::CadenceScheduler::add
/// [`CadenceScheduler::remove`]: crate::CadenceScheduler::remove
#[derive(Debug, thiserror::Error)]
pub enum CadenceError {
    /// The background ticker thread could not be spawned.
    #[error("Failed to start ticker '{name}': {source}")]
    TickerStart {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The ticker was asked to start but refused (used by test drivers).
    #[error("Ticker refused to start: {0}")]
    TickerRefused(String),

    /// The ticker did not exit within the stop timeout. Its resources were
    /// released regardless.
    #[error("Ticker did not stop within {0:?}")]
    StopTimeout(Duration),

    /// The ticker thread panicked while running.
    #[error("Ticker thread panicked")]
    TickerPanicked,

    /// A cadence pattern string could not be parsed.
    #[error("Invalid cadence pattern '{0}'")]
    InvalidPattern(String),

    /// A phase outside `0..32` was supplied.
    #[error("Cadence phase {0} is out of range (0..32)")]
    InvalidPhase(u32),

    /// Configuration failed validation.
    #[error("Invalid cadence configuration: {0}")]
    InvalidConfig(String),
}

/// Failure reported by a cadenced element while handling a tick.
///
/// Any error evicts the element from the scheduler that delivered the tick.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ElementError {
    /// The element has been torn down and can no longer be updated.
    #[error("Element has been disposed")]
    Disposed,

    /// Any other update failure.
    #[error("Element update failed: {0}")]
    Failed(String),
}

impl ElementError {
    /// Convenience constructor for [`ElementError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
