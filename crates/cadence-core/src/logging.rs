//! Logging targets for cadence scheduling.
//!
//! The crate logs through `tracing` and never installs a subscriber. Hosts
//! that want the output install one themselves:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("cadence_core::scheduler=debug")
//!     .init();
//! ```
//!
//! Levels used:
//!
//! - `trace`: every tick, and dead elements evicted during a tick
//! - `debug`: ticker start/stop and registrations
//! - `warn`: duplicate registrations, ticker stop timeouts
//! - `error`: element update failures, ticker start failures

/// Target names for log filtering.
pub mod targets {
    /// Crate-wide target.
    pub const CORE: &str = "cadence_core";
    /// Registry and tick processing.
    pub const SCHEDULER: &str = "cadence_core::scheduler";
    /// Tick drivers.
    pub const TICKER: &str = "cadence_core::ticker";
}
