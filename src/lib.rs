//! SENTRA - Sensor Engine for Thresholds, Rollups, and Alarms
//!
//! An in-process sensor monitoring core: register sensors with validity
//! ranges and two-level thresholds, ingest timestamped readings, classify
//! them, drive the alarm lifecycle (open, acknowledge, escalate, resolve),
//! and compute fleet rollups on demand.
//!
//! The crate performs no I/O of its own. Persistence is delegated to a
//! [`storage::Repository`] collaborator, and anything resembling a wire
//! protocol or a scheduler lives outside this core.
//!
//! # Examples
//!
//! ```rust
//! use sentra::{Config, Monitor};
//!
//! sentra::init();
//!
//! let config = Config::from_yaml(r#"
//! sensors:
//!   - id: "TEMP_01"
//!     kind: temperature
//!     unit: "°C"
//!     min: 0.0
//!     max: 100.0
//!     warning: 75.0
//!     critical: 90.0
//! "#)?;
//!
//! let monitor = Monitor::from_config(&config)?;
//! monitor.ingest_reading("TEMP_01", 95.0, None)?;
//!
//! let open = monitor.list_open_alarms(Some("TEMP_01"));
//! assert_eq!(open.len(), 1);
//! # Ok::<(), sentra::MonitorError>(())
//! ```

#![warn(missing_docs)]

/// Error handling with structured error types
pub mod error;

/// Sensor definitions and the fleet registry
pub mod registry;

/// Reading ingestion and per-sensor history
pub mod ingest;

/// Threshold classification and alarm decisions
pub mod evaluator;

/// Alarm lifecycle ledger
pub mod ledger;

/// Read-only rollups over readings and alarms
pub mod report;

/// Top-level monitoring facade
pub mod monitor;

/// Declarative fleet configuration with YAML support
pub mod config;

/// Persistence seam for storage collaborators
pub mod storage;

pub use config::Config;
pub use error::{MonitorError, Result};
pub use evaluator::{classify, decide, AlarmDecision, Classification, Severity};
pub use ingest::{Reading, ReadingIngestor};
pub use ledger::{Alarm, AlarmLedger, AlarmState};
pub use monitor::{Monitor, MonitorStats};
pub use registry::{Direction, Sensor, SensorKind, SensorRegistry, SensorSpec};
pub use report::{AggregationReporter, FleetSummary, SensorStats};
pub use storage::{MemoryRepository, Repository};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging for the monitoring core
///
/// Installs a `tracing-subscriber` registry honoring `RUST_LOG`. Safe to
/// call more than once; later calls are ignored. Embedding applications
/// that install their own subscriber can skip this entirely.
pub fn init() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_target(false));

    // Already-initialized is fine
    let _ = subscriber.try_init();
}
