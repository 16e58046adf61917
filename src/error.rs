use chrono::{DateTime, Utc};
use thiserror::Error;

/// Application level error type used throughout the crate.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Bad input shape or value, surfaced immediately and never retried
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced sensor is absent or inactive
    #[error("Sensor not found: {0}")]
    SensorNotFound(String),

    /// Referenced alarm does not exist in the ledger
    #[error("Alarm not found: {0}")]
    AlarmNotFound(u64),

    /// Reading submitted with a timestamp earlier than the sensor's last one
    #[error("Out-of-order reading for sensor {sensor_id}: {timestamp} is before {last}")]
    Ordering {
        /// Sensor the reading was submitted for
        sensor_id: String,
        /// Rejected timestamp
        timestamp: DateTime<Utc>,
        /// Timestamp of the sensor's last accepted reading
        last: DateTime<Utc>,
    },

    /// Illegal lifecycle transition requested (e.g. acknowledging a resolved alarm)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Internal consistency bug, fatal for the offending operation
    #[error("Invariant violation: {0}")]
    Invariant(String),

    /// I/O related failure while loading configuration
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),

    /// Error while parsing YAML configuration files
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Convenient alias over [`Result`] using [`MonitorError`]
pub type Result<T> = std::result::Result<T, MonitorError>;
