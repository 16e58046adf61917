// src/evaluator.rs - Threshold classification and alarm decisions
//
// Everything in this module is a pure function: the monitor decides what to
// do with a reading here, and the ledger executes that decision.

use crate::registry::{Direction, Sensor};
use serde::{Deserialize, Serialize};

/// Severity bucket assigned to a single reading at ingestion time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Inside the normal operating band
    Normal,
    /// Past the warning threshold
    Warning,
    /// Past the critical threshold
    Critical,
}

/// Severity of an alarm
///
/// Ordered so that `Warning < Critical`; the ledger relies on this ordering
/// to keep escalation monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Operator attention required
    Warning,
    /// Immediate operator action required
    Critical,
}

impl Severity {
    /// The classification bucket this severity corresponds to
    pub fn classification(self) -> Classification {
        match self {
            Severity::Warning => Classification::Warning,
            Severity::Critical => Classification::Critical,
        }
    }
}

/// What the ledger should do with a freshly classified reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmDecision {
    /// No ledger change
    None,
    /// Open a new alarm at the given severity
    Open(Severity),
    /// Raise the open alarm to the given severity
    Escalate(Severity),
    /// Close the open alarm
    Resolve,
}

/// Classify a value against a sensor's thresholds
///
/// Deterministic threshold comparison in the sensor's direction. The critical
/// threshold is checked first, so a value sitting exactly on a threshold
/// lands in the more severe bucket.
///
/// # Examples
///
/// ```rust
/// use sentra::{classify, Classification, Direction, SensorKind, Sensor};
///
/// let sensor = Sensor {
///     id: "TEMP_01".into(),
///     kind: SensorKind::Temperature,
///     unit: "°C".into(),
///     min: 0.0,
///     max: 100.0,
///     warning: 75.0,
///     critical: 90.0,
///     direction: Direction::Above,
///     active: true,
/// };
///
/// assert_eq!(classify(&sensor, 70.0), Classification::Normal);
/// assert_eq!(classify(&sensor, 75.0), Classification::Warning);
/// assert_eq!(classify(&sensor, 90.0), Classification::Critical);
/// ```
pub fn classify(sensor: &Sensor, value: f64) -> Classification {
    match sensor.direction {
        Direction::Above => {
            if value >= sensor.critical {
                Classification::Critical
            } else if value >= sensor.warning {
                Classification::Warning
            } else {
                Classification::Normal
            }
        }
        Direction::Below => {
            if value <= sensor.critical {
                Classification::Critical
            } else if value <= sensor.warning {
                Classification::Warning
            } else {
                Classification::Normal
            }
        }
    }
}

/// Decide how a classification affects the sensor's open alarm
///
/// `open` is the severity of the alarm currently occupying the sensor's
/// slot in the ledger, if any. Total function; returns
/// [`AlarmDecision::None`] whenever nothing has to change, so duplicate
/// alarms and de-escalations are impossible by construction.
pub fn decide(open: Option<Severity>, new: Classification) -> AlarmDecision {
    match (open, new) {
        (None, Classification::Warning) => AlarmDecision::Open(Severity::Warning),
        (None, Classification::Critical) => AlarmDecision::Open(Severity::Critical),
        (Some(_), Classification::Normal) => AlarmDecision::Resolve,
        (Some(Severity::Warning), Classification::Critical) => {
            AlarmDecision::Escalate(Severity::Critical)
        }
        // Equal severity, an already-critical alarm seeing a warning
        // reading, or normal with nothing open: leave the ledger alone.
        _ => AlarmDecision::None,
    }
}
