// src/registry.rs - Sensor definitions and the fleet registry
use crate::error::{MonitorError, Result};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Kind of physical quantity a sensor measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    /// Temperature probe
    Temperature,
    /// Pressure transmitter
    Pressure,
    /// Tank or vessel level
    Level,
    /// Flow meter
    Flow,
    /// Vibration pickup
    Vibration,
    /// Anything else
    Other,
}

/// Direction in which a sensor's thresholds fire
///
/// `Above` sensors alarm when the value rises past the thresholds
/// (high / high-high in ISA terms), `Below` sensors mirror that for
/// falling values (low / low-low).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Alarm when the value rises past the thresholds
    Above,
    /// Alarm when the value falls past the thresholds
    Below,
}

/// Declarative sensor definition, as it appears in the YAML fleet config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSpec {
    /// Unique sensor identifier
    pub id: String,

    /// Measured quantity
    #[serde(default = "default_kind")]
    pub kind: SensorKind,

    /// Engineering units
    pub unit: String,

    /// Lower bound of the valid measurement range
    pub min: f64,

    /// Upper bound of the valid measurement range
    pub max: f64,

    /// Warning threshold
    pub warning: f64,

    /// Critical threshold, beyond the warning one in the configured direction
    pub critical: f64,

    /// Threshold direction
    #[serde(default = "default_direction")]
    pub direction: Direction,
}

fn default_kind() -> SensorKind {
    SensorKind::Other
}

fn default_direction() -> Direction {
    Direction::Above
}

/// A registered sensor
///
/// Created by [`SensorRegistry::register`], mutated only through explicit
/// reconfiguration. Deactivation is a flag flip; historical readings and
/// alarms for a deactivated sensor are preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    /// Unique sensor identifier
    pub id: String,
    /// Measured quantity
    pub kind: SensorKind,
    /// Engineering units
    pub unit: String,
    /// Lower bound of the valid measurement range
    pub min: f64,
    /// Upper bound of the valid measurement range
    pub max: f64,
    /// Warning threshold
    pub warning: f64,
    /// Critical threshold
    pub critical: f64,
    /// Threshold direction
    pub direction: Direction,
    /// Soft-delete flag; inactive sensors reject new readings
    pub active: bool,
}

impl Sensor {
    fn from_spec(spec: SensorSpec) -> Self {
        Self {
            id: spec.id,
            kind: spec.kind,
            unit: spec.unit,
            min: spec.min,
            max: spec.max,
            warning: spec.warning,
            critical: spec.critical,
            direction: spec.direction,
            active: true,
        }
    }
}

/// Thread-safe registry of sensor configurations
///
/// The registry is the single source of truth for the fleet. It is cheap to
/// clone and safe to share between threads.
///
/// # Examples
///
/// ```rust
/// use sentra::{SensorRegistry, SensorSpec, SensorKind, Direction};
///
/// let registry = SensorRegistry::new();
/// registry.register(SensorSpec {
///     id: "TEMP_01".into(),
///     kind: SensorKind::Temperature,
///     unit: "°C".into(),
///     min: 0.0,
///     max: 100.0,
///     warning: 75.0,
///     critical: 90.0,
///     direction: Direction::Above,
/// })?;
///
/// let sensor = registry.get("TEMP_01")?;
/// assert_eq!(sensor.warning, 75.0);
/// # Ok::<(), sentra::MonitorError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SensorRegistry {
    sensors: Arc<DashMap<String, Sensor>>,
}

impl SensorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            sensors: Arc::new(DashMap::new()),
        }
    }

    /// Register a new sensor
    ///
    /// Fails with [`MonitorError::Validation`] if the id is already taken,
    /// the range is empty, or the thresholds are not strictly ordered from
    /// the center of the range outward in the configured direction.
    pub fn register(&self, spec: SensorSpec) -> Result<Sensor> {
        validate_spec(&spec)?;

        if self.sensors.contains_key(&spec.id) {
            return Err(MonitorError::Validation(format!(
                "sensor '{}' is already registered",
                spec.id
            )));
        }

        let sensor = Sensor::from_spec(spec);
        info!(
            "Registered sensor {} ({:?}, {} .. {} {}, warn {} crit {} {:?})",
            sensor.id,
            sensor.kind,
            sensor.min,
            sensor.max,
            sensor.unit,
            sensor.warning,
            sensor.critical,
            sensor.direction
        );
        self.sensors.insert(sensor.id.clone(), sensor.clone());
        Ok(sensor)
    }

    /// Get an active sensor
    ///
    /// Fails with [`MonitorError::SensorNotFound`] if the sensor is absent
    /// or deactivated. Callers that need deactivated sensors use
    /// [`SensorRegistry::get_any`].
    pub fn get(&self, sensor_id: &str) -> Result<Sensor> {
        match self.sensors.get(sensor_id) {
            Some(entry) if entry.active => Ok(entry.clone()),
            _ => Err(MonitorError::SensorNotFound(sensor_id.to_string())),
        }
    }

    /// Get a sensor regardless of its active flag
    pub fn get_any(&self, sensor_id: &str) -> Result<Sensor> {
        self.sensors
            .get(sensor_id)
            .map(|entry| entry.clone())
            .ok_or_else(|| MonitorError::SensorNotFound(sensor_id.to_string()))
    }

    /// Deactivate a sensor (idempotent)
    ///
    /// Readings and alarms already recorded for the sensor are kept; only
    /// new ingestion is rejected while inactive.
    pub fn deactivate(&self, sensor_id: &str) -> Result<()> {
        self.set_active(sensor_id, false)
    }

    /// Reactivate a sensor (idempotent)
    pub fn reactivate(&self, sensor_id: &str) -> Result<()> {
        self.set_active(sensor_id, true)
    }

    fn set_active(&self, sensor_id: &str, active: bool) -> Result<()> {
        let mut entry = self
            .sensors
            .get_mut(sensor_id)
            .ok_or_else(|| MonitorError::SensorNotFound(sensor_id.to_string()))?;
        if entry.active != active {
            entry.active = active;
            debug!("Sensor {} active = {}", sensor_id, active);
        }
        Ok(())
    }

    /// Replace a sensor's thresholds
    ///
    /// Re-validates the ordering against the stored range and direction.
    /// Existing readings are not reclassified; history reflects the
    /// thresholds in force at ingestion time.
    pub fn update_thresholds(&self, sensor_id: &str, warning: f64, critical: f64) -> Result<()> {
        let mut entry = self
            .sensors
            .get_mut(sensor_id)
            .ok_or_else(|| MonitorError::SensorNotFound(sensor_id.to_string()))?;

        let candidate = SensorSpec {
            id: entry.id.clone(),
            kind: entry.kind,
            unit: entry.unit.clone(),
            min: entry.min,
            max: entry.max,
            warning,
            critical,
            direction: entry.direction,
        };
        validate_spec(&candidate)?;

        entry.warning = warning;
        entry.critical = critical;
        info!(
            "Updated thresholds for {}: warn {} crit {}",
            sensor_id, warning, critical
        );
        Ok(())
    }

    /// Check if a sensor id is registered (active or not)
    pub fn exists(&self, sensor_id: &str) -> bool {
        self.sensors.contains_key(sensor_id)
    }

    /// All registered sensor ids
    pub fn ids(&self) -> Vec<String> {
        self.sensors.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of registered sensors
    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}

impl Default for SensorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_spec(spec: &SensorSpec) -> Result<()> {
    if spec.id.trim().is_empty() {
        return Err(MonitorError::Validation("sensor id must not be empty".into()));
    }
    for (name, v) in [
        ("min", spec.min),
        ("max", spec.max),
        ("warning", spec.warning),
        ("critical", spec.critical),
    ] {
        if !v.is_finite() {
            return Err(MonitorError::Validation(format!(
                "sensor '{}': {} must be finite, got {}",
                spec.id, name, v
            )));
        }
    }
    if spec.min >= spec.max {
        return Err(MonitorError::Validation(format!(
            "sensor '{}': min {} must be below max {}",
            spec.id, spec.min, spec.max
        )));
    }

    // Thresholds must step outward from the center of the range. The critical
    // threshold may sit past the range boundary (a never-fires setpoint) but
    // never on the wrong side of the warning one.
    let ordered = match spec.direction {
        Direction::Above => {
            spec.min < spec.warning && spec.warning < spec.max && spec.warning < spec.critical
        }
        Direction::Below => {
            spec.max > spec.warning && spec.warning > spec.min && spec.warning > spec.critical
        }
    };
    if !ordered {
        return Err(MonitorError::Validation(format!(
            "sensor '{}': thresholds warn {} / crit {} are not ordered for direction {:?} in range {} .. {}",
            spec.id, spec.warning, spec.critical, spec.direction, spec.min, spec.max
        )));
    }
    Ok(())
}
