// src/ingest.rs - Reading ingestion and per-sensor history
use crate::error::{MonitorError, Result};
use crate::evaluator::{classify, Classification};
use crate::registry::SensorRegistry;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// One timestamped value from a sensor
///
/// Readings are append-only. The classification is computed against the
/// thresholds in force at ingestion time and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Ingestion-order identifier
    pub id: u64,
    /// Sensor this reading came from
    pub sensor_id: String,
    /// Raw measured value
    pub value: f64,
    /// Server-assigned unless the caller supplied one
    pub timestamp: DateTime<Utc>,
    /// Severity bucket at ingestion time, immutable afterwards
    pub classification: Classification,
}

/// Accepts raw values, stamps and classifies them, and appends them to an
/// append-only per-sensor history
///
/// The ingestor shares the [`SensorRegistry`] it was built with; lookups and
/// range checks go through it. Callers that need the
/// classification-then-ledger step to be atomic serialize access per sensor
/// (see `Monitor`), the ingestor itself only guards its own collections.
#[derive(Debug, Clone)]
pub struct ReadingIngestor {
    registry: SensorRegistry,
    histories: Arc<DashMap<String, RwLock<Vec<Reading>>>>,
    next_id: Arc<AtomicU64>,
}

impl ReadingIngestor {
    /// Create an ingestor backed by the given registry
    pub fn new(registry: SensorRegistry) -> Self {
        Self {
            registry,
            histories: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Validate, stamp, classify, and append a raw value
    ///
    /// Unknown or deactivated sensors reject the reading with
    /// [`MonitorError::SensorNotFound`]; NaN and infinite values with
    /// [`MonitorError::Validation`]. An explicit timestamp strictly earlier
    /// than the sensor's last recorded one is rejected with
    /// [`MonitorError::Ordering`] and leaves the history untouched;
    /// out-of-order readings are rejected, not reordered.
    pub fn ingest(
        &self,
        sensor_id: &str,
        value: f64,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<Reading> {
        let sensor = self.registry.get(sensor_id)?;

        if !value.is_finite() {
            return Err(MonitorError::Validation(format!(
                "sensor '{}': reading value must be finite, got {}",
                sensor_id, value
            )));
        }

        let timestamp = timestamp.unwrap_or_else(Utc::now);

        let history = self
            .histories
            .entry(sensor_id.to_string())
            .or_insert_with(|| RwLock::new(Vec::new()));
        let mut history = history.write();

        if let Some(last) = history.last() {
            if timestamp < last.timestamp {
                return Err(MonitorError::Ordering {
                    sensor_id: sensor_id.to_string(),
                    timestamp,
                    last: last.timestamp,
                });
            }
        }

        let reading = Reading {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            sensor_id: sensor_id.to_string(),
            value,
            timestamp,
            classification: classify(&sensor, value),
        };
        trace!(
            "Ingested {} = {} {} ({:?})",
            sensor_id,
            value,
            sensor.unit,
            reading.classification
        );
        history.push(reading.clone());
        Ok(reading)
    }

    /// Readings for a sensor in ingestion order, optionally windowed
    ///
    /// Returns a snapshot iterator, so callers can walk history while other
    /// sensors keep ingesting. Deactivated sensors still report their
    /// history; only sensors that were never registered fail.
    pub fn history(
        &self,
        sensor_id: &str,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<impl Iterator<Item = Reading>> {
        if !self.registry.exists(sensor_id) {
            return Err(MonitorError::SensorNotFound(sensor_id.to_string()));
        }
        let snapshot: Vec<Reading> = self
            .histories
            .get(sensor_id)
            .map(|entry| entry.read().clone())
            .unwrap_or_default();
        Ok(snapshot.into_iter().filter(move |r| {
            since.map_or(true, |s| r.timestamp >= s) && until.map_or(true, |u| r.timestamp <= u)
        }))
    }

    /// Most recent reading for a sensor, if any
    pub fn last(&self, sensor_id: &str) -> Option<Reading> {
        self.histories
            .get(sensor_id)
            .and_then(|entry| entry.read().last().cloned())
    }

    /// Drop readings strictly older than the cutoff
    ///
    /// Explicit retention operation; idempotent, a second call with the same
    /// cutoff removes nothing. Returns the number of readings removed.
    pub fn prune(&self, sensor_id: &str, before: DateTime<Utc>) -> Result<usize> {
        if !self.registry.exists(sensor_id) {
            return Err(MonitorError::SensorNotFound(sensor_id.to_string()));
        }
        let removed = match self.histories.get(sensor_id) {
            Some(entry) => {
                let mut history = entry.write();
                let len_before = history.len();
                history.retain(|r| r.timestamp >= before);
                len_before - history.len()
            }
            None => 0,
        };
        if removed > 0 {
            debug!("Pruned {} readings for {} before {}", removed, sensor_id, before);
        }
        Ok(removed)
    }

    /// The registry this ingestor was built with
    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }
}
