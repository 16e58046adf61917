// src/monitor.rs - Top-level facade wiring registry, ingestor, and ledger
use crate::config::Config;
use crate::error::Result;
use crate::evaluator::{decide, AlarmDecision, Severity};
use crate::ingest::{Reading, ReadingIngestor};
use crate::ledger::{Alarm, AlarmLedger};
use crate::registry::{Sensor, SensorRegistry, SensorSpec};
use crate::report::{AggregationReporter, FleetSummary, SensorStats};
use crate::storage::Repository;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Counters exposed by [`Monitor::stats`]
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStats {
    /// Registered sensors, active or not
    pub sensor_count: usize,
    /// Readings appended to history
    pub readings_accepted: u64,
    /// Readings rejected at validation or ordering checks
    pub readings_rejected: u64,
    /// Alarms opened since start
    pub alarms_opened: u64,
    /// Alarms resolved since start
    pub alarms_resolved: u64,
    /// Alarms currently open or acknowledged
    pub open_alarm_count: usize,
    /// Seconds since the monitor was created
    pub uptime_secs: u64,
}

/// In-process monitoring core
///
/// Owns the sensor registry, the reading history, and the alarm ledger, and
/// keeps the classify-then-ledger-update step atomic by serializing all
/// mutation per sensor id. Reads run concurrently against copy-on-read
/// snapshots. Cheap to clone; clones share state.
///
/// # Examples
///
/// ```rust
/// use sentra::{Config, Monitor};
///
/// let config = Config::from_yaml(r#"
/// sensors:
///   - id: "TEMP_01"
///     kind: temperature
///     unit: "°C"
///     min: 0.0
///     max: 100.0
///     warning: 75.0
///     critical: 90.0
/// "#)?;
/// let monitor = Monitor::from_config(&config)?;
///
/// monitor.ingest_reading("TEMP_01", 80.0, None)?;
/// assert_eq!(monitor.list_open_alarms(Some("TEMP_01")).len(), 1);
/// # Ok::<(), sentra::MonitorError>(())
/// ```
#[derive(Clone)]
pub struct Monitor {
    registry: SensorRegistry,
    ingestor: ReadingIngestor,
    ledger: AlarmLedger,
    reporter: AggregationReporter,
    sensor_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    repository: Option<Arc<dyn Repository>>,
    readings_accepted: Arc<AtomicU64>,
    readings_rejected: Arc<AtomicU64>,
    alarms_opened: Arc<AtomicU64>,
    alarms_resolved: Arc<AtomicU64>,
    started: Instant,
}

impl Monitor {
    /// Create an empty monitor
    pub fn new() -> Self {
        let registry = SensorRegistry::new();
        let ingestor = ReadingIngestor::new(registry.clone());
        let ledger = AlarmLedger::new();
        let reporter = AggregationReporter::new(ingestor.clone(), ledger.clone());
        Self {
            registry,
            ingestor,
            ledger,
            reporter,
            sensor_locks: Arc::new(DashMap::new()),
            repository: None,
            readings_accepted: Arc::new(AtomicU64::new(0)),
            readings_rejected: Arc::new(AtomicU64::new(0)),
            alarms_opened: Arc::new(AtomicU64::new(0)),
            alarms_resolved: Arc::new(AtomicU64::new(0)),
            started: Instant::now(),
        }
    }

    /// Create a monitor and register the configured fleet
    pub fn from_config(config: &Config) -> Result<Self> {
        let monitor = Self::new();
        for spec in &config.sensors {
            monitor.register_sensor(spec.clone())?;
        }
        info!("Monitor started with {} sensors", monitor.registry.len());
        Ok(monitor)
    }

    /// Attach a storage collaborator
    ///
    /// Accepted readings and alarm transitions are forwarded to it after the
    /// in-memory state has been updated. The in-memory core is authoritative:
    /// a repository failure is logged at `warn!` and does not fail the
    /// operation that triggered it.
    pub fn with_repository(mut self, repository: Arc<dyn Repository>) -> Self {
        self.repository = Some(repository);
        self
    }

    // --- Registration API ---

    /// Register a sensor
    pub fn register_sensor(&self, spec: SensorSpec) -> Result<Sensor> {
        self.registry.register(spec)
    }

    /// Deactivate a sensor; its history and alarms are kept
    pub fn deactivate_sensor(&self, sensor_id: &str) -> Result<()> {
        self.registry.deactivate(sensor_id)
    }

    /// Reactivate a previously deactivated sensor
    pub fn reactivate_sensor(&self, sensor_id: &str) -> Result<()> {
        self.registry.reactivate(sensor_id)
    }

    /// Replace a sensor's thresholds; history is not reclassified
    pub fn update_thresholds(&self, sensor_id: &str, warning: f64, critical: f64) -> Result<()> {
        self.registry.update_thresholds(sensor_id, warning, critical)
    }

    // --- Ingestion API ---

    /// Submit a raw value for a sensor
    ///
    /// Validates, stamps, and classifies the value, then applies the
    /// resulting alarm decision to the ledger. The whole step runs under
    /// the sensor's mutation lock, so two readings for the same sensor can
    /// never race to open two alarms. A failure in an attached repository
    /// is logged but does not undo or fail the accepted reading.
    pub fn ingest_reading(
        &self,
        sensor_id: &str,
        value: f64,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<Reading> {
        let lock = self.sensor_lock(sensor_id);
        let _guard = lock.lock();

        let reading = match self.ingestor.ingest(sensor_id, value, timestamp) {
            Ok(reading) => reading,
            Err(e) => {
                self.readings_rejected.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };
        self.readings_accepted.fetch_add(1, Ordering::Relaxed);

        let decision = decide(self.ledger.open_severity(sensor_id), reading.classification);
        let touched = self.ledger.apply(decision, sensor_id, &reading)?;
        match decision {
            AlarmDecision::Open(_) => {
                self.alarms_opened.fetch_add(1, Ordering::Relaxed);
            }
            AlarmDecision::Resolve => {
                self.alarms_resolved.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }

        if let Some(repo) = &self.repository {
            if let Err(e) = repo.save_reading(&reading) {
                warn!("Repository failed to save reading {}: {}", reading.id, e);
            }
            if let Some(alarm) = &touched {
                if let Err(e) = repo.save_alarm(alarm) {
                    warn!("Repository failed to save alarm {}: {}", alarm.id, e);
                }
            }
        }
        debug!(
            "Reading {} for {} accepted ({:?}, decision {:?})",
            reading.id, sensor_id, reading.classification, decision
        );
        Ok(reading)
    }

    /// Readings for a sensor, optionally windowed
    pub fn reading_history(
        &self,
        sensor_id: &str,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<Reading>> {
        Ok(self.ingestor.history(sensor_id, since, until)?.collect())
    }

    /// Most recent reading for a sensor
    pub fn last_reading(&self, sensor_id: &str) -> Option<Reading> {
        self.ingestor.last(sensor_id)
    }

    /// Drop readings older than the cutoff (idempotent retention hook)
    pub fn prune_readings(&self, sensor_id: &str, before: DateTime<Utc>) -> Result<usize> {
        let lock = self.sensor_lock(sensor_id);
        let _guard = lock.lock();
        self.ingestor.prune(sensor_id, before)
    }

    // --- Alarm API ---

    /// Acknowledge an alarm on behalf of an operator
    pub fn acknowledge_alarm(&self, alarm_id: u64, actor: &str) -> Result<Alarm> {
        let alarm = self.ledger.acknowledge(alarm_id, actor, None)?;
        if let Some(repo) = &self.repository {
            if let Err(e) = repo.save_alarm(&alarm) {
                warn!("Repository failed to save alarm {}: {}", alarm.id, e);
            }
        }
        Ok(alarm)
    }

    /// Alarms currently open or acknowledged
    pub fn list_open_alarms(&self, sensor_id: Option<&str>) -> Vec<Alarm> {
        self.ledger.open_alarms(sensor_id)
    }

    /// Full alarm history, including resolved alarms
    pub fn alarm_history(
        &self,
        sensor_id: Option<&str>,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Vec<Alarm> {
        self.ledger.history(sensor_id, since, until)
    }

    // --- Reporting API ---

    /// Per-sensor statistics over a reading window
    pub fn sensor_stats(
        &self,
        sensor_id: &str,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<SensorStats> {
        self.reporter.sensor_stats(sensor_id, since, until)
    }

    /// Fleet-wide alarm and availability rollup
    pub fn fleet_summary(&self, sensor_ids: Option<&[String]>) -> Result<FleetSummary> {
        self.reporter.fleet_summary(sensor_ids)
    }

    /// Alarm counts per severity in a window
    pub fn alarms_by_severity(
        &self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> HashMap<Severity, usize> {
        self.reporter.alarms_by_severity(since, until)
    }

    /// Runtime counters
    pub fn stats(&self) -> MonitorStats {
        MonitorStats {
            sensor_count: self.registry.len(),
            readings_accepted: self.readings_accepted.load(Ordering::Relaxed),
            readings_rejected: self.readings_rejected.load(Ordering::Relaxed),
            alarms_opened: self.alarms_opened.load(Ordering::Relaxed),
            alarms_resolved: self.alarms_resolved.load(Ordering::Relaxed),
            open_alarm_count: self.ledger.open_alarms(None).len(),
            uptime_secs: self.started.elapsed().as_secs(),
        }
    }

    /// The underlying registry, for collaborators that only need lookups
    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    fn sensor_lock(&self, sensor_id: &str) -> Arc<Mutex<()>> {
        self.sensor_locks
            .entry(sensor_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}
