// src/report.rs - Read-only rollups over readings and alarms
use crate::error::{MonitorError, Result};
use crate::evaluator::{Classification, Severity};
use crate::ingest::ReadingIngestor;
use crate::ledger::{AlarmLedger, AlarmState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Per-sensor statistics over a reading window
///
/// A window with no readings yields `count == 0` and `None` extremes rather
/// than an error, so the reporter stays total; only a sensor id that was
/// never registered fails.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorStats {
    /// Sensor the window was computed for
    pub sensor_id: String,
    /// Readings in the window
    pub count: usize,
    /// Smallest value in the window
    pub min: Option<f64>,
    /// Largest value in the window
    pub max: Option<f64>,
    /// Arithmetic mean over the window
    pub mean: Option<f64>,
    /// Classification of the newest reading in the window
    pub last_classification: Option<Classification>,
}

/// Fleet-wide alarm and availability rollup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetSummary {
    /// Sensors considered
    pub sensors_total: usize,
    /// Alarms currently open and unacknowledged
    pub alarms_open: usize,
    /// Alarms currently open and acknowledged
    pub alarms_acked: usize,
    /// Alarms resolved over the fleet's lifetime
    pub alarms_resolved: usize,
    /// Share of sensors with no active critical alarm, one decimal
    pub availability_percent: f64,
}

/// Computes rollups on demand; never mutates the ingestor or the ledger
#[derive(Debug, Clone)]
pub struct AggregationReporter {
    ingestor: ReadingIngestor,
    ledger: AlarmLedger,
}

impl AggregationReporter {
    /// Build a reporter over the given ingestor and ledger
    pub fn new(ingestor: ReadingIngestor, ledger: AlarmLedger) -> Self {
        Self { ingestor, ledger }
    }

    /// Count / min / max / mean / last classification over a reading window
    pub fn sensor_stats(
        &self,
        sensor_id: &str,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<SensorStats> {
        let readings: Vec<_> = self.ingestor.history(sensor_id, since, until)?.collect();

        let mut min = None;
        let mut max = None;
        let mut sum = 0.0;
        for r in &readings {
            min = Some(min.map_or(r.value, |m: f64| m.min(r.value)));
            max = Some(max.map_or(r.value, |m: f64| m.max(r.value)));
            sum += r.value;
        }
        let count = readings.len();
        Ok(SensorStats {
            sensor_id: sensor_id.to_string(),
            count,
            min,
            max,
            mean: (count > 0).then(|| sum / count as f64),
            last_classification: readings.last().map(|r| r.classification),
        })
    }

    /// Alarm state counts and availability across the fleet
    ///
    /// When `sensor_ids` is given only those sensors are considered, both
    /// for the alarm counts and for availability; otherwise the whole
    /// registry is. Availability is the share of considered sensors with no
    /// active critical alarm, rounded to one decimal. An empty fleet reports
    /// 100.0.
    pub fn fleet_summary(&self, sensor_ids: Option<&[String]>) -> Result<FleetSummary> {
        let ids: Vec<String> = match sensor_ids {
            Some(ids) => {
                for id in ids {
                    if !self.ingestor.registry().exists(id) {
                        return Err(MonitorError::SensorNotFound(id.clone()));
                    }
                }
                ids.to_vec()
            }
            None => self.ingestor.registry().ids(),
        };

        let mut open = 0;
        let mut acked = 0;
        let mut resolved = 0;
        for id in &ids {
            for alarm in self.ledger.history(Some(id), None, None) {
                match alarm.state() {
                    AlarmState::Open => open += 1,
                    AlarmState::Acked => acked += 1,
                    AlarmState::Resolved => resolved += 1,
                }
            }
        }

        let healthy = ids
            .iter()
            .filter(|id| !self.ledger.has_active_critical(id))
            .count();
        let availability = if ids.is_empty() {
            100.0
        } else {
            round1(healthy as f64 / ids.len() as f64 * 100.0)
        };

        Ok(FleetSummary {
            sensors_total: ids.len(),
            alarms_open: open,
            alarms_acked: acked,
            alarms_resolved: resolved,
            availability_percent: availability,
        })
    }

    /// Alarm counts per severity over a window of `opened_at` timestamps
    ///
    /// The counts always total to the number of alarms in the window.
    pub fn alarms_by_severity(
        &self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> HashMap<Severity, usize> {
        let mut counts = HashMap::new();
        for alarm in self.ledger.history(None, since, until) {
            *counts.entry(alarm.severity).or_insert(0) += 1;
        }
        counts
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
