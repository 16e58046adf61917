// src/ledger.rs - Alarm lifecycle ledger
//
// The ledger owns every alarm ever opened and enforces the
// at-most-one-open-alarm-per-sensor rule through a per-sensor slot that
// holds the id of the currently open alarm.

use crate::error::{MonitorError, Result};
use crate::evaluator::{AlarmDecision, Severity};
use crate::ingest::Reading;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Lifecycle state of an alarm, derived from its timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmState {
    /// Active, not yet acknowledged
    Open,
    /// Active and acknowledged by an operator
    Acked,
    /// Returned to normal; terminal
    Resolved,
}

/// A tracked period during which a sensor's readings exceeded a threshold
///
/// State machine: `Open --acknowledge--> Acked --resolve--> Resolved`, with
/// `Open --resolve--> Resolved` directly when nobody acknowledges. Escalation
/// is a severity-only self-loop on Open/Acked. Nothing leaves Resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    /// Ledger-assigned identifier
    pub id: u64,
    /// Sensor the alarm belongs to
    pub sensor_id: String,
    /// Reading that opened the alarm
    pub reading_id: u64,
    /// Current severity; only ever increases while active
    pub severity: Severity,
    /// Timestamp of the triggering reading
    pub opened_at: DateTime<Utc>,
    /// When the alarm was last escalated, if ever
    pub escalated_at: Option<DateTime<Utc>>,
    /// When an operator acknowledged the alarm
    pub acknowledged_at: Option<DateTime<Utc>>,
    /// Who acknowledged it
    pub acknowledged_by: Option<String>,
    /// When the sensor returned to normal
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Alarm {
    /// Current lifecycle state
    pub fn state(&self) -> AlarmState {
        if self.resolved_at.is_some() {
            AlarmState::Resolved
        } else if self.acknowledged_at.is_some() {
            AlarmState::Acked
        } else {
            AlarmState::Open
        }
    }

    /// Whether the alarm is still active (open or acknowledged)
    pub fn is_active(&self) -> bool {
        self.resolved_at.is_none()
    }
}

/// Owns the alarm lifecycle for the whole fleet
#[derive(Debug, Clone)]
pub struct AlarmLedger {
    alarms: Arc<RwLock<Vec<Alarm>>>,
    /// sensor id -> index of its currently open alarm in `alarms`
    open_slots: Arc<DashMap<String, usize>>,
    next_id: Arc<AtomicU64>,
}

impl AlarmLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self {
            alarms: Arc::new(RwLock::new(Vec::new())),
            open_slots: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Severity of the sensor's currently open alarm, if any
    pub fn open_severity(&self, sensor_id: &str) -> Option<Severity> {
        let idx = *self.open_slots.get(sensor_id)?;
        self.alarms.read().get(idx).map(|a| a.severity)
    }

    /// Execute an evaluator decision against the per-sensor open slot
    ///
    /// Returns the alarm the decision touched, or `None` for
    /// [`AlarmDecision::None`]. Escalate/Resolve with an empty slot is a
    /// caller ordering bug, reported as [`MonitorError::Invariant`] and
    /// logged at the highest severity.
    pub fn apply(
        &self,
        decision: AlarmDecision,
        sensor_id: &str,
        reading: &Reading,
    ) -> Result<Option<Alarm>> {
        match decision {
            AlarmDecision::None => Ok(None),
            AlarmDecision::Open(severity) => {
                if self.open_slots.contains_key(sensor_id) {
                    let msg = format!(
                        "open requested for sensor '{}' which already has an open alarm",
                        sensor_id
                    );
                    error!("{}", msg);
                    return Err(MonitorError::Invariant(msg));
                }
                let alarm = Alarm {
                    id: self.next_id.fetch_add(1, Ordering::Relaxed),
                    sensor_id: sensor_id.to_string(),
                    reading_id: reading.id,
                    severity,
                    opened_at: reading.timestamp,
                    escalated_at: None,
                    acknowledged_at: None,
                    acknowledged_by: None,
                    resolved_at: None,
                };
                let mut alarms = self.alarms.write();
                self.open_slots.insert(sensor_id.to_string(), alarms.len());
                alarms.push(alarm.clone());
                warn!(
                    "Alarm {} opened for {} at {:?} (value {})",
                    alarm.id, sensor_id, severity, reading.value
                );
                Ok(Some(alarm))
            }
            AlarmDecision::Escalate(severity) => {
                let idx = self.occupied_slot(sensor_id, "escalate")?;
                let mut alarms = self.alarms.write();
                let alarm = &mut alarms[idx];
                if severity <= alarm.severity {
                    let msg = format!(
                        "escalation of alarm {} for '{}' would lower severity {:?} -> {:?}",
                        alarm.id, sensor_id, alarm.severity, severity
                    );
                    error!("{}", msg);
                    return Err(MonitorError::Invariant(msg));
                }
                alarm.severity = severity;
                alarm.escalated_at = Some(reading.timestamp);
                warn!(
                    "Alarm {} for {} escalated to {:?} (value {})",
                    alarm.id, sensor_id, severity, reading.value
                );
                Ok(Some(alarm.clone()))
            }
            AlarmDecision::Resolve => {
                let idx = self.occupied_slot(sensor_id, "resolve")?;
                let mut alarms = self.alarms.write();
                let alarm = &mut alarms[idx];
                alarm.resolved_at = Some(reading.timestamp);
                self.open_slots.remove(sensor_id);
                info!("Alarm {} for {} resolved", alarm.id, sensor_id);
                Ok(Some(alarm.clone()))
            }
        }
    }

    fn occupied_slot(&self, sensor_id: &str, op: &str) -> Result<usize> {
        match self.open_slots.get(sensor_id) {
            Some(idx) => Ok(*idx),
            None => {
                let msg = format!("{} requested for sensor '{}' with no open alarm", op, sensor_id);
                error!("{}", msg);
                Err(MonitorError::Invariant(msg))
            }
        }
    }

    /// Acknowledge an alarm
    ///
    /// Acknowledging an already-acknowledged alarm is a no-op that returns
    /// the alarm unchanged; acknowledging a resolved one is an
    /// [`MonitorError::InvalidState`]. An explicit `at` earlier than the
    /// alarm's `opened_at` is rejected with [`MonitorError::Validation`],
    /// an alarm cannot be acknowledged before it existed.
    pub fn acknowledge(
        &self,
        alarm_id: u64,
        actor: &str,
        at: Option<DateTime<Utc>>,
    ) -> Result<Alarm> {
        let mut alarms = self.alarms.write();
        let alarm = alarms
            .iter_mut()
            .find(|a| a.id == alarm_id)
            .ok_or(MonitorError::AlarmNotFound(alarm_id))?;

        match alarm.state() {
            AlarmState::Resolved => Err(MonitorError::InvalidState(format!(
                "alarm {} for sensor '{}' is already resolved",
                alarm_id, alarm.sensor_id
            ))),
            AlarmState::Acked => Ok(alarm.clone()),
            AlarmState::Open => {
                let at = at.unwrap_or_else(Utc::now);
                if at < alarm.opened_at {
                    return Err(MonitorError::Validation(format!(
                        "acknowledgement time {} precedes alarm {} opened at {}",
                        at, alarm_id, alarm.opened_at
                    )));
                }
                alarm.acknowledged_at = Some(at);
                alarm.acknowledged_by = Some(actor.to_string());
                info!("Alarm {} acknowledged by {}", alarm_id, actor);
                Ok(alarm.clone())
            }
        }
    }

    /// Alarms currently in the Open or Acked state
    pub fn open_alarms(&self, sensor_id: Option<&str>) -> Vec<Alarm> {
        self.alarms
            .read()
            .iter()
            .filter(|a| a.is_active())
            .filter(|a| sensor_id.map_or(true, |id| a.sensor_id == id))
            .cloned()
            .collect()
    }

    /// Every alarm ever opened, including resolved ones
    ///
    /// The optional window filters on `opened_at`.
    pub fn history(
        &self,
        sensor_id: Option<&str>,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Vec<Alarm> {
        self.alarms
            .read()
            .iter()
            .filter(|a| sensor_id.map_or(true, |id| a.sensor_id == id))
            .filter(|a| since.map_or(true, |s| a.opened_at >= s))
            .filter(|a| until.map_or(true, |u| a.opened_at <= u))
            .cloned()
            .collect()
    }

    /// Whether the sensor currently has an active critical alarm
    pub fn has_active_critical(&self, sensor_id: &str) -> bool {
        self.open_severity(sensor_id) == Some(Severity::Critical)
    }
}

impl Default for AlarmLedger {
    fn default() -> Self {
        Self::new()
    }
}
