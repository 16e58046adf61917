// src/storage.rs - Persistence seam
//
// The core performs no I/O of its own. Collaborators that want durability
// attach a Repository; any backend satisfying these three operations is
// acceptable, no SQL or schema is mandated.

use crate::error::Result;
use crate::ingest::Reading;
use crate::ledger::Alarm;
use crate::registry::Sensor;
use parking_lot::RwLock;

/// Storage collaborator interface
///
/// `Monitor` forwards every accepted reading and every alarm transition to
/// the attached repository after the in-memory state has been updated.
pub trait Repository: Send + Sync {
    /// Persist an accepted reading
    fn save_reading(&self, reading: &Reading) -> Result<()>;

    /// Persist an alarm after a lifecycle change
    fn save_alarm(&self, alarm: &Alarm) -> Result<()>;

    /// Load a sensor definition, if the backend has one
    fn load_sensor(&self, sensor_id: &str) -> Result<Option<Sensor>>;
}

/// In-memory repository, mainly for tests and examples
#[derive(Debug, Default)]
pub struct MemoryRepository {
    readings: RwLock<Vec<Reading>>,
    alarms: RwLock<Vec<Alarm>>,
    sensors: RwLock<Vec<Sensor>>,
}

impl MemoryRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a sensor definition for later `load_sensor` calls
    pub fn put_sensor(&self, sensor: Sensor) {
        self.sensors.write().push(sensor);
    }

    /// Number of readings saved so far
    pub fn reading_count(&self) -> usize {
        self.readings.read().len()
    }

    /// Number of alarm saves so far (one per lifecycle change)
    pub fn alarm_saves(&self) -> usize {
        self.alarms.read().len()
    }
}

impl Repository for MemoryRepository {
    fn save_reading(&self, reading: &Reading) -> Result<()> {
        self.readings.write().push(reading.clone());
        Ok(())
    }

    fn save_alarm(&self, alarm: &Alarm) -> Result<()> {
        self.alarms.write().push(alarm.clone());
        Ok(())
    }

    fn load_sensor(&self, sensor_id: &str) -> Result<Option<Sensor>> {
        Ok(self
            .sensors
            .read()
            .iter()
            .find(|s| s.id == sensor_id)
            .cloned())
    }
}
