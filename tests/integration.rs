use chrono::{Duration, Utc};
use sentra::*;

const FLEET_YAML: &str = r#"
sensors:
  - id: "TEMP_01"
    kind: temperature
    unit: "°C"
    min: 0.0
    max: 100.0
    warning: 75.0
    critical: 90.0
    direction: above
  - id: "PRESS_01"
    kind: pressure
    unit: "bar"
    min: 0.0
    max: 10.0
    warning: 8.0
    critical: 9.5
    direction: above
  - id: "LVL_01"
    kind: level
    unit: "m"
    min: 0.0
    max: 10.0
    warning: 2.0
    critical: 0.5
    direction: below
"#;

fn fleet() -> Monitor {
    let config = Config::from_yaml(FLEET_YAML).unwrap();
    Monitor::from_config(&config).unwrap()
}

#[test]
fn temperature_alarm_lifecycle() {
    let monitor = fleet();

    let r = monitor.ingest_reading("TEMP_01", 70.0, None).unwrap();
    assert_eq!(r.classification, Classification::Normal);
    assert!(monitor.list_open_alarms(Some("TEMP_01")).is_empty());

    let r = monitor.ingest_reading("TEMP_01", 80.0, None).unwrap();
    assert_eq!(r.classification, Classification::Warning);
    let open = monitor.list_open_alarms(Some("TEMP_01"));
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].severity, Severity::Warning);
    assert_eq!(open[0].state(), AlarmState::Open);

    let r = monitor.ingest_reading("TEMP_01", 95.0, None).unwrap();
    assert_eq!(r.classification, Classification::Critical);
    let open = monitor.list_open_alarms(Some("TEMP_01"));
    assert_eq!(open.len(), 1, "escalation must not open a second alarm");
    assert_eq!(open[0].severity, Severity::Critical);
    assert!(open[0].escalated_at.is_some());

    let r = monitor.ingest_reading("TEMP_01", 60.0, None).unwrap();
    assert_eq!(r.classification, Classification::Normal);
    assert!(monitor.list_open_alarms(Some("TEMP_01")).is_empty());

    let history = monitor.alarm_history(Some("TEMP_01"), None, None);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].state(), AlarmState::Resolved);
}

#[test]
fn stats_after_lifecycle() {
    let monitor = fleet();
    for v in [70.0, 80.0, 95.0, 60.0] {
        monitor.ingest_reading("TEMP_01", v, None).unwrap();
    }

    let stats = monitor.sensor_stats("TEMP_01", None, None).unwrap();
    assert_eq!(stats.count, 4);
    assert_eq!(stats.min, Some(60.0));
    assert_eq!(stats.max, Some(95.0));
    assert_eq!(stats.mean, Some(76.25));
    assert_eq!(stats.last_classification, Some(Classification::Normal));
}

#[test]
fn out_of_order_reading_rejected_cleanly() {
    let monitor = fleet();
    let t0 = Utc::now();
    monitor.ingest_reading("TEMP_01", 80.0, Some(t0)).unwrap();

    let err = monitor
        .ingest_reading("TEMP_01", 95.0, Some(t0 - Duration::seconds(10)))
        .unwrap_err();
    assert!(matches!(err, MonitorError::Ordering { .. }));

    // Neither history nor the ledger saw the rejected reading
    assert_eq!(monitor.reading_history("TEMP_01", None, None).unwrap().len(), 1);
    let open = monitor.list_open_alarms(Some("TEMP_01"));
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].severity, Severity::Warning);
}

#[test]
fn acknowledge_is_idempotent() {
    let monitor = fleet();
    monitor.ingest_reading("PRESS_01", 9.8, None).unwrap();

    let alarm_id = monitor.list_open_alarms(Some("PRESS_01"))[0].id;
    let first = monitor.acknowledge_alarm(alarm_id, "operator_1").unwrap();
    assert_eq!(first.state(), AlarmState::Acked);

    let second = monitor.acknowledge_alarm(alarm_id, "operator_2").unwrap();
    assert_eq!(second, first);

    monitor.ingest_reading("PRESS_01", 5.0, None).unwrap();
    assert!(matches!(
        monitor.acknowledge_alarm(alarm_id, "operator_1"),
        Err(MonitorError::InvalidState(_))
    ));
}

#[test]
fn below_direction_sensor_alarms_on_falling_values() {
    let monitor = fleet();

    monitor.ingest_reading("LVL_01", 5.0, None).unwrap();
    assert!(monitor.list_open_alarms(Some("LVL_01")).is_empty());

    monitor.ingest_reading("LVL_01", 1.5, None).unwrap();
    assert_eq!(
        monitor.list_open_alarms(Some("LVL_01"))[0].severity,
        Severity::Warning
    );

    monitor.ingest_reading("LVL_01", 0.2, None).unwrap();
    let open = monitor.list_open_alarms(Some("LVL_01"));
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].severity, Severity::Critical);
}

#[test]
fn fleet_summary_availability() {
    let monitor = fleet();
    monitor.ingest_reading("TEMP_01", 95.0, None).unwrap(); // critical
    monitor.ingest_reading("PRESS_01", 8.5, None).unwrap(); // warning only
    monitor.ingest_reading("LVL_01", 5.0, None).unwrap(); // normal

    let summary = monitor.fleet_summary(None).unwrap();
    assert_eq!(summary.sensors_total, 3);
    assert_eq!(summary.alarms_open, 2);
    // One of three sensors has an active critical alarm
    assert_eq!(summary.availability_percent, 66.7);

    let by_severity = monitor.alarms_by_severity(None, None);
    assert_eq!(by_severity.values().sum::<usize>(), 2);
}

#[test]
fn deactivated_sensor_keeps_history_but_rejects_readings() {
    let monitor = fleet();
    monitor.ingest_reading("TEMP_01", 70.0, None).unwrap();

    monitor.deactivate_sensor("TEMP_01").unwrap();
    assert!(matches!(
        monitor.ingest_reading("TEMP_01", 70.0, None),
        Err(MonitorError::SensorNotFound(_))
    ));
    assert_eq!(monitor.reading_history("TEMP_01", None, None).unwrap().len(), 1);
    assert!(monitor.sensor_stats("TEMP_01", None, None).is_ok());

    monitor.reactivate_sensor("TEMP_01").unwrap();
    monitor.ingest_reading("TEMP_01", 71.0, None).unwrap();
}

#[test]
fn threshold_update_applies_only_forward() {
    let monitor = fleet();
    let r = monitor.ingest_reading("TEMP_01", 70.0, None).unwrap();
    assert_eq!(r.classification, Classification::Normal);

    // Tighten the thresholds; the stored reading keeps its classification
    monitor.update_thresholds("TEMP_01", 60.0, 65.0).unwrap();
    let history = monitor.reading_history("TEMP_01", None, None).unwrap();
    assert_eq!(history[0].classification, Classification::Normal);

    let r = monitor.ingest_reading("TEMP_01", 70.0, None).unwrap();
    assert_eq!(r.classification, Classification::Critical);
}

#[test]
fn ingest_then_last_round_trip() {
    let monitor = fleet();
    let before = monitor.last_reading("TEMP_01");
    assert!(before.is_none());

    let r = monitor.ingest_reading("TEMP_01", 42.5, None).unwrap();
    let last = monitor.last_reading("TEMP_01").unwrap();
    assert_eq!(last, r);
    assert_eq!(last.value, 42.5);
    assert_eq!(last.sensor_id, "TEMP_01");

    let next = monitor.ingest_reading("TEMP_01", 43.0, None).unwrap();
    assert!(next.timestamp >= last.timestamp);
}

#[test]
fn repository_collaborator_is_notified() {
    use std::sync::Arc;

    let repo = Arc::new(MemoryRepository::new());
    let config = Config::from_yaml(FLEET_YAML).unwrap();
    let monitor = Monitor::from_config(&config)
        .unwrap()
        .with_repository(repo.clone());

    monitor.ingest_reading("TEMP_01", 95.0, None).unwrap();
    monitor.ingest_reading("TEMP_01", 60.0, None).unwrap();

    assert_eq!(repo.reading_count(), 2);
    // One save for the open, one for the resolve
    assert_eq!(repo.alarm_saves(), 2);
}
