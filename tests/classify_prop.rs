use chrono::{Duration, Utc};
use proptest::prelude::*;
use sentra::{
    classify, decide, AlarmDecision, Classification, Direction, Monitor, SensorKind, SensorSpec,
    Severity,
};

fn above_sensor(warning: f64, critical: f64) -> sentra::Sensor {
    sentra::Sensor {
        id: "S".into(),
        kind: SensorKind::Other,
        unit: "u".into(),
        min: -1e6,
        max: 1e6,
        warning,
        critical,
        direction: Direction::Above,
        active: true,
    }
}

proptest! {
    #[test]
    fn classify_is_deterministic(
        warning in -1e5f64..1e5,
        offset in 1e-3f64..1e5,
        value in -1e6f64..1e6,
    ) {
        let sensor = above_sensor(warning, warning + offset);
        prop_assert_eq!(classify(&sensor, value), classify(&sensor, value));
    }

    #[test]
    fn classification_is_monotonic_in_value(
        warning in -1e5f64..1e5,
        offset in 1e-3f64..1e5,
        a in -1e6f64..1e6,
        b in -1e6f64..1e6,
    ) {
        let sensor = above_sensor(warning, warning + offset);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        // For an "above" sensor a larger value can never classify lower
        prop_assert!(classify(&sensor, lo) <= classify(&sensor, hi));
    }

    #[test]
    fn decide_never_deescalates(
        new in prop_oneof![
            Just(Classification::Normal),
            Just(Classification::Warning),
            Just(Classification::Critical),
        ],
    ) {
        match decide(Some(Severity::Critical), new) {
            AlarmDecision::Escalate(_) | AlarmDecision::Open(_) => {
                prop_assert!(false, "critical alarm must only resolve or stay");
            }
            AlarmDecision::Resolve => prop_assert_eq!(new, Classification::Normal),
            AlarmDecision::None => prop_assert_ne!(new, Classification::Normal),
        }
    }

    #[test]
    fn at_most_one_open_alarm_per_sensor(values in prop::collection::vec(-50.0f64..150.0, 1..60)) {
        let monitor = Monitor::new();
        monitor.register_sensor(SensorSpec {
            id: "TEMP_01".into(),
            kind: SensorKind::Temperature,
            unit: "°C".into(),
            min: 0.0,
            max: 100.0,
            warning: 75.0,
            critical: 90.0,
            direction: Direction::Above,
        }).unwrap();

        let t0 = Utc::now();
        for (i, value) in values.into_iter().enumerate() {
            let ts = t0 + Duration::seconds(i as i64);
            monitor.ingest_reading("TEMP_01", value, Some(ts)).unwrap();
            prop_assert!(monitor.list_open_alarms(Some("TEMP_01")).len() <= 1);
        }
    }

    #[test]
    fn alarm_counts_total_history(values in prop::collection::vec(-50.0f64..150.0, 1..60)) {
        let monitor = Monitor::new();
        monitor.register_sensor(SensorSpec {
            id: "TEMP_01".into(),
            kind: SensorKind::Temperature,
            unit: "°C".into(),
            min: 0.0,
            max: 100.0,
            warning: 75.0,
            critical: 90.0,
            direction: Direction::Above,
        }).unwrap();

        let t0 = Utc::now();
        for (i, value) in values.into_iter().enumerate() {
            monitor
                .ingest_reading("TEMP_01", value, Some(t0 + Duration::seconds(i as i64)))
                .unwrap();
        }

        let counted: usize = monitor.alarms_by_severity(None, None).values().sum();
        prop_assert_eq!(counted, monitor.alarm_history(None, None, None).len());
    }
}
