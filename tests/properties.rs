use std::collections::{HashMap, HashSet};

use datecontainer::{DateContainerFactory, ErrorType, Granularity, Instant, Zone};
use proptest::prelude::*;

const DAY: i64 = 86_400;

fn utc(secs: i64) -> Instant {
    Instant::from_timestamp(&Zone::utc(), secs).unwrap()
}

proptest! {
    #[test]
    fn distinct_days_round_trip(days in prop::collection::hash_set(0i64..20_000, 1..40)) {
        let factory = DateContainerFactory::default();
        let mut container = factory.create_interval_day();
        for day in &days {
            container.attach(utc(day * DAY), *day);
        }

        let identifiers = container.identifiers().unwrap();
        let map = container.to_map().unwrap();
        prop_assert_eq!(identifiers.len(), days.len());
        prop_assert_eq!(map.len(), days.len());

        let unique: HashSet<_> = identifiers.iter().collect();
        prop_assert_eq!(unique.len(), identifiers.len());
        for key in map.keys() {
            prop_assert!(unique.contains(key));
        }
        for day in &days {
            prop_assert_eq!(container.get_data(&utc(day * DAY)), Some(day));
        }
    }

    #[test]
    fn same_day_collapses_to_last(offsets in prop::collection::vec(0i64..DAY, 2..10)) {
        let factory = DateContainerFactory::default();
        let mut container = factory.create_interval_day();
        for (i, offset) in offsets.iter().enumerate() {
            container.attach(utc(*offset), i);
        }

        let map = container.to_map().unwrap();
        prop_assert_eq!(map.len(), 1);
        // the last attach of a repeated offset overwrites in place, so the winner is
        // whatever sits last in iteration order
        let last = container.values().last().copied();
        prop_assert_eq!(map.get("1970-01-01").map(|v| **v), last);
    }

    #[test]
    fn identifier_is_stable(secs in -10_000_000_000i64..10_000_000_000) {
        let container = DateContainerFactory::default().create_interval_second::<()>();
        let first = container.get_identifier(&utc(secs)).unwrap();
        let second = container.get_identifier(&utc(secs)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn detach_leaves_others(days in prop::collection::hash_set(0i64..1_000, 2..20)) {
        let mut container = DateContainerFactory::default().create_interval_day();
        for day in &days {
            container.attach(utc(day * DAY), *day);
        }
        let removed = *days.iter().next().unwrap();
        container.detach(&utc(removed * DAY));
        container.detach(&utc(5_000 * DAY));

        prop_assert!(!container.contains(&utc(removed * DAY)));
        prop_assert_eq!(container.len(), days.len() - 1);
        for day in days.iter().filter(|d| **d != removed) {
            prop_assert_eq!(container.get_data(&utc(day * DAY)), Some(day));
        }
    }
}

#[test]
fn same_offset_different_name() {
    let amsterdam = Zone::new("Europe/Amsterdam", 3600).unwrap();
    let berlin = Zone::new("Europe/Berlin", 3600).unwrap();
    let container = DateContainerFactory::new(amsterdam).create::<()>(Granularity::Day);

    let err = container
        .get_identifier(&Instant::from_timestamp(&berlin, 0).unwrap())
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Europe/Amsterdam"));
    assert!(message.contains("Europe/Berlin"));
    assert!(matches!(err, ErrorType::IllegalTimezone { .. }));
}

#[test]
fn export_serializes() {
    let mut container = DateContainerFactory::default().create_interval_day();
    container
        .attach(utc(0), "A".to_string())
        .attach(utc(DAY), "B".to_string());

    let json = serde_json::to_string(&container.to_map().unwrap()).unwrap();
    let back: HashMap<String, String> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.get("1970-01-01").map(String::as_str), Some("A"));
    assert_eq!(back.get("1970-01-02").map(String::as_str), Some("B"));

    let instant = Instant::from_timestamp(&Zone::new("Asia/Kolkata", 19_800).unwrap(), 0).unwrap();
    let json = serde_json::to_string(&instant).unwrap();
    assert_eq!(serde_json::from_str::<Instant>(&json).unwrap(), instant);
}
