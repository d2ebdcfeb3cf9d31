mod common;

use common::{Motion, MockProvider, at_day, natal, quiet_config, seconds_off};
use transit_ephem::Body;
use transit_search::{EventDetail, EventKind, Relevance, ScanConfig, TransitScanner};

fn house_config(bodies: &[Body]) -> ScanConfig {
    let mut c = quiet_config();
    c.bodies = bodies.to_vec();
    c.houses.enabled = true;
    c.houses.status_snapshot = false;
    c
}

fn house_numbers(e: &transit_search::TransitEvent) -> (u8, u8, u8) {
    match &e.detail {
        EventDetail::House(h) => (h.house, h.from_house, h.to_house),
        other => panic!("not a house event: {other:?}"),
    }
}

#[test]
fn cusp_crossing_emits_egress_then_ingress() {
    let provider = MockProvider::new()
        .with(Body::Mars, Motion::Linear { lon: 29.9, speed: 0.2 })
        .shared();
    let mut config = house_config(&[Body::Mars]);
    config.cadence_hours = 24.0;
    let scanner = TransitScanner::new(provider, config).unwrap();
    let events = scanner.scan(&natal(&[]), at_day(0.0), at_day(1.0)).unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, EventKind::HouseEgress);
    assert_eq!(house_numbers(&events[0]), (1, 1, 2));
    assert_eq!(events[1].kind, EventKind::HouseIngress);
    assert_eq!(house_numbers(&events[1]), (2, 1, 2));
    assert_eq!(events[0].jd_utc, events[1].jd_utc);
    assert!(seconds_off(events[1].jd_utc, 0.5) < 2.0);
    assert_eq!(events[1].relevance, Relevance::Medium);
}

#[test]
fn ingress_only_when_egress_disabled() {
    let provider = MockProvider::new()
        .with(Body::Saturn, Motion::Linear { lon: 59.95, speed: 0.1 })
        .shared();
    let mut config = house_config(&[Body::Saturn]);
    config.houses.emit_egress = false;
    let scanner = TransitScanner::new(provider, config).unwrap();
    let events = scanner.scan(&natal(&[]), at_day(0.0), at_day(1.0)).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::HouseIngress);
    assert_eq!(house_numbers(&events[0]), (3, 2, 3));
    assert_eq!(events[0].relevance, Relevance::High);
}

#[test]
fn retrograde_loop_recrosses_cusp() {
    // Starts at 30.5°, stations at 29.5° on day 5, back to 30.5° on day 10.
    let provider = MockProvider::new()
        .with(Body::Mars, Motion::Station { lon: 29.5, k: 0.04, t0: 5.0 })
        .shared();
    let mut config = house_config(&[Body::Mars]);
    config.cadence_hours = 6.0;
    let scanner = TransitScanner::new(provider, config).unwrap();
    let events = scanner.scan(&natal(&[]), at_day(0.0), at_day(10.0)).unwrap();

    let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::HouseEgress,
            EventKind::HouseIngress,
            EventKind::HouseEgress,
            EventKind::HouseIngress,
        ]
    );
    assert_eq!(house_numbers(&events[1]), (1, 2, 1));
    assert_eq!(house_numbers(&events[3]), (2, 1, 2));
    let half_width = 12.5_f64.sqrt();
    assert!(seconds_off(events[1].jd_utc, 5.0 - half_width) < 2.0);
    assert!(seconds_off(events[3].jd_utc, 5.0 + half_width) < 2.0);
    match &events[1].detail {
        EventDetail::House(h) => assert!(h.speed_deg_per_day < 0.0),
        _ => unreachable!(),
    }
}

#[test]
fn snapshot_lists_every_body_once() {
    let provider = MockProvider::new()
        .with(Body::Mars, Motion::Linear { lon: 10.0, speed: 0.5 })
        .with(Body::Saturn, Motion::Linear { lon: 200.0, speed: -0.05 })
        .shared();
    let mut config = house_config(&[Body::Mars, Body::Saturn]);
    config.houses.status_snapshot = true;
    let scanner = TransitScanner::new(provider, config).unwrap();
    let events = scanner.scan(&natal(&[]), at_day(0.0), at_day(3.0)).unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::HouseStatus);
    assert_eq!(events[0].relevance, Relevance::Low);
    let EventDetail::HouseStatus { transits } = &events[0].detail else {
        panic!("expected a snapshot");
    };
    assert_eq!(transits.len(), 2);
    assert_eq!((transits[0].body, transits[0].house), (Body::Mars, 1));
    assert!(!transits[0].retrograde);
    assert_eq!((transits[1].body, transits[1].house), (Body::Saturn, 7));
    assert!(transits[1].retrograde);
}
