mod common;

use chrono::{TimeZone, Utc};
use transit_ephem::{Body, ZodiacSign};
use transit_search::{EventDetail, EventKind, ProfectionDetail, Relevance, TransitScanner};

use common::{MockProvider, natal, quiet_config};

fn scanner() -> TransitScanner {
    let mut config = quiet_config();
    config.profections.enabled = true;
    config.cadence_hours = 24.0;
    TransitScanner::new(MockProvider::new().shared(), config).unwrap()
}

fn detail(e: &transit_search::TransitEvent) -> &ProfectionDetail {
    match &e.detail {
        EventDetail::Profection(p) => p,
        other => panic!("not a profection: {other:?}"),
    }
}

#[test]
fn one_profection_per_birthday() {
    let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2032, 12, 31, 0, 0, 0).unwrap();
    let events = scanner().scan(&natal(&[]), start, end).unwrap();

    assert_eq!(events.len(), 13);
    for (i, e) in events.iter().enumerate() {
        let year = 2020 + i as i32;
        assert_eq!(e.kind, EventKind::ProfectionStart);
        assert_eq!(e.instant, Utc.with_ymd_and_hms(year, 3, 10, 8, 15, 0).unwrap());
        assert_eq!(detail(e).age, 30 + i as u32);
        assert_eq!(e.relevance, Relevance::High);
    }

    // ascendant at 0° Aries: age 30 profects to the 7th, Libra, Venus
    let first = detail(&events[0]);
    assert_eq!((first.house, first.sign, first.lord), (7, ZodiacSign::Libra, Body::Venus));
    let last = detail(&events[12]);
    assert_eq!(last.age, 42);
    assert_eq!((last.house, last.sign, last.lord), (7, ZodiacSign::Libra, Body::Venus));
    assert_eq!(detail(&events[6]).house, 1);
}

#[test]
fn birth_inside_range_starts_at_age_zero() {
    let start = Utc.with_ymd_and_hms(1990, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(1990, 6, 1, 0, 0, 0).unwrap();
    let events = scanner().scan(&natal(&[]), start, end).unwrap();
    assert_eq!(events.len(), 1);
    let p = detail(&events[0]);
    assert_eq!((p.age, p.house, p.sign), (0, 1, ZodiacSign::Aries));
}

#[test]
fn nothing_before_birth() {
    let start = Utc.with_ymd_and_hms(1980, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(1989, 12, 31, 0, 0, 0).unwrap();
    let events = scanner().scan(&natal(&[]), start, end).unwrap();
    assert!(events.is_empty());
}
