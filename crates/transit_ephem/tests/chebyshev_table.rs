//! Fit, persist and reload a Chebyshev table against the analytic provider.

use transit_ephem::{
    AnalyticEphemeris, Body, ChebyshevEphemeris, ChebyshevTable, EphemerisError,
    EphemerisProvider, FitConfig, PrecisionMode, calendar_to_jd,
};

const BODIES: [Body; 4] = [Body::Sun, Body::Moon, Body::Venus, Body::Saturn];

fn fitted() -> (AnalyticEphemeris, ChebyshevTable, f64, f64) {
    let source = AnalyticEphemeris::default();
    let start = calendar_to_jd(2025, 1, 1.0);
    let end = calendar_to_jd(2025, 1, 21.0);
    let table = ChebyshevTable::fit(&source, &BODIES, start, end, &FitConfig::default()).unwrap();
    (source, table, start, end)
}

fn signed_diff(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    if d > 180.0 { d - 360.0 } else { d }
}

#[test]
fn table_matches_source_inside_coverage() {
    let (source, table, start, end) = fitted();
    let eph = ChebyshevEphemeris::new(table).unwrap();
    assert_eq!(eph.precision(), PrecisionMode::HighPrecisionFile);
    assert_eq!(eph.source_precision(), PrecisionMode::AnalyticApproximation);
    assert_eq!(eph.coverage(), Some((start, end)));

    let mut jd = start + 0.137;
    while jd < end {
        for body in BODIES {
            let a = source.position(body, jd).unwrap();
            let b = eph.position(body, jd).unwrap();
            let dl = signed_diff(a.longitude_deg, b.longitude_deg).abs();
            assert!(dl < 1e-5, "{body} at {jd}: lon diff {dl}");
            assert!((a.latitude_deg - b.latitude_deg).abs() < 1e-5);
            assert!((a.speed_deg_per_day - b.speed_deg_per_day).abs() < 0.01);
        }
        jd += 0.731;
    }
}

#[test]
fn save_and_load_roundtrip() {
    let (_, table, start, _) = fitted();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.json");
    table.save(&path).unwrap();

    let loaded = ChebyshevEphemeris::open(&path).unwrap();
    assert_eq!(loaded.table().series.len(), table.series.len());
    assert_eq!(loaded.table().position_config, table.position_config);

    let original = ChebyshevEphemeris::new(table).unwrap();
    for body in BODIES {
        let a = original.position(body, start + 2.5).unwrap();
        let b = loaded.position(body, start + 2.5).unwrap();
        assert!((a.longitude_deg - b.longitude_deg).abs() < 1e-9);
    }
}

#[test]
fn outside_coverage_is_an_error() {
    let (_, table, _, end) = fitted();
    let eph = ChebyshevEphemeris::new(table).unwrap();
    let err = eph.position(Body::Moon, end + 1.0).unwrap_err();
    assert!(matches!(err, EphemerisError::OutOfRange { body: Body::Moon, .. }));
    assert_eq!(
        eph.position(Body::Pluto, end - 1.0).unwrap_err(),
        EphemerisError::UnsupportedBody(Body::Pluto)
    );
}

#[test]
fn corrupted_table_is_rejected() {
    let (_, mut table, _, _) = fitted();
    table.series[0].segments[1].start_jd += 0.5;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    table.save(&path).unwrap();
    assert!(matches!(
        ChebyshevTable::load(&path),
        Err(EphemerisError::InvalidTable(_))
    ));
}

#[test]
fn missing_file_is_a_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ChebyshevTable::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, EphemerisError::TableLoad(_)));
}
