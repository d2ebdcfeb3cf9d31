//! Golden-value tests for the analytic provider.
//!
//! Reference instants are published equinox, lunation and contact times;
//! tolerances reflect the truncated theories.

use transit_ephem::{
    AnalyticEphemeris, Body, Center, DEFAULT_DELTA_T_SECONDS, EphemerisProvider, GeoLocation,
    PositionConfig, PositionKind, calendar_to_jd,
};

fn jd_tt(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> f64 {
    calendar_to_jd(
        year,
        month,
        day as f64 + (hour as f64 + minute as f64 / 60.0) / 24.0,
    ) + DEFAULT_DELTA_T_SECONDS / 86_400.0
}

fn signed_diff(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    if d > 180.0 { d - 360.0 } else { d }
}

fn apparent() -> AnalyticEphemeris {
    AnalyticEphemeris::new(PositionConfig {
        center: Center::Geocentric,
        kind: PositionKind::Apparent,
    })
    .unwrap()
}

/// March equinox 2025-03-20 09:01 UTC
#[test]
fn sun_at_march_equinox_2025() {
    let jd = jd_tt(2025, 3, 20, 9, 1);
    let mean = AnalyticEphemeris::default().position(Body::Sun, jd).unwrap();
    let app = apparent().position(Body::Sun, jd).unwrap();
    assert!(
        signed_diff(mean.longitude_deg, 0.0).abs() < 0.05,
        "mean Sun = {}",
        mean.longitude_deg
    );
    assert!(
        signed_diff(app.longitude_deg, 0.0).abs() < 0.03,
        "apparent Sun = {}",
        app.longitude_deg
    );
}

/// Venus reaches 0°50' Pisces around 2025-01-03 22:36 UTC
#[test]
fn venus_early_january_2025() {
    let pos = AnalyticEphemeris::default()
        .position(Body::Venus, jd_tt(2025, 1, 3, 22, 36))
        .unwrap();
    let off = signed_diff(pos.longitude_deg, 330.833);
    assert!(off.abs() < 0.2, "Venus off by {off:.3}°");
    assert!(pos.speed_deg_per_day > 0.9 && pos.speed_deg_per_day < 1.4);
}

/// Full Moon 2025-01-13 22:27 UTC
#[test]
fn full_moon_january_2025() {
    let eph = AnalyticEphemeris::default();
    let jd = jd_tt(2025, 1, 13, 22, 27);
    let sun = eph.position(Body::Sun, jd).unwrap();
    let moon = eph.position(Body::Moon, jd).unwrap();
    let elong = (moon.longitude_deg - sun.longitude_deg).rem_euclid(360.0);
    assert!((elong - 180.0).abs() < 0.5, "elongation = {elong}");
    assert!(moon.speed_deg_per_day > 11.0 && moon.speed_deg_per_day < 15.5);
}

/// New Moon 2025-01-29 12:36 UTC
#[test]
fn new_moon_january_2025() {
    let eph = AnalyticEphemeris::default();
    let jd = jd_tt(2025, 1, 29, 12, 36);
    let sun = eph.position(Body::Sun, jd).unwrap();
    let moon = eph.position(Body::Moon, jd).unwrap();
    let off = signed_diff(moon.longitude_deg, sun.longitude_deg);
    assert!(off.abs() < 0.5, "elongation = {off}");
}

/// Mars retrograde from 2024-12-06 to 2025-02-24
#[test]
fn mars_retrograde_winter_2025() {
    let eph = AnalyticEphemeris::default();
    let during = eph.position(Body::Mars, jd_tt(2025, 1, 15, 0, 0)).unwrap();
    let after = eph.position(Body::Mars, jd_tt(2025, 4, 1, 0, 0)).unwrap();
    assert!(during.is_retrograde(), "speed = {}", during.speed_deg_per_day);
    assert!(!after.is_retrograde());
}

#[test]
fn apparent_differs_from_mean_by_arcseconds() {
    let jd = jd_tt(2025, 6, 1, 0, 0);
    for body in [Body::Sun, Body::Jupiter, Body::Moon] {
        let mean = AnalyticEphemeris::default().position(body, jd).unwrap();
        let app = apparent().position(body, jd).unwrap();
        let d = signed_diff(app.longitude_deg, mean.longitude_deg).abs();
        assert!(d > 0.0, "{body}: no correction applied");
        assert!(d < 0.015, "{body}: correction {d}° too large");
    }
}

#[test]
fn topocentric_parallax_bounds() {
    let topo = AnalyticEphemeris::new(PositionConfig {
        center: Center::Topocentric(GeoLocation::new(40.4168, -3.7038, 650.0)),
        kind: PositionKind::Mean,
    })
    .unwrap();
    let geo = AnalyticEphemeris::default();
    let jd = jd_tt(2025, 1, 7, 18, 0);

    let moon_geo = geo.position(Body::Moon, jd).unwrap();
    let moon_topo = topo.position(Body::Moon, jd).unwrap();
    let dl = signed_diff(moon_topo.longitude_deg, moon_geo.longitude_deg)
        * moon_geo.latitude_deg.to_radians().cos();
    let db = moon_topo.latitude_deg - moon_geo.latitude_deg;
    let shift = (dl * dl + db * db).sqrt();
    // horizontal parallax never exceeds ~1.02°
    assert!(shift > 1e-4 && shift < 1.05, "lunar parallax = {shift}");

    let mars_geo = geo.position(Body::Mars, jd).unwrap();
    let mars_topo = topo.position(Body::Mars, jd).unwrap();
    assert!(signed_diff(mars_topo.longitude_deg, mars_geo.longitude_deg).abs() < 0.01);
}
