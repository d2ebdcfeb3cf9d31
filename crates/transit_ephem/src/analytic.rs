//! Closed-form positions: Keplerian mean elements for the planets and a
//! truncated lunar series for the Moon.
//!
//! Planet elements: E. M. Standish, "Keplerian Elements for Approximate
//! Positions of the Major Planets" (JPL), Table 1, valid 1800-2050.
//! Moon: Meeus, "Astronomical Algorithms" ch. 47, leading terms of tables
//! 47.A and 47.B.
//!
//! Typical accuracy is under one arcminute for the planets and a few
//! arcseconds of lunar longitude error beyond the series truncation.

use crate::body::Body;
use crate::error::EphemerisError;
use crate::frames::{
    aberration_longitude_deg, cartesian_to_spherical, ecliptic_to_equatorial,
    equatorial_to_ecliptic, general_precession_longitude_deg, mean_obliquity_deg, nutation_deg,
    spherical_to_cartesian, SphericalCoords,
};
use crate::julian::{
    jd_to_centuries, DEFAULT_DELTA_T_SECONDS, J2000_JD, SECONDS_PER_DAY,
};
use crate::provider::{
    Center, EclipticPosition, EphemerisProvider, GeoLocation, PositionConfig, PositionKind,
    PrecisionMode,
};

/// 1800-01-01 00:00 TT.
pub const ANALYTIC_START_JD: f64 = 2_378_496.5;
/// 2051-01-01 00:00 TT.
pub const ANALYTIC_END_JD: f64 = 2_470_172.5;

const AU_KM: f64 = 149_597_870.7;
const EARTH_RADIUS_KM: f64 = 6378.14;
/// Light travel time for one AU, in days.
const LIGHT_TIME_DAYS_PER_AU: f64 = 0.005_775_518_3;
/// Earth/Moon mass ratio.
const EARTH_MOON_MASS_RATIO: f64 = 81.300_56;
/// Half-width of the central difference used for speeds.
const SPEED_STEP_DAYS: f64 = 1.0 / 24.0;

/// Mean elements and their rates per Julian century:
/// `[a, e, I, L, long.peri, long.node]` in AU and degrees.
struct KeplerElements {
    base: [f64; 6],
    rate: [f64; 6],
}

#[rustfmt::skip]
const MERCURY: KeplerElements = KeplerElements {
    base: [0.387_099_27, 0.205_635_93, 7.004_979_02, 252.250_323_50, 77.457_796_28, 48.330_765_93],
    rate: [0.000_000_37, 0.000_019_06, -0.005_947_49, 149_472.674_111_75, 0.160_476_89, -0.125_340_81],
};
#[rustfmt::skip]
const VENUS: KeplerElements = KeplerElements {
    base: [0.723_335_66, 0.006_776_72, 3.394_676_05, 181.979_099_50, 131.602_467_18, 76.679_842_55],
    rate: [0.000_003_90, -0.000_041_07, -0.000_788_90, 58_517.815_387_29, 0.002_683_29, -0.277_694_18],
};
#[rustfmt::skip]
const EM_BARY: KeplerElements = KeplerElements {
    base: [1.000_002_61, 0.016_711_23, -0.000_015_31, 100.464_571_66, 102.937_681_93, 0.0],
    rate: [0.000_005_62, -0.000_043_92, -0.012_946_68, 35_999.372_449_81, 0.323_273_64, 0.0],
};
#[rustfmt::skip]
const MARS: KeplerElements = KeplerElements {
    base: [1.523_710_34, 0.093_394_10, 1.849_691_42, -4.553_432_05, -23.943_629_59, 49.559_538_91],
    rate: [0.000_018_47, 0.000_078_82, -0.008_131_31, 19_140.302_684_99, 0.444_410_88, -0.292_573_43],
};
#[rustfmt::skip]
const JUPITER: KeplerElements = KeplerElements {
    base: [5.202_887_00, 0.048_386_24, 1.304_396_95, 34.396_440_51, 14.728_479_83, 100.473_909_09],
    rate: [-0.000_116_07, -0.000_132_53, -0.001_837_14, 3_034.746_127_75, 0.212_526_68, 0.204_691_06],
};
#[rustfmt::skip]
const SATURN: KeplerElements = KeplerElements {
    base: [9.536_675_94, 0.053_861_79, 2.485_991_87, 49.954_244_23, 92.598_878_31, 113.662_424_48],
    rate: [-0.001_250_60, -0.000_509_91, 0.001_936_09, 1_222.493_622_01, -0.418_972_16, -0.288_677_94],
};
#[rustfmt::skip]
const URANUS: KeplerElements = KeplerElements {
    base: [19.189_164_64, 0.047_257_44, 0.772_637_83, 313.238_104_51, 170.954_276_30, 74.016_925_03],
    rate: [-0.001_961_76, -0.000_043_97, -0.002_429_39, 428.482_027_85, 0.408_052_81, 0.042_405_89],
};
#[rustfmt::skip]
const NEPTUNE: KeplerElements = KeplerElements {
    base: [30.069_922_76, 0.008_590_48, 1.770_043_47, -55.120_029_69, 44.964_762_27, 131.784_225_74],
    rate: [0.000_262_91, 0.000_051_05, 0.000_353_72, 218.459_453_25, -0.322_414_64, -0.005_086_64],
};
#[rustfmt::skip]
const PLUTO: KeplerElements = KeplerElements {
    base: [39.482_116_75, 0.248_827_30, 17.140_012_06, 238.929_038_33, 224.068_916_29, 110.303_936_84],
    rate: [-0.000_315_96, 0.000_051_70, 0.000_048_18, 145.207_805_15, -0.040_629_42, -0.011_834_82],
};

fn elements_for(body: Body) -> Option<&'static KeplerElements> {
    match body {
        Body::Mercury => Some(&MERCURY),
        Body::Venus => Some(&VENUS),
        Body::Mars => Some(&MARS),
        Body::Jupiter => Some(&JUPITER),
        Body::Saturn => Some(&SATURN),
        Body::Uranus => Some(&URANUS),
        Body::Neptune => Some(&NEPTUNE),
        Body::Pluto => Some(&PLUTO),
        Body::Sun | Body::Moon => None,
    }
}

/// Solve Kepler's equation `E - e sin E = M` (radians) by Newton iteration.
fn solve_kepler(m: f64, e: f64) -> f64 {
    let mut ecc_anom = if e < 0.8 { m } else { std::f64::consts::PI };
    for _ in 0..30 {
        let delta = (ecc_anom - e * ecc_anom.sin() - m) / (1.0 - e * ecc_anom.cos());
        ecc_anom -= delta;
        if delta.abs() < 1e-14 {
            break;
        }
    }
    ecc_anom
}

/// Heliocentric ecliptic J2000 position in AU.
fn heliocentric(el: &KeplerElements, t: f64) -> [f64; 3] {
    let at = |k: usize| el.base[k] + el.rate[k] * t;
    let a = at(0);
    let e = at(1);
    let inc = at(2).to_radians();
    let mean_lon = at(3);
    let peri = at(4);
    let node = at(5);

    let m = (mean_lon - peri).rem_euclid(360.0);
    let m = if m > 180.0 { m - 360.0 } else { m }.to_radians();
    let w = (peri - node).to_radians();
    let node = node.to_radians();

    let ecc_anom = solve_kepler(m, e);
    let xp = a * (ecc_anom.cos() - e);
    let yp = a * (1.0 - e * e).sqrt() * ecc_anom.sin();

    let (sw, cw) = w.sin_cos();
    let (sn, cn) = node.sin_cos();
    let (si, ci) = inc.sin_cos();
    [
        (cw * cn - sw * sn * ci) * xp + (-sw * cn - cw * sn * ci) * yp,
        (cw * sn + sw * cn * ci) * xp + (-sw * sn + cw * cn * ci) * yp,
        (sw * si) * xp + (cw * si) * yp,
    ]
}

/// Lunar series row: `[D, M, M', F, amplitude]`.
type LunarTerm = (i8, i8, i8, i8, f64);

/// Table 47.A row: `[D, M, M', F, Σl (1e-6 degree), Σr (0.001 km)]`.
type LunarLonDistTerm = (i8, i8, i8, i8, f64, f64);

#[rustfmt::skip]
const MOON_LON_DIST: [LunarLonDistTerm; 32] = [
    (0, 0, 1, 0, 6_288_774.0, -20_905_355.0),
    (2, 0, -1, 0, 1_274_027.0, -3_699_111.0),
    (2, 0, 0, 0, 658_314.0, -2_955_968.0),
    (0, 0, 2, 0, 213_618.0, -569_925.0),
    (0, 1, 0, 0, -185_116.0, 48_888.0),
    (0, 0, 0, 2, -114_332.0, -3_149.0),
    (2, 0, -2, 0, 58_793.0, 246_158.0),
    (2, -1, -1, 0, 57_066.0, -152_138.0),
    (2, 0, 1, 0, 53_322.0, -170_733.0),
    (2, -1, 0, 0, 45_758.0, -204_586.0),
    (0, 1, -1, 0, -40_923.0, -129_620.0),
    (1, 0, 0, 0, -34_720.0, 108_743.0),
    (0, 1, 1, 0, -30_383.0, 104_755.0),
    (2, 0, 0, -2, 15_327.0, 10_321.0),
    (0, 0, 1, 2, -12_528.0, 0.0),
    (0, 0, 1, -2, 10_980.0, 79_661.0),
    (4, 0, -1, 0, 10_675.0, -34_782.0),
    (0, 0, 3, 0, 10_034.0, -23_210.0),
    (4, 0, -2, 0, 8_548.0, -21_636.0),
    (2, 1, -1, 0, -7_888.0, 24_208.0),
    (2, 1, 0, 0, -6_766.0, 30_824.0),
    (1, 0, -1, 0, -5_163.0, -8_379.0),
    (1, 1, 0, 0, 4_987.0, -16_675.0),
    (2, -1, 1, 0, 4_036.0, -12_831.0),
    (2, 0, 2, 0, 3_994.0, -10_445.0),
    (4, 0, 0, 0, 3_861.0, -11_650.0),
    (2, 0, -3, 0, 3_665.0, 14_403.0),
    (0, 1, -2, 0, -2_689.0, -7_003.0),
    (2, 0, -1, 2, -2_602.0, 0.0),
    (2, -1, -2, 0, 2_390.0, 10_056.0),
    (1, 0, 1, 0, -2_348.0, 6_322.0),
    (2, -2, 0, 0, 2_236.0, -9_884.0),
];

/// Table 47.B latitude terms (1e-6 degree).
#[rustfmt::skip]
const MOON_LAT: [LunarTerm; 14] = [
    (0, 0, 0, 1, 5_128_122.0), (0, 0, 1, 1, 280_602.0), (0, 0, 1, -1, 277_693.0),
    (2, 0, 0, -1, 173_237.0), (2, 0, -1, 1, 55_413.0), (2, 0, -1, -1, 46_271.0),
    (2, 0, 0, 1, 32_573.0), (0, 0, 2, 1, 17_198.0), (2, 0, 1, -1, 9_266.0),
    (0, 0, 2, -1, 8_822.0), (2, -1, 0, -1, 8_216.0), (2, 0, -2, -1, 4_324.0),
    (2, 0, 1, 1, 4_200.0), (2, 1, 0, -1, -3_359.0),
];

/// Geocentric Moon, mean equinox of date: longitude, latitude (degrees)
/// and distance (km).
fn moon_of_date(t: f64) -> (f64, f64, f64) {
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;
    let lp = 218.316_447_7 + 481_267.881_234_21 * t - 0.001_578_6 * t2 + t3 / 538_841.0
        - t4 / 65_194_000.0;
    let d = 297.850_192_1 + 445_267.111_403_4 * t - 0.001_881_9 * t2 + t3 / 545_868.0
        - t4 / 113_065_000.0;
    let m = 357.529_109_2 + 35_999.050_290_9 * t - 0.000_153_6 * t2 + t3 / 24_490_000.0;
    let mp = 134.963_396_4 + 477_198.867_505_5 * t + 0.008_741_4 * t2 + t3 / 69_699.0
        - t4 / 14_712_000.0;
    let f = 93.272_095_0 + 483_202.017_523_3 * t - 0.003_653_9 * t2 - t3 / 3_526_000.0
        + t4 / 863_310_000.0;
    let a1 = 119.75 + 131.849 * t;
    let a2 = 53.09 + 479_264.290 * t;
    let a3 = 313.45 + 481_266.484 * t;
    let ecc = 1.0 - 0.002_516 * t - 0.000_007_4 * t2;

    let argument = |cd: i8, cm: i8, cmp: i8, cf: i8| {
        (cd as f64 * d + cm as f64 * m + cmp as f64 * mp + cf as f64 * f).to_radians()
    };
    let ecc_factor = |cm: i8| match cm.abs() {
        1 => ecc,
        2 => ecc * ecc,
        _ => 1.0,
    };

    let mut sum_l = 0.0;
    let mut sum_r = 0.0;
    for &(cd, cm, cmp, cf, l, r) in &MOON_LON_DIST {
        let arg = argument(cd, cm, cmp, cf);
        let e = ecc_factor(cm);
        sum_l += l * e * arg.sin();
        sum_r += r * e * arg.cos();
    }
    let mut sum_b: f64 = MOON_LAT
        .iter()
        .map(|&(cd, cm, cmp, cf, b)| b * ecc_factor(cm) * argument(cd, cm, cmp, cf).sin())
        .sum();

    let sin_deg = |x: f64| x.to_radians().sin();
    sum_l += 3958.0 * sin_deg(a1) + 1962.0 * sin_deg(lp - f) + 318.0 * sin_deg(a2);
    sum_b += -2235.0 * sin_deg(lp) + 382.0 * sin_deg(a3) + 175.0 * sin_deg(a1 - f)
        + 175.0 * sin_deg(a1 + f)
        + 127.0 * sin_deg(lp - mp)
        - 115.0 * sin_deg(lp + mp);

    let lon = (lp + sum_l / 1e6).rem_euclid(360.0);
    let lat = sum_b / 1e6;
    let dist_km = 385_000.56 + sum_r / 1000.0;
    (lon, lat, dist_km)
}

/// Heliocentric Earth (not the barycentre), ecliptic J2000, AU.
fn earth_heliocentric(t: f64) -> [f64; 3] {
    let emb = heliocentric(&EM_BARY, t);
    let (lon, lat, dist_km) = moon_of_date(t);
    let moon = spherical_to_cartesian(
        lon - general_precession_longitude_deg(t),
        lat,
        dist_km / AU_KM,
    );
    let k = 1.0 / (1.0 + EARTH_MOON_MASS_RATIO);
    [emb[0] - moon[0] * k, emb[1] - moon[1] * k, emb[2] - moon[2] * k]
}

/// Greenwich mean sidereal time in degrees (Meeus 12.4).
fn gmst_deg(jd_ut: f64) -> f64 {
    let t = jd_to_centuries(jd_ut);
    (280.460_618_37 + 360.985_647_366_29 * (jd_ut - J2000_JD) + 0.000_387_933 * t * t
        - t * t * t / 38_710_000.0)
        .rem_euclid(360.0)
}

/// Closed-form provider for the ten bodies, 1800-2050.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticEphemeris {
    config: PositionConfig,
}

impl AnalyticEphemeris {
    pub fn new(config: PositionConfig) -> Result<Self, EphemerisError> {
        config.validate().map_err(EphemerisError::InvalidConfig)?;
        Ok(Self { config })
    }

    /// Geocentric, light-time corrected, mean equinox of date.
    fn geometric(&self, body: Body, jd_tt: f64) -> SphericalCoords {
        let t = jd_to_centuries(jd_tt);
        if body == Body::Moon {
            let (lon, lat, dist_km) = moon_of_date(t);
            return SphericalCoords {
                lon_deg: lon,
                lat_deg: lat,
                distance: dist_km / AU_KM,
            };
        }

        let earth = earth_heliocentric(t);
        let geo = match elements_for(body) {
            None => [-earth[0], -earth[1], -earth[2]],
            Some(el) => {
                let mut tau = 0.0;
                let mut geo = [0.0; 3];
                for _ in 0..2 {
                    let p = heliocentric(el, jd_to_centuries(jd_tt - tau));
                    geo = [p[0] - earth[0], p[1] - earth[1], p[2] - earth[2]];
                    let r = (geo[0] * geo[0] + geo[1] * geo[1] + geo[2] * geo[2]).sqrt();
                    tau = r * LIGHT_TIME_DAYS_PER_AU;
                }
                geo
            }
        };
        let mut sph = cartesian_to_spherical(&geo);
        sph.lon_deg = (sph.lon_deg + general_precession_longitude_deg(t)).rem_euclid(360.0);
        sph
    }

    fn topocentric(sph: SphericalCoords, jd_tt: f64, loc: &GeoLocation) -> SphericalCoords {
        let t = jd_to_centuries(jd_tt);
        let eps = mean_obliquity_deg(t);
        let body_eq = ecliptic_to_equatorial(
            &spherical_to_cartesian(sph.lon_deg, sph.lat_deg, sph.distance),
            eps,
        );

        let jd_ut = jd_tt - DEFAULT_DELTA_T_SECONDS / SECONDS_PER_DAY;
        let lst = (gmst_deg(jd_ut) + loc.lon_deg).to_radians();
        let r = (EARTH_RADIUS_KM + loc.alt_m / 1000.0) / AU_KM;
        let (sphi, cphi) = loc.lat_deg.to_radians().sin_cos();
        let observer = [r * cphi * lst.cos(), r * cphi * lst.sin(), r * sphi];

        let rel = [
            body_eq[0] - observer[0],
            body_eq[1] - observer[1],
            body_eq[2] - observer[2],
        ];
        cartesian_to_spherical(&equatorial_to_ecliptic(&rel, eps))
    }

    fn longitude_pipeline(&self, body: Body, jd_tt: f64) -> SphericalCoords {
        let mut sph = self.geometric(body, jd_tt);
        if let Center::Topocentric(loc) = self.config.center {
            sph = Self::topocentric(sph, jd_tt, &loc);
        }
        if self.config.kind == PositionKind::Apparent {
            let t = jd_to_centuries(jd_tt);
            let (dpsi, _) = nutation_deg(t);
            let aberration = if body == Body::Moon {
                0.0
            } else {
                let sun = self.geometric(Body::Sun, jd_tt);
                aberration_longitude_deg(sun.lon_deg, sph.lon_deg, sph.lat_deg)
            };
            sph.lon_deg = (sph.lon_deg + dpsi + aberration).rem_euclid(360.0);
        }
        sph
    }
}

impl EphemerisProvider for AnalyticEphemeris {
    fn precision(&self) -> PrecisionMode {
        PrecisionMode::AnalyticApproximation
    }

    fn position_config(&self) -> PositionConfig {
        self.config
    }

    fn coverage(&self) -> Option<(f64, f64)> {
        Some((ANALYTIC_START_JD, ANALYTIC_END_JD))
    }

    fn position(&self, body: Body, jd_tt: f64) -> Result<EclipticPosition, EphemerisError> {
        if !jd_tt.is_finite() {
            return Err(EphemerisError::NonFiniteEpoch);
        }
        if !(ANALYTIC_START_JD..=ANALYTIC_END_JD).contains(&jd_tt) {
            return Err(EphemerisError::OutOfRange {
                body,
                jd_tt,
                start_jd: ANALYTIC_START_JD,
                end_jd: ANALYTIC_END_JD,
            });
        }

        let here = self.longitude_pipeline(body, jd_tt);
        let before = self.longitude_pipeline(body, jd_tt - SPEED_STEP_DAYS);
        let after = self.longitude_pipeline(body, jd_tt + SPEED_STEP_DAYS);
        let mut dlon = (after.lon_deg - before.lon_deg).rem_euclid(360.0);
        if dlon > 180.0 {
            dlon -= 360.0;
        }

        Ok(EclipticPosition {
            longitude_deg: here.lon_deg,
            latitude_deg: here.lat_deg,
            distance_au: here.distance,
            speed_deg_per_day: dlon / (2.0 * SPEED_STEP_DAYS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::julian::calendar_to_jd;

    #[test]
    fn kepler_circular_orbit() {
        assert!((solve_kepler(1.234, 0.0) - 1.234).abs() < 1e-14);
    }

    #[test]
    fn kepler_satisfies_equation() {
        let (m, e) = (0.5, 0.2488);
        let ecc = solve_kepler(m, e);
        assert!((ecc - e * ecc.sin() - m).abs() < 1e-12);
    }

    #[test]
    fn moon_meeus_example_47a() {
        // 1992 Apr 12.0 TD: λ = 133.162655°, β = -3.229126°, Δ = 368409.7 km
        let t = jd_to_centuries(2_448_724.5);
        let (lon, lat, dist) = moon_of_date(t);
        assert!((lon - 133.162_655).abs() < 0.03, "lon = {lon}");
        assert!((lat + 3.229_126).abs() < 0.02, "lat = {lat}");
        assert!((dist - 368_409.7).abs() < 150.0, "dist = {dist}");
    }

    #[test]
    fn sun_distance_near_one_au() {
        let eph = AnalyticEphemeris::default();
        let pos = eph.position(Body::Sun, calendar_to_jd(2025, 7, 4.0)).unwrap();
        // aphelion
        assert!((pos.distance_au - 1.0167).abs() < 0.001, "{}", pos.distance_au);
        assert!((pos.speed_deg_per_day - 0.953).abs() < 0.01);
    }

    #[test]
    fn out_of_range_is_reported() {
        let eph = AnalyticEphemeris::default();
        let err = eph.position(Body::Mars, calendar_to_jd(1700, 1, 1.0)).unwrap_err();
        assert!(matches!(err, EphemerisError::OutOfRange { body: Body::Mars, .. }));
        assert_eq!(
            eph.position(Body::Mars, f64::NAN).unwrap_err(),
            EphemerisError::NonFiniteEpoch
        );
    }

    #[test]
    fn invalid_observer_rejected() {
        let cfg = PositionConfig {
            center: Center::Topocentric(GeoLocation::new(0.0, 200.0, 0.0)),
            kind: PositionKind::Mean,
        };
        assert!(AnalyticEphemeris::new(cfg).is_err());
    }

    #[test]
    fn reports_analytic_precision() {
        assert_eq!(
            AnalyticEphemeris::default().precision(),
            PrecisionMode::AnalyticApproximation
        );
    }
}
