//! Synthetic providers with closed-form motion for exact event checks.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use transit_ephem::{
    Body, EclipticPosition, EphemerisError, EphemerisProvider, PositionConfig, PrecisionMode,
    datetime_to_jd, normalize_360,
};
use transit_search::{AspectDefinition, HouseCusps, NatalContext, ScanConfig};

/// 2025-01-01T00:00:00Z.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

pub fn epoch_jd() -> f64 {
    datetime_to_jd(&epoch())
}

/// `epoch() + days`, to the millisecond.
pub fn at_day(days: f64) -> DateTime<Utc> {
    epoch() + Duration::milliseconds((days * 86_400_000.0).round() as i64)
}

/// Longitude as a function of days since [`epoch`].
#[derive(Debug, Clone, Copy)]
pub enum Motion {
    Linear { lon: f64, speed: f64 },
    /// `lon + k * (t - t0)^2`: stationary at `t0`.
    Station { lon: f64, k: f64, t0: f64 },
}

impl Motion {
    fn eval(self, t: f64) -> (f64, f64) {
        match self {
            Self::Linear { lon, speed } => (lon + speed * t, speed),
            Self::Station { lon, k, t0 } => (lon + k * (t - t0).powi(2), 2.0 * k * (t - t0)),
        }
    }
}

/// Mean geocentric distance of the Moon.
pub const MOON_DISTANCE_AU: f64 = 384_400.0 / 149_597_870.7;

pub struct MockProvider {
    precision: PrecisionMode,
    motions: BTreeMap<Body, Motion>,
    /// Constant (latitude, distance) per body; zero latitude and a mean
    /// distance otherwise.
    ecliptic: BTreeMap<Body, (f64, f64)>,
    /// Days since epoch after which every call fails.
    fail_after: Option<f64>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            precision: PrecisionMode::HighPrecisionFile,
            motions: BTreeMap::new(),
            ecliptic: BTreeMap::new(),
            fail_after: None,
        }
    }

    pub fn precision(mut self, precision: PrecisionMode) -> Self {
        self.precision = precision;
        self
    }

    pub fn precision_mode(&self) -> PrecisionMode {
        self.precision
    }

    pub fn with(mut self, body: Body, motion: Motion) -> Self {
        self.motions.insert(body, motion);
        self
    }

    pub fn ecliptic(mut self, body: Body, latitude_deg: f64, distance_au: f64) -> Self {
        self.ecliptic.insert(body, (latitude_deg, distance_au));
        self
    }

    pub fn fail_after(mut self, days: f64) -> Self {
        self.fail_after = Some(days);
        self
    }

    pub fn shared(self) -> Arc<dyn EphemerisProvider> {
        Arc::new(self)
    }
}

impl EphemerisProvider for MockProvider {
    fn precision(&self) -> PrecisionMode {
        self.precision
    }

    fn position_config(&self) -> PositionConfig {
        PositionConfig::default()
    }

    fn position(&self, body: Body, jd_tt: f64) -> Result<EclipticPosition, EphemerisError> {
        let t = jd_tt - epoch_jd();
        if self.fail_after.is_some_and(|limit| t > limit) {
            return Err(EphemerisError::OutOfRange {
                body,
                jd_tt,
                start_jd: epoch_jd(),
                end_jd: epoch_jd() + self.fail_after.unwrap_or_default(),
            });
        }
        let motion = self
            .motions
            .get(&body)
            .ok_or(EphemerisError::UnsupportedBody(body))?;
        let (lon, speed) = motion.eval(t);
        let default_distance = if body == Body::Moon { MOON_DISTANCE_AU } else { 1.0 };
        let (latitude_deg, distance_au) = self
            .ecliptic
            .get(&body)
            .copied()
            .unwrap_or((0.0, default_distance));
        Ok(EclipticPosition {
            longitude_deg: normalize_360(lon),
            latitude_deg,
            distance_au,
            speed_deg_per_day: speed,
        })
    }
}

/// Configuration with every detector off and no TT offset.
pub fn quiet_config() -> ScanConfig {
    let mut c = ScanConfig::default();
    c.bodies = Vec::new();
    c.aspects = Vec::new();
    c.include_angles = false;
    c.houses.enabled = false;
    c.lunar_phases.enabled = false;
    c.progressions.enabled = false;
    c.profections.enabled = false;
    c.delta_t_seconds = 0.0;
    c
}

pub fn config_with_aspects(bodies: &[Body], aspects: Vec<AspectDefinition>) -> ScanConfig {
    let mut c = quiet_config();
    c.bodies = bodies.to_vec();
    c.aspects = aspects;
    c
}

/// Equal houses from 0° Aries, born 1990-03-10 08:15 UTC.
pub fn natal(bodies: &[(Body, f64)]) -> NatalContext {
    NatalContext::new(
        Utc.with_ymd_and_hms(1990, 3, 10, 8, 15, 0).unwrap(),
        bodies.iter().copied().collect(),
        HouseCusps::equal(0.0).unwrap(),
    )
    .unwrap()
}

/// Seconds between an event and the expected day offset.
pub fn seconds_off(jd_utc: f64, expected_days: f64) -> f64 {
    ((jd_utc - epoch_jd()) - expected_days).abs() * 86_400.0
}
