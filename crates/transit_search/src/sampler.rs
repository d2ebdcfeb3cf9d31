//! Position sampler: the single point where the engine touches the
//! ephemeris provider.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use transit_ephem::{
    Body, DEFAULT_DELTA_T_SECONDS, EphemerisError, EphemerisProvider, PositionConfig, PrecisionMode,
    SignPosition, datetime_to_jd, jd_to_datetime, normalize_360, sign_position,
};

use crate::error::ScanError;

/// Longitude, speed and sign decomposition of a body at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodyPosition {
    pub body: Body,
    /// Ecliptic longitude in degrees, [0, 360).
    pub longitude_deg: f64,
    /// Degrees per day; negative while retrograde.
    pub speed_deg_per_day: f64,
    pub latitude_deg: f64,
    /// Zero when the source carries no distance.
    pub distance_au: f64,
    #[serde(skip)]
    pub sign: SignPosition,
}

impl BodyPosition {
    pub fn new(body: Body, longitude_deg: f64, speed_deg_per_day: f64) -> Self {
        let longitude_deg = normalize_360(longitude_deg);
        Self {
            body,
            longitude_deg,
            speed_deg_per_day,
            latitude_deg: 0.0,
            distance_au: 0.0,
            sign: sign_position(longitude_deg),
        }
    }

    pub fn with_ecliptic(mut self, latitude_deg: f64, distance_au: f64) -> Self {
        self.latitude_deg = latitude_deg;
        self.distance_au = distance_au;
        self
    }

    pub fn is_retrograde(&self) -> bool {
        self.speed_deg_per_day < 0.0
    }
}

/// Wraps a provider with UTC-to-TT conversion, error mapping and an
/// evaluation counter.
pub struct PositionSampler {
    provider: Arc<dyn EphemerisProvider>,
    delta_t_days: f64,
    evaluations: AtomicU64,
}

impl PositionSampler {
    pub fn new(provider: Arc<dyn EphemerisProvider>) -> Self {
        Self {
            provider,
            delta_t_days: DEFAULT_DELTA_T_SECONDS / 86_400.0,
            evaluations: AtomicU64::new(0),
        }
    }

    /// Use `seconds` for TT - UTC instead of the default.
    pub fn with_delta_t(mut self, seconds: f64) -> Self {
        self.delta_t_days = seconds / 86_400.0;
        self
    }

    /// Mode of the wrapped provider.
    pub fn precision(&self) -> PrecisionMode {
        self.provider.precision()
    }

    pub fn position_config(&self) -> PositionConfig {
        self.provider.position_config()
    }

    /// Fail unless the wrapped provider runs in `required` mode.
    pub fn require_precision(&self, required: PrecisionMode) -> Result<(), ScanError> {
        let active = self.precision();
        if active != required {
            return Err(ScanError::config(format!(
                "precision mode {required} required but provider runs {active}"
            )));
        }
        Ok(())
    }

    /// Position of `body` at `jd_utc` (Julian Date, UTC scale).
    pub fn position_at(&self, body: Body, jd_utc: f64) -> Result<BodyPosition, ScanError> {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        let jd_tt = jd_utc + self.delta_t_days;
        let unavailable = |source| ScanError::EphemerisUnavailable {
            body,
            jd_utc,
            instant: jd_to_datetime(jd_utc),
            source,
        };
        let pos = self.provider.position(body, jd_tt).map_err(unavailable)?;
        let finite = [pos.longitude_deg, pos.speed_deg_per_day, pos.latitude_deg, pos.distance_au]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(unavailable(EphemerisError::NonFinitePosition { body, jd_tt }));
        }
        Ok(BodyPosition::new(body, pos.longitude_deg, pos.speed_deg_per_day)
            .with_ecliptic(pos.latitude_deg, pos.distance_au))
    }

    pub fn position_at_instant(
        &self,
        body: Body,
        instant: &DateTime<Utc>,
    ) -> Result<BodyPosition, ScanError> {
        self.position_at(body, datetime_to_jd(instant))
    }

    /// Provider calls made so far.
    pub fn evaluations(&self) -> u64 {
        self.evaluations.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transit_ephem::EclipticPosition;

    struct Fixed(PrecisionMode);

    impl EphemerisProvider for Fixed {
        fn precision(&self) -> PrecisionMode {
            self.0
        }

        fn position_config(&self) -> PositionConfig {
            PositionConfig::default()
        }

        fn position(&self, body: Body, jd_tt: f64) -> Result<EclipticPosition, EphemerisError> {
            if body == Body::Pluto {
                return Err(EphemerisError::UnsupportedBody(body));
            }
            Ok(EclipticPosition {
                longitude_deg: jd_tt - 370.0,
                latitude_deg: 0.0,
                distance_au: 1.0,
                speed_deg_per_day: -0.5,
            })
        }
    }

    #[test]
    fn normalizes_and_decomposes() {
        let s = PositionSampler::new(Arc::new(Fixed(PrecisionMode::HighPrecisionFile)))
            .with_delta_t(0.0);
        let p = s.position_at(Body::Mars, 5.0).unwrap();
        assert!((p.longitude_deg - 355.0).abs() < 1e-9);
        assert!(p.is_retrograde());
        assert_eq!(p.sign.sign, transit_ephem::ZodiacSign::Pisces);
        assert_eq!(s.evaluations(), 1);
    }

    #[test]
    fn provider_failure_becomes_unavailable() {
        let s = PositionSampler::new(Arc::new(Fixed(PrecisionMode::HighPrecisionFile)));
        let err = s.position_at(Body::Pluto, 2_460_000.5).unwrap_err();
        match err {
            ScanError::EphemerisUnavailable { body, jd_utc, .. } => {
                assert_eq!(body, Body::Pluto);
                assert_eq!(jd_utc, 2_460_000.5);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn precision_requirement_is_checked() {
        let s = PositionSampler::new(Arc::new(Fixed(PrecisionMode::AnalyticApproximation)));
        assert!(s.require_precision(PrecisionMode::AnalyticApproximation).is_ok());
        assert!(matches!(
            s.require_precision(PrecisionMode::HighPrecisionFile),
            Err(ScanError::Configuration(_))
        ));
    }
}
