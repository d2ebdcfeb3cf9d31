//! The provider boundary: what a position source must expose and how it
//! is configured.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::error::EphemerisError;

/// How positions are produced.
///
/// The two modes diverge by observable amounts (tenths of a degree for
/// the faster bodies), so callers can require one and refuse the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecisionMode {
    /// Positions interpolated from a fitted coefficient file.
    HighPrecisionFile,
    /// Closed-form mean elements and truncated series.
    AnalyticApproximation,
}

impl PrecisionMode {
    pub const fn name(self) -> &'static str {
        match self {
            Self::HighPrecisionFile => "high_precision_file",
            Self::AnalyticApproximation => "analytic_approximation",
        }
    }
}

impl std::fmt::Display for PrecisionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Geodetic observer location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    /// Latitude in degrees, north positive.
    pub lat_deg: f64,
    /// Longitude in degrees, east positive.
    pub lon_deg: f64,
    #[serde(default)]
    pub alt_m: f64,
}

impl GeoLocation {
    pub fn new(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            alt_m,
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.lat_deg.is_finite() || self.lat_deg.abs() > 90.0 {
            return Err("latitude must be within [-90, 90]");
        }
        if !self.lon_deg.is_finite() || self.lon_deg.abs() > 180.0 {
            return Err("longitude must be within [-180, 180]");
        }
        if !self.alt_m.is_finite() {
            return Err("altitude must be finite");
        }
        Ok(())
    }
}

/// Origin of the position vectors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Center {
    #[default]
    Geocentric,
    Topocentric(GeoLocation),
}

/// Which corrections are applied to the longitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PositionKind {
    /// Light-time corrected, referred to the mean equinox of date.
    #[default]
    Mean,
    /// Mean plus nutation in longitude and annual aberration.
    Apparent,
}

/// Position options of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PositionConfig {
    #[serde(default)]
    pub center: Center,
    #[serde(default)]
    pub kind: PositionKind,
}

impl PositionConfig {
    pub fn geocentric_mean() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        match self.center {
            Center::Geocentric => Ok(()),
            Center::Topocentric(loc) => loc.validate(),
        }
    }
}

/// Ecliptic position of a body at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EclipticPosition {
    /// Longitude in degrees, [0, 360).
    pub longitude_deg: f64,
    pub latitude_deg: f64,
    pub distance_au: f64,
    /// Longitude rate; negative while retrograde.
    pub speed_deg_per_day: f64,
}

impl EclipticPosition {
    pub fn is_retrograde(&self) -> bool {
        self.speed_deg_per_day < 0.0
    }
}

/// A source of body positions.
///
/// Implementations must be deterministic: the same `(body, jd_tt)` yields
/// the same position on every call.
pub trait EphemerisProvider: Send + Sync {
    fn precision(&self) -> PrecisionMode;

    fn position_config(&self) -> PositionConfig;

    /// Supported `[start, end]` range as TT Julian Dates, when bounded.
    fn coverage(&self) -> Option<(f64, f64)> {
        None
    }

    /// Ecliptic-of-date position at `jd_tt` (TT Julian Date).
    fn position(&self, body: Body, jd_tt: f64) -> Result<EclipticPosition, EphemerisError>;
}

impl<P: EphemerisProvider + ?Sized> EphemerisProvider for Arc<P> {
    fn precision(&self) -> PrecisionMode {
        (**self).precision()
    }

    fn position_config(&self) -> PositionConfig {
        (**self).position_config()
    }

    fn coverage(&self) -> Option<(f64, f64)> {
        (**self).coverage()
    }

    fn position(&self, body: Body, jd_tt: f64) -> Result<EclipticPosition, EphemerisError> {
        (**self).position(body, jd_tt)
    }
}

impl<P: EphemerisProvider + ?Sized> EphemerisProvider for Box<P> {
    fn precision(&self) -> PrecisionMode {
        (**self).precision()
    }

    fn position_config(&self) -> PositionConfig {
        (**self).position_config()
    }

    fn coverage(&self) -> Option<(f64, f64)> {
        (**self).coverage()
    }

    fn position(&self, body: Body, jd_tt: f64) -> Result<EclipticPosition, EphemerisError> {
        (**self).position(body, jd_tt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_geocentric_mean() {
        let cfg = PositionConfig::default();
        assert_eq!(cfg.center, Center::Geocentric);
        assert_eq!(cfg.kind, PositionKind::Mean);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_bad_observer() {
        let cfg = PositionConfig {
            center: Center::Topocentric(GeoLocation::new(95.0, 0.0, 0.0)),
            kind: PositionKind::Mean,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn precision_mode_serde_names() {
        let json = serde_json::to_string(&PrecisionMode::HighPrecisionFile).unwrap();
        assert_eq!(json, "\"high_precision_file\"");
        assert_eq!(
            PrecisionMode::AnalyticApproximation.to_string(),
            "analytic_approximation"
        );
    }

    #[test]
    fn providers_are_object_safe() {
        fn _assert(_: &dyn EphemerisProvider) {}
    }
}
