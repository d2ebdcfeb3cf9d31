//! Error types for transit scanning.

use chrono::{DateTime, Utc};
use thiserror::Error;
use transit_ephem::{Body, EphemerisError};

/// Errors that abort a scan. No variant is recovered from internally: a
/// failed scan returns no partial events.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScanError {
    /// Malformed natal data (cusps, longitudes, birth instant).
    #[error("invalid natal context: {0}")]
    InvalidNatalContext(String),
    /// The provider could not resolve a body at an instant.
    #[error("ephemeris unavailable for {body} at {}: {source}", describe_instant(*jd_utc, instant))]
    EphemerisUnavailable {
        body: Body,
        jd_utc: f64,
        instant: Option<DateTime<Utc>>,
        #[source]
        source: EphemerisError,
    },
    /// Degenerate matcher input.
    #[error("invalid aspect request: {0}")]
    InvalidAspectRequest(String),
    /// Invalid scan configuration or aspect table.
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_instant(jd_utc: f64, instant: &Option<DateTime<Utc>>) -> String {
    match instant {
        Some(dt) => dt.to_rfc3339(),
        None => format!("JD {jd_utc}"),
    }
}

impl ScanError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn natal(msg: impl Into<String>) -> Self {
        Self::InvalidNatalContext(msg.into())
    }
}

impl From<toml::de::Error> for ScanError {
    fn from(e: toml::de::Error) -> Self {
        Self::Configuration(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn unavailable_names_body_and_instant() {
        let err = ScanError::EphemerisUnavailable {
            body: Body::Venus,
            jd_utc: 2_460_679.5,
            instant: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single(),
            source: EphemerisError::NonFiniteEpoch,
        };
        let msg = err.to_string();
        assert!(msg.contains("Venus"), "{msg}");
        assert!(msg.contains("2025-01-01T00:00:00"), "{msg}");
    }

    #[test]
    fn unavailable_without_instant_uses_jd() {
        let err = ScanError::EphemerisUnavailable {
            body: Body::Moon,
            jd_utc: 1.5,
            instant: None,
            source: EphemerisError::NonFiniteEpoch,
        };
        assert!(err.to_string().contains("JD 1.5"));
    }
}
