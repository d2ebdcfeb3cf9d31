//! Error types for ephemeris providers.

use thiserror::Error;

use crate::body::Body;

/// Errors raised while resolving a body position.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum EphemerisError {
    /// The epoch lies outside the provider's supported range.
    #[error("{body} at JD {jd_tt} is outside the supported range [{start_jd}, {end_jd}]")]
    OutOfRange {
        body: Body,
        jd_tt: f64,
        start_jd: f64,
        end_jd: f64,
    },
    /// The provider carries no data for this body.
    #[error("no ephemeris data for {0}")]
    UnsupportedBody(Body),
    /// NaN or infinite epoch.
    #[error("epoch must be finite")]
    NonFiniteEpoch,
    /// The provider produced NaN or infinite values.
    #[error("{body} at JD {jd_tt}: non-finite position")]
    NonFinitePosition { body: Body, jd_tt: f64 },
    /// The provider did not answer within its deadline.
    #[error("{body} at JD {jd_tt}: provider timed out after {timeout_ms} ms")]
    Timeout { body: Body, jd_tt: f64, timeout_ms: u64 },
    /// Provider options are inconsistent.
    #[error("invalid provider configuration: {0}")]
    InvalidConfig(&'static str),
    /// A Chebyshev table could not be built or loaded.
    #[error("table load error: {0}")]
    TableLoad(String),
    /// A Chebyshev table violates its structural invariants.
    #[error("invalid table: {0}")]
    InvalidTable(&'static str),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<std::io::Error> for EphemerisError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for EphemerisError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}
