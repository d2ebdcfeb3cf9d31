//! Ephemeris boundary for the transit scanner.
//!
//! This crate provides:
//! - The body catalogue and Julian Date helpers
//! - Ecliptic frame math (obliquity, precession, nutation, aberration)
//! - Zodiac sign decomposition and DMS formatting
//! - The [`EphemerisProvider`] trait with an explicit [`PrecisionMode`]
//! - An analytic provider, a Chebyshev-table provider and a deadline wrapper

pub mod analytic;
pub mod body;
pub mod chebyshev;
pub mod error;
pub mod frames;
pub mod julian;
pub mod provider;
pub mod timeout;
pub mod zodiac;

pub use analytic::{ANALYTIC_END_JD, ANALYTIC_START_JD, AnalyticEphemeris};
pub use body::{ALL_BODIES, Body};
pub use chebyshev::{ChebyshevEphemeris, ChebyshevTable, FitConfig};
pub use error::EphemerisError;
pub use julian::{
    DEFAULT_DELTA_T_SECONDS, J2000_JD, calendar_to_jd, datetime_to_jd, jd_to_calendar,
    jd_to_centuries, jd_to_datetime,
};
pub use provider::{
    Center, EclipticPosition, EphemerisProvider, GeoLocation, PositionConfig, PositionKind,
    PrecisionMode,
};
pub use timeout::DeadlineProvider;
pub use zodiac::{
    ALL_SIGNS, Dms, SignPosition, ZodiacSign, deg_to_dms, format_dms, format_position,
    normalize_360, sign_position,
};
