//! Secondary progressions: one day after birth per year of life.

use transit_ephem::Body;

use crate::error::ScanError;
use crate::sampler::{BodyPosition, PositionSampler};

/// Tropical year used to scale real time into progressed time.
pub const PROGRESSION_DAYS_PER_YEAR: f64 = 365.242_19;

/// Progressed Julian Date for the real instant `jd_utc`.
pub fn progressed_jd(birth_jd: f64, jd_utc: f64) -> f64 {
    birth_jd + (jd_utc - birth_jd) / PROGRESSION_DAYS_PER_YEAR
}

/// Progressed position of `body` at the real instant `jd_utc`.
///
/// Speed is expressed per real day, so it is the ephemeris speed divided by
/// [`PROGRESSION_DAYS_PER_YEAR`].
pub fn progressed_position(
    sampler: &PositionSampler,
    birth_jd: f64,
    body: Body,
    jd_utc: f64,
) -> Result<BodyPosition, ScanError> {
    let pos = sampler.position_at(body, progressed_jd(birth_jd, jd_utc))?;
    Ok(BodyPosition::new(
        body,
        pos.longitude_deg,
        pos.speed_deg_per_day / PROGRESSION_DAYS_PER_YEAR,
    )
    .with_ecliptic(pos.latitude_deg, pos.distance_au))
}
