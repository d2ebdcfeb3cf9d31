//! Aspect matcher: separation, orb and applying/separating classification
//! for one moving point against one target.

use serde::Serialize;

use crate::aspect_types::{AspectDefinition, AspectKind};
use crate::error::ScanError;
use crate::natal::PointRef;
use crate::search_util::normalize_to_pm180;

/// A point's longitude and speed at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointSample {
    pub point: PointRef,
    pub longitude_deg: f64,
    /// Zero for natal points.
    pub speed_deg_per_day: f64,
}

impl PointSample {
    pub fn new(point: PointRef, longitude_deg: f64, speed_deg_per_day: f64) -> Self {
        Self {
            point,
            longitude_deg,
            speed_deg_per_day,
        }
    }
}

/// Geometry of a pair relative to one aspect angle, independent of orbs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectGeometry {
    /// moving - target, normalized to (-180, +180].
    pub separation_deg: f64,
    /// |separation| - angle; negative inside the exact angle.
    pub deviation_deg: f64,
    /// Distance to exactness is shrinking.
    pub applying: bool,
}

impl AspectGeometry {
    pub fn orb_deg(&self) -> f64 {
        self.deviation_deg.abs()
    }
}

/// An aspect currently in orb.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AspectMatch {
    pub kind: AspectKind,
    pub separation_deg: f64,
    /// Current distance from exactness in degrees.
    pub orb_deg: f64,
    /// Limit in effect for the current direction of motion.
    pub orb_limit_deg: f64,
    pub applying: bool,
    pub exact: bool,
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn check_pair(moving: &PointSample, target: &PointSample) -> Result<(), ScanError> {
    if moving.point == target.point {
        return Err(ScanError::InvalidAspectRequest(format!(
            "{} cannot aspect itself",
            moving.point
        )));
    }
    let finite = [
        moving.longitude_deg,
        moving.speed_deg_per_day,
        target.longitude_deg,
        target.speed_deg_per_day,
    ]
    .iter()
    .all(|v| v.is_finite());
    if !finite {
        return Err(ScanError::InvalidAspectRequest(format!(
            "non-finite input for {} -> {}",
            moving.point, target.point
        )));
    }
    Ok(())
}

/// Separation, deviation and direction of motion against `kind`.
///
/// The distance to exactness is `|pm180(m - t)| - A`; its rate of change
/// has the sign of `sign(dev) * sign(sep) * (v_m - v_t)`.
pub fn geometry(moving: &PointSample, target: &PointSample, kind: AspectKind) -> AspectGeometry {
    let separation_deg = normalize_to_pm180(moving.longitude_deg - target.longitude_deg);
    let deviation_deg = separation_deg.abs() - kind.angle_deg();
    let relative_speed = moving.speed_deg_per_day - target.speed_deg_per_day;
    let rate = sign(deviation_deg) * sign(separation_deg) * relative_speed;
    AspectGeometry {
        separation_deg,
        deviation_deg,
        applying: rate < 0.0,
    }
}

/// Match one aspect definition; `None` when outside the orb.
///
/// The orb limit is the definition's applying or separating side, after
/// any override for the (moving, target) pair. A distance within
/// `epsilon_deg` is exact and always in orb.
pub fn match_aspect(
    moving: &PointSample,
    target: &PointSample,
    def: &AspectDefinition,
    epsilon_deg: f64,
) -> Result<Option<AspectMatch>, ScanError> {
    check_pair(moving, target)?;
    let orb = match moving.point.point.body() {
        Some(body) => def.orb_for(body, target.point.point),
        None => def.orb,
    };
    let geo = geometry(moving, target, def.kind);
    let orb_deg = geo.orb_deg();
    let exact = orb_deg <= epsilon_deg;
    let limit = orb.limit(geo.applying);
    if !exact && orb_deg > limit {
        return Ok(None);
    }
    Ok(Some(AspectMatch {
        kind: def.kind,
        separation_deg: geo.separation_deg,
        orb_deg,
        orb_limit_deg: limit,
        applying: geo.applying && !exact,
        exact,
    }))
}

/// Best in-orb aspect among `defs`: the smallest current orb wins, the
/// earlier definition on a tie. Returns the definition index with it.
pub fn best_match(
    moving: &PointSample,
    target: &PointSample,
    defs: &[AspectDefinition],
    epsilon_deg: f64,
) -> Result<Option<(usize, AspectMatch)>, ScanError> {
    let mut best: Option<(usize, AspectMatch)> = None;
    for (i, def) in defs.iter().enumerate() {
        if let Some(m) = match_aspect(moving, target, def, epsilon_deg)? {
            if best.is_none_or(|(_, b)| m.orb_deg < b.orb_deg) {
                best = Some((i, m));
            }
        }
    }
    Ok(best)
}
