//! Solar and lunar eclipses at the syzygies.
//!
//! Classification uses the geocentric shadow geometry at the instant of the
//! New or Full Moon: the Moon's ecliptic latitude is compared with sums and
//! differences of apparent radii and horizontal parallaxes derived from the
//! Sun and Moon distances.

use serde::{Deserialize, Serialize};

const AU_KM: f64 = 149_597_870.7;
const EARTH_RADIUS_KM: f64 = 6_378.137;
const MOON_RADIUS_KM: f64 = 1_737.4;
const SUN_RADIUS_KM: f64 = 696_000.0;

/// Atmospheric enlargement of the Earth's shadow (Danjon).
const SHADOW_ENLARGEMENT: f64 = 1.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EclipseKind {
    Solar,
    Lunar,
}

impl EclipseKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Solar => "Solar",
            Self::Lunar => "Lunar",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EclipseType {
    Total,
    /// Solar only: the Moon's disk is smaller than the Sun's.
    Annular,
    Partial,
    /// Lunar only: the Moon misses the umbra.
    Penumbral,
}

impl EclipseType {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Total => "Total",
            Self::Annular => "Annular",
            Self::Partial => "Partial",
            Self::Penumbral => "Penumbral",
        }
    }
}

impl std::fmt::Display for EclipseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Angle subtended by `radius_km` at `distance_au`, in degrees.
fn subtended_deg(radius_km: f64, distance_au: f64) -> f64 {
    (radius_km / (distance_au * AU_KM)).min(1.0).asin().to_degrees()
}

/// Apparent radii and parallaxes at one syzygy.
struct Disks {
    beta: f64,
    moon_radius: f64,
    sun_radius: f64,
    moon_parallax: f64,
    sun_parallax: f64,
}

impl Disks {
    fn new(moon_latitude_deg: f64, moon_distance_au: f64, sun_distance_au: f64) -> Option<Self> {
        if !(moon_distance_au > 0.0 && sun_distance_au > 0.0) {
            return None;
        }
        Some(Self {
            beta: moon_latitude_deg.abs(),
            moon_radius: subtended_deg(MOON_RADIUS_KM, moon_distance_au),
            sun_radius: subtended_deg(SUN_RADIUS_KM, sun_distance_au),
            moon_parallax: subtended_deg(EARTH_RADIUS_KM, moon_distance_au),
            sun_parallax: subtended_deg(EARTH_RADIUS_KM, sun_distance_au),
        })
    }
}

/// Solar eclipse at a New Moon, if any.
///
/// Central (total or annular) when the shadow axis meets the Earth, partial
/// while the penumbra still touches it. Distances of zero mean the provider
/// carries none and yield `None`.
pub fn solar_eclipse(
    moon_latitude_deg: f64,
    moon_distance_au: f64,
    sun_distance_au: f64,
) -> Option<EclipseType> {
    let d = Disks::new(moon_latitude_deg, moon_distance_au, sun_distance_au)?;
    let parallax = d.moon_parallax - d.sun_parallax;
    if d.beta >= parallax + d.moon_radius + d.sun_radius {
        None
    } else if d.beta < parallax {
        Some(if d.moon_radius >= d.sun_radius {
            EclipseType::Total
        } else {
            EclipseType::Annular
        })
    } else {
        Some(EclipseType::Partial)
    }
}

/// Lunar eclipse at a Full Moon, if any.
pub fn lunar_eclipse(
    moon_latitude_deg: f64,
    moon_distance_au: f64,
    sun_distance_au: f64,
) -> Option<EclipseType> {
    let d = Disks::new(moon_latitude_deg, moon_distance_au, sun_distance_au)?;
    let umbra = SHADOW_ENLARGEMENT * d.moon_parallax + d.sun_parallax - d.sun_radius;
    let penumbra = SHADOW_ENLARGEMENT * d.moon_parallax + d.sun_parallax + d.sun_radius;
    if d.beta + d.moon_radius <= umbra {
        Some(EclipseType::Total)
    } else if d.beta - d.moon_radius < umbra {
        Some(EclipseType::Partial)
    } else if d.beta - d.moon_radius < penumbra {
        Some(EclipseType::Penumbral)
    } else {
        None
    }
}
