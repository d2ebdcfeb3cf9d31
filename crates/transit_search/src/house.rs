//! House occupancy for a longitude against natal cusps.

use serde::Serialize;
use transit_ephem::{Body, normalize_360};

use crate::natal::HouseCusps;

/// House (1-12) containing `longitude_deg`.
///
/// House n spans cusp n inclusive to cusp n+1 exclusive, going in the
/// direction of increasing longitude; house 12 wraps to cusp 1. The house
/// is the one whose cusp lies the shortest way back along the zodiac, so
/// every longitude maps to exactly one house.
pub fn house_of(longitude_deg: f64, cusps: &HouseCusps) -> u8 {
    let lon = normalize_360(longitude_deg);
    let mut best = 1u8;
    let mut best_offset = f64::INFINITY;
    for (i, &cusp) in cusps.as_array().iter().enumerate() {
        let offset = normalize_360(lon - cusp);
        if offset < best_offset {
            best_offset = offset;
            best = i as u8 + 1;
        }
    }
    best
}

/// Fixed semantic label of a house.
pub const fn house_label(house: u8) -> &'static str {
    match house {
        1 => "Self",
        2 => "Resources",
        3 => "Communication",
        4 => "Home",
        5 => "Creativity",
        6 => "Health",
        7 => "Partnerships",
        8 => "Transformation",
        9 => "Philosophy",
        10 => "Career",
        11 => "Community",
        12 => "Hidden matters",
        _ => "Unknown",
    }
}

/// A body's occupancy of a natal house at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HouseTransit {
    pub body: Body,
    pub longitude_deg: f64,
    pub house: u8,
    pub retrograde: bool,
}
