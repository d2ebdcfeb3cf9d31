//! Bodies sampled by the transit engine.
//!
//! The catalogue is the ten classical astrological bodies. Codes follow the
//! NAIF convention so tables fitted from SPK-backed sources keep their ids.

use serde::{Deserialize, Serialize};

/// A body whose ecliptic position can be requested from a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Body {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
}

/// All bodies in traditional order (luminaries first, then by distance).
pub const ALL_BODIES: [Body; 10] = [
    Body::Sun,
    Body::Moon,
    Body::Mercury,
    Body::Venus,
    Body::Mars,
    Body::Jupiter,
    Body::Saturn,
    Body::Uranus,
    Body::Neptune,
    Body::Pluto,
];

impl Body {
    /// Position in [`ALL_BODIES`], usable as a dense array index.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// NAIF-style body code.
    pub const fn code(self) -> i32 {
        match self {
            Self::Sun => 10,
            Self::Moon => 301,
            Self::Mercury => 199,
            Self::Venus => 299,
            Self::Mars => 499,
            Self::Jupiter => 599,
            Self::Saturn => 699,
            Self::Uranus => 799,
            Self::Neptune => 899,
            Self::Pluto => 999,
        }
    }

    /// Convert a NAIF-style body code into a [`Body`].
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            10 => Some(Self::Sun),
            301 => Some(Self::Moon),
            199 => Some(Self::Mercury),
            299 => Some(Self::Venus),
            499 => Some(Self::Mars),
            599 => Some(Self::Jupiter),
            699 => Some(Self::Saturn),
            799 => Some(Self::Uranus),
            899 => Some(Self::Neptune),
            999 => Some(Self::Pluto),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Sun => "Sun",
            Self::Moon => "Moon",
            Self::Mercury => "Mercury",
            Self::Venus => "Venus",
            Self::Mars => "Mars",
            Self::Jupiter => "Jupiter",
            Self::Saturn => "Saturn",
            Self::Uranus => "Uranus",
            Self::Neptune => "Neptune",
            Self::Pluto => "Pluto",
        }
    }

    /// Astronomical glyph.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Sun => "☉",
            Self::Moon => "☽",
            Self::Mercury => "☿",
            Self::Venus => "♀",
            Self::Mars => "♂",
            Self::Jupiter => "♃",
            Self::Saturn => "♄",
            Self::Uranus => "♅",
            Self::Neptune => "♆",
            Self::Pluto => "♇",
        }
    }

    /// Case-insensitive lookup by English name.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        ALL_BODIES
            .iter()
            .copied()
            .find(|b| b.name().eq_ignore_ascii_case(&lower))
    }

    /// Sun or Moon.
    pub const fn is_luminary(self) -> bool {
        matches!(self, Self::Sun | Self::Moon)
    }

    /// Jupiter and beyond: bodies whose transits last weeks to months.
    pub const fn is_slow(self) -> bool {
        matches!(
            self,
            Self::Jupiter | Self::Saturn | Self::Uranus | Self::Neptune | Self::Pluto
        )
    }

    /// Mean geocentric motion in degrees per day (360 / orbital period,
    /// apparent solar period for the Sun, sidereal month for the Moon).
    pub const fn mean_daily_motion_deg(self) -> f64 {
        match self {
            Self::Sun => 0.985_647,
            Self::Moon => 13.176_358,
            Self::Mercury => 4.092_339,
            Self::Venus => 1.602_131,
            Self::Mars => 0.524_033,
            Self::Jupiter => 0.083_091,
            Self::Saturn => 0.033_460,
            Self::Uranus => 0.011_731,
            Self::Neptune => 0.005_982,
            Self::Pluto => 0.003_975,
        }
    }

    /// Coarsest sampling cadence that still resolves every state change of
    /// this body against a 1° orb.
    ///
    /// Geocentric speeds exceed the mean motion near perigee or inferior
    /// conjunction, so the value keeps a safety factor of roughly two.
    pub const fn recommended_cadence_hours(self) -> f64 {
        match self {
            Self::Moon => 1.0,
            Self::Mercury => 4.0,
            Self::Venus => 6.0,
            Self::Sun | Self::Mars => 12.0,
            Self::Jupiter
            | Self::Saturn
            | Self::Uranus
            | Self::Neptune
            | Self::Pluto => 24.0,
        }
    }
}

impl std::fmt::Display for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_roundtrip() {
        for body in ALL_BODIES {
            assert_eq!(Body::from_code(body.code()), Some(body));
        }
        assert_eq!(Body::from_code(399), None);
    }

    #[test]
    fn index_matches_catalogue_order() {
        for (i, body) in ALL_BODIES.iter().enumerate() {
            assert_eq!(body.index(), i);
        }
    }

    #[test]
    fn name_lookup_is_case_insensitive() {
        assert_eq!(Body::from_name("venus"), Some(Body::Venus));
        assert_eq!(Body::from_name(" SATURN "), Some(Body::Saturn));
        assert_eq!(Body::from_name("ceres"), None);
    }

    #[test]
    fn slow_and_luminary_partitions() {
        assert!(Body::Sun.is_luminary());
        assert!(Body::Moon.is_luminary());
        assert!(!Body::Mars.is_luminary());
        assert!(Body::Jupiter.is_slow());
        assert!(!Body::Mars.is_slow());
    }

    #[test]
    fn moon_needs_finest_cadence() {
        let finest = ALL_BODIES
            .iter()
            .map(|b| b.recommended_cadence_hours())
            .fold(f64::INFINITY, f64::min);
        assert_eq!(finest, Body::Moon.recommended_cadence_hours());
    }

    #[test]
    fn serde_lowercase() {
        let json = serde_json::to_string(&Body::Jupiter).unwrap();
        assert_eq!(json, "\"jupiter\"");
        let back: Body = serde_json::from_str("\"pluto\"").unwrap();
        assert_eq!(back, Body::Pluto);
    }
}
