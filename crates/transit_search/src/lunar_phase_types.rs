//! Lunar phase buckets and lunation contacts.

use serde::{Deserialize, Serialize};

use crate::natal::Point;

/// How finely the synodic month is bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhaseScheme {
    /// New, first quarter, full, last quarter.
    #[default]
    Four,
    /// The four principal phases plus crescents and gibbous phases.
    Eight,
}

/// Phase of the Moon, keyed by the Sun-Moon elongation at which it begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LunarPhase {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

const FOUR_PHASES: [LunarPhase; 4] = [
    LunarPhase::NewMoon,
    LunarPhase::FirstQuarter,
    LunarPhase::FullMoon,
    LunarPhase::LastQuarter,
];

const EIGHT_PHASES: [LunarPhase; 8] = [
    LunarPhase::NewMoon,
    LunarPhase::WaxingCrescent,
    LunarPhase::FirstQuarter,
    LunarPhase::WaxingGibbous,
    LunarPhase::FullMoon,
    LunarPhase::WaningGibbous,
    LunarPhase::LastQuarter,
    LunarPhase::WaningCrescent,
];

impl PhaseScheme {
    /// Phases in order of increasing start elongation.
    pub fn phases(self) -> &'static [LunarPhase] {
        match self {
            Self::Four => &FOUR_PHASES,
            Self::Eight => &EIGHT_PHASES,
        }
    }

    /// Bucket containing `elongation_deg` (in [0, 360)).
    pub fn bucket(self, elongation_deg: f64) -> LunarPhase {
        let phases = self.phases();
        let width = 360.0 / phases.len() as f64;
        let idx = ((elongation_deg.rem_euclid(360.0) / width).floor() as usize).min(phases.len() - 1);
        phases[idx]
    }
}

impl LunarPhase {
    /// Elongation at which the phase begins.
    pub const fn start_elongation_deg(self) -> f64 {
        match self {
            Self::NewMoon => 0.0,
            Self::WaxingCrescent => 45.0,
            Self::FirstQuarter => 90.0,
            Self::WaxingGibbous => 135.0,
            Self::FullMoon => 180.0,
            Self::WaningGibbous => 225.0,
            Self::LastQuarter => 270.0,
            Self::WaningCrescent => 315.0,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::NewMoon => "New Moon",
            Self::WaxingCrescent => "Waxing Crescent",
            Self::FirstQuarter => "First Quarter",
            Self::WaxingGibbous => "Waxing Gibbous",
            Self::FullMoon => "Full Moon",
            Self::WaningGibbous => "Waning Gibbous",
            Self::LastQuarter => "Last Quarter",
            Self::WaningCrescent => "Waning Crescent",
        }
    }

    /// New or full moon.
    pub const fn is_syzygy(self) -> bool {
        matches!(self, Self::NewMoon | Self::FullMoon)
    }
}

impl std::fmt::Display for LunarPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A natal point close to the Moon at a phase change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LunarContact {
    pub target: Point,
    pub target_longitude_deg: f64,
    pub orb_deg: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_phase_buckets() {
        let s = PhaseScheme::Four;
        assert_eq!(s.bucket(0.0), LunarPhase::NewMoon);
        assert_eq!(s.bucket(89.9), LunarPhase::NewMoon);
        assert_eq!(s.bucket(90.0), LunarPhase::FirstQuarter);
        assert_eq!(s.bucket(180.0), LunarPhase::FullMoon);
        assert_eq!(s.bucket(359.9), LunarPhase::LastQuarter);
    }

    #[test]
    fn eight_phase_buckets() {
        let s = PhaseScheme::Eight;
        assert_eq!(s.bucket(44.0), LunarPhase::NewMoon);
        assert_eq!(s.bucket(46.0), LunarPhase::WaxingCrescent);
        assert_eq!(s.bucket(316.0), LunarPhase::WaningCrescent);
    }

    #[test]
    fn bucket_start_matches_phase() {
        for scheme in [PhaseScheme::Four, PhaseScheme::Eight] {
            for &p in scheme.phases() {
                assert_eq!(scheme.bucket(p.start_elongation_deg()), p);
            }
        }
    }
}
