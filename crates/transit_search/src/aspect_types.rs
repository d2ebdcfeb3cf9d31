//! Aspect kinds, orbs and the validated aspect table.

use serde::{Deserialize, Serialize};
use transit_ephem::Body;

use crate::error::ScanError;
use crate::natal::Point;

/// Angular relationship between two points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectKind {
    Conjunction,
    SemiSextile,
    SemiSquare,
    Sextile,
    Square,
    Trine,
    Sesquiquadrate,
    Quincunx,
    Opposition,
}

pub const ALL_ASPECTS: [AspectKind; 9] = [
    AspectKind::Conjunction,
    AspectKind::SemiSextile,
    AspectKind::SemiSquare,
    AspectKind::Sextile,
    AspectKind::Square,
    AspectKind::Trine,
    AspectKind::Sesquiquadrate,
    AspectKind::Quincunx,
    AspectKind::Opposition,
];

/// Traditional quality of an aspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Harmony {
    Neutral,
    Harmonious,
    Tension,
}

impl Harmony {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Harmonious => "harmonious",
            Self::Tension => "tension",
        }
    }
}

impl AspectKind {
    pub const fn angle_deg(self) -> f64 {
        match self {
            Self::Conjunction => 0.0,
            Self::SemiSextile => 30.0,
            Self::SemiSquare => 45.0,
            Self::Sextile => 60.0,
            Self::Square => 90.0,
            Self::Trine => 120.0,
            Self::Sesquiquadrate => 135.0,
            Self::Quincunx => 150.0,
            Self::Opposition => 180.0,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Conjunction => "Conjunction",
            Self::SemiSextile => "Semi-sextile",
            Self::SemiSquare => "Semi-square",
            Self::Sextile => "Sextile",
            Self::Square => "Square",
            Self::Trine => "Trine",
            Self::Sesquiquadrate => "Sesquiquadrate",
            Self::Quincunx => "Quincunx",
            Self::Opposition => "Opposition",
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Conjunction => "☌",
            Self::SemiSextile => "⚺",
            Self::SemiSquare => "∠",
            Self::Sextile => "⚹",
            Self::Square => "□",
            Self::Trine => "△",
            Self::Sesquiquadrate => "⚼",
            Self::Quincunx => "⚻",
            Self::Opposition => "☍",
        }
    }

    /// Ptolemaic aspects.
    pub const fn is_major(self) -> bool {
        matches!(
            self,
            Self::Conjunction | Self::Sextile | Self::Square | Self::Trine | Self::Opposition
        )
    }

    /// Conjunction, square or opposition.
    pub const fn is_hard(self) -> bool {
        matches!(self, Self::Conjunction | Self::Square | Self::Opposition)
    }

    pub const fn harmony(self) -> Harmony {
        match self {
            Self::Conjunction => Harmony::Neutral,
            Self::SemiSextile | Self::Sextile | Self::Trine => Harmony::Harmonious,
            Self::SemiSquare
            | Self::Square
            | Self::Sesquiquadrate
            | Self::Quincunx
            | Self::Opposition => Harmony::Tension,
        }
    }

    /// 0° and 180° have a single exact configuration; the others have one
    /// on each side of the target.
    pub(crate) const fn is_one_sided(self) -> bool {
        matches!(self, Self::Conjunction | Self::Opposition)
    }
}

impl std::fmt::Display for AspectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Allowed deviation from the exact angle, per side.
///
/// Accepts either a bare number (symmetric) or
/// `{ applying = .., separating = .. }` in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "OrbSpec")]
pub struct Orb {
    pub applying: f64,
    pub separating: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OrbSpec {
    Symmetric(f64),
    Asymmetric { applying: f64, separating: f64 },
}

impl From<OrbSpec> for Orb {
    fn from(spec: OrbSpec) -> Self {
        match spec {
            OrbSpec::Symmetric(deg) => Self::symmetric(deg),
            OrbSpec::Asymmetric {
                applying,
                separating,
            } => Self {
                applying,
                separating,
            },
        }
    }
}

impl Orb {
    pub const fn symmetric(deg: f64) -> Self {
        Self {
            applying: deg,
            separating: deg,
        }
    }

    /// Limit for the current direction of motion.
    pub fn limit(&self, applying: bool) -> f64 {
        if applying { self.applying } else { self.separating }
    }

    /// Widest of the two sides.
    pub fn max(&self) -> f64 {
        self.applying.max(self.separating)
    }

    fn validate(&self) -> Result<(), String> {
        for (side, v) in [("applying", self.applying), ("separating", self.separating)] {
            if !v.is_finite() || v < 0.0 {
                return Err(format!("{side} orb must be finite and non-negative, got {v}"));
            }
            if v >= 90.0 {
                return Err(format!("{side} orb must be below 90°, got {v}"));
            }
        }
        Ok(())
    }
}

/// Orb replacing the default for one (moving body, target) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbOverride {
    pub moving: Body,
    pub target: Point,
    pub orb: Orb,
}

/// One configured aspect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectDefinition {
    pub kind: AspectKind,
    pub orb: Orb,
    #[serde(default)]
    pub overrides: Vec<OrbOverride>,
}

impl AspectDefinition {
    pub fn new(kind: AspectKind, orb: f64) -> Self {
        Self {
            kind,
            orb: Orb::symmetric(orb),
            overrides: Vec::new(),
        }
    }

    pub fn with_override(mut self, moving: Body, target: Point, orb: Orb) -> Self {
        self.overrides.push(OrbOverride {
            moving,
            target,
            orb,
        });
        self
    }

    /// Effective orb for a pair.
    pub fn orb_for(&self, moving: Body, target: Point) -> Orb {
        self.overrides
            .iter()
            .find(|o| o.moving == moving && o.target == target)
            .map_or(self.orb, |o| o.orb)
    }
}

/// Validated set of aspect definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct AspectTable {
    definitions: Vec<AspectDefinition>,
}

impl AspectTable {
    /// Validate a list of definitions.
    ///
    /// Duplicate aspect kinds, duplicate overrides and invalid orbs are
    /// configuration errors. Orb windows of different kinds may overlap.
    pub fn new(definitions: Vec<AspectDefinition>) -> Result<Self, ScanError> {
        let mut kinds = Vec::with_capacity(definitions.len());
        for def in &definitions {
            if kinds.contains(&def.kind) {
                return Err(ScanError::config(format!("duplicate aspect {}", def.kind)));
            }
            kinds.push(def.kind);
            def.orb
                .validate()
                .map_err(|e| ScanError::config(format!("{}: {e}", def.kind)))?;
            for (i, o) in def.overrides.iter().enumerate() {
                o.orb.validate().map_err(|e| {
                    ScanError::config(format!("{} override {} -> {}: {e}", def.kind, o.moving, o.target))
                })?;
                if def.overrides[..i]
                    .iter()
                    .any(|p| p.moving == o.moving && p.target == o.target)
                {
                    return Err(ScanError::config(format!(
                        "duplicate {} override for {} -> {}",
                        def.kind, o.moving, o.target
                    )));
                }
            }
        }
        Ok(Self { definitions })
    }

    /// Conjunction, opposition and square at 3°, trine and sextile at 2°.
    pub fn default_major() -> Self {
        Self {
            definitions: default_major_definitions(),
        }
    }

    pub fn definitions(&self) -> &[AspectDefinition] {
        &self.definitions
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }
}

pub fn default_major_definitions() -> Vec<AspectDefinition> {
    vec![
        AspectDefinition::new(AspectKind::Conjunction, 3.0),
        AspectDefinition::new(AspectKind::Opposition, 3.0),
        AspectDefinition::new(AspectKind::Square, 3.0),
        AspectDefinition::new(AspectKind::Trine, 2.0),
        AspectDefinition::new(AspectKind::Sextile, 2.0),
    ]
}
