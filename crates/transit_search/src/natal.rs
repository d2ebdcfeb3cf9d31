//! Natal chart input: birth instant, natal longitudes and house cusps.
//!
//! The chart is precomputed elsewhere and read-only for a whole scan.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use transit_ephem::{ALL_BODIES, Body, ZodiacSign, datetime_to_jd, normalize_360, sign_position};

use crate::error::ScanError;

/// The four chart angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Angle {
    Ascendant,
    ImumCoeli,
    Descendant,
    Midheaven,
}

pub const ALL_ANGLES: [Angle; 4] = [
    Angle::Ascendant,
    Angle::Midheaven,
    Angle::Descendant,
    Angle::ImumCoeli,
];

impl Angle {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ascendant => "Ascendant",
            Self::ImumCoeli => "Imum Coeli",
            Self::Descendant => "Descendant",
            Self::Midheaven => "Midheaven",
        }
    }

    pub const fn abbreviation(self) -> &'static str {
        match self {
            Self::Ascendant => "ASC",
            Self::ImumCoeli => "IC",
            Self::Descendant => "DSC",
            Self::Midheaven => "MC",
        }
    }

    /// House whose cusp defines the angle.
    pub const fn house(self) -> u8 {
        match self {
            Self::Ascendant => 1,
            Self::ImumCoeli => 4,
            Self::Descendant => 7,
            Self::Midheaven => 10,
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        match key {
            "ascendant" | "asc" => Some(Self::Ascendant),
            "midheaven" | "mc" => Some(Self::Midheaven),
            "descendant" | "dsc" => Some(Self::Descendant),
            "imum_coeli" | "ic" => Some(Self::ImumCoeli),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Ascendant => "ascendant",
            Self::ImumCoeli => "imum_coeli",
            Self::Descendant => "descendant",
            Self::Midheaven => "midheaven",
        }
    }
}

/// A chart point: a body or an angle.
///
/// Serialized as a lowercase key (`"venus"`, `"ascendant"`, `"mc"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Point {
    Body(Body),
    Angle(Angle),
}

impl Point {
    pub fn name(self) -> &'static str {
        match self {
            Self::Body(b) => b.name(),
            Self::Angle(a) => a.name(),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Body(b) => b.symbol(),
            Self::Angle(a) => a.abbreviation(),
        }
    }

    pub fn body(self) -> Option<Body> {
        match self {
            Self::Body(b) => Some(b),
            Self::Angle(_) => None,
        }
    }

    pub fn is_angle(self) -> bool {
        matches!(self, Self::Angle(_))
    }
}

impl TryFrom<String> for Point {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let key = value.trim().to_ascii_lowercase();
        if let Some(angle) = Angle::from_key(&key) {
            return Ok(Self::Angle(angle));
        }
        Body::from_name(&key)
            .map(Self::Body)
            .ok_or_else(|| format!("unknown chart point '{value}'"))
    }
}

impl From<Point> for String {
    fn from(p: Point) -> Self {
        match p {
            Point::Body(b) => b.name().to_ascii_lowercase(),
            Point::Angle(a) => a.key().to_string(),
        }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Which chart a point belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Natal,
    Transiting,
    Progressed,
}

impl Layer {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Natal => "natal",
            Self::Transiting => "transiting",
            Self::Progressed => "progressed",
        }
    }
}

/// A point in a specific chart layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PointRef {
    pub layer: Layer,
    pub point: Point,
}

impl PointRef {
    pub const fn natal(point: Point) -> Self {
        Self {
            layer: Layer::Natal,
            point,
        }
    }

    pub const fn transiting(body: Body) -> Self {
        Self {
            layer: Layer::Transiting,
            point: Point::Body(body),
        }
    }

    pub const fn progressed(body: Body) -> Self {
        Self {
            layer: Layer::Progressed,
            point: Point::Body(body),
        }
    }
}

impl std::fmt::Display for PointRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.layer.name(), self.point.name())
    }
}

/// Twelve house cusps, increasing modulo 360° around the circle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HouseCusps([f64; 12]);

impl HouseCusps {
    /// Validate and normalize cusp longitudes.
    ///
    /// Rejects non-finite values, coincident cusps and any ordering that
    /// does not wind exactly once around the circle.
    pub fn new(cusps: [f64; 12]) -> Result<Self, ScanError> {
        if let Some(i) = cusps.iter().position(|c| !c.is_finite()) {
            return Err(ScanError::natal(format!("cusp {} is not finite", i + 1)));
        }
        let cusps = cusps.map(normalize_360);
        let mut total = 0.0;
        for i in 0..12 {
            let arc = normalize_360(cusps[(i + 1) % 12] - cusps[i]);
            if arc <= 1e-9 {
                return Err(ScanError::natal(format!(
                    "cusps {} and {} coincide",
                    i + 1,
                    (i + 1) % 12 + 1
                )));
            }
            total += arc;
        }
        if (total - 360.0).abs() > 1e-6 {
            return Err(ScanError::natal(
                "cusps are not monotonically increasing around the circle",
            ));
        }
        Ok(Self(cusps))
    }

    /// Equal houses starting at `ascendant_deg`.
    pub fn equal(ascendant_deg: f64) -> Result<Self, ScanError> {
        Self::new(std::array::from_fn(|i| ascendant_deg + 30.0 * i as f64))
    }

    /// Cusp of `house` (1-12).
    pub fn cusp(&self, house: u8) -> f64 {
        self.0[(usize::from(house).clamp(1, 12)) - 1]
    }

    pub fn as_array(&self) -> &[f64; 12] {
        &self.0
    }
}

impl TryFrom<Vec<f64>> for HouseCusps {
    type Error = ScanError;

    fn try_from(v: Vec<f64>) -> Result<Self, Self::Error> {
        let arr: [f64; 12] = v
            .try_into()
            .map_err(|v: Vec<f64>| ScanError::natal(format!("expected 12 cusps, got {}", v.len())))?;
        Self::new(arr)
    }
}

/// File representation of a natal chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct NatalFile {
    birth: DateTime<Utc>,
    #[serde(default)]
    bodies: BTreeMap<Body, f64>,
    cusps: Vec<f64>,
}

/// Natal chart consumed by a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct NatalContext {
    birth: DateTime<Utc>,
    bodies: BTreeMap<Body, f64>,
    cusps: HouseCusps,
}

impl NatalContext {
    pub fn new(
        birth: DateTime<Utc>,
        bodies: BTreeMap<Body, f64>,
        cusps: HouseCusps,
    ) -> Result<Self, ScanError> {
        let mut normalized = BTreeMap::new();
        for (body, lon) in bodies {
            if !lon.is_finite() {
                return Err(ScanError::natal(format!("natal {body} longitude is not finite")));
            }
            normalized.insert(body, normalize_360(lon));
        }
        Ok(Self {
            birth,
            bodies: normalized,
            cusps,
        })
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ScanError> {
        let file: NatalFile =
            toml::from_str(s).map_err(|e| ScanError::natal(e.to_string()))?;
        Self::from_file(file)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ScanError> {
        let file: NatalFile =
            serde_json::from_str(s).map_err(|e| ScanError::natal(e.to_string()))?;
        Self::from_file(file)
    }

    /// Load from a `.json` file, or TOML for any other extension.
    pub fn load(path: &Path) -> Result<Self, ScanError> {
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_toml_str(&text),
        }
    }

    fn from_file(file: NatalFile) -> Result<Self, ScanError> {
        let cusps = HouseCusps::try_from(file.cusps)?;
        Self::new(file.birth, file.bodies, cusps)
    }

    pub fn to_json_string(&self) -> Result<String, ScanError> {
        let file = NatalFile {
            birth: self.birth,
            bodies: self.bodies.clone(),
            cusps: self.cusps.0.to_vec(),
        };
        serde_json::to_string_pretty(&file).map_err(|e| ScanError::natal(e.to_string()))
    }

    pub fn birth(&self) -> DateTime<Utc> {
        self.birth
    }

    pub fn birth_jd(&self) -> f64 {
        datetime_to_jd(&self.birth)
    }

    pub fn cusps(&self) -> &HouseCusps {
        &self.cusps
    }

    pub fn body_longitude(&self, body: Body) -> Option<f64> {
        self.bodies.get(&body).copied()
    }

    pub fn angle(&self, angle: Angle) -> f64 {
        self.cusps.cusp(angle.house())
    }

    pub fn longitude(&self, point: Point) -> Option<f64> {
        match point {
            Point::Body(b) => self.body_longitude(b),
            Point::Angle(a) => Some(self.angle(a)),
        }
    }

    pub fn ascendant_sign(&self) -> ZodiacSign {
        sign_position(self.angle(Angle::Ascendant)).sign
    }

    /// Natal points usable as aspect targets, bodies first in catalogue
    /// order, then the angles.
    pub fn targets(&self, include_angles: bool) -> Vec<(Point, f64)> {
        let mut out: Vec<(Point, f64)> = ALL_BODIES
            .iter()
            .filter_map(|&b| self.body_longitude(b).map(|lon| (Point::Body(b), lon)))
            .collect();
        if include_angles {
            out.extend(ALL_ANGLES.iter().map(|&a| (Point::Angle(a), self.angle(a))));
        }
        out
    }
}
