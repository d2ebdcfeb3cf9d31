//! File-backed positions: per-body Chebyshev segments over unwrapped
//! ecliptic longitude.
//!
//! Evaluation uses the Clenshaw recurrence. Tables are fitted at Chebyshev
//! nodes from any other provider and stored as JSON.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::body::{ALL_BODIES, Body};
use crate::error::EphemerisError;
use crate::provider::{EclipticPosition, EphemerisProvider, PositionConfig, PrecisionMode};
use crate::zodiac::normalize_360;

/// Current on-disk format.
pub const TABLE_FORMAT_VERSION: u32 = 1;

/// Evaluate `sum(c_k * T_k(s))` for `s` in `[-1, 1]`.
pub fn clenshaw(coeffs: &[f64], s: f64) -> f64 {
    match coeffs {
        [] => 0.0,
        [c0] => *c0,
        [c0, rest @ ..] => {
            let two_s = 2.0 * s;
            let (mut b1, mut b2) = (0.0, 0.0);
            for &c in rest.iter().rev() {
                let b = two_s * b1 - b2 + c;
                b2 = b1;
                b1 = b;
            }
            s * b1 - b2 + c0
        }
    }
}

/// Evaluate `sum(c_k * T_k'(s))`, tracking `T_k` and `T_k'` together:
///
/// ```text
/// T_k'(s) = 2 T_{k-1}(s) + 2 s T_{k-1}'(s) - T_{k-2}'(s)
/// ```
pub fn clenshaw_derivative(coeffs: &[f64], s: f64) -> f64 {
    if coeffs.len() <= 1 {
        return 0.0;
    }
    let two_s = 2.0 * s;
    let (mut t2, mut dt2) = (1.0, 0.0);
    let (mut t1, mut dt1) = (s, 1.0);
    let mut sum = coeffs[1];
    for &c in &coeffs[2..] {
        let t = two_s * t1 - t2;
        let dt = 2.0 * t1 + two_s * dt1 - dt2;
        sum += c * dt;
        (t2, t1) = (t1, t);
        (dt2, dt1) = (dt1, dt);
    }
    sum
}

/// Chebyshev coefficients from values sampled at the nodes
/// `cos(pi (k + 1/2) / n)`.
fn fit_coefficients(values_at_nodes: &[f64]) -> Vec<f64> {
    let n = values_at_nodes.len();
    let nf = n as f64;
    (0..n)
        .map(|j| {
            let sum: f64 = values_at_nodes
                .iter()
                .enumerate()
                .map(|(k, f)| {
                    f * (std::f64::consts::PI * j as f64 * (k as f64 + 0.5) / nf).cos()
                })
                .sum();
            let c = 2.0 * sum / nf;
            if j == 0 { c / 2.0 } else { c }
        })
        .collect()
}

/// One interpolation interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start_jd: f64,
    pub end_jd: f64,
    /// Coefficients of unwrapped longitude in degrees.
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    pub dist: Vec<f64>,
}

impl Segment {
    fn normalized_time(&self, jd: f64) -> f64 {
        (2.0 * jd - (self.start_jd + self.end_jd)) / (self.end_jd - self.start_jd)
    }

    fn evaluate(&self, jd: f64) -> EclipticPosition {
        let s = self.normalized_time(jd);
        let scale = 2.0 / (self.end_jd - self.start_jd);
        EclipticPosition {
            longitude_deg: normalize_360(clenshaw(&self.lon, s)),
            latitude_deg: clenshaw(&self.lat, s),
            distance_au: clenshaw(&self.dist, s),
            speed_deg_per_day: clenshaw_derivative(&self.lon, s) * scale,
        }
    }

    fn validate(&self) -> Result<(), &'static str> {
        if !(self.start_jd.is_finite() && self.end_jd.is_finite()) {
            return Err("segment bounds must be finite");
        }
        if self.start_jd >= self.end_jd {
            return Err("segment start must precede its end");
        }
        if self.lon.is_empty() || self.lat.len() != self.lon.len() || self.dist.len() != self.lon.len()
        {
            return Err("segment coefficient arrays must be non-empty and of equal length");
        }
        if self.lon.iter().chain(&self.lat).chain(&self.dist).any(|c| !c.is_finite()) {
            return Err("segment coefficients must be finite");
        }
        Ok(())
    }
}

/// Contiguous segments for one body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySeries {
    pub body: Body,
    pub segments: Vec<Segment>,
}

impl BodySeries {
    fn range(&self) -> Option<(f64, f64)> {
        Some((self.segments.first()?.start_jd, self.segments.last()?.end_jd))
    }

    fn segment_for(&self, jd: f64) -> Option<&Segment> {
        let idx = self.segments.partition_point(|seg| seg.end_jd < jd);
        self.segments.get(idx).filter(|seg| seg.start_jd <= jd)
    }
}

/// Serialized table of fitted segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChebyshevTable {
    pub format_version: u32,
    /// Mode of the provider the table was fitted from.
    pub source_precision: PrecisionMode,
    pub position_config: PositionConfig,
    pub series: Vec<BodySeries>,
}

/// Fitting options for [`ChebyshevTable::fit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitConfig {
    pub segment_days: f64,
    /// Polynomial degree per segment.
    pub degree: usize,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            segment_days: 4.0,
            degree: 13,
        }
    }
}

impl FitConfig {
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.segment_days.is_finite() || self.segment_days <= 0.0 {
            return Err("segment_days must be positive");
        }
        // the Moon must move well under 180° per segment for unwrapping
        if self.segment_days > 8.0 {
            return Err("segment_days must not exceed 8");
        }
        if self.degree == 0 || self.degree > 32 {
            return Err("degree must be in 1..=32");
        }
        Ok(())
    }
}

impl ChebyshevTable {
    /// Fit a table from `source` over `[start_jd, end_jd]` (TT).
    pub fn fit(
        source: &dyn EphemerisProvider,
        bodies: &[Body],
        start_jd: f64,
        end_jd: f64,
        config: &FitConfig,
    ) -> Result<Self, EphemerisError> {
        config.validate().map_err(EphemerisError::InvalidConfig)?;
        if !(start_jd.is_finite() && end_jd.is_finite()) || start_jd >= end_jd {
            return Err(EphemerisError::InvalidConfig("fit range must be finite and increasing"));
        }

        let n = config.degree + 1;
        let nodes: Vec<f64> = (0..n)
            .map(|k| (std::f64::consts::PI * (k as f64 + 0.5) / n as f64).cos())
            .collect();

        let mut series = Vec::with_capacity(bodies.len());
        for &body in bodies {
            let mut segments = Vec::new();
            let mut seg_start = start_jd;
            while seg_start < end_jd {
                let seg_end = (seg_start + config.segment_days).min(end_jd);
                let mid = 0.5 * (seg_start + seg_end);
                let half = 0.5 * (seg_end - seg_start);
                let anchor = source.position(body, mid)?.longitude_deg;

                let mut lon = Vec::with_capacity(n);
                let mut lat = Vec::with_capacity(n);
                let mut dist = Vec::with_capacity(n);
                for &x in &nodes {
                    let p = source.position(body, mid + half * x)?;
                    let mut d = (p.longitude_deg - anchor).rem_euclid(360.0);
                    if d > 180.0 {
                        d -= 360.0;
                    }
                    lon.push(anchor + d);
                    lat.push(p.latitude_deg);
                    dist.push(p.distance_au);
                }
                segments.push(Segment {
                    start_jd: seg_start,
                    end_jd: seg_end,
                    lon: fit_coefficients(&lon),
                    lat: fit_coefficients(&lat),
                    dist: fit_coefficients(&dist),
                });
                seg_start = seg_end;
            }
            debug!(%body, segments = segments.len(), "fitted body series");
            series.push(BodySeries { body, segments });
        }

        info!(
            bodies = bodies.len(),
            start_jd, end_jd, degree = config.degree, "fitted chebyshev table"
        );
        Ok(Self {
            format_version: TABLE_FORMAT_VERSION,
            source_precision: source.precision(),
            position_config: source.position_config(),
            series,
        })
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.format_version != TABLE_FORMAT_VERSION {
            return Err("unsupported table format version");
        }
        let mut seen = [false; ALL_BODIES.len()];
        for s in &self.series {
            if std::mem::replace(&mut seen[s.body.index()], true) {
                return Err("duplicate body series");
            }
            if s.segments.is_empty() {
                return Err("body series has no segments");
            }
            for seg in &s.segments {
                seg.validate()?;
            }
            for pair in s.segments.windows(2) {
                if (pair[1].start_jd - pair[0].end_jd).abs() > 1e-9 {
                    return Err("segments must be contiguous and ascending");
                }
            }
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), EphemerisError> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        info!(path = %path.display(), "saved chebyshev table");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, EphemerisError> {
        let reader = BufReader::new(File::open(path).map_err(|e| {
            EphemerisError::TableLoad(format!("{}: {e}", path.display()))
        })?);
        let table: Self = serde_json::from_reader(reader)?;
        table.validate().map_err(EphemerisError::InvalidTable)?;
        info!(path = %path.display(), bodies = table.series.len(), "loaded chebyshev table");
        Ok(table)
    }
}

/// Provider backed by a [`ChebyshevTable`].
#[derive(Debug, Clone)]
pub struct ChebyshevEphemeris {
    table: ChebyshevTable,
    index: [Option<usize>; ALL_BODIES.len()],
}

impl ChebyshevEphemeris {
    pub fn new(table: ChebyshevTable) -> Result<Self, EphemerisError> {
        table.validate().map_err(EphemerisError::InvalidTable)?;
        let mut index = [None; ALL_BODIES.len()];
        for (i, s) in table.series.iter().enumerate() {
            index[s.body.index()] = Some(i);
        }
        Ok(Self { table, index })
    }

    pub fn open(path: &Path) -> Result<Self, EphemerisError> {
        Self::new(ChebyshevTable::load(path)?)
    }

    pub fn table(&self) -> &ChebyshevTable {
        &self.table
    }

    /// Mode of the provider the table was fitted from.
    pub fn source_precision(&self) -> PrecisionMode {
        self.table.source_precision
    }

    fn series(&self, body: Body) -> Option<&BodySeries> {
        self.index[body.index()].map(|i| &self.table.series[i])
    }
}

impl EphemerisProvider for ChebyshevEphemeris {
    fn precision(&self) -> PrecisionMode {
        PrecisionMode::HighPrecisionFile
    }

    fn position_config(&self) -> PositionConfig {
        self.table.position_config
    }

    /// Range covered by every body in the table.
    fn coverage(&self) -> Option<(f64, f64)> {
        self.table
            .series
            .iter()
            .filter_map(BodySeries::range)
            .reduce(|(s0, e0), (s1, e1)| (s0.max(s1), e0.min(e1)))
    }

    fn position(&self, body: Body, jd_tt: f64) -> Result<EclipticPosition, EphemerisError> {
        if !jd_tt.is_finite() {
            return Err(EphemerisError::NonFiniteEpoch);
        }
        let series = self
            .series(body)
            .ok_or(EphemerisError::UnsupportedBody(body))?;
        let segment = series.segment_for(jd_tt).ok_or_else(|| {
            let (start_jd, end_jd) = series.range().unwrap_or((f64::NAN, f64::NAN));
            EphemerisError::OutOfRange {
                body,
                jd_tt,
                start_jd,
                end_jd,
            }
        })?;
        Ok(segment.evaluate(jd_tt))
    }
}
