//! Shared edge-triggered discipline for all detectors.
//!
//! Each detector reduces a sample to a state that depends on that sample
//! alone and reports events only for the step between two consecutive
//! samples. The first sample a detector sees only primes it. Because no
//! state outlives a step, a scan split into sub-ranges that share their
//! boundary sample emits exactly the events of the unsplit scan.

use chrono::{DateTime, Duration, Utc};
use transit_ephem::{ALL_BODIES, Body};

use crate::aspect_types::AspectTable;
use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::event::TransitEvent;
use crate::natal::NatalContext;
use crate::progressed::progressed_position;
use crate::sampler::{BodyPosition, PositionSampler};

/// Two consecutive states of one tracked quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct Step<S> {
    pub prev_jd: f64,
    pub prev: S,
    pub jd: f64,
    pub current: S,
}

/// Remembers the last state and pairs it with the next one.
#[derive(Debug, Clone)]
pub struct EdgeTrigger<S> {
    last: Option<(f64, S)>,
}

impl<S> Default for EdgeTrigger<S> {
    fn default() -> Self {
        Self { last: None }
    }
}

impl<S: Clone> EdgeTrigger<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `state` at `jd`; returns the step from the previous sample,
    /// or `None` on the first call.
    pub fn step(&mut self, jd: f64, state: S) -> Option<Step<S>> {
        let prev = self.last.replace((jd, state.clone()));
        prev.map(|(prev_jd, prev)| Step {
            prev_jd,
            prev,
            jd,
            current: state,
        })
    }
}

/// Positions at one grid instant.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Index in the scan grid; 0 is the scan start.
    pub index: usize,
    pub jd_utc: f64,
    transiting: [Option<BodyPosition>; ALL_BODIES.len()],
    progressed: [Option<BodyPosition>; ALL_BODIES.len()],
}

impl Frame {
    pub fn new(index: usize, jd_utc: f64) -> Self {
        Self {
            index,
            jd_utc,
            transiting: [None; ALL_BODIES.len()],
            progressed: [None; ALL_BODIES.len()],
        }
    }

    pub fn set_transiting(&mut self, pos: BodyPosition) {
        self.transiting[pos.body.index()] = Some(pos);
    }

    pub fn set_progressed(&mut self, pos: BodyPosition) {
        self.progressed[pos.body.index()] = Some(pos);
    }

    pub fn transiting(&self, body: Body) -> Result<BodyPosition, ScanError> {
        self.transiting[body.index()]
            .ok_or_else(|| ScanError::config(format!("transiting {body} was not sampled")))
    }

    pub fn progressed(&self, body: Body) -> Result<BodyPosition, ScanError> {
        self.progressed[body.index()]
            .ok_or_else(|| ScanError::config(format!("progressed {body} was not sampled")))
    }
}

/// Read-only inputs shared by every detector of one scan.
pub struct ScanContext<'a> {
    pub natal: &'a NatalContext,
    pub config: &'a ScanConfig,
    pub sampler: &'a PositionSampler,
    pub aspects: &'a AspectTable,
    pub progressed_aspects: &'a AspectTable,
    start: DateTime<Utc>,
    start_jd: f64,
    birth_jd: f64,
}

impl<'a> ScanContext<'a> {
    pub fn new(
        natal: &'a NatalContext,
        config: &'a ScanConfig,
        sampler: &'a PositionSampler,
        aspects: &'a AspectTable,
        progressed_aspects: &'a AspectTable,
        start: DateTime<Utc>,
    ) -> Self {
        Self {
            natal,
            config,
            sampler,
            aspects,
            progressed_aspects,
            start,
            start_jd: transit_ephem::datetime_to_jd(&start),
            birth_jd: natal.birth_jd(),
        }
    }

    pub fn start_jd(&self) -> f64 {
        self.start_jd
    }

    pub fn birth_jd(&self) -> f64 {
        self.birth_jd
    }

    /// UTC instant of `jd_utc`, to the millisecond, measured from the scan
    /// start so grid instants land on whole milliseconds.
    pub fn instant(&self, jd_utc: f64) -> DateTime<Utc> {
        let ms = ((jd_utc - self.start_jd) * 86_400_000.0).round() as i64;
        self.start + Duration::milliseconds(ms)
    }

    pub fn transiting(&self, body: Body, jd_utc: f64) -> Result<BodyPosition, ScanError> {
        self.sampler.position_at(body, jd_utc)
    }

    pub fn progressed(&self, body: Body, jd_utc: f64) -> Result<BodyPosition, ScanError> {
        progressed_position(self.sampler, self.birth_jd, body, jd_utc)
    }
}

/// A stateful transition detector driven once per grid sample.
pub trait Detector: Send {
    fn name(&self) -> &'static str;

    /// Transiting bodies this detector reads from each frame.
    fn transiting_bodies(&self) -> Vec<Body> {
        Vec::new()
    }

    /// Progressed bodies this detector reads from each frame.
    fn progressed_bodies(&self) -> Vec<Body> {
        Vec::new()
    }

    /// Consume the next frame and append the events of the step ending at
    /// it, in chronological order.
    fn observe(
        &mut self,
        ctx: &ScanContext<'_>,
        frame: &Frame,
        out: &mut Vec<TransitEvent>,
    ) -> Result<(), ScanError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_only_primes() {
        let mut t = EdgeTrigger::new();
        assert!(t.step(0.0, 1u8).is_none());
        let s = t.step(1.0, 2u8).unwrap();
        assert_eq!((s.prev_jd, s.prev, s.jd, s.current), (0.0, 1, 1.0, 2));
        let s = t.step(2.0, 2u8).unwrap();
        assert_eq!(s.prev, s.current);
    }

    #[test]
    fn frame_reports_missing_bodies() {
        let mut f = Frame::new(0, 2_460_000.5);
        f.set_transiting(BodyPosition::new(Body::Mars, 10.0, 0.5));
        assert_eq!(f.transiting(Body::Mars).unwrap().longitude_deg, 10.0);
        assert!(f.transiting(Body::Venus).is_err());
        assert!(f.progressed(Body::Mars).is_err());
    }
}
