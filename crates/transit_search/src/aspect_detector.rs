//! Aspect state machines for (moving, target, aspect) pairs.
//!
//! Pairs live in a flat arena ordered by moving point, then target, then
//! aspect, so each (moving, target) group is a contiguous index range.
//! Within a group only the in-orb aspect with the smallest orb is active;
//! every other aspect of the group is out of orb for that sample.
//!
//! Per pair the phases are Out, Approaching, Exact and Separating. Every
//! phase change between two samples emits one event, refined by bisection:
//!
//! - entering Approaching emits `AspectFormed`
//! - reaching Exact emits `AspectExact`
//! - entering Separating emits `AspectSeparated`
//! - leaving orb emits `AspectEnded`
//!
//! A zero crossing of the signed deviation inside a step always passes
//! through Exact, even when neither sample is within the exactness epsilon.

use std::ops::Range;

use transit_ephem::Body;

use crate::aspect::{AspectMatch, PointSample, best_match, geometry};
use crate::aspect_types::{AspectKind, AspectTable};
use crate::detector::{Detector, EdgeTrigger, Frame, ScanContext, Step};
use crate::error::ScanError;
use crate::event::{AspectDetail, EventDetail, EventKind, TransitEvent};
use crate::natal::{Point, PointRef};
use crate::search_util::{bisect_change, bisect_zero, is_genuine_crossing, normalize_to_pm180};

/// Lifecycle phase of one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Out,
    Approaching,
    Exact,
    Separating,
}

impl Phase {
    fn of(m: &AspectMatch) -> Self {
        if m.exact {
            Self::Exact
        } else if m.applying {
            Self::Approaching
        } else {
            Self::Separating
        }
    }

    /// Event emitted when a pair enters this phase.
    fn entry_event(self) -> EventKind {
        match self {
            Self::Out => EventKind::AspectEnded,
            Self::Approaching => EventKind::AspectFormed,
            Self::Exact => EventKind::AspectExact,
            Self::Separating => EventKind::AspectSeparated,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Source {
    Transiting(Body),
    Progressed(Body),
    Natal(Point, f64),
}

impl Source {
    fn point_ref(self) -> PointRef {
        match self {
            Self::Transiting(b) => PointRef::transiting(b),
            Self::Progressed(b) => PointRef::progressed(b),
            Self::Natal(p, _) => PointRef::natal(p),
        }
    }

    fn from_frame(self, frame: &Frame) -> Result<PointSample, ScanError> {
        let point = self.point_ref();
        match self {
            Self::Transiting(b) => {
                let p = frame.transiting(b)?;
                Ok(PointSample::new(point, p.longitude_deg, p.speed_deg_per_day))
            }
            Self::Progressed(b) => {
                let p = frame.progressed(b)?;
                Ok(PointSample::new(point, p.longitude_deg, p.speed_deg_per_day))
            }
            Self::Natal(_, lon) => Ok(PointSample::new(point, lon, 0.0)),
        }
    }

    fn at(self, ctx: &ScanContext<'_>, jd: f64) -> Result<PointSample, ScanError> {
        let point = self.point_ref();
        match self {
            Self::Transiting(b) => {
                let p = ctx.transiting(b, jd)?;
                Ok(PointSample::new(point, p.longitude_deg, p.speed_deg_per_day))
            }
            Self::Progressed(b) => {
                let p = ctx.progressed(b, jd)?;
                Ok(PointSample::new(point, p.longitude_deg, p.speed_deg_per_day))
            }
            Self::Natal(_, lon) => Ok(PointSample::new(point, lon, 0.0)),
        }
    }
}

/// Both points of a group and the active aspect at one instant.
#[derive(Debug, Clone, Copy)]
struct GroupSample {
    moving: PointSample,
    target: PointSample,
    /// Index into the table and the match, if any aspect is in orb.
    best: Option<(usize, AspectMatch)>,
}

impl GroupSample {
    fn phase_of(&self, def: usize) -> Phase {
        match self.best {
            Some((i, m)) if i == def => Phase::of(&m),
            _ => Phase::Out,
        }
    }
}

struct PairGroup {
    moving: Source,
    target: Source,
    /// Arena indices of this group's pairs.
    pairs: Range<usize>,
    trigger: EdgeTrigger<GroupSample>,
}

/// Arena slot: one aspect of one group.
#[derive(Debug, Clone, Copy)]
struct AspectPair {
    group: usize,
    def: usize,
    kind: AspectKind,
}

/// Tracks a set of moving points against a set of targets.
pub struct AspectDetector {
    name: &'static str,
    table: AspectTable,
    epsilon_deg: f64,
    groups: Vec<PairGroup>,
    pairs: Vec<AspectPair>,
}

impl AspectDetector {
    fn build(
        name: &'static str,
        table: AspectTable,
        epsilon_deg: f64,
        movers: Vec<Source>,
        targets: Vec<Source>,
    ) -> Self {
        let mut groups = Vec::with_capacity(movers.len() * targets.len());
        let mut pairs = Vec::with_capacity(groups.capacity() * table.len());
        for &moving in &movers {
            for &target in &targets {
                if moving.point_ref() == target.point_ref() {
                    continue;
                }
                let group = groups.len();
                let first = pairs.len();
                for (def, d) in table.definitions().iter().enumerate() {
                    pairs.push(AspectPair {
                        group,
                        def,
                        kind: d.kind,
                    });
                }
                groups.push(PairGroup {
                    moving,
                    target,
                    pairs: first..pairs.len(),
                    trigger: EdgeTrigger::new(),
                });
            }
        }
        Self {
            name,
            table,
            epsilon_deg,
            groups,
            pairs,
        }
    }

    fn natal_targets(ctx: &ScanContext<'_>) -> Vec<Source> {
        ctx.natal
            .targets(ctx.config.include_angles)
            .into_iter()
            .map(|(p, lon)| Source::Natal(p, lon))
            .collect()
    }

    /// Transiting bodies against natal bodies and (optionally) angles.
    pub fn transits(ctx: &ScanContext<'_>) -> Self {
        let movers = ctx.config.bodies.iter().map(|&b| Source::Transiting(b)).collect();
        Self::build(
            "transit-aspects",
            ctx.aspects.clone(),
            ctx.config.exact_epsilon_deg,
            movers,
            Self::natal_targets(ctx),
        )
    }

    /// Progressed bodies against natal targets.
    pub fn progressions(ctx: &ScanContext<'_>) -> Self {
        let movers = ctx
            .config
            .progressions
            .bodies
            .iter()
            .map(|&b| Source::Progressed(b))
            .collect();
        Self::build(
            "progressed-aspects",
            ctx.progressed_aspects.clone(),
            ctx.config.exact_epsilon_deg,
            movers,
            Self::natal_targets(ctx),
        )
    }

    /// Transiting bodies against progressed bodies.
    pub fn transits_to_progressed(ctx: &ScanContext<'_>) -> Self {
        let movers = ctx.config.bodies.iter().map(|&b| Source::Transiting(b)).collect();
        let targets = ctx
            .config
            .progressions
            .bodies
            .iter()
            .map(|&b| Source::Progressed(b))
            .collect();
        Self::build(
            "transit-to-progressed-aspects",
            ctx.aspects.clone(),
            ctx.config.exact_epsilon_deg,
            movers,
            targets,
        )
    }

    /// Number of (moving, target, aspect) pairs tracked.
    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    fn select(
        &self,
        moving: PointSample,
        target: PointSample,
    ) -> Result<GroupSample, ScanError> {
        let best = best_match(&moving, &target, self.table.definitions(), self.epsilon_deg)?;
        Ok(GroupSample {
            moving,
            target,
            best,
        })
    }

    fn sample_group(
        &self,
        ctx: &ScanContext<'_>,
        group: usize,
        jd: f64,
    ) -> Result<GroupSample, ScanError> {
        let g = &self.groups[group];
        self.select(g.moving.at(ctx, jd)?, g.target.at(ctx, jd)?)
    }

    fn phase_at(&self, ctx: &ScanContext<'_>, pair: AspectPair, jd: f64) -> Result<Phase, ScanError> {
        Ok(self.sample_group(ctx, pair.group, jd)?.phase_of(pair.def))
    }

    /// Signed deviation from the exact configuration on one side of the
    /// target: `pm180(moving - target - side * angle)`.
    fn signed_deviation(sample: &GroupSample, kind: AspectKind, side: f64) -> f64 {
        normalize_to_pm180(
            sample.moving.longitude_deg - sample.target.longitude_deg - side * kind.angle_deg(),
        )
    }

    /// Earliest zero crossing of the signed deviation inside the step.
    fn exact_crossing(
        &self,
        ctx: &ScanContext<'_>,
        pair: AspectPair,
        step: &Step<GroupSample>,
    ) -> Result<Option<f64>, ScanError> {
        let sides: &[f64] = if pair.kind.is_one_sided() {
            &[1.0]
        } else {
            &[1.0, -1.0]
        };
        let mut earliest: Option<f64> = None;
        for &side in sides {
            let f_a = Self::signed_deviation(&step.prev, pair.kind, side);
            let f_b = Self::signed_deviation(&step.current, pair.kind, side);
            if !is_genuine_crossing(f_a, f_b) {
                continue;
            }
            let t = bisect_zero(step.prev_jd, f_a, step.jd, |t| {
                let s = self.sample_group(ctx, pair.group, t)?;
                Ok(Self::signed_deviation(&s, pair.kind, side))
            })?;
            if earliest.is_none_or(|e| t < e) {
                earliest = Some(t);
            }
        }
        Ok(earliest)
    }

    /// First instant after `from` where the phase stops satisfying `pred`
    /// (given that it satisfies it at `from` exactly when `initial`).
    fn refine(
        &self,
        ctx: &ScanContext<'_>,
        pair: AspectPair,
        from: f64,
        to: f64,
        initial: bool,
        pred: fn(Phase) -> bool,
    ) -> Result<f64, ScanError> {
        bisect_change(from, to, initial, |t| Ok(pred(self.phase_at(ctx, pair, t)?)))
    }

    /// Phase path of one pair across a step, as (entered phase, instant).
    fn transitions(
        &self,
        ctx: &ScanContext<'_>,
        pair: AspectPair,
        step: &Step<GroupSample>,
    ) -> Result<Vec<(Phase, f64)>, ScanError> {
        let p = step.prev.phase_of(pair.def);
        let q = step.current.phase_of(pair.def);
        let mut path = Vec::new();
        if p == Phase::Exact && q == Phase::Exact {
            return Ok(path);
        }
        let crossing = if p == Phase::Exact {
            None
        } else {
            self.exact_crossing(ctx, pair, step)?
        };
        if p == q && crossing.is_none() {
            return Ok(path);
        }

        let in_orb = |ph: Phase| ph != Phase::Out;
        let is_exact = |ph: Phase| ph == Phase::Exact;
        let is_approaching = |ph: Phase| ph == Phase::Approaching;
        let is_closing = |ph: Phase| matches!(ph, Phase::Approaching | Phase::Exact);

        let mut cur = p;
        let mut t = step.prev_jd;
        let reaches_exact = crossing.is_some() || (q == Phase::Exact && p != Phase::Exact);
        if reaches_exact {
            let t_x = match crossing {
                Some(t_x) => t_x,
                None => self.refine(ctx, pair, t, step.jd, false, is_exact)?,
            };
            match cur {
                Phase::Out => {
                    let t_in = self.refine(ctx, pair, t, t_x, false, in_orb)?;
                    path.push((Phase::Approaching, t_in.min(t_x)));
                }
                Phase::Separating => {
                    // station inside the step: turned back before crossing
                    let t_turn = self.refine(ctx, pair, t, t_x, false, is_closing)?;
                    path.push((Phase::Approaching, t_turn.min(t_x)));
                }
                _ => {}
            }
            path.push((Phase::Exact, t_x));
            cur = Phase::Exact;
            t = t_x;
        }

        match (cur, q) {
            (Phase::Out, Phase::Out) => {}
            (Phase::Out, _) => {
                // entering orb while separating still counts as forming
                let t_in = self.refine(ctx, pair, t, step.jd, false, in_orb)?;
                path.push((Phase::Approaching, t_in));
            }
            (Phase::Exact, Phase::Out) => {
                let t_sep = self.refine(ctx, pair, t, step.jd, true, is_exact)?;
                path.push((Phase::Separating, t_sep));
                let t_out = self.refine(ctx, pair, t_sep, step.jd, true, in_orb)?;
                path.push((Phase::Out, t_out));
            }
            (Phase::Exact, next @ (Phase::Approaching | Phase::Separating)) => {
                let t_left = self.refine(ctx, pair, t, step.jd, true, is_exact)?;
                path.push((next, t_left));
            }
            (_, Phase::Out) => {
                let t_out = self.refine(ctx, pair, t, step.jd, true, in_orb)?;
                path.push((Phase::Out, t_out));
            }
            (Phase::Approaching, Phase::Separating) => {
                let t_turn = self.refine(ctx, pair, t, step.jd, true, is_approaching)?;
                path.push((Phase::Separating, t_turn));
            }
            (Phase::Separating, Phase::Approaching) => {
                let t_turn = self.refine(ctx, pair, t, step.jd, false, is_approaching)?;
                path.push((Phase::Approaching, t_turn));
            }
            // unchanged, or reaching Exact, which the crossing branch handled
            _ => {}
        }
        Ok(path)
    }

    fn event(
        &self,
        ctx: &ScanContext<'_>,
        pair: AspectPair,
        kind: EventKind,
        jd: f64,
    ) -> Result<TransitEvent, ScanError> {
        let s = self.sample_group(ctx, pair.group, jd)?;
        let geo = geometry(&s.moving, &s.target, pair.kind);
        let orb_deg = geo.orb_deg();
        let detail = AspectDetail {
            moving: s.moving.point,
            moving_longitude_deg: s.moving.longitude_deg,
            moving_speed_deg_per_day: s.moving.speed_deg_per_day,
            target: s.target.point,
            target_longitude_deg: s.target.longitude_deg,
            aspect: pair.kind,
            orb_deg,
            applying: geo.applying && orb_deg > self.epsilon_deg,
        };
        Ok(TransitEvent::new(kind, jd, ctx.instant(jd), EventDetail::Aspect(detail)))
    }
}

impl Detector for AspectDetector {
    fn name(&self) -> &'static str {
        self.name
    }

    fn transiting_bodies(&self) -> Vec<Body> {
        let mut out = Vec::new();
        for g in &self.groups {
            for s in [g.moving, g.target] {
                if let Source::Transiting(b) = s {
                    if !out.contains(&b) {
                        out.push(b);
                    }
                }
            }
        }
        out
    }

    fn progressed_bodies(&self) -> Vec<Body> {
        let mut out = Vec::new();
        for g in &self.groups {
            for s in [g.moving, g.target] {
                if let Source::Progressed(b) = s {
                    if !out.contains(&b) {
                        out.push(b);
                    }
                }
            }
        }
        out
    }

    fn observe(
        &mut self,
        ctx: &ScanContext<'_>,
        frame: &Frame,
        out: &mut Vec<TransitEvent>,
    ) -> Result<(), ScanError> {
        let mut emitted: Vec<(f64, usize, EventKind)> = Vec::new();
        for group in 0..self.groups.len() {
            let g = &self.groups[group];
            let sample = self.select(g.moving.from_frame(frame)?, g.target.from_frame(frame)?)?;
            let Some(step) = self.groups[group].trigger.step(frame.jd_utc, sample) else {
                continue;
            };
            for idx in self.groups[group].pairs.clone() {
                let pair = self.pairs[idx];
                for (phase, t) in self.transitions(ctx, pair, &step)? {
                    emitted.push((t, idx, phase.entry_event()));
                }
            }
        }
        // chronological within the step; arena order breaks ties
        emitted.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        for (t, idx, kind) in emitted {
            out.push(self.event(ctx, self.pairs[idx], kind, t)?);
        }
        Ok(())
    }
}
