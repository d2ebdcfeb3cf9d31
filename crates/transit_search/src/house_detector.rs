//! House ingress/egress tracking for transiting bodies.

use transit_ephem::Body;

use crate::detector::{Detector, EdgeTrigger, Frame, ScanContext, Step};
use crate::error::ScanError;
use crate::event::{EventDetail, EventKind, HouseDetail, TransitEvent};
use crate::house::{HouseTransit, house_of};
use crate::search_util::bisect_change;

/// A step never crosses more cusps than there are houses.
const MAX_CROSSINGS_PER_STEP: usize = 12;

pub struct HouseDetector {
    bodies: Vec<Body>,
    emit_egress: bool,
    status_snapshot: bool,
    triggers: Vec<EdgeTrigger<u8>>,
}

impl HouseDetector {
    pub fn new(ctx: &ScanContext<'_>) -> Self {
        let bodies = ctx.config.bodies.clone();
        Self {
            triggers: vec![EdgeTrigger::new(); bodies.len()],
            bodies,
            emit_egress: ctx.config.houses.emit_egress,
            status_snapshot: ctx.config.houses.status_snapshot,
        }
    }

    fn house_at(ctx: &ScanContext<'_>, body: Body, jd: f64) -> Result<u8, ScanError> {
        let pos = ctx.transiting(body, jd)?;
        Ok(house_of(pos.longitude_deg, ctx.natal.cusps()))
    }

    fn snapshot(&self, ctx: &ScanContext<'_>, frame: &Frame) -> Result<TransitEvent, ScanError> {
        let mut transits = Vec::with_capacity(self.bodies.len());
        for &body in &self.bodies {
            let pos = frame.transiting(body)?;
            transits.push(HouseTransit {
                body,
                longitude_deg: pos.longitude_deg,
                house: house_of(pos.longitude_deg, ctx.natal.cusps()),
                retrograde: pos.is_retrograde(),
            });
        }
        Ok(TransitEvent::new(
            EventKind::HouseStatus,
            frame.jd_utc,
            ctx.instant(frame.jd_utc),
            EventDetail::HouseStatus { transits },
        ))
    }

    /// Egress/ingress pairs for every cusp `body` crosses during `step`.
    fn changes(
        &self,
        ctx: &ScanContext<'_>,
        body: Body,
        step: &Step<u8>,
        out: &mut Vec<TransitEvent>,
    ) -> Result<(), ScanError> {
        let mut t = step.prev_jd;
        let mut house = step.prev;
        for _ in 0..MAX_CROSSINGS_PER_STEP {
            if house == step.current {
                break;
            }
            let left = house;
            let t_c = bisect_change(t, step.jd, true, |t| Ok(Self::house_at(ctx, body, t)? == left))?;
            let pos = ctx.transiting(body, t_c)?;
            let entered = house_of(pos.longitude_deg, ctx.natal.cusps());
            let detail = |house| {
                EventDetail::House(HouseDetail {
                    body,
                    longitude_deg: pos.longitude_deg,
                    speed_deg_per_day: pos.speed_deg_per_day,
                    house,
                    from_house: left,
                    to_house: entered,
                })
            };
            let instant = ctx.instant(t_c);
            if self.emit_egress {
                out.push(TransitEvent::new(EventKind::HouseEgress, t_c, instant, detail(left)));
            }
            out.push(TransitEvent::new(EventKind::HouseIngress, t_c, instant, detail(entered)));
            t = t_c;
            house = entered;
        }
        Ok(())
    }
}

impl Detector for HouseDetector {
    fn name(&self) -> &'static str {
        "houses"
    }

    fn transiting_bodies(&self) -> Vec<Body> {
        self.bodies.clone()
    }

    fn observe(
        &mut self,
        ctx: &ScanContext<'_>,
        frame: &Frame,
        out: &mut Vec<TransitEvent>,
    ) -> Result<(), ScanError> {
        if frame.index == 0 && self.status_snapshot {
            out.push(self.snapshot(ctx, frame)?);
        }
        let mut emitted = Vec::new();
        for i in 0..self.bodies.len() {
            let body = self.bodies[i];
            let pos = frame.transiting(body)?;
            let house = house_of(pos.longitude_deg, ctx.natal.cusps());
            let Some(step) = self.triggers[i].step(frame.jd_utc, house) else {
                continue;
            };
            if step.prev != step.current {
                self.changes(ctx, body, &step, &mut emitted)?;
            }
        }
        emitted.sort_by(|a, b| a.jd_utc.total_cmp(&b.jd_utc));
        out.extend(emitted);
        Ok(())
    }
}
