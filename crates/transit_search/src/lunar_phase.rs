//! Lunar phase changes and eclipses with natal contacts.
//!
//! The phase is the bucket of the Sun-Moon elongation. A change fires once
//! per boundary crossed, at the bisected instant the elongation reaches the
//! boundary. New and Full Moons inside the eclipse limits are followed by
//! an eclipse event at the same instant.

use transit_ephem::{Body, normalize_360};

use crate::detector::{Detector, EdgeTrigger, Frame, ScanContext, Step};
use crate::eclipse::{EclipseKind, lunar_eclipse, solar_eclipse};
use crate::error::ScanError;
use crate::event::{EclipseDetail, EventDetail, EventKind, LunarPhaseDetail, TransitEvent};
use crate::house::house_of;
use crate::sampler::BodyPosition;
use crate::lunar_phase_types::{LunarContact, LunarPhase, PhaseScheme};
use crate::search_util::{bisect_zero, normalize_to_pm180};

/// Moon minus Sun, in [0, 360).
pub fn elongation_deg(moon_lon: f64, sun_lon: f64) -> f64 {
    normalize_360(moon_lon - sun_lon)
}

pub struct LunarPhaseDetector {
    scheme: PhaseScheme,
    contact_orb_deg: f64,
    include_angles: bool,
    eclipses: bool,
    trigger: EdgeTrigger<f64>,
}

impl LunarPhaseDetector {
    pub fn new(ctx: &ScanContext<'_>) -> Self {
        Self {
            scheme: ctx.config.lunar_phases.scheme,
            contact_orb_deg: ctx.config.lunar_phases.contact_orb_deg,
            include_angles: ctx.config.include_angles,
            eclipses: ctx.config.lunar_phases.eclipses,
            trigger: EdgeTrigger::new(),
        }
    }

    fn elongation_at(ctx: &ScanContext<'_>, jd: f64) -> Result<f64, ScanError> {
        let moon = ctx.transiting(Body::Moon, jd)?;
        let sun = ctx.transiting(Body::Sun, jd)?;
        Ok(elongation_deg(moon.longitude_deg, sun.longitude_deg))
    }

    /// Instants in the step where the elongation passes a phase boundary
    /// in the direction of increasing elongation.
    fn crossings(
        &self,
        ctx: &ScanContext<'_>,
        step: &Step<f64>,
    ) -> Result<Vec<(f64, LunarPhase)>, ScanError> {
        let mut found = Vec::new();
        for &phase in self.scheme.phases() {
            let boundary = phase.start_elongation_deg();
            let f_a = normalize_to_pm180(step.prev - boundary);
            let f_b = normalize_to_pm180(step.current - boundary);
            if !(f_a < 0.0 && f_b >= 0.0 && f_b - f_a < 270.0) {
                continue;
            }
            let t = if f_b == 0.0 {
                step.jd
            } else {
                bisect_zero(step.prev_jd, f_a, step.jd, |t| {
                    Ok(normalize_to_pm180(Self::elongation_at(ctx, t)? - boundary))
                })?
            };
            found.push((t, phase));
        }
        found.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(found)
    }

    /// Natal targets within the contact orb of `longitude_deg`.
    fn contacts(&self, ctx: &ScanContext<'_>, longitude_deg: f64) -> Vec<LunarContact> {
        ctx.natal
            .targets(self.include_angles)
            .into_iter()
            .filter_map(|(target, lon)| {
                let orb_deg = normalize_to_pm180(longitude_deg - lon).abs();
                (orb_deg <= self.contact_orb_deg).then_some(LunarContact {
                    target,
                    target_longitude_deg: lon,
                    orb_deg,
                })
            })
            .collect()
    }

    fn event(
        &self,
        ctx: &ScanContext<'_>,
        phase: LunarPhase,
        jd: f64,
        moon: &BodyPosition,
        sun: &BodyPosition,
    ) -> TransitEvent {
        let detail = LunarPhaseDetail {
            phase,
            moon_longitude_deg: moon.longitude_deg,
            sun_longitude_deg: sun.longitude_deg,
            contacts: self.contacts(ctx, moon.longitude_deg),
        };
        TransitEvent::new(
            EventKind::LunarPhase,
            jd,
            ctx.instant(jd),
            EventDetail::LunarPhase(detail),
        )
    }

    fn eclipse(
        &self,
        ctx: &ScanContext<'_>,
        phase: LunarPhase,
        jd: f64,
        moon: &BodyPosition,
        sun: &BodyPosition,
    ) -> Option<TransitEvent> {
        let (kind, class, longitude_deg) = match phase {
            LunarPhase::NewMoon => (
                EclipseKind::Solar,
                solar_eclipse(moon.latitude_deg, moon.distance_au, sun.distance_au)?,
                sun.longitude_deg,
            ),
            LunarPhase::FullMoon => (
                EclipseKind::Lunar,
                lunar_eclipse(moon.latitude_deg, moon.distance_au, sun.distance_au)?,
                moon.longitude_deg,
            ),
            _ => return None,
        };
        let detail = EclipseDetail {
            kind,
            class,
            longitude_deg,
            moon_latitude_deg: moon.latitude_deg,
            natal_house: house_of(longitude_deg, ctx.natal.cusps()),
            contacts: self.contacts(ctx, longitude_deg),
        };
        let event_kind = match kind {
            EclipseKind::Solar => EventKind::EclipseSolar,
            EclipseKind::Lunar => EventKind::EclipseLunar,
        };
        Some(TransitEvent::new(
            event_kind,
            jd,
            ctx.instant(jd),
            EventDetail::Eclipse(detail),
        ))
    }
}

impl Detector for LunarPhaseDetector {
    fn name(&self) -> &'static str {
        "lunar-phases"
    }

    fn transiting_bodies(&self) -> Vec<Body> {
        vec![Body::Sun, Body::Moon]
    }

    fn observe(
        &mut self,
        ctx: &ScanContext<'_>,
        frame: &Frame,
        out: &mut Vec<TransitEvent>,
    ) -> Result<(), ScanError> {
        let moon = frame.transiting(Body::Moon)?;
        let sun = frame.transiting(Body::Sun)?;
        let elongation = elongation_deg(moon.longitude_deg, sun.longitude_deg);
        let Some(step) = self.trigger.step(frame.jd_utc, elongation) else {
            return Ok(());
        };
        for (t, phase) in self.crossings(ctx, &step)? {
            let moon = ctx.transiting(Body::Moon, t)?;
            let sun = ctx.transiting(Body::Sun, t)?;
            out.push(self.event(ctx, phase, t, &moon, &sun));
            if self.eclipses && phase.is_syzygy() {
                out.extend(self.eclipse(ctx, phase, t, &moon, &sun));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elongation_wraps() {
        assert!((elongation_deg(10.0, 350.0) - 20.0).abs() < 1e-12);
        assert!((elongation_deg(350.0, 10.0) - 340.0).abs() < 1e-12);
    }
}
