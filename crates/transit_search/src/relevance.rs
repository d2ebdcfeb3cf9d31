//! Relevance tiers. A pure, total function of event kind and detail.

use transit_ephem::Body;

use crate::aspect_types::AspectKind;
use crate::eclipse::EclipseType;
use crate::event::{AspectDetail, EventDetail, EventKind, Relevance};
use crate::natal::{Layer, Point};

/// Tier of an event.
///
/// Every (kind, detail) combination maps to exactly one tier; a kind paired
/// with a foreign detail falls back to LOW.
pub fn classify(kind: EventKind, detail: &EventDetail) -> Relevance {
    match (kind, detail) {
        (
            EventKind::AspectFormed
            | EventKind::AspectExact
            | EventKind::AspectSeparated
            | EventKind::AspectEnded,
            EventDetail::Aspect(a),
        ) => aspect_tier(a),
        (EventKind::HouseIngress | EventKind::HouseEgress, EventDetail::House(h)) => {
            house_change_tier(h.body)
        }
        (EventKind::LunarPhase, EventDetail::LunarPhase(p)) => {
            if !p.phase.is_syzygy() {
                Relevance::Low
            } else if p.contacts.is_empty() {
                Relevance::Medium
            } else {
                Relevance::High
            }
        }
        (EventKind::EclipseSolar | EventKind::EclipseLunar, EventDetail::Eclipse(e)) => {
            if e.class == EclipseType::Penumbral && e.contacts.is_empty() {
                Relevance::Medium
            } else {
                Relevance::High
            }
        }
        (EventKind::ProfectionStart, EventDetail::Profection(_)) => Relevance::High,
        _ => Relevance::Low,
    }
}

fn is_luminary_or_angle(point: Point) -> bool {
    match point {
        Point::Body(b) => b.is_luminary(),
        Point::Angle(_) => true,
    }
}

fn aspect_tier(a: &AspectDetail) -> Relevance {
    if a.moving.layer == Layer::Progressed {
        return if a.aspect == AspectKind::Conjunction {
            Relevance::High
        } else {
            Relevance::Medium
        };
    }
    let Some(body) = a.moving.point.body() else {
        return Relevance::Low;
    };
    if !a.aspect.is_major() || body == Body::Moon {
        return Relevance::Low;
    }
    if body.is_slow() {
        if a.aspect.is_hard() && is_luminary_or_angle(a.target.point) {
            return Relevance::High;
        }
        return Relevance::Medium;
    }
    Relevance::Medium
}

fn house_change_tier(body: Body) -> Relevance {
    match body {
        Body::Saturn | Body::Uranus | Body::Neptune | Body::Pluto => Relevance::High,
        Body::Jupiter | Body::Mars => Relevance::Medium,
        _ => Relevance::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eclipse::EclipseKind;
    use crate::event::{EclipseDetail, HouseDetail, LunarPhaseDetail, ProfectionDetail};
    use crate::lunar_phase_types::{LunarContact, LunarPhase};
    use crate::natal::{Angle, PointRef};
    use transit_ephem::ZodiacSign;

    fn aspect(moving: PointRef, target: Point, kind: AspectKind) -> EventDetail {
        EventDetail::Aspect(AspectDetail {
            moving,
            moving_longitude_deg: 0.0,
            moving_speed_deg_per_day: 0.1,
            target: PointRef::natal(target),
            target_longitude_deg: 0.0,
            aspect: kind,
            orb_deg: 0.0,
            applying: false,
        })
    }

    #[test]
    fn slow_hard_aspect_to_luminary_is_high() {
        let d = aspect(
            PointRef::transiting(Body::Saturn),
            Point::Body(Body::Sun),
            AspectKind::Opposition,
        );
        assert_eq!(classify(EventKind::AspectExact, &d), Relevance::High);
        let d = aspect(
            PointRef::transiting(Body::Pluto),
            Point::Angle(Angle::Midheaven),
            AspectKind::Conjunction,
        );
        assert_eq!(classify(EventKind::AspectFormed, &d), Relevance::High);
    }

    #[test]
    fn slow_soft_aspect_is_medium() {
        let d = aspect(
            PointRef::transiting(Body::Jupiter),
            Point::Body(Body::Moon),
            AspectKind::Trine,
        );
        assert_eq!(classify(EventKind::AspectExact, &d), Relevance::Medium);
    }

    #[test]
    fn moon_and_minor_aspects_are_low() {
        let d = aspect(
            PointRef::transiting(Body::Moon),
            Point::Body(Body::Sun),
            AspectKind::Conjunction,
        );
        assert_eq!(classify(EventKind::AspectExact, &d), Relevance::Low);
        let d = aspect(
            PointRef::transiting(Body::Saturn),
            Point::Body(Body::Sun),
            AspectKind::Quincunx,
        );
        assert_eq!(classify(EventKind::AspectExact, &d), Relevance::Low);
    }

    #[test]
    fn progressed_conjunction_is_high() {
        let d = aspect(
            PointRef::progressed(Body::Moon),
            Point::Body(Body::Venus),
            AspectKind::Conjunction,
        );
        assert_eq!(classify(EventKind::AspectExact, &d), Relevance::High);
    }

    #[test]
    fn house_changes_by_body_speed() {
        let h = |body| {
            EventDetail::House(HouseDetail {
                body,
                longitude_deg: 30.0,
                speed_deg_per_day: 0.1,
                house: 2,
                from_house: 1,
                to_house: 2,
            })
        };
        assert_eq!(classify(EventKind::HouseIngress, &h(Body::Saturn)), Relevance::High);
        assert_eq!(classify(EventKind::HouseEgress, &h(Body::Mars)), Relevance::Medium);
        assert_eq!(classify(EventKind::HouseIngress, &h(Body::Moon)), Relevance::Low);
    }

    #[test]
    fn lunation_with_contact_is_high() {
        let mut detail = LunarPhaseDetail {
            phase: LunarPhase::FullMoon,
            moon_longitude_deg: 100.0,
            sun_longitude_deg: 280.0,
            contacts: Vec::new(),
        };
        let kind = EventKind::LunarPhase;
        assert_eq!(classify(kind, &EventDetail::LunarPhase(detail.clone())), Relevance::Medium);
        detail.contacts.push(LunarContact {
            target: Point::Body(Body::Venus),
            target_longitude_deg: 101.0,
            orb_deg: 1.0,
        });
        assert_eq!(classify(kind, &EventDetail::LunarPhase(detail.clone())), Relevance::High);
        detail.phase = LunarPhase::FirstQuarter;
        assert_eq!(classify(kind, &EventDetail::LunarPhase(detail)), Relevance::Low);
    }

    #[test]
    fn eclipses_are_high_unless_bare_penumbral() {
        let mut detail = EclipseDetail {
            kind: EclipseKind::Lunar,
            class: EclipseType::Penumbral,
            longitude_deg: 174.0,
            moon_latitude_deg: 1.1,
            natal_house: 6,
            contacts: Vec::new(),
        };
        let kind = EventKind::EclipseLunar;
        assert_eq!(classify(kind, &EventDetail::Eclipse(detail.clone())), Relevance::Medium);
        detail.class = EclipseType::Partial;
        assert_eq!(classify(kind, &EventDetail::Eclipse(detail.clone())), Relevance::High);
        detail.kind = EclipseKind::Solar;
        detail.class = EclipseType::Annular;
        assert_eq!(
            classify(EventKind::EclipseSolar, &EventDetail::Eclipse(detail)),
            Relevance::High
        );
    }

    #[test]
    fn profection_and_status() {
        let p = EventDetail::Profection(ProfectionDetail {
            age: 30,
            house: 7,
            sign: ZodiacSign::Libra,
            lord: Body::Venus,
        });
        assert_eq!(classify(EventKind::ProfectionStart, &p), Relevance::High);
        let s = EventDetail::HouseStatus {
            transits: Vec::new(),
        };
        assert_eq!(classify(EventKind::HouseStatus, &s), Relevance::Low);
    }
}
