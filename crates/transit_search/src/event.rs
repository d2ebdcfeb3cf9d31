//! Transit events emitted by the detectors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use transit_ephem::{Body, ZodiacSign};

use crate::aspect_types::AspectKind;
use crate::eclipse::{EclipseKind, EclipseType};
use crate::house::HouseTransit;
use crate::lunar_phase_types::{LunarContact, LunarPhase};
use crate::natal::PointRef;
use crate::relevance::classify;

/// Significance tier used by downstream filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Relevance {
    High,
    Medium,
    Low,
}

impl Relevance {
    pub const fn name(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

/// What happened. Each variant is one state transition of a detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Pair entered orb.
    AspectFormed,
    /// Deviation reached zero.
    AspectExact,
    /// Distance to exactness started growing again.
    AspectSeparated,
    /// Pair left orb.
    AspectEnded,
    HouseIngress,
    HouseEgress,
    /// Occupancy snapshot at scan start.
    HouseStatus,
    LunarPhase,
    /// New Moon inside the solar eclipse limits.
    EclipseSolar,
    /// Full Moon inside the lunar eclipse limits.
    EclipseLunar,
    ProfectionStart,
}

impl EventKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::AspectFormed => "aspect_formed",
            Self::AspectExact => "aspect_exact",
            Self::AspectSeparated => "aspect_separated",
            Self::AspectEnded => "aspect_ended",
            Self::HouseIngress => "house_ingress",
            Self::HouseEgress => "house_egress",
            Self::HouseStatus => "house_status",
            Self::LunarPhase => "lunar_phase",
            Self::EclipseSolar => "eclipse_solar",
            Self::EclipseLunar => "eclipse_lunar",
            Self::ProfectionStart => "profection_start",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AspectDetail {
    pub moving: PointRef,
    pub moving_longitude_deg: f64,
    pub moving_speed_deg_per_day: f64,
    pub target: PointRef,
    pub target_longitude_deg: f64,
    pub aspect: AspectKind,
    /// Distance from exactness at the event instant.
    pub orb_deg: f64,
    pub applying: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HouseDetail {
    pub body: Body,
    pub longitude_deg: f64,
    pub speed_deg_per_day: f64,
    /// House entered (ingress) or left (egress).
    pub house: u8,
    pub from_house: u8,
    pub to_house: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LunarPhaseDetail {
    pub phase: LunarPhase,
    pub moon_longitude_deg: f64,
    pub sun_longitude_deg: f64,
    pub contacts: Vec<LunarContact>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EclipseDetail {
    pub kind: EclipseKind,
    pub class: EclipseType,
    /// Eclipse degree: the Sun for solar eclipses, the Moon for lunar ones.
    pub longitude_deg: f64,
    pub moon_latitude_deg: f64,
    /// Natal house of the eclipse degree.
    pub natal_house: u8,
    pub contacts: Vec<LunarContact>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfectionDetail {
    /// Completed years at the anniversary.
    pub age: u32,
    pub house: u8,
    pub sign: ZodiacSign,
    /// Traditional ruler of the profected sign.
    pub lord: Body,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventDetail {
    Aspect(AspectDetail),
    House(HouseDetail),
    HouseStatus { transits: Vec<HouseTransit> },
    LunarPhase(LunarPhaseDetail),
    Eclipse(EclipseDetail),
    Profection(ProfectionDetail),
}

/// One emitted transition. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitEvent {
    pub kind: EventKind,
    /// Julian Date (UTC) of the refined instant.
    pub jd_utc: f64,
    pub instant: DateTime<Utc>,
    pub detail: EventDetail,
    pub relevance: Relevance,
}

impl TransitEvent {
    /// Build an event; relevance is derived from kind and detail.
    pub fn new(kind: EventKind, jd_utc: f64, instant: DateTime<Utc>, detail: EventDetail) -> Self {
        let relevance = classify(kind, &detail);
        Self {
            kind,
            jd_utc,
            instant,
            detail,
            relevance,
        }
    }

    pub fn aspect(&self) -> Option<&AspectDetail> {
        match &self.detail {
            EventDetail::Aspect(a) => Some(a),
            _ => None,
        }
    }
}
