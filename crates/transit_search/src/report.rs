//! String-formatted records for downstream consumers.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use transit_ephem::{Body, format_dms, format_position};

use crate::eclipse::EclipseKind;
use crate::error::ScanError;
use crate::event::{EventDetail, TransitEvent};
use crate::house::{HouseTransit, house_label};
use crate::natal::{Layer, PointRef};

/// Zone for the local-time field of report records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocalZone {
    /// IANA zone; the offset follows daylight-saving changes.
    Named(Tz),
    Fixed(FixedOffset),
}

impl LocalZone {
    pub fn named(name: &str) -> Result<Self, ScanError> {
        name.parse::<Tz>()
            .map(Self::Named)
            .map_err(|e| ScanError::config(format!("unknown time zone {name:?}: {e}")))
    }

    pub fn fixed(utc_offset_minutes: i32) -> Result<Self, ScanError> {
        utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Self::Fixed)
            .ok_or_else(|| ScanError::config(format!("invalid UTC offset {utc_offset_minutes} min")))
    }

    /// `YYYY-MM-DD HH:MM ±HH:MM` at `instant`.
    pub fn format(&self, instant: &DateTime<Utc>) -> String {
        const FMT: &str = "%Y-%m-%d %H:%M %:z";
        match self {
            Self::Named(tz) => instant.with_timezone(tz).format(FMT).to_string(),
            Self::Fixed(offset) => instant.with_timezone(offset).format(FMT).to_string(),
        }
    }
}

impl Default for LocalZone {
    fn default() -> Self {
        Self::Named(Tz::UTC)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseTransitRecord {
    pub body: String,
    pub symbol: String,
    pub position: String,
    pub house: u8,
    pub house_label: String,
    pub retrograde: bool,
}

impl From<&HouseTransit> for HouseTransitRecord {
    fn from(t: &HouseTransit) -> Self {
        Self {
            body: t.body.name().to_string(),
            symbol: t.body.symbol().to_string(),
            position: format_position(t.longitude_deg),
            house: t.house,
            house_label: house_label(t.house).to_string(),
            retrograde: t.retrograde,
        }
    }
}

/// One event as the downstream schema expects it. Every optional field is
/// omitted from JSON when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub kind: String,
    /// `YYYY-MM-DD` (UTC).
    pub date: String,
    /// `HH:MM:SS` (UTC).
    pub time_utc: String,
    /// RFC 3339 with millisecond precision.
    pub timestamp: String,
    /// `YYYY-MM-DD HH:MM ±HH:MM` in the configured zone.
    pub local_time: String,
    pub relevance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_layer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrograde: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_layer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orb: Option<String>,
    /// `"applying"` or `"separating"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applying: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harmony: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house_label: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub house_transits: Vec<HouseTransitRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lunar_phase: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lunar_contacts: Vec<String>,
    /// `"Total Solar"`, `"Penumbral Lunar"`, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eclipse: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profection_age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profection_sign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lord_of_year: Option<String>,
    /// Filled in by an interpretation layer outside the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,
}

fn layer_name(p: PointRef) -> Option<String> {
    match p.layer {
        Layer::Natal => None,
        other => Some(other.name().to_string()),
    }
}

impl EventRecord {
    pub fn from_event(event: &TransitEvent, zone: &LocalZone) -> Self {
        let mut rec = Self {
            kind: event.kind.name().to_string(),
            date: event.instant.format("%Y-%m-%d").to_string(),
            time_utc: event.instant.format("%H:%M:%S").to_string(),
            timestamp: event
                .instant
                .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            local_time: zone.format(&event.instant),
            relevance: event.relevance.name().to_string(),
            ..Self::default()
        };
        match &event.detail {
            EventDetail::Aspect(a) => {
                rec.body = Some(a.moving.point.name().to_string());
                rec.body_symbol = Some(a.moving.point.symbol().to_string());
                rec.body_layer = layer_name(a.moving);
                rec.body_position = Some(format_position(a.moving_longitude_deg));
                rec.retrograde = Some(a.moving_speed_deg_per_day < 0.0);
                rec.target = Some(a.target.point.name().to_string());
                rec.target_symbol = Some(a.target.point.symbol().to_string());
                rec.target_layer = Some(a.target.layer.name().to_string());
                rec.target_position = Some(format_position(a.target_longitude_deg));
                rec.aspect = Some(a.aspect.name().to_string());
                rec.aspect_symbol = Some(a.aspect.symbol().to_string());
                rec.orb = Some(format_dms(a.orb_deg));
                rec.applying = Some(if a.applying { "applying" } else { "separating" }.to_string());
                rec.harmony = Some(a.aspect.harmony().name().to_string());
            }
            EventDetail::House(h) => {
                rec.body = Some(h.body.name().to_string());
                rec.body_symbol = Some(h.body.symbol().to_string());
                rec.body_position = Some(format_position(h.longitude_deg));
                rec.retrograde = Some(h.speed_deg_per_day < 0.0);
                rec.house = Some(h.house);
                rec.house_label = Some(house_label(h.house).to_string());
            }
            EventDetail::HouseStatus { transits } => {
                rec.house_transits = transits.iter().map(HouseTransitRecord::from).collect();
            }
            EventDetail::LunarPhase(p) => {
                rec.body = Some(Body::Moon.name().to_string());
                rec.body_symbol = Some(Body::Moon.symbol().to_string());
                rec.body_position = Some(format_position(p.moon_longitude_deg));
                rec.lunar_phase = Some(p.phase.name().to_string());
                rec.lunar_contacts = p
                    .contacts
                    .iter()
                    .map(|c| format!("{} ({})", c.target, format_dms(c.orb_deg)))
                    .collect();
            }
            EventDetail::Eclipse(e) => {
                let body = match e.kind {
                    EclipseKind::Solar => Body::Sun,
                    EclipseKind::Lunar => Body::Moon,
                };
                rec.body = Some(body.name().to_string());
                rec.body_symbol = Some(body.symbol().to_string());
                rec.body_position = Some(format_position(e.longitude_deg));
                rec.eclipse = Some(format!("{} {}", e.class.name(), e.kind.name()));
                rec.house = Some(e.natal_house);
                rec.house_label = Some(house_label(e.natal_house).to_string());
                rec.lunar_contacts = e
                    .contacts
                    .iter()
                    .map(|c| format!("{} ({})", c.target, format_dms(c.orb_deg)))
                    .collect();
            }
            EventDetail::Profection(p) => {
                rec.house = Some(p.house);
                rec.house_label = Some(house_label(p.house).to_string());
                rec.profection_age = Some(p.age);
                rec.profection_sign = Some(p.sign.name().to_string());
                rec.lord_of_year = Some(p.lord.name().to_string());
            }
        }
        rec
    }
}

/// Ordered records plus summary counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub events: Vec<EventRecord>,
    pub total_events: usize,
    pub counts_by_kind: BTreeMap<String, usize>,
}

impl ScanReport {
    /// Format `events` with local times in `zone`.
    pub fn from_events(events: &[TransitEvent], zone: &LocalZone) -> Self {
        let mut counts_by_kind = BTreeMap::new();
        for e in events {
            *counts_by_kind.entry(e.kind.name().to_string()).or_insert(0) += 1;
        }
        Self {
            events: events.iter().map(|e| EventRecord::from_event(e, zone)).collect(),
            total_events: events.len(),
            counts_by_kind,
        }
    }

    pub fn to_json_string(&self) -> Result<String, ScanError> {
        serde_json::to_string_pretty(self).map_err(|e| ScanError::config(e.to_string()))
    }
}
