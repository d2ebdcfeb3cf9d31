//! Transit scanning engine.
//!
//! This crate provides:
//! - Natal context loading and validation (longitudes, cusps, angles)
//! - An aspect matcher with asymmetric orbs and per-pair overrides
//! - Edge-triggered detectors for aspects, house changes, lunar phases,
//!   eclipses, secondary progressions and annual profections
//! - A scan driver over a fixed cadence grid, sequential or partitioned
//!   across threads, with bisection-refined event instants
//! - Relevance tiers and string-formatted report records

pub mod aspect;
pub mod aspect_detector;
pub mod aspect_types;
pub mod config;
pub mod detector;
pub mod eclipse;
pub mod error;
pub mod event;
pub mod house;
pub mod house_detector;
pub mod lunar_phase;
pub mod lunar_phase_types;
pub mod natal;
pub mod profection;
pub mod progressed;
pub mod relevance;
pub mod report;
pub mod sampler;
pub mod scan;
pub(crate) mod search_util;

pub use aspect::{AspectGeometry, AspectMatch, PointSample, best_match, geometry, match_aspect};
pub use aspect_detector::{AspectDetector, Phase};
pub use aspect_types::{
    ALL_ASPECTS, AspectDefinition, AspectKind, AspectTable, Harmony, Orb, OrbOverride,
    default_major_definitions,
};
pub use config::{
    HouseConfig, LunarPhaseConfig, ProfectionConfig, ProgressionConfig, ScanConfig,
};
pub use detector::{Detector, EdgeTrigger, Frame, ScanContext, Step};
pub use eclipse::{EclipseKind, EclipseType, lunar_eclipse, solar_eclipse};
pub use error::ScanError;
pub use event::{
    AspectDetail, EclipseDetail, EventDetail, EventKind, HouseDetail, LunarPhaseDetail,
    ProfectionDetail, Relevance, TransitEvent,
};
pub use house::{HouseTransit, house_label, house_of};
pub use house_detector::HouseDetector;
pub use lunar_phase::{LunarPhaseDetector, elongation_deg};
pub use lunar_phase_types::{LunarContact, LunarPhase, PhaseScheme};
pub use natal::{ALL_ANGLES, Angle, HouseCusps, Layer, NatalContext, Point, PointRef};
pub use profection::{ProfectionDetector, age_at, anniversary, profection};
pub use progressed::{PROGRESSION_DAYS_PER_YEAR, progressed_jd, progressed_position};
pub use relevance::classify;
pub use report::{EventRecord, HouseTransitRecord, LocalZone, ScanReport};
pub use sampler::{BodyPosition, PositionSampler};
pub use scan::TransitScanner;
