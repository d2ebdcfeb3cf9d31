//! Scan configuration, loadable from TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};
use transit_ephem::{ALL_BODIES, Body, DEFAULT_DELTA_T_SECONDS, PrecisionMode};

use crate::aspect_types::{AspectDefinition, AspectKind, AspectTable, default_major_definitions};
use crate::error::ScanError;
use crate::lunar_phase_types::PhaseScheme;
use crate::report::LocalZone;

/// Largest accepted UTC offset for local-time formatting (±14 h).
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HouseConfig {
    pub enabled: bool,
    /// Emit an egress for the house left alongside each ingress.
    pub emit_egress: bool,
    /// One occupancy snapshot at the start of the scan.
    pub status_snapshot: bool,
}

impl Default for HouseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            emit_egress: true,
            status_snapshot: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LunarPhaseConfig {
    pub enabled: bool,
    pub scheme: PhaseScheme,
    /// Natal points within this distance of the Moon are listed as contacts.
    pub contact_orb_deg: f64,
    /// Check every New and Full Moon for a solar or lunar eclipse.
    pub eclipses: bool,
}

impl Default for LunarPhaseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            scheme: PhaseScheme::Four,
            contact_orb_deg: 3.0,
            eclipses: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProgressionConfig {
    pub enabled: bool,
    /// Progressed bodies checked against natal targets.
    pub bodies: Vec<Body>,
    pub aspects: Vec<AspectDefinition>,
    /// Also check transiting bodies against the progressed bodies.
    pub transits_to_progressed: bool,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bodies: vec![Body::Moon],
            aspects: vec![AspectDefinition::new(AspectKind::Conjunction, 2.0)],
            transits_to_progressed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfectionConfig {
    pub enabled: bool,
}

impl Default for ProfectionConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Everything a scan needs besides the natal chart and the date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Spacing of the sampling grid in hours.
    pub cadence_hours: f64,
    /// Transiting bodies tracked for aspects and house changes.
    pub bodies: Vec<Body>,
    pub aspects: Vec<AspectDefinition>,
    /// Distance from exactness treated as exact, in degrees.
    pub exact_epsilon_deg: f64,
    /// Use the natal ASC, IC, DSC and MC as aspect targets.
    pub include_angles: bool,
    pub houses: HouseConfig,
    pub lunar_phases: LunarPhaseConfig,
    pub progressions: ProgressionConfig,
    pub profections: ProfectionConfig,
    /// IANA zone for the local-time field of report records, e.g.
    /// `"America/Argentina/Buenos_Aires"`. Takes precedence over
    /// `utc_offset_minutes`.
    pub timezone: Option<String>,
    /// Fixed offset used when no `timezone` is set.
    pub utc_offset_minutes: i32,
    /// Fail at construction unless the provider runs in this mode.
    pub required_precision: Option<PrecisionMode>,
    /// Contiguous sub-ranges scanned on separate threads.
    pub partitions: usize,
    /// Deadline for a single provider call.
    pub sample_timeout_ms: Option<u64>,
    /// TT - UTC in seconds.
    pub delta_t_seconds: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            cadence_hours: 1.0,
            bodies: ALL_BODIES.to_vec(),
            aspects: default_major_definitions(),
            exact_epsilon_deg: 0.001,
            include_angles: true,
            houses: HouseConfig::default(),
            lunar_phases: LunarPhaseConfig::default(),
            progressions: ProgressionConfig::default(),
            profections: ProfectionConfig::default(),
            timezone: None,
            utc_offset_minutes: 0,
            required_precision: None,
            partitions: 1,
            sample_timeout_ms: None,
            delta_t_seconds: DEFAULT_DELTA_T_SECONDS,
        }
    }
}

fn check_unique(what: &str, bodies: &[Body]) -> Result<(), ScanError> {
    for (i, b) in bodies.iter().enumerate() {
        if bodies[..i].contains(b) {
            return Err(ScanError::config(format!("{b} listed twice in {what}")));
        }
    }
    Ok(())
}

impl ScanConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ScanError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ScanError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        if !self.cadence_hours.is_finite() || self.cadence_hours <= 0.0 {
            return Err(ScanError::config("cadence_hours must be positive"));
        }
        check_unique("bodies", &self.bodies)?;
        if !self.exact_epsilon_deg.is_finite()
            || self.exact_epsilon_deg <= 0.0
            || self.exact_epsilon_deg >= 1.0
        {
            return Err(ScanError::config("exact_epsilon_deg must be in (0, 1)"));
        }
        self.aspect_table()?;
        let lunar = &self.lunar_phases;
        if !lunar.contact_orb_deg.is_finite()
            || lunar.contact_orb_deg < 0.0
            || lunar.contact_orb_deg >= 90.0
        {
            return Err(ScanError::config("lunar_phases.contact_orb_deg must be in [0, 90)"));
        }
        check_unique("progressions.bodies", &self.progressions.bodies)?;
        self.progressed_aspect_table()?;
        if self.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ScanError::config("utc_offset_minutes must be within ±840"));
        }
        self.local_zone()?;
        if self.partitions == 0 {
            return Err(ScanError::config("partitions must be at least 1"));
        }
        if self.sample_timeout_ms == Some(0) {
            return Err(ScanError::config("sample_timeout_ms must be positive"));
        }
        if !self.delta_t_seconds.is_finite() {
            return Err(ScanError::config("delta_t_seconds must be finite"));
        }
        Ok(())
    }

    /// Zone for local times: the named zone if set, else the fixed offset.
    pub fn local_zone(&self) -> Result<LocalZone, ScanError> {
        match &self.timezone {
            Some(name) => LocalZone::named(name),
            None => LocalZone::fixed(self.utc_offset_minutes),
        }
    }

    /// Validated table for transiting aspects.
    pub fn aspect_table(&self) -> Result<AspectTable, ScanError> {
        AspectTable::new(self.aspects.clone())
    }

    /// Validated table for progressed aspects.
    pub fn progressed_aspect_table(&self) -> Result<AspectTable, ScanError> {
        AspectTable::new(self.progressions.aspects.clone())
            .map_err(|e| match e {
                ScanError::Configuration(msg) => ScanError::config(format!("progressions: {msg}")),
                other => other,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspect_types::Orb;

    #[test]
    fn defaults_validate() {
        let c = ScanConfig::default();
        c.validate().unwrap();
        assert_eq!(c.bodies.len(), 10);
        assert_eq!(c.lunar_phases.scheme, PhaseScheme::Four);
        assert_eq!(c.progressions.bodies, vec![Body::Moon]);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = ScanConfig::from_toml_str(
            r#"
cadence_hours = 6.0
bodies = ["venus", "saturn"]
required_precision = "analytic_approximation"

[[aspects]]
kind = "conjunction"
orb = 1.0

[[aspects]]
kind = "square"
orb = { applying = 3.0, separating = 2.0 }

[lunar_phases]
scheme = "eight"
"#,
        )
        .unwrap();
        assert_eq!(c.cadence_hours, 6.0);
        assert_eq!(c.bodies, vec![Body::Venus, Body::Saturn]);
        assert_eq!(c.aspects.len(), 2);
        assert_eq!(
            c.aspects[1].orb,
            Orb {
                applying: 3.0,
                separating: 2.0
            }
        );
        assert_eq!(c.lunar_phases.scheme, PhaseScheme::Eight);
        assert!(c.lunar_phases.enabled);
        assert_eq!(c.required_precision, Some(PrecisionMode::AnalyticApproximation));
        assert!(c.houses.emit_egress);
    }

    #[test]
    fn overrides_parse() {
        let c = ScanConfig::from_toml_str(
            r#"
[[aspects]]
kind = "conjunction"
orb = 3.0
overrides = [{ moving = "moon", target = "ascendant", orb = 5.0 }]
"#,
        )
        .unwrap();
        let table = c.aspect_table().unwrap();
        assert_eq!(table.definitions()[0].overrides.len(), 1);
    }

    #[test]
    fn duplicate_aspects_rejected() {
        let err = ScanConfig::from_toml_str(
            r#"
[[aspects]]
kind = "trine"
orb = 2.0

[[aspects]]
kind = "trine"
orb = 4.0
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ScanError::Configuration(_)));
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(ScanConfig::from_toml_str("cadense_hours = 2.0").is_err());
    }

    #[test]
    fn invalid_values_rejected() {
        for toml in [
            "cadence_hours = 0.0",
            "partitions = 0",
            "exact_epsilon_deg = 2.0",
            "utc_offset_minutes = 900",
            "bodies = [\"moon\", \"moon\"]",
            "sample_timeout_ms = 0",
            "timezone = \"Europe/Atlantis\"",
        ] {
            assert!(ScanConfig::from_toml_str(toml).is_err(), "{toml} accepted");
        }
    }

    #[test]
    fn named_timezone_wins_over_offset() {
        let c = ScanConfig::from_toml_str(
            "timezone = \"America/Argentina/Buenos_Aires\"\nutc_offset_minutes = 60\n",
        )
        .unwrap();
        assert!(matches!(c.local_zone().unwrap(), LocalZone::Named(_)));
        let c = ScanConfig::from_toml_str("utc_offset_minutes = 60").unwrap();
        assert!(matches!(c.local_zone().unwrap(), LocalZone::Fixed(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.toml");
        std::fs::write(&path, "cadence_hours = 2.0\npartitions = 4\n").unwrap();
        let c = ScanConfig::load(&path).unwrap();
        assert_eq!(c.partitions, 4);
        assert!(matches!(
            ScanConfig::load(&dir.path().join("missing.toml")),
            Err(ScanError::Io(_))
        ));
    }
}
