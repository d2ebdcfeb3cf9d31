use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use transit_ephem::{
    ALL_BODIES, AnalyticEphemeris, Body, Center, ChebyshevEphemeris, ChebyshevTable,
    EphemerisProvider, FitConfig, GeoLocation, PositionConfig, PositionKind, datetime_to_jd,
    format_position,
};
use transit_search::{
    NatalContext, PositionSampler, ScanConfig, ScanReport, TransitScanner, age_at, house_label,
    house_of, profection,
};

#[derive(Parser)]
#[command(name = "transit", about = "Transit scanning engine CLI")]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct ProviderArgs {
    /// Fitted Chebyshev table (JSON); the analytic theory is used without it
    #[arg(long)]
    table: Option<PathBuf>,
    /// Apply nutation and aberration (analytic provider only)
    #[arg(long)]
    apparent: bool,
    /// Observer as LAT,LON in degrees (analytic provider only)
    #[arg(long, value_parser = parse_location, allow_hyphen_values = true)]
    topocentric: Option<GeoLocation>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a date range for transit events and print the report as JSON
    Scan {
        /// Natal chart (TOML or JSON)
        #[arg(long)]
        natal: PathBuf,
        /// Range start (RFC 3339 or YYYY-MM-DD, UTC)
        #[arg(long)]
        start: String,
        /// Range end (RFC 3339 or YYYY-MM-DD, UTC)
        #[arg(long)]
        end: String,
        /// Scan configuration (TOML); defaults apply without it
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the configured sampling cadence
        #[arg(long)]
        cadence_hours: Option<f64>,
        /// Override the configured partition count
        #[arg(long)]
        partitions: Option<usize>,
        /// IANA time zone for local times in the report
        #[arg(long)]
        timezone: Option<String>,
        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Print engine events instead of formatted records
        #[arg(long)]
        raw: bool,
        #[command(flatten)]
        provider: ProviderArgs,
    },
    /// Longitude and speed of one body (or all bodies) at an instant
    Position {
        /// Body name; all bodies when omitted
        #[arg(long)]
        body: Option<String>,
        /// UTC instant (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        date: String,
        #[command(flatten)]
        provider: ProviderArgs,
    },
    /// Natal house occupied by each transiting body at an instant
    House {
        /// Natal chart (TOML or JSON)
        #[arg(long)]
        natal: PathBuf,
        /// UTC instant (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        date: String,
        #[command(flatten)]
        provider: ProviderArgs,
    },
    /// Fit a Chebyshev table from the analytic theory
    FitTable {
        /// Range start (RFC 3339 or YYYY-MM-DD, UTC)
        #[arg(long)]
        start: String,
        /// Range end (RFC 3339 or YYYY-MM-DD, UTC)
        #[arg(long)]
        end: String,
        /// Output path (JSON)
        #[arg(long)]
        out: PathBuf,
        /// Segment length in days
        #[arg(long, default_value = "4")]
        segment_days: f64,
        /// Polynomial degree per segment
        #[arg(long, default_value = "13")]
        degree: usize,
        /// Apply nutation and aberration to the source positions
        #[arg(long)]
        apparent: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// RFC 3339, or a bare date taken as midnight UTC.
fn parse_instant(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}' (use RFC 3339 or YYYY-MM-DD)"))?;
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| anyhow!("invalid date '{s}'"))
}

fn parse_body(s: &str) -> Result<Body> {
    Body::from_name(s).ok_or_else(|| {
        let valid: Vec<_> = ALL_BODIES.iter().map(|b| b.name()).collect();
        anyhow!("unknown body '{s}' (valid: {})", valid.join(", "))
    })
}

fn parse_location(s: &str) -> Result<GeoLocation, String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got '{s}'"))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("latitude: {e}"))?;
    let lon: f64 = lon.trim().parse().map_err(|e| format!("longitude: {e}"))?;
    let loc = GeoLocation::new(lat, lon, 0.0);
    loc.validate().map_err(str::to_string)?;
    Ok(loc)
}

fn position_config(apparent: bool, topocentric: Option<GeoLocation>) -> PositionConfig {
    PositionConfig {
        center: topocentric.map_or(Center::Geocentric, Center::Topocentric),
        kind: if apparent {
            PositionKind::Apparent
        } else {
            PositionKind::Mean
        },
    }
}

fn load_provider(args: &ProviderArgs) -> Result<Arc<dyn EphemerisProvider>> {
    match &args.table {
        Some(path) => {
            if args.apparent || args.topocentric.is_some() {
                bail!("--apparent and --topocentric apply to the analytic provider; a table carries its own corrections");
            }
            let eph = ChebyshevEphemeris::open(path)
                .with_context(|| format!("failed to load table {}", path.display()))?;
            info!(path = %path.display(), "using Chebyshev table");
            Ok(Arc::new(eph))
        }
        None => Ok(Arc::new(AnalyticEphemeris::new(position_config(
            args.apparent,
            args.topocentric,
        ))?)),
    }
}

fn load_natal(path: &Path) -> Result<NatalContext> {
    NatalContext::load(path).with_context(|| format!("failed to load natal chart {}", path.display()))
}

#[allow(clippy::too_many_arguments)]
fn run_scan(
    natal: &Path,
    start: &str,
    end: &str,
    config: Option<&Path>,
    cadence_hours: Option<f64>,
    partitions: Option<usize>,
    timezone: Option<&str>,
    output: Option<&Path>,
    raw: bool,
    provider: &ProviderArgs,
) -> Result<()> {
    let natal = load_natal(natal)?;
    let mut config = match config {
        Some(path) => ScanConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ScanConfig::default(),
    };
    if let Some(h) = cadence_hours {
        config.cadence_hours = h;
    }
    if let Some(p) = partitions {
        config.partitions = p;
    }
    if let Some(tz) = timezone {
        config.timezone = Some(tz.to_string());
    }
    let start = parse_instant(start)?;
    let end = parse_instant(end)?;
    let zone = config.local_zone()?;

    let scanner = TransitScanner::new(load_provider(provider)?, config)?;
    let events = scanner.scan(&natal, start, end)?;
    let json = if raw {
        serde_json::to_string_pretty(&events)?
    } else {
        ScanReport::from_events(&events, &zone).to_json_string()?
    };
    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), events = events.len(), "report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_position(body: Option<&str>, date: &str, provider: &ProviderArgs) -> Result<()> {
    let instant = parse_instant(date)?;
    let sampler = PositionSampler::new(load_provider(provider)?);
    let bodies = match body {
        Some(name) => vec![parse_body(name)?],
        None => ALL_BODIES.to_vec(),
    };
    println!("{} (JD {:.5} UTC, {})", instant.to_rfc3339(), datetime_to_jd(&instant), sampler.precision());
    for b in bodies {
        let pos = sampler.position_at_instant(b, &instant)?;
        println!(
            "  {:<8} {:>10.5}°  {:<22} {:>+9.5}°/day{}",
            b.name(),
            pos.longitude_deg,
            format_position(pos.longitude_deg),
            pos.speed_deg_per_day,
            if pos.is_retrograde() { "  R" } else { "" }
        );
    }
    Ok(())
}

fn run_house(natal: &Path, date: &str, provider: &ProviderArgs) -> Result<()> {
    let natal = load_natal(natal)?;
    let instant = parse_instant(date)?;
    let sampler = PositionSampler::new(load_provider(provider)?);
    println!("{}", instant.to_rfc3339());
    if let Some(line) = profection_line(&natal, instant) {
        println!("  {line}");
    }
    for &b in &ALL_BODIES {
        let pos = sampler.position_at_instant(b, &instant)?;
        let house = house_of(pos.longitude_deg, natal.cusps());
        println!(
            "  {:<8} {:<22} house {:>2} ({}){}",
            b.name(),
            format_position(pos.longitude_deg),
            house,
            house_label(house),
            if pos.is_retrograde() { "  R" } else { "" }
        );
    }
    Ok(())
}

/// Year of life and its profected house, or `None` before birth.
fn profection_line(natal: &NatalContext, instant: DateTime<Utc>) -> Option<String> {
    let age = age_at(natal.birth(), instant)?;
    let p = profection(natal, age);
    Some(format!(
        "age {age}: profected house {} ({}), {} year, lord {}",
        p.house,
        house_label(p.house),
        p.sign.name(),
        p.lord.name()
    ))
}

fn run_fit_table(
    start: &str,
    end: &str,
    out: &Path,
    segment_days: f64,
    degree: usize,
    apparent: bool,
) -> Result<()> {
    let start = parse_instant(start)?;
    let end = parse_instant(end)?;
    let source = AnalyticEphemeris::new(position_config(apparent, None))?;
    let fit = FitConfig {
        segment_days,
        degree,
    };
    let table = ChebyshevTable::fit(
        &source,
        &ALL_BODIES,
        datetime_to_jd(&start),
        datetime_to_jd(&end),
        &fit,
    )?;
    table.save(out)?;
    let segments: usize = table.series.iter().map(|s| s.segments.len()).sum();
    println!("Wrote {} ({} bodies, {} segments)", out.display(), table.series.len(), segments);
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Scan {
            natal,
            start,
            end,
            config,
            cadence_hours,
            partitions,
            timezone,
            output,
            raw,
            provider,
        } => run_scan(
            &natal,
            &start,
            &end,
            config.as_deref(),
            cadence_hours,
            partitions,
            timezone.as_deref(),
            output.as_deref(),
            raw,
            &provider,
        ),
        Commands::Position {
            body,
            date,
            provider,
        } => run_position(body.as_deref(), &date, &provider),
        Commands::House {
            natal,
            date,
            provider,
        } => run_house(&natal, &date, &provider),
        Commands::FitTable {
            start,
            end,
            out,
            segment_days,
            degree,
            apparent,
        } => run_fit_table(&start, &end, &out, segment_days, degree, apparent),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_rfc3339_and_bare_dates() {
        assert_eq!(
            parse_instant("2025-01-03T22:36:00Z").unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 3, 22, 36, 0).unwrap()
        );
        assert_eq!(
            parse_instant("2025-01-03T23:36:00+01:00").unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 3, 22, 36, 0).unwrap()
        );
        assert_eq!(
            parse_instant("2025-01-03").unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 3, 0, 0, 0).unwrap()
        );
        assert!(parse_instant("03/01/2025").is_err());
    }

    #[test]
    fn house_output_names_the_profection_year() {
        let natal = NatalContext::new(
            Utc.with_ymd_and_hms(1990, 3, 10, 8, 15, 0).unwrap(),
            std::collections::BTreeMap::new(),
            transit_search::HouseCusps::equal(15.0).unwrap(),
        )
        .unwrap();
        let line =
            profection_line(&natal, Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap()).unwrap();
        assert_eq!(line, "age 30: profected house 7 (Partnerships), Libra year, lord Venus");
        let before = Utc.with_ymd_and_hms(1989, 1, 1, 0, 0, 0).unwrap();
        assert!(profection_line(&natal, before).is_none());
    }

    #[test]
    fn body_names_are_case_insensitive() {
        assert_eq!(parse_body("venus").unwrap(), Body::Venus);
        assert_eq!(parse_body("SATURN").unwrap(), Body::Saturn);
        let err = parse_body("vulcan").unwrap_err().to_string();
        assert!(err.contains("Pluto"));
    }

    #[test]
    fn parses_observer_location() {
        let loc = parse_location("51.48,-0.0015").unwrap();
        assert_eq!((loc.lat_deg, loc.lon_deg), (51.48, -0.0015));
        assert!(parse_location("95,0").is_err());
        assert!(parse_location("51.48").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn scan_writes_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let natal = dir.path().join("natal.toml");
        std::fs::write(
            &natal,
            "birth = \"1985-07-04T14:20:00Z\"\n\
             cusps = [0.0, 30.0, 60.0, 90.0, 120.0, 150.0, 180.0, 210.0, 240.0, 270.0, 300.0, 330.0]\n\
             [bodies]\nsaturn = 330.833\n",
        )
        .unwrap();
        let config = dir.path().join("scan.toml");
        std::fs::write(
            &config,
            "bodies = [\"venus\"]\ninclude_angles = false\n\
             aspects = [{ kind = \"conjunction\", orb = 1.0 }]\n\
             [houses]\nenabled = false\n[lunar_phases]\nenabled = false\n\
             [progressions]\nenabled = false\n[profections]\nenabled = false\n",
        )
        .unwrap();
        let out = dir.path().join("report.json");
        run_scan(
            &natal,
            "2025-01-01",
            "2025-01-10",
            Some(&config),
            None,
            None,
            Some("America/Argentina/Buenos_Aires"),
            Some(&out),
            false,
            &ProviderArgs {
                table: None,
                apparent: false,
                topocentric: None,
            },
        )
        .unwrap();
        let report: ScanReport =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(report.counts_by_kind.get("aspect_exact"), Some(&1));
        assert!(report.events.iter().all(|e| e.local_time.ends_with("-03:00")));
    }
}
