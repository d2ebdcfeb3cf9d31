//! Scan driver: walks the sampling grid and feeds every detector.
//!
//! The grid is `start + i * cadence` with the last sample exactly at `end`.
//! With `partitions > 1` the grid is cut into contiguous sub-ranges that
//! share their boundary sample; each runs on a scoped thread with its own
//! detectors and the per-partition event lists are appended in order.
//! Events are finally stably sorted by instant.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use transit_ephem::{Body, DeadlineProvider, EphemerisProvider, datetime_to_jd};

use crate::aspect_detector::AspectDetector;
use crate::aspect_types::AspectTable;
use crate::config::ScanConfig;
use crate::detector::{Detector, Frame, ScanContext};
use crate::error::ScanError;
use crate::event::TransitEvent;
use crate::house_detector::HouseDetector;
use crate::lunar_phase::LunarPhaseDetector;
use crate::natal::NatalContext;
use crate::profection::ProfectionDetector;
use crate::report::ScanReport;
use crate::sampler::PositionSampler;

/// Runs scans for one provider and configuration.
pub struct TransitScanner {
    sampler: PositionSampler,
    config: ScanConfig,
    aspects: AspectTable,
    progressed_aspects: AspectTable,
}

impl TransitScanner {
    /// Validate `config` and bind it to `provider`.
    ///
    /// Fails when the configuration is invalid or when `required_precision`
    /// is set and the provider runs in a different mode.
    pub fn new(provider: Arc<dyn EphemerisProvider>, config: ScanConfig) -> Result<Self, ScanError> {
        config.validate()?;
        let provider: Arc<dyn EphemerisProvider> = match config.sample_timeout_ms {
            Some(ms) => {
                let workers = config.partitions.max(1);
                let deadline = DeadlineProvider::new(provider, Duration::from_millis(ms), workers)
                    .map_err(|e| ScanError::config(format!("cannot start lookup workers: {e}")))?;
                Arc::new(deadline)
            }
            None => provider,
        };
        let sampler = PositionSampler::new(provider).with_delta_t(config.delta_t_seconds);
        if let Some(required) = config.required_precision {
            sampler.require_precision(required)?;
        }
        let aspects = config.aspect_table()?;
        let progressed_aspects = config.progressed_aspect_table()?;
        Ok(Self {
            sampler,
            config,
            aspects,
            progressed_aspects,
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn sampler(&self) -> &PositionSampler {
        &self.sampler
    }

    /// All events in `[start, end]`, ordered by instant.
    ///
    /// Any error aborts the whole scan; no partial result is returned.
    pub fn scan(
        &self,
        natal: &NatalContext,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TransitEvent>, ScanError> {
        if end <= start {
            return Err(ScanError::config(format!(
                "scan range end {end} is not after start {start}"
            )));
        }
        let start_jd = datetime_to_jd(&start);
        let end_jd = datetime_to_jd(&end);
        let step = self.config.cadence_hours / 24.0;
        let intervals = ((end_jd - start_jd) / step).ceil().max(1.0) as usize;
        let grid = Grid {
            start_jd,
            end_jd,
            step,
            intervals,
        };

        self.warn_coarse_cadence();
        let partitions = self.config.partitions.min(intervals);
        info!(
            %start,
            %end,
            samples = intervals + 1,
            cadence_hours = self.config.cadence_hours,
            partitions,
            precision = %self.sampler.precision(),
            "transit scan started"
        );

        let ctx = ScanContext::new(
            natal,
            &self.config,
            &self.sampler,
            &self.aspects,
            &self.progressed_aspects,
            start,
        );
        let evaluations_before = self.sampler.evaluations();
        let mut events = if partitions <= 1 {
            run_partition(&ctx, &grid, 0, intervals)?
        } else {
            run_parallel(&ctx, &grid, partitions)?
        };
        events.sort_by(|a, b| a.jd_utc.total_cmp(&b.jd_utc));

        debug!(
            evaluations = self.sampler.evaluations() - evaluations_before,
            "sampler statistics"
        );
        info!(events = events.len(), "transit scan finished");
        Ok(events)
    }

    /// Scan and format the result for downstream consumers.
    pub fn scan_report(
        &self,
        natal: &NatalContext,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ScanReport, ScanError> {
        let zone = self.config.local_zone()?;
        let events = self.scan(natal, start, end)?;
        Ok(ScanReport::from_events(&events, &zone))
    }

    fn warn_coarse_cadence(&self) {
        for &body in &self.config.bodies {
            let recommended = body.recommended_cadence_hours();
            if self.config.cadence_hours > recommended {
                warn!(
                    body = body.name(),
                    cadence_hours = self.config.cadence_hours,
                    recommended_hours = recommended,
                    "cadence is coarser than recommended; brief events of this body may be missed"
                );
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Grid {
    start_jd: f64,
    end_jd: f64,
    step: f64,
    intervals: usize,
}

impl Grid {
    fn jd(&self, index: usize) -> f64 {
        if index >= self.intervals {
            self.end_jd
        } else {
            self.start_jd + index as f64 * self.step
        }
    }
}

fn build_detectors(ctx: &ScanContext<'_>) -> Vec<Box<dyn Detector>> {
    let config = ctx.config;
    let mut detectors: Vec<Box<dyn Detector>> = Vec::new();
    if !config.bodies.is_empty() && !ctx.aspects.is_empty() {
        detectors.push(Box::new(AspectDetector::transits(ctx)));
    }
    let progressions = &config.progressions;
    if progressions.enabled && !progressions.bodies.is_empty() {
        if !ctx.progressed_aspects.is_empty() {
            detectors.push(Box::new(AspectDetector::progressions(ctx)));
        }
        if progressions.transits_to_progressed && !ctx.aspects.is_empty() {
            detectors.push(Box::new(AspectDetector::transits_to_progressed(ctx)));
        }
    }
    if config.houses.enabled && !config.bodies.is_empty() {
        detectors.push(Box::new(HouseDetector::new(ctx)));
    }
    if config.lunar_phases.enabled {
        detectors.push(Box::new(LunarPhaseDetector::new(ctx)));
    }
    if config.profections.enabled {
        detectors.push(Box::new(ProfectionDetector::new()));
    }
    detectors
}

fn union(lists: impl Iterator<Item = Vec<Body>>) -> Vec<Body> {
    let mut out: Vec<Body> = Vec::new();
    for b in lists.flatten() {
        if !out.contains(&b) {
            out.push(b);
        }
    }
    out
}

/// Sample grid indices `first..=last` through a fresh detector set.
fn run_partition(
    ctx: &ScanContext<'_>,
    grid: &Grid,
    first: usize,
    last: usize,
) -> Result<Vec<TransitEvent>, ScanError> {
    let mut detectors = build_detectors(ctx);
    let transiting = union(detectors.iter().map(|d| d.transiting_bodies()));
    let progressed = union(detectors.iter().map(|d| d.progressed_bodies()));
    let mut events = Vec::new();
    for index in first..=last {
        let jd = grid.jd(index);
        let mut frame = Frame::new(index, jd);
        for &body in &transiting {
            frame.set_transiting(ctx.transiting(body, jd)?);
        }
        for &body in &progressed {
            frame.set_progressed(ctx.progressed(body, jd)?);
        }
        for detector in detectors.iter_mut() {
            detector.observe(ctx, &frame, &mut events)?;
        }
    }
    Ok(events)
}

fn run_parallel(
    ctx: &ScanContext<'_>,
    grid: &Grid,
    partitions: usize,
) -> Result<Vec<TransitEvent>, ScanError> {
    let bounds: Vec<usize> = (0..=partitions)
        .map(|k| k * grid.intervals / partitions)
        .collect();
    let results: Vec<Result<Vec<TransitEvent>, ScanError>> = thread::scope(|scope| {
        let handles: Vec<_> = bounds
            .windows(2)
            .enumerate()
            .map(|(k, w)| {
                let (first, last) = (w[0], w[1]);
                scope.spawn(move || {
                    debug!(partition = k, first, last, "partition started");
                    let result = run_partition(ctx, grid, first, last);
                    debug!(partition = k, ok = result.is_ok(), "partition finished");
                    result
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    });
    let mut events = Vec::new();
    for r in results {
        events.extend(r?);
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_ends_exactly_at_end() {
        let g = Grid {
            start_jd: 0.0,
            end_jd: 1.05,
            step: 0.25,
            intervals: 5,
        };
        assert_eq!(g.jd(0), 0.0);
        assert_eq!(g.jd(4), 1.0);
        assert_eq!(g.jd(5), 1.05);
    }

    #[test]
    fn union_keeps_first_occurrence_order() {
        let u = union(
            vec![
                vec![Body::Sun, Body::Moon],
                vec![Body::Moon, Body::Venus],
            ]
            .into_iter(),
        );
        assert_eq!(u, vec![Body::Sun, Body::Moon, Body::Venus]);
    }
}
