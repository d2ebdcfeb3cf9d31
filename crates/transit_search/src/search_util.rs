//! Shared numerics for refining transition instants between two samples.

use crate::error::ScanError;

/// Refinement stops once the bracket is narrower than one second.
pub(crate) const CONVERGENCE_DAYS: f64 = 1.0 / 86_400.0;

/// Upper bound on bisection steps (brackets up to ~30 years).
pub(crate) const MAX_ITERATIONS: u32 = 64;

/// Normalize an angle to (-180, +180].
pub(crate) fn normalize_to_pm180(deg: f64) -> f64 {
    let mut d = deg % 360.0;
    if d > 180.0 {
        d -= 360.0;
    } else if d <= -180.0 {
        d += 360.0;
    }
    d
}

/// Sign change that is a real zero crossing rather than a ±180° wrap.
pub(crate) fn is_genuine_crossing(f_a: f64, f_b: f64) -> bool {
    f_a * f_b < 0.0 && (f_a - f_b).abs() < 270.0
}

/// Bisect the zero crossing of `f_at` between `t_a` and `t_b`.
pub(crate) fn bisect_zero<F>(mut t_a: f64, mut f_a: f64, mut t_b: f64, f_at: F) -> Result<f64, ScanError>
where
    F: Fn(f64) -> Result<f64, ScanError>,
{
    for _ in 0..MAX_ITERATIONS {
        if (t_b - t_a).abs() < CONVERGENCE_DAYS {
            break;
        }
        let t_mid = 0.5 * (t_a + t_b);
        let f_mid = f_at(t_mid)?;
        if f_a * f_mid <= 0.0 {
            t_b = t_mid;
        } else {
            t_a = t_mid;
            f_a = f_mid;
        }
    }
    Ok(0.5 * (t_a + t_b))
}

/// Bisect the first instant in `(t_a, t_b]` where `holds` stops returning
/// the value it has at `t_a`.
///
/// `holds(t_a)` and `holds(t_b)` are expected to differ; the result is the
/// right edge of the final bracket, so the changed value holds there.
pub(crate) fn bisect_change<F>(mut t_a: f64, mut t_b: f64, initial: bool, holds: F) -> Result<f64, ScanError>
where
    F: Fn(f64) -> Result<bool, ScanError>,
{
    for _ in 0..MAX_ITERATIONS {
        if (t_b - t_a).abs() < CONVERGENCE_DAYS {
            break;
        }
        let t_mid = 0.5 * (t_a + t_b);
        if holds(t_mid)? == initial {
            t_a = t_mid;
        } else {
            t_b = t_mid;
        }
    }
    Ok(t_b)
}
