//! Candidate power generation for stability sweeps.

use crate::error::{SimError, SimResult};

fn check_bounds(start: f64, end: f64, points: usize) -> SimResult<()> {
    if points < 2 {
        return Err(SimError::InvalidArg {
            what: format!("sweep needs at least 2 points (got {points})"),
        });
    }
    if !start.is_finite() || !end.is_finite() {
        return Err(SimError::InvalidArg {
            what: "sweep bounds must be finite".to_string(),
        });
    }
    if (start - end).abs() < 1e-12 {
        return Err(SimError::InvalidArg {
            what: "start and end must differ".to_string(),
        });
    }
    Ok(())
}

/// Uniformly spaced powers from `start` to `end` inclusive.
pub fn linear_candidates(start: f64, end: f64, points: usize) -> SimResult<Vec<f64>> {
    check_bounds(start, end, points)?;
    let delta = (end - start) / (points - 1) as f64;
    let mut out: Vec<f64> = (0..points).map(|i| start + i as f64 * delta).collect();
    // Exact endpoint
    out[points - 1] = end;
    Ok(out)
}

/// Logarithmically spaced powers; both bounds must be strictly positive.
pub fn logarithmic_candidates(start: f64, end: f64, points: usize) -> SimResult<Vec<f64>> {
    check_bounds(start, end, points)?;
    if start <= 0.0 || end <= 0.0 {
        return Err(SimError::InvalidArg {
            what: format!("logarithmic sweep needs positive bounds (got {start}, {end})"),
        });
    }
    let (ls, le) = (start.ln(), end.ln());
    let delta = (le - ls) / (points - 1) as f64;
    let mut out: Vec<f64> = (0..points).map(|i| (ls + i as f64 * delta).exp()).collect();
    out[0] = start;
    out[points - 1] = end;
    Ok(out)
}
