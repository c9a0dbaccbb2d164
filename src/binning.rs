//! Sampling schedule and bin assignment.
//!
//! Worms are counted at sample points spaced by `hour`. Each sample point owns a
//! 3-hour-wide window, so consecutive windows overlap and a worm can be counted
//! at several sample points.

use crate::error::{SimError, require_positive};
use serde::{Deserialize, Serialize};

/// Half of the window width around each sample point.
pub const BIN_HALF_WIDTH: f64 = 1.5;

/// Upper bound on the number of sample points of a single run.
pub const MAX_SAMPLE_POINTS: i64 = 1_000_000;

/// Half-open time window `[lower, upper)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
}

impl Bin {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn around(point: f64) -> Self {
        Self::new(point - BIN_HALF_WIDTH, point + BIN_HALF_WIDTH)
    }

    pub fn contains(&self, time: f64) -> bool {
        self.lower <= time && time < self.upper
    }
}

fn check_groups(molt_groups: &[Vec<f64>], hour: f64) -> Result<(), SimError> {
    require_positive("hour", hour)?;
    if molt_groups.is_empty() {
        return Err(SimError::EmptyInput { group: 0 });
    }
    if let Some(group) = molt_groups.iter().position(Vec::is_empty) {
        return Err(SimError::EmptyInput { group });
    }
    Ok(())
}

fn checked_idx(idx: f64, hour: f64) -> Result<i64, SimError> {
    // i64::MAX is not representable, so the upper bound is exclusive.
    if !idx.is_finite() || idx < i64::MIN as f64 || idx >= i64::MAX as f64 {
        return Err(SimError::InvalidParameter { name: "hour", value: hour });
    }
    Ok(idx as i64)
}

/// Index of the largest multiple of `hour` not above the smallest molt time.
fn small_idx(molt_groups: &[Vec<f64>], hour: f64) -> Result<i64, SimError> {
    check_groups(molt_groups, hour)?;
    let small = molt_groups
        .iter()
        .flatten()
        .copied()
        .fold(f64::INFINITY, f64::min);

    let mut idx = (small / hour).round();
    if idx * hour > small {
        idx -= 1.0;
    }
    checked_idx(idx, hour)
}

/// Index of the smallest multiple of `hour` not below the largest molt time.
fn big_idx(molt_groups: &[Vec<f64>], hour: f64) -> Result<i64, SimError> {
    check_groups(molt_groups, hour)?;
    let big = molt_groups
        .iter()
        .flatten()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);

    let mut idx = (big / hour).round();
    if idx * hour < big {
        idx += 1.0;
    }
    checked_idx(idx, hour)
}

/// Smallest molt time of all groups, rounded down to a multiple of `hour`.
pub fn find_small(molt_groups: &[Vec<f64>], hour: f64) -> Result<f64, SimError> {
    Ok(small_idx(molt_groups, hour)? as f64 * hour)
}

/// Largest molt time of all groups, rounded up to a multiple of `hour`.
pub fn find_big(molt_groups: &[Vec<f64>], hour: f64) -> Result<f64, SimError> {
    Ok(big_idx(molt_groups, hour)? as f64 * hour)
}

/// Sample points `small, small + hour, ..., big` shared by every group.
///
/// Points are computed as integer multiples of `hour`, so the last point is
/// exactly [`find_big`]. Fails if `hour` would yield more than
/// [`MAX_SAMPLE_POINTS`] points.
pub fn find_sample_points(molt_groups: &[Vec<f64>], hour: f64) -> Result<Vec<f64>, SimError> {
    let lo = small_idx(molt_groups, hour)?;
    let hi = big_idx(molt_groups, hour)?;
    match hi.checked_sub(lo) {
        Some(span) if span < MAX_SAMPLE_POINTS => {}
        _ => return Err(SimError::InvalidParameter { name: "hour", value: hour }),
    }
    let points: Vec<_> = (lo..=hi).map(|idx| idx as f64 * hour).collect();
    log::debug!("{} sample points from {lo} to {hi} (hour = {hour})", points.len());
    Ok(points)
}

pub fn create_bins(points: &[f64]) -> Vec<Bin> {
    points.iter().map(|&point| Bin::around(point)).collect()
}

/// Molt times falling into each bin, in source order.
pub fn assign(molt_times: &[f64], bins: &[Bin]) -> Vec<Vec<f64>> {
    bins.iter()
        .map(|bin| {
            molt_times
                .iter()
                .copied()
                .filter(|&time| bin.contains(time))
                .collect()
        })
        .collect()
}

/// Replace every assigned molt time by the sample point it was counted at.
pub fn flatten(assignment: &[Vec<f64>], points: &[f64]) -> Vec<f64> {
    assignment
        .iter()
        .zip(points)
        .flat_map(|(times, &point)| std::iter::repeat_n(point, times.len()))
        .collect()
}

/// Fraction of the group counted in a bin holding `count` worms.
pub fn density(count: usize, size: usize) -> Result<f64, SimError> {
    if size == 0 {
        return Err(SimError::DivisionByZero { name: "size" });
    }
    Ok(count as f64 / size as f64)
}

/// Fraction of the group counted in each bin.
pub fn find_densities(assignment: &[Vec<f64>], size: usize) -> Result<Vec<f64>, SimError> {
    assignment
        .iter()
        .map(|times| density(times.len(), size))
        .collect()
}
