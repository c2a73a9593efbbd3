//! Correlator - point-process correlation of two arrival sequences
//!
//! Counting follows Laurence et al. (2006): for every reference event `t_i`
//! and lag bin `[tau_min, tau_max)`, count target events `u_j` with
//! `u_j - t_i` inside the bin. Both sequences and the bin edges are sorted,
//! so each bin keeps a pair of indices into `u` that only move forward as
//! `t_i` grows: `O(|t| * nbins + |u|)` instead of `O(|t| * |u|)`.
//!
//! Preconditions (checked by the caller, see `check_span`):
//! - `t` and `u` are non-decreasing and non-empty
//! - `bins` is strictly increasing

use contracts::Tick;

use crate::error::{CorrelationError, Result};

/// Per-bin pair counts
pub fn pcorrelate_counts(t: &[Tick], u: &[Tick], bins: &[Tick]) -> Vec<u64> {
    let nbins = bins.len().saturating_sub(1);
    let mut counts = vec![0u64; nbins];
    // imin[k]: first u with u - t_i >= bins[k]; imax[k]: first u with u - t_i >= bins[k + 1]
    let mut imin = vec![0usize; nbins];
    let mut imax = vec![0usize; nbins];

    for &ti in t {
        let mut j = 0;
        for k in 0..nbins {
            let (tau_min, tau_max) = (bins[k], bins[k + 1]);
            if k == 0 {
                j = imin[0];
                while j < u.len() && u[j] - ti < tau_min {
                    j += 1;
                }
            }
            // bin k starts where bin k - 1 ended
            imin[k] = j;
            if imax[k] > j {
                j = imax[k];
            }
            while j < u.len() && u[j] - ti < tau_max {
                j += 1;
            }
            imax[k] = j;
            counts[k] += (imax[k] - imin[k]) as u64;
        }
    }
    counts
}

/// Unnormalized correlation: counts divided by bin width
pub fn pcorrelate_raw(t: &[Tick], u: &[Tick], bins: &[Tick]) -> Vec<f64> {
    pcorrelate_counts(t, u, bins)
        .into_iter()
        .zip(bins.windows(2))
        .map(|(count, edge)| count as f64 / (edge[1] - edge[0]) as f64)
        .collect()
}

/// Finite-window normalization of a raw correlation
///
/// With `T` the combined span of `t` and `u` and `tau` the upper edge of
/// each bin, `G[k] *= (T - tau) / (n1 * n2)` where `n1` counts `t >= tau`
/// and `n2` counts `u <= max(u) - tau`. A bin with `n1 * n2 == 0` has no
/// defined value and yields `None`.
pub fn pnormalize(g: &[f64], t: &[Tick], u: &[Tick], bins: &[Tick]) -> Vec<Option<f64>> {
    let (Some(duration), Some(&u_max)) = (combined_span(t, u), u.last()) else {
        return vec![None; g.len()];
    };
    let duration = duration as f64;

    g.iter()
        .zip(bins.iter().skip(1))
        .map(|(&value, &tau)| {
            let n1 = t.len() - t.partition_point(|&ti| ti < tau);
            let n2 = u.partition_point(|&uj| uj <= u_max - tau);
            let denominator = n1 as f64 * n2 as f64;
            (denominator > 0.0).then(|| value * (duration - tau as f64) / denominator)
        })
        .collect()
}

/// Normalized correlation of `t` against `u`, one entry per bin
pub fn pcorrelate(t: &[Tick], u: &[Tick], bins: &[Tick]) -> Vec<Option<f64>> {
    let raw = pcorrelate_raw(t, u, bins);
    pnormalize(&raw, t, u, bins)
}

/// Span from the earliest to the latest event of either sequence
pub fn combined_span(t: &[Tick], u: &[Tick]) -> Option<Tick> {
    let first = match (t.first(), u.first()) {
        (Some(&a), Some(&b)) => a.min(b),
        _ => return None,
    };
    let last = match (t.last(), u.last()) {
        (Some(&a), Some(&b)) => a.max(b),
        _ => return None,
    };
    Some(last - first)
}

/// Check that `pcorrelate` has something to compute
///
/// # Errors
/// - `EmptySequence` when either input is empty
/// - `NoLagBins` with fewer than two edges
/// - `InsufficientSpan` unless the combined span exceeds the largest edge
pub fn check_span(t: &[Tick], u: &[Tick], bins: &[Tick]) -> Result<()> {
    if t.is_empty() {
        return Err(CorrelationError::EmptySequence { which: "reference" });
    }
    if u.is_empty() {
        return Err(CorrelationError::EmptySequence { which: "target" });
    }
    let required = match bins {
        [_, .., last] => *last,
        _ => return Err(CorrelationError::NoLagBins),
    };
    let span = combined_span(t, u).unwrap_or(0);
    if span <= required {
        return Err(CorrelationError::InsufficientSpan { span, required });
    }
    Ok(())
}

/// `check_span` followed by `pcorrelate`
pub fn correlate_checked(t: &[Tick], u: &[Tick], bins: &[Tick]) -> Result<Vec<Option<f64>>> {
    check_span(t, u, bins)?;
    Ok(pcorrelate(t, u, bins))
}
