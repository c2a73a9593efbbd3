//! LagBinBuilder - logarithmic lag bins in clock ticks

use contracts::Tick;
use serde::Serialize;

use crate::error::{CorrelationError, Result};

/// Strictly increasing lag-bin edges in ticks, with display midpoints
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LagBins {
    edges: Vec<Tick>,
    centers: Vec<f64>,
    clock_period: f64,
}

impl LagBins {
    /// Use explicit integer edges
    ///
    /// Centers are the midpoints of adjacent edges, converted to seconds.
    pub fn from_edges(edges: Vec<Tick>, clock_period: f64) -> Result<Self> {
        if let Some(index) = (1..edges.len()).find(|&i| edges[i] <= edges[i - 1]) {
            return Err(CorrelationError::NonIncreasingEdges { index });
        }
        let centers = edges
            .windows(2)
            .map(|w| (w[0] + w[1]) as f64 / 2.0 * clock_period)
            .collect();
        Ok(Self {
            edges,
            centers,
            clock_period,
        })
    }

    /// Edges in ticks
    pub fn edges(&self) -> &[Tick] {
        &self.edges
    }

    /// Bin midpoints in seconds, one per bin
    pub fn centers(&self) -> &[f64] {
        &self.centers
    }

    /// Seconds per tick the edges were computed for
    pub fn clock_period(&self) -> f64 {
        self.clock_period
    }

    /// Number of bins (`edges - 1`, or 0)
    pub fn bin_count(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    /// Largest edge, the longest lag any bin reaches
    pub fn largest_edge(&self) -> Option<Tick> {
        self.edges.last().copied()
    }
}

/// Build `nbins + 1` log-spaced lag edges between `tmin` and `tmax` seconds
///
/// Out-of-range parameters are clamped instead of rejected:
/// - `nbins == 0` becomes 1
/// - `tmin <= 0` becomes one clock period
/// - `tmax <= tmin` becomes `tmin + 1`
///
/// Edges are rounded to whole ticks; an edge rounding to the same tick as
/// the previous surviving edge is dropped. With `avoid_zero` a smallest edge
/// of 0 ticks is raised to 1.
pub fn gen_bins(nbins: usize, tmin: f64, tmax: f64, clock_period: f64, avoid_zero: bool) -> LagBins {
    let nbins = nbins.max(1);
    let tmin = if tmin > 0.0 { tmin } else { clock_period };
    let tmax = if tmax > tmin { tmax } else { tmin + 1.0 };

    let log_min = tmin.ln();
    let step = (tmax.ln() - log_min) / nbins as f64;

    let mut edges: Vec<Tick> = Vec::with_capacity(nbins + 1);
    let mut seconds: Vec<f64> = Vec::with_capacity(nbins + 1);
    for i in 0..=nbins {
        let edge = if i == nbins {
            tmax
        } else {
            (log_min + step * i as f64).exp()
        };
        let mut tick = (edge / clock_period).round() as Tick;
        if avoid_zero && i == 0 && tick == 0 {
            tick = 1;
        }
        if edges.last().is_some_and(|&last| tick <= last) {
            continue;
        }
        edges.push(tick);
        seconds.push(edge);
    }

    let centers = seconds.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();
    LagBins {
        edges,
        centers,
        clock_period,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strictly_increasing(edges: &[Tick]) -> bool {
        edges.windows(2).all(|w| w[0] < w[1])
    }

    #[test]
    fn test_clamped_defaults() {
        let bins = gen_bins(5, 0.0, 0.0, 1e-5, true);
        assert_eq!(bins.edges(), &[1, 10, 100, 1_000, 10_000, 100_001]);
        assert_eq!(bins.bin_count(), 5);
        assert_eq!(bins.centers().len(), 5);
        assert!(bins.centers().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_collapsed_edges_are_dropped() {
        // 10 edges between 1 and 5 ticks cannot all be distinct
        let bins = gen_bins(9, 1e-5, 5e-5, 1e-5, true);
        assert_eq!(bins.edges().first(), Some(&1));
        assert_eq!(bins.largest_edge(), Some(5));
        assert!(strictly_increasing(bins.edges()));
        assert_eq!(bins.centers().len(), bins.bin_count());
    }

    #[test]
    fn test_avoid_zero() {
        let bins = gen_bins(4, 1e-7, 1e-3, 1e-5, true);
        assert_eq!(bins.edges()[0], 1);

        let bins = gen_bins(4, 1e-7, 1e-3, 1e-5, false);
        assert_eq!(bins.edges()[0], 0);
    }

    #[test]
    fn test_zero_nbins_clamped() {
        let bins = gen_bins(0, 1e-5, 1.0, 1e-5, true);
        assert_eq!(bins.edges(), &[1, 100_000]);
    }

    #[test]
    fn test_edges_strictly_increasing_over_parameter_grid() {
        for nbins in 2..40 {
            for &(tmin, tmax) in &[(1e-5, 1.0), (3e-5, 2e-4), (1e-6, 1e-2), (0.5, 0.7)] {
                let bins = gen_bins(nbins, tmin, tmax, 1e-5, true);
                assert!(strictly_increasing(bins.edges()), "nbins={nbins} tmin={tmin}");
                assert_eq!(bins.centers().len(), bins.bin_count());
            }
        }
    }

    #[test]
    fn test_from_edges_validates_order() {
        let bins = LagBins::from_edges(vec![1, 2, 3, 4], 1.0).unwrap();
        assert_eq!(bins.centers(), &[1.5, 2.5, 3.5]);

        let err = LagBins::from_edges(vec![1, 3, 3], 1.0).unwrap_err();
        assert_eq!(err, CorrelationError::NonIncreasingEdges { index: 2 });
    }
}
