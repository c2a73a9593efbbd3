//! Per-poll correlation of live arrival sequences

use std::fmt;

use contracts::{ArrivalTimes, SessionConfig};
use serde::Serialize;
use tracing::{debug, trace};

use crate::correlator::correlate_checked;
use crate::error::CorrelationError;
use crate::lag_bins::{gen_bins, LagBins};

/// Identity of one correlation curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CurveKind {
    /// Channel against itself
    Auto { channel: usize },
    /// Reference channel against target channel
    Cross { reference: usize, target: usize },
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto { channel } => write!(f, "auto[{channel}]"),
            Self::Cross { reference, target } => write!(f, "cross[{reference}x{target}]"),
        }
    }
}

/// One computed curve
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationCurve {
    /// Which channels were correlated
    pub kind: CurveKind,

    /// Normalized values, index-aligned with the lag centers
    pub values: Vec<Option<f64>>,
}

impl CorrelationCurve {
    /// Bins whose normalization denominator was zero
    pub fn undefined_bins(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}

/// Outcome of one correlation poll
#[derive(Debug, Clone, Default)]
pub struct CorrelationReport {
    /// Lag bin midpoints in seconds
    pub lag_centers: Vec<f64>,

    /// Curves computed on this poll
    pub curves: Vec<CorrelationCurve>,

    /// Curves skipped on this poll, with the reason
    pub skipped: Vec<(CurveKind, CorrelationError)>,
}

impl CorrelationReport {
    /// Find a computed curve
    pub fn curve(&self, kind: CurveKind) -> Option<&CorrelationCurve> {
        self.curves.iter().find(|c| c.kind == kind)
    }

    /// True when nothing was computed (renderer keeps the previous curves)
    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Undefined bins over every computed curve
    pub fn undefined_bins(&self) -> usize {
        self.curves.iter().map(CorrelationCurve::undefined_bins).sum()
    }
}

/// Correlates the per-channel arrival sequences of one window
#[derive(Debug, Clone)]
pub struct CorrelationEngine {
    bins: LagBins,
    auto: bool,
    cross: bool,
}

impl CorrelationEngine {
    /// Create an engine over fixed lag bins
    pub fn new(bins: LagBins, auto: bool, cross: bool) -> Self {
        Self { bins, auto, cross }
    }

    /// Build lag bins and curve selection from a session configuration
    ///
    /// Cross-correlation is disabled on single-channel setups.
    pub fn from_config(config: &SessionConfig) -> Self {
        let corr = &config.correlation;
        let bins = gen_bins(
            corr.nbins,
            corr.tmin,
            corr.tmax,
            config.clock_period(),
            corr.avoid_zero,
        );
        Self::new(bins, corr.auto, corr.cross && config.acquisition.channels >= 2)
    }

    /// Lag bins in use
    pub fn bins(&self) -> &LagBins {
        &self.bins
    }

    /// Replace the lag bins
    pub fn set_bins(&mut self, bins: LagBins) {
        self.bins = bins;
    }

    /// Compute every enabled curve that has enough data
    ///
    /// A curve whose inputs are empty or span no more than the largest lag
    /// is skipped and reported in `skipped`; the others are still computed.
    pub fn correlate(&self, arrivals: &[ArrivalTimes]) -> CorrelationReport {
        let mut report = CorrelationReport {
            lag_centers: self.bins.centers().to_vec(),
            ..Default::default()
        };
        let edges = self.bins.edges();

        if self.cross {
            if let [reference, target, ..] = arrivals {
                let kind = CurveKind::Cross {
                    reference: 0,
                    target: 1,
                };
                push_curve(&mut report, kind, correlate_checked(reference, target, edges));
            }
        }

        if self.auto {
            for (channel, times) in arrivals.iter().enumerate() {
                let kind = CurveKind::Auto { channel };
                push_curve(&mut report, kind, correlate_checked(times, times, edges));
            }
        }

        debug!(
            computed = report.curves.len(),
            skipped = report.skipped.len(),
            undefined_bins = report.undefined_bins(),
            "correlation poll"
        );
        report
    }
}

fn push_curve(
    report: &mut CorrelationReport,
    kind: CurveKind,
    result: Result<Vec<Option<f64>>, CorrelationError>,
) {
    match result {
        Ok(values) => report.curves.push(CorrelationCurve { kind, values }),
        Err(error) => {
            trace!(curve = %kind, %error, "correlation skipped");
            report.skipped.push((kind, error));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(auto: bool, cross: bool) -> CorrelationEngine {
        let bins = LagBins::from_edges(vec![1, 2, 3, 4], 1e-5).unwrap();
        CorrelationEngine::new(bins, auto, cross)
    }

    #[test]
    fn test_auto_curves_per_channel() {
        let arrivals = vec![vec![2, 4, 6, 29], vec![0, 1, 2, 3, 50]];
        let report = engine(true, false).correlate(&arrivals);

        assert_eq!(report.curves.len(), 2);
        assert!(report.skipped.is_empty());
        let first = report.curve(CurveKind::Auto { channel: 0 }).unwrap();
        assert!((first.values[1].unwrap() - 2.0 * 24.0 / 9.0).abs() < 1e-12);
        assert_eq!(report.lag_centers.len(), 3);
    }

    #[test]
    fn test_short_channel_skipped_others_computed() {
        let arrivals = vec![vec![2, 4, 6, 29], vec![0, 4]];
        let report = engine(true, false).correlate(&arrivals);

        assert_eq!(report.curves.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(
            report.skipped[0],
            (
                CurveKind::Auto { channel: 1 },
                CorrelationError::InsufficientSpan { span: 4, required: 4 }
            )
        );
    }

    #[test]
    fn test_cross_curve() {
        let arrivals = vec![vec![0, 10, 20, 30], vec![2, 12, 22, 32]];
        let report = engine(false, true).correlate(&arrivals);

        assert_eq!(report.curves.len(), 1);
        let cross = report
            .curve(CurveKind::Cross {
                reference: 0,
                target: 1,
            })
            .unwrap();
        assert!(cross.values[1].unwrap() > 0.0);
    }

    #[test]
    fn test_empty_channel_skipped() {
        let arrivals = vec![vec![], vec![1, 9]];
        let report = engine(true, true).correlate(&arrivals);
        assert!(matches!(
            report.skipped[0].1,
            CorrelationError::EmptySequence { which: "reference" }
        ));
        assert_eq!(report.curves.len(), 1);
    }

    #[test]
    fn test_from_config_disables_cross_on_single_channel() {
        let mut config = SessionConfig::default();
        config.acquisition.channels = 1;
        config.correlation.cross = true;
        let engine = CorrelationEngine::from_config(&config);

        let report = engine.correlate(&[vec![0, 200_000]]);
        assert_eq!(report.curves.len(), 1);
        assert!(report.skipped.is_empty());
        assert_eq!(report.curves[0].kind, CurveKind::Auto { channel: 0 });
        assert_eq!(engine.bins().edges().first(), Some(&1));
        assert_eq!(engine.bins().largest_edge(), Some(100_000));
    }

    #[test]
    fn test_curve_kind_display() {
        assert_eq!(CurveKind::Auto { channel: 1 }.to_string(), "auto[1]");
        assert_eq!(
            CurveKind::Cross {
                reference: 0,
                target: 1
            }
            .to_string(),
            "cross[0x1]"
        );
    }
}
