//! Session statistics, summarised at the end of a run

use std::fmt;
use std::time::{Duration, Instant};

use correlation_engine::CorrelationReport;
use observability::metrics::{CorrelationMetricsAggregator, MetricsSummary, PollObservation};
use recorder::RecordingSummary;

use crate::display::DisplayUpdate;

#[derive(Debug, Clone)]
pub struct SessionStats {
    started: Instant,
    display_polls: u64,
    display_bins: u64,
    channel_photons: Vec<u64>,
    correlation: CorrelationMetricsAggregator,
    recordings: u64,
    recorded_photons: u64,
    dropped_batches: u64,
}

impl SessionStats {
    pub fn new(channel_count: usize) -> Self {
        Self {
            started: Instant::now(),
            display_polls: 0,
            display_bins: 0,
            channel_photons: vec![0; channel_count],
            correlation: CorrelationMetricsAggregator::new(),
            recordings: 0,
            recorded_photons: 0,
            dropped_batches: 0,
        }
    }

    pub fn record_display(&mut self, update: &DisplayUpdate) {
        self.display_polls += 1;
        self.display_bins += update.bins as u64;
        for (total, photons) in self.channel_photons.iter_mut().zip(&update.photons) {
            *total += photons;
        }
    }

    pub fn record_correlation(
        &mut self,
        report: &CorrelationReport,
        window_samples: usize,
        elapsed: Duration,
    ) {
        self.correlation.update(&PollObservation {
            computed: report.curves.len(),
            skipped: report
                .skipped
                .iter()
                .map(|(_, error)| skip_reason(error))
                .collect(),
            undefined_bins: report.undefined_bins(),
            window_samples,
            elapsed,
        });
    }

    pub fn record_recording(&mut self, summary: &RecordingSummary) {
        self.recordings += 1;
        self.recorded_photons += summary.photons;
        self.dropped_batches += summary.sink.dropped_batches;
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            elapsed: self.started.elapsed(),
            display_polls: self.display_polls,
            display_bins: self.display_bins,
            channel_photons: self.channel_photons.clone(),
            correlation: self.correlation.summary(),
            recordings: self.recordings,
            recorded_photons: self.recorded_photons,
            dropped_batches: self.dropped_batches,
        }
    }
}

/// Stable label for a skipped curve, without the per-poll numbers
fn skip_reason(error: &correlation_engine::CorrelationError) -> String {
    use correlation_engine::CorrelationError::*;
    match error {
        EmptySequence { .. } => "empty sequence",
        InsufficientSpan { .. } => "insufficient span",
        NoLagBins => "no lag bins",
        NonIncreasingEdges { .. } => "non-increasing edges",
        LengthMismatch { .. } => "length mismatch",
        DetectorSelection { .. } => "detector selection",
    }
    .to_string()
}

#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub elapsed: Duration,
    pub display_polls: u64,
    pub display_bins: u64,
    pub channel_photons: Vec<u64>,
    pub correlation: MetricsSummary,
    pub recordings: u64,
    pub recorded_photons: u64,
    pub dropped_batches: u64,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Session Summary ===")?;
        writeln!(f, "Elapsed: {:.1}s", self.elapsed.as_secs_f64())?;
        writeln!(
            f,
            "Display: {} polls, {} bins",
            self.display_polls, self.display_bins
        )?;
        for (channel, photons) in self.channel_photons.iter().enumerate() {
            writeln!(f, "  ch{}: {} photons", channel, photons)?;
        }
        writeln!(
            f,
            "Recordings: {} ({} photons, {} dropped batches)",
            self.recordings, self.recorded_photons, self.dropped_batches
        )?;
        write!(f, "{}", self.correlation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use correlation_engine::{CorrelationCurve, CorrelationError, CurveKind};

    #[test]
    fn test_display_totals() {
        let mut stats = SessionStats::new(2);
        stats.record_display(&DisplayUpdate {
            bins: 3,
            photons: vec![10, 4],
            canvas_index: 3,
        });
        stats.record_display(&DisplayUpdate {
            bins: 1,
            photons: vec![1, 0],
            canvas_index: 4,
        });

        let summary = stats.summary();
        assert_eq!(summary.display_polls, 2);
        assert_eq!(summary.display_bins, 4);
        assert_eq!(summary.channel_photons, vec![11, 4]);
    }

    #[test]
    fn test_correlation_skip_reasons() {
        let mut stats = SessionStats::new(2);
        let report = CorrelationReport {
            lag_centers: vec![1.0, 2.0],
            curves: vec![CorrelationCurve {
                kind: CurveKind::Auto { channel: 0 },
                values: vec![Some(1.0), None],
            }],
            skipped: vec![(
                CurveKind::Auto { channel: 1 },
                CorrelationError::InsufficientSpan {
                    span: 3,
                    required: 10,
                },
            )],
        };
        stats.record_correlation(&report, 500, Duration::from_millis(2));

        let summary = stats.summary();
        assert_eq!(summary.correlation.total_polls, 1);
        assert_eq!(summary.correlation.curves_computed, 1);
        assert_eq!(summary.correlation.undefined_bins, 1);
        assert_eq!(
            summary.correlation.skip_reasons.get("insufficient span"),
            Some(&1)
        );

        let text = summary.to_string();
        assert!(text.contains("=== Session Summary ==="));
        assert!(text.contains("=== Correlation Summary ==="));
        assert!(text.contains("ch1: 0 photons"));
    }
}
