//! Metric recording helpers and the in-memory correlation aggregator
//!
//! Names carry the `photon_corr_` prefix. Labels stay low-cardinality:
//! consumer role, sink name, batch status, curve kind.

use std::collections::HashMap;
use std::time::Duration;

use metrics::{counter, gauge, histogram};

/// Samples a consumer (display, correlation, recorder, measure) read from
/// the live buffer.
pub fn record_samples_consumed(role: &'static str, samples: usize) {
    counter!("photon_corr_samples_consumed_total", "role" => role).increment(samples as u64);
}

/// One batch handed to a sink worker, by outcome (`ok`, `error`, `dropped`).
pub fn record_sink_batch(sink: &str, status: &'static str) {
    counter!(
        "photon_corr_sink_batches_total",
        "sink" => sink.to_string(),
        "status" => status
    )
    .increment(1);
}

/// Display poll: whole bins drawn and photons per channel in those bins.
pub fn record_display_poll(bins: usize, channel_photons: &[u64]) {
    counter!("photon_corr_display_bins_total").increment(bins as u64);
    for (channel, photons) in channel_photons.iter().enumerate() {
        counter!(
            "photon_corr_photons_total",
            "channel" => channel.to_string()
        )
        .increment(*photons);
    }
}

/// Correlation poll outcome.
pub fn record_correlation_poll(
    computed: usize,
    skipped: usize,
    undefined_bins: usize,
    elapsed: Duration,
) {
    counter!("photon_corr_correlation_polls_total").increment(1);
    counter!("photon_corr_curves_total", "status" => "computed").increment(computed as u64);
    counter!("photon_corr_curves_total", "status" => "skipped").increment(skipped as u64);
    counter!("photon_corr_undefined_bins_total").increment(undefined_bins as u64);
    histogram!("photon_corr_correlation_poll_ms").record(elapsed.as_secs_f64() * 1000.0);
}

/// Ticks recorded so far against the recording's tick limit.
pub fn record_recording_progress(ticks: u64, tick_limit: u64) {
    gauge!("photon_corr_recording_ticks").set(ticks as f64);
    let fraction = if tick_limit == 0 {
        0.0
    } else {
        ticks as f64 / tick_limit as f64
    };
    gauge!("photon_corr_recording_progress").set(fraction);
}

/// What one correlation poll produced, in terms the aggregator understands.
#[derive(Debug, Clone, Default)]
pub struct PollObservation {
    /// Curves that produced values
    pub computed: usize,
    /// Reasons for curves skipped this poll
    pub skipped: Vec<String>,
    /// Bins whose normalization was undefined
    pub undefined_bins: usize,
    /// Samples per channel in the polled window
    pub window_samples: usize,
    pub elapsed: Duration,
}

/// Aggregates correlation polls in memory for the end-of-run summary.
#[derive(Debug, Clone, Default)]
pub struct CorrelationMetricsAggregator {
    pub total_polls: u64,
    pub curves_computed: u64,
    pub curves_skipped: u64,
    pub undefined_bins: u64,
    /// Polls where every curve was skipped
    pub empty_polls: u64,
    pub poll_ms: RunningStats,
    pub window_samples: RunningStats,
    pub skip_reasons: HashMap<String, u64>,
}

impl CorrelationMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, poll: &PollObservation) {
        self.total_polls += 1;
        self.curves_computed += poll.computed as u64;
        self.curves_skipped += poll.skipped.len() as u64;
        self.undefined_bins += poll.undefined_bins as u64;

        if poll.computed == 0 {
            self.empty_polls += 1;
        }
        for reason in &poll.skipped {
            *self.skip_reasons.entry(reason.clone()).or_insert(0) += 1;
        }

        self.poll_ms.push(poll.elapsed.as_secs_f64() * 1000.0);
        self.window_samples.push(poll.window_samples as f64);
    }

    pub fn summary(&self) -> MetricsSummary {
        let attempted = self.curves_computed + self.curves_skipped;
        MetricsSummary {
            total_polls: self.total_polls,
            curves_computed: self.curves_computed,
            curves_skipped: self.curves_skipped,
            empty_polls: self.empty_polls,
            undefined_bins: self.undefined_bins,
            skip_rate: if attempted > 0 {
                self.curves_skipped as f64 / attempted as f64 * 100.0
            } else {
                0.0
            },
            poll_ms: StatsSummary::from(&self.poll_ms),
            window_samples: StatsSummary::from(&self.window_samples),
            skip_reasons: self.skip_reasons.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_polls: u64,
    pub curves_computed: u64,
    pub curves_skipped: u64,
    pub empty_polls: u64,
    pub undefined_bins: u64,
    /// Percentage of attempted curves that were skipped
    pub skip_rate: f64,
    pub poll_ms: StatsSummary,
    pub window_samples: StatsSummary,
    pub skip_reasons: HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Correlation Summary ===")?;
        writeln!(f, "Polls: {}", self.total_polls)?;
        writeln!(f, "Curves computed: {}", self.curves_computed)?;
        writeln!(
            f,
            "Curves skipped: {} ({:.2}%)",
            self.curves_skipped, self.skip_rate
        )?;
        writeln!(f, "Polls without curves: {}", self.empty_polls)?;
        writeln!(f, "Undefined bins: {}", self.undefined_bins)?;
        writeln!(f, "Poll time (ms): {}", self.poll_ms)?;
        writeln!(f, "Window samples: {}", self.window_samples)?;

        if !self.skip_reasons.is_empty() {
            writeln!(f, "Skip reasons:")?;
            let mut reasons: Vec<_> = self.skip_reasons.iter().collect();
            reasons.sort();
            for (reason, count) in reasons {
                writeln!(f, "  {}: {}", reason, count)?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance (n - 1)
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
