//! Periodic correlation of the live buffer
//!
//! Every poll takes the samples written since the previous poll through its
//! own cursor, expands them into per-channel arrival ticks counted from the
//! window start, and runs the enabled curves. A skipped curve leaves the
//! previously rendered one untouched.
//!
//! A window always reaches back far enough to span the largest lag, even
//! when polls come faster than that; it then overlaps the previous one.
//! When a poll comes a full buffer lap or more after the previous one, the
//! window is the most recent lap instead.

use std::time::{Duration, Instant};

use contracts::{SampleProducer, SessionConfig};
use correlation_engine::{CorrelationEngine, CorrelationReport};
use ingestion::{arrival_times, RingBufferCursor};
use observability::metrics::{record_correlation_poll, record_samples_consumed};
use tracing::debug;

use crate::error::Result;

/// One correlation poll result plus its cost
#[derive(Debug, Clone)]
pub struct CorrelationPoll {
    pub report: CorrelationReport,
    /// Samples per channel in the correlated window
    pub window_samples: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct LiveCorrelator {
    cursor: RingBufferCursor,
    engine: CorrelationEngine,
    /// Time the producer needs to fill the whole buffer
    lap: Option<Duration>,
    last_poll: Option<Instant>,
}

impl LiveCorrelator {
    pub fn new(cursor: RingBufferCursor, engine: CorrelationEngine) -> Self {
        Self {
            cursor,
            engine,
            lap: None,
            last_poll: None,
        }
    }

    /// Switch to whole-lap windows when polls are `lap` or more apart
    pub fn with_lap(mut self, lap: Duration) -> Self {
        self.lap = Some(lap);
        self
    }

    /// Correlator starting at the producer's current position
    pub fn from_config(config: &SessionConfig, producer: &dyn SampleProducer) -> Result<Self> {
        let cursor = RingBufferCursor::new(config.buffer_len(), config.acquisition.channels)?;
        let lap = Duration::from_secs_f64(
            config.acquisition.buffer_size as f64 * config.clock_period(),
        );
        let mut correlator =
            Self::new(cursor, CorrelationEngine::from_config(config)).with_lap(lap);
        correlator.resync(producer);
        Ok(correlator)
    }

    pub fn engine(&self) -> &CorrelationEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut CorrelationEngine {
        &mut self.engine
    }

    /// Drop everything unread, e.g. after the poll was stopped for a while
    pub fn resync(&mut self, producer: &dyn SampleProducer) {
        self.cursor = RingBufferCursor::at_producer(producer);
        self.last_poll = Some(Instant::now());
    }

    /// Samples a window needs for its span to exceed the largest lag
    pub fn min_window_samples(&self) -> usize {
        self.engine
            .bins()
            .largest_edge()
            .map_or(0, |edge| edge.max(0) as usize + 2)
    }

    pub fn poll(&mut self, producer: &dyn SampleProducer) -> CorrelationPoll {
        let started = Instant::now();
        let lapped = match (self.lap, self.last_poll) {
            (Some(lap), Some(last)) => started.duration_since(last) >= lap,
            _ => false,
        };
        self.last_poll = Some(started);

        let producer_index = producer.current_write_index();
        let window = if lapped {
            debug!("correlation poll fell a lap behind, reading the latest lap");
            self.cursor.extract_latest(producer_index)
        } else {
            self.cursor
                .extract_trailing(producer_index, self.min_window_samples())
        };
        let snapshot = window.snapshot(&producer.read_buffer());
        let arrivals = arrival_times(&snapshot, 0);

        let report = self.engine.correlate(&arrivals);
        let elapsed = started.elapsed();

        record_samples_consumed("correlation", snapshot.sample_count());
        record_correlation_poll(
            report.curves.len(),
            report.skipped.len(),
            report.undefined_bins(),
            elapsed,
        );
        debug!(
            samples = snapshot.sample_count(),
            photons = snapshot.total(),
            computed = report.curves.len(),
            elapsed_us = elapsed.as_micros() as u64,
            "live correlation"
        );

        CorrelationPoll {
            report,
            window_samples: snapshot.sample_count(),
            elapsed,
        }
    }
}
