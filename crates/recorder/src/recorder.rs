//! AcquisitionRecorder - records the live buffer for a fixed duration
//!
//! A third consumer of the sample buffer next to the display and the
//! correlation poll. It starts reading at the producer's current index,
//! numbers ticks from 0, and stops by itself once `duration_s` seconds of
//! samples have been recorded; the last window is cut at that limit.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use contracts::{SampleProducer, SessionConfig, SinkType, Tick};
use ingestion::{ArrivalExpander, RingBufferCursor};
use observability::metrics::{record_recording_progress, record_samples_consumed};
use tracing::{debug, info};

use crate::error::RecorderError;
use crate::handle::SinkHandle;
use crate::metrics::MetricsSnapshot;
use crate::sinks::{create_sink, AcquisitionSink};

/// Recording parameters
#[derive(Debug, Clone)]
pub struct RecorderSettings {
    /// Sink used for the recording
    pub sink: SinkType,

    /// Recording length in seconds
    pub duration_s: u64,

    /// Samples per second per channel
    pub acquisition_rate: u64,

    /// Seconds per tick
    pub clock_period: f64,

    /// Interleaved channel count
    pub channel_count: usize,

    /// Directory recordings are written to
    pub output_dir: PathBuf,

    /// File name prefix
    pub file_stem: String,

    /// Sink worker queue capacity (batches)
    pub queue_capacity: usize,

    /// Spread same-tick photons over distinct timestamps (HDF5 only)
    pub expand: bool,
}

impl RecorderSettings {
    /// Derive settings from a session configuration
    pub fn from_config(config: &SessionConfig) -> Self {
        let rec = &config.recording;
        Self {
            sink: rec.sink,
            duration_s: rec.duration_s,
            acquisition_rate: config.acquisition.acquisition_rate,
            clock_period: config.clock_period(),
            channel_count: config.acquisition.channels,
            output_dir: rec.output_dir.clone(),
            file_stem: rec.file_stem.clone(),
            queue_capacity: rec.queue_capacity,
            expand: rec.expand,
        }
    }

    /// Ticks after which the recording stops
    pub fn tick_limit(&self) -> Tick {
        (self.duration_s * self.acquisition_rate) as Tick
    }
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

/// Result of one recorder poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingStatus {
    /// Still below the duration limit
    Recording,
    /// Duration reached; call `finish`
    Complete,
}

/// Summary of a finished recording
#[derive(Debug, Clone)]
pub struct RecordingSummary {
    /// Ticks recorded
    pub ticks: Tick,

    /// Photons queued for the sink (lost ones are in `sink.photons_lost`)
    pub photons: u64,

    /// Sink metrics at shutdown
    pub sink: MetricsSnapshot,

    /// Saved file (None for the log sink or an empty recording)
    pub path: Option<PathBuf>,
}

/// Records the live buffer into an acquisition sink
pub struct AcquisitionRecorder {
    cursor: RingBufferCursor,
    expander: ArrivalExpander,
    handle: SinkHandle,
    tick_limit: Tick,
    photons: u64,
    path: Option<PathBuf>,
    started_at: DateTime<Utc>,
}

impl AcquisitionRecorder {
    /// Start recording into the sink selected by `settings`
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(
        producer: &dyn SampleProducer,
        settings: &RecorderSettings,
    ) -> Result<Self, RecorderError> {
        let started_at = Utc::now();
        let sink = create_sink(settings, started_at)?;
        Ok(Self::start_with_sink(producer, sink, settings, started_at))
    }

    /// Start recording into an already created sink
    pub fn start_with_sink(
        producer: &dyn SampleProducer,
        sink: AcquisitionSink,
        settings: &RecorderSettings,
        started_at: DateTime<Utc>,
    ) -> Self {
        let path = sink.path().map(PathBuf::from);
        let cursor = RingBufferCursor::at_producer(producer);
        info!(
            sink = ?settings.sink,
            duration_s = settings.duration_s,
            start_index = cursor.last_read(),
            "acquisition started"
        );
        Self {
            cursor,
            expander: ArrivalExpander::new(settings.clock_period),
            handle: SinkHandle::spawn(sink, settings.queue_capacity),
            tick_limit: settings.tick_limit(),
            photons: 0,
            path,
            started_at,
        }
    }

    /// Ticks recorded so far
    pub fn ticks(&self) -> Tick {
        self.expander.next_tick()
    }

    /// Photons queued for the sink so far; dropped batches are not counted
    pub fn photons(&self) -> u64 {
        self.photons
    }

    /// Wall-clock start of the recording
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// True once the duration limit is reached
    pub fn is_complete(&self) -> bool {
        self.ticks() >= self.tick_limit
    }

    /// Read the new window and queue it for the sink
    pub fn poll(&mut self, producer: &dyn SampleProducer) -> RecordingStatus {
        if self.is_complete() {
            return RecordingStatus::Complete;
        }

        let window = self.cursor.peek(producer.current_write_index());
        if window.is_empty() {
            return RecordingStatus::Recording;
        }

        let remaining = (self.tick_limit - self.ticks()) as usize;
        let window = window.truncated(remaining);
        self.cursor.advance(window.sample_count());

        let snapshot = window.snapshot(&producer.read_buffer());
        let batch = self.expander.next_batch(&snapshot);
        record_samples_consumed("recorder", snapshot.sample_count());
        record_recording_progress(self.ticks() as u64, self.tick_limit as u64);

        let photons = batch.len() as u64;
        debug!(
            samples = snapshot.sample_count(),
            photons,
            ticks = self.ticks(),
            "recorder window"
        );
        if photons > 0 && self.handle.try_send(batch) {
            self.photons += photons;
        }

        if self.is_complete() {
            RecordingStatus::Complete
        } else {
            RecordingStatus::Recording
        }
    }

    /// Stop recording, drain the sink and save the file
    pub async fn finish(self) -> RecordingSummary {
        let metrics = self.handle.metrics().clone();
        self.handle.shutdown().await;
        let sink = metrics.snapshot();

        let path = self.path.filter(|_| sink.photons_written > 0);
        info!(
            ticks = self.expander.next_tick(),
            photons = self.photons,
            dropped_batches = sink.dropped_batches,
            photons_lost = sink.photons_lost,
            path = ?path,
            "acquisition stopped"
        );
        RecordingSummary {
            ticks: self.expander.next_tick(),
            photons: self.photons,
            sink,
            path,
        }
    }
}
