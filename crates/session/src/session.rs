//! Session - owns the producer and every consumer of its buffer
//!
//! The display trace, the live correlator, the recorder and measurements
//! each keep their own cursor into the same buffer, so none of them can
//! steal samples from another.

use std::collections::HashMap;
use std::sync::Arc;

use contracts::{SampleBuffer, SampleProducer, SessionConfig};
use correlation_engine::{CorrelationCurve, CurveKind};
use ingestion::{SimulatedCounter, SimulatorSettings};
use recorder::{AcquisitionRecorder, RecorderSettings, RecordingStatus, RecordingSummary};
use tracing::{info, warn};

use crate::correlation::{CorrelationPoll, LiveCorrelator};
use crate::display::{DisplayTrace, DisplayUpdate};
use crate::error::{Result, SessionError};
use crate::measure::Measurement;
use crate::stats::{SessionStats, SessionSummary};

pub struct Session {
    config: SessionConfig,
    producer: Arc<dyn SampleProducer>,
    simulator: Option<SimulatedCounter>,
    display: DisplayTrace,
    correlator: LiveCorrelator,
    curves: HashMap<CurveKind, CorrelationCurve>,
    lag_centers: Vec<f64>,
    recorder_settings: RecorderSettings,
    recorder: Option<AcquisitionRecorder>,
    stats: SessionStats,
}

impl Session {
    /// Session over an external producer
    ///
    /// The producer's buffer must match the configured channel count and
    /// buffer length.
    pub fn new(config: SessionConfig, producer: Arc<dyn SampleProducer>) -> Result<Self> {
        let buffer = producer.read_buffer();
        if buffer.len() != config.buffer_len()
            || buffer.channel_count() != config.acquisition.channels
        {
            return Err(SessionError::BufferMismatch {
                expected_len: config.buffer_len(),
                expected_channels: config.acquisition.channels,
                actual_len: buffer.len(),
                actual_channels: buffer.channel_count(),
            });
        }

        let display = DisplayTrace::from_config(&config)?;
        let correlator = LiveCorrelator::from_config(&config, producer.as_ref())?;
        let lag_centers = correlator.engine().bins().centers().to_vec();

        info!(
            channels = config.acquisition.channels,
            acquisition_rate = config.acquisition.acquisition_rate,
            buffer_len = config.buffer_len(),
            samples_per_bin = config.samples_per_bin(),
            lag_bins = correlator.engine().bins().bin_count(),
            "session created"
        );

        Ok(Self {
            recorder_settings: RecorderSettings::from_config(&config),
            stats: SessionStats::new(config.acquisition.channels),
            config,
            producer,
            simulator: None,
            display,
            correlator,
            curves: HashMap::new(),
            lag_centers,
            recorder: None,
        })
    }

    /// Session over a freshly spawned simulated counter
    ///
    /// Must be called inside a tokio runtime.
    pub fn simulated(config: SessionConfig) -> Result<Self> {
        let (writer, buffer) = SampleBuffer::allocate(
            config.acquisition.buffer_size,
            config.acquisition.channels,
        );
        let simulator = SimulatedCounter::spawn(writer, SimulatorSettings::from_config(&config));
        let mut session = Self::new(config, Arc::new(buffer))?;
        session.simulator = Some(simulator);
        Ok(session)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn producer(&self) -> Arc<dyn SampleProducer> {
        self.producer.clone()
    }

    pub fn display(&self) -> &DisplayTrace {
        &self.display
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Lag bin midpoints (seconds) of every curve
    pub fn lag_centers(&self) -> &[f64] {
        &self.lag_centers
    }

    /// Most recent computed value of a curve
    ///
    /// Survives polls that skip the curve.
    pub fn curve(&self, kind: CurveKind) -> Option<&CorrelationCurve> {
        self.curves.get(&kind)
    }

    pub fn recorder_settings_mut(&mut self) -> &mut RecorderSettings {
        &mut self.recorder_settings
    }

    /// New measurement function over this session's producer
    pub fn measurement(&self) -> Measurement {
        Measurement::new(self.producer.clone())
    }

    pub fn poll_display(&mut self) -> Result<DisplayUpdate> {
        let update = self.display.poll(self.producer.as_ref())?;
        self.stats.record_display(&update);
        Ok(update)
    }

    pub fn poll_correlation(&mut self) -> CorrelationPoll {
        let poll = self.correlator.poll(self.producer.as_ref());
        for curve in &poll.report.curves {
            self.curves.insert(curve.kind, curve.clone());
        }
        self.stats
            .record_correlation(&poll.report, poll.window_samples, poll.elapsed);
        poll
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    pub fn start_recording(&mut self) -> Result<()> {
        if self.recorder.is_some() {
            return Err(SessionError::RecordingActive);
        }
        let recorder = AcquisitionRecorder::start(self.producer.as_ref(), &self.recorder_settings)?;
        self.recorder = Some(recorder);
        Ok(())
    }

    /// Feed the running recording; finishes it once its duration is reached
    pub async fn poll_recording(&mut self) -> Option<RecordingSummary> {
        let status = self.recorder.as_mut()?.poll(self.producer.as_ref());
        match status {
            RecordingStatus::Recording => None,
            RecordingStatus::Complete => self.finish_recording().await,
        }
    }

    /// Stop the running recording early
    pub async fn stop_recording(&mut self) -> Result<RecordingSummary> {
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.poll(self.producer.as_ref());
        }
        self.finish_recording().await.ok_or(SessionError::NoRecording)
    }

    async fn finish_recording(&mut self) -> Option<RecordingSummary> {
        let recorder = self.recorder.take()?;
        let summary = recorder.finish().await;
        self.stats.record_recording(&summary);
        Some(summary)
    }

    /// Finish any recording, stop the simulator and summarise the run
    pub async fn shutdown(mut self) -> Result<SessionSummary> {
        if self.recorder.is_some() {
            let summary = self.stop_recording().await?;
            info!(ticks = summary.ticks, "recording finished at shutdown");
        }
        if let Some(mut simulator) = self.simulator.take() {
            if let Err(e) = simulator.stop().await {
                warn!(error = %e, "simulated counter did not stop cleanly");
            }
        }

        let summary = self.stats.summary();
        info!(
            display_polls = summary.display_polls,
            correlation_polls = summary.correlation.total_polls,
            recordings = summary.recordings,
            "session closed"
        );
        Ok(summary)
    }
}
