//! Simulated photon counter
//!
//! Stands in for the hardware counter: a background task writes one display
//! bin worth of samples per step into the shared buffer, zeroing the block
//! first, then publishes the new write index. Bursts of photons are drawn
//! around a random center inside the block.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{SampleBuffer, SampleProducer, SampleWriter, SessionConfig};
use metrics::counter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Poisson};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::error::{IngestionError, Result};

/// Simulated counter settings
#[derive(Debug, Clone)]
pub struct SimulatorSettings {
    /// Samples written per step (one display bin)
    pub samples_per_block: usize,

    /// Delay between two steps
    pub step_interval: Duration,

    /// Probability that a block contains a burst
    pub burst_probability: f64,

    /// Mean photons per channel in one burst
    pub photons_per_burst: f64,

    /// Burst standard deviation in samples
    pub burst_width_samples: f64,

    /// Background photon probability per sample and channel
    pub dark_count_probability: f64,

    /// Random seed (None = OS entropy)
    pub seed: Option<u64>,
}

impl SimulatorSettings {
    /// Derive settings from a session configuration
    pub fn from_config(config: &SessionConfig) -> Self {
        let sim = &config.simulator;
        Self {
            samples_per_block: config.samples_per_bin(),
            step_interval: Duration::from_secs_f64(1.0 / config.display.bin_size.max(1) as f64),
            burst_probability: sim.burst_probability.clamp(0.0, 1.0),
            photons_per_burst: f64::from(sim.photons_per_burst),
            burst_width_samples: sim.burst_width_s * config.acquisition.acquisition_rate as f64,
            dark_count_probability: sim.dark_count_probability.clamp(0.0, 1.0),
            seed: sim.seed,
        }
    }
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

/// Block-by-block photon generator
///
/// Synchronous core of the simulated counter.
pub struct BurstGenerator {
    settings: SimulatorSettings,
    rng: StdRng,
    /// Photons per channel in a burst; None for a non-positive mean
    burst_size: Option<Poisson<f64>>,
    /// Photon offset from the burst center, in samples
    spread: Option<Normal<f64>>,
    next_slot: usize,
}

impl BurstGenerator {
    /// Create a generator writing from slot 0
    pub fn new(settings: SimulatorSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let burst_size = Poisson::new(settings.photons_per_burst).ok();
        let spread = Normal::new(0.0, settings.burst_width_samples).ok();
        Self {
            settings,
            rng,
            burst_size,
            spread,
            next_slot: 0,
        }
    }

    /// Write one block, publish the new write index and return the photon count
    pub fn step(&mut self, writer: &mut SampleWriter) -> u64 {
        let len = writer.len();
        let channels = writer.channel_count();
        let block = self.settings.samples_per_block.max(1);
        let start = self.next_slot;
        let slot = |sample: usize, channel: usize| (start + sample * channels + channel) % len;

        for sample in 0..block {
            for channel in 0..channels {
                writer.store(slot(sample, channel), 0);
            }
        }

        let mut photons = 0u64;
        let burst = self.settings.burst_probability > 0.0
            && self.rng.random_bool(self.settings.burst_probability);
        if let (true, Some(burst_size)) = (burst, self.burst_size) {
            let spread = self.spread;
            let center = self.rng.random_range(0..block) as f64;
            for channel in 0..channels {
                let n = burst_size.sample(&mut self.rng) as u64;
                for _ in 0..n {
                    let offset = spread.map_or(0.0, |d| d.sample(&mut self.rng));
                    let loc = (center + offset).floor() as i64;
                    if loc < 0 || loc >= block as i64 {
                        continue;
                    }
                    writer.add(slot(loc as usize, channel), 1);
                    photons += 1;
                }
            }
        }

        if self.settings.dark_count_probability > 0.0 {
            for sample in 0..block {
                for channel in 0..channels {
                    if self.rng.random_bool(self.settings.dark_count_probability) {
                        writer.add(slot(sample, channel), 1);
                        photons += 1;
                    }
                }
            }
        }

        self.next_slot = (start + block * channels) % len;
        writer.publish(self.next_slot);
        photons
    }
}

/// Simulated counter statistics
#[derive(Debug, Default)]
pub struct SimulatorStats {
    /// Blocks written
    pub blocks_written: AtomicU64,

    /// Photons written
    pub photons_written: AtomicU64,
}

impl SimulatorStats {
    fn record_block(&self, photons: u64) {
        self.blocks_written.fetch_add(1, Ordering::Relaxed);
        self.photons_written.fetch_add(photons, Ordering::Relaxed);
    }

    /// (blocks, photons) written so far
    pub fn snapshot(&self) -> (u64, u64) {
        (
            self.blocks_written.load(Ordering::Relaxed),
            self.photons_written.load(Ordering::Relaxed),
        )
    }
}

/// Background task producing simulated counts into a shared buffer
pub struct SimulatedCounter {
    buffer: SampleBuffer,
    running: Arc<AtomicBool>,
    stats: Arc<SimulatorStats>,
    task: Option<JoinHandle<()>>,
}

impl SimulatedCounter {
    /// Start writing into the buffer owned by `writer`
    ///
    /// Must be called inside a tokio runtime.
    pub fn spawn(mut writer: SampleWriter, settings: SimulatorSettings) -> Self {
        let buffer = writer.buffer();
        let running = Arc::new(AtomicBool::new(true));
        let stats = Arc::new(SimulatorStats::default());

        let task_running = running.clone();
        let task_stats = stats.clone();
        let task = tokio::spawn(async move {
            let step_interval = settings.step_interval;
            let samples_per_block = settings.samples_per_block;
            let mut generator = BurstGenerator::new(settings);
            let mut ticker = tokio::time::interval(step_interval);

            debug!(
                samples_per_block,
                step_interval_us = step_interval.as_micros() as u64,
                buffer_len = writer.len(),
                "simulated counter started"
            );

            while task_running.load(Ordering::Relaxed) {
                ticker.tick().await;
                let photons = generator.step(&mut writer);
                task_stats.record_block(photons);
                counter!("photon_corr_simulated_photons_total").increment(photons);
                trace!(
                    write_index = writer.write_index(),
                    photons,
                    "simulated block written"
                );
            }

            debug!("simulated counter stopped");
        });

        Self {
            buffer,
            running,
            stats,
            task: Some(task),
        }
    }

    /// Whether the background task is still writing
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Shared statistics
    pub fn stats(&self) -> Arc<SimulatorStats> {
        self.stats.clone()
    }

    /// Stop the background task and wait for it
    pub async fn stop(&mut self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.await.map_err(|e| IngestionError::ProducerFailed {
                message: e.to_string(),
            })?;
        }
        Ok(())
    }
}

impl SampleProducer for SimulatedCounter {
    fn current_write_index(&self) -> usize {
        self.buffer.write_index()
    }

    fn read_buffer(&self) -> SampleBuffer {
        self.buffer.clone()
    }
}

impl Drop for SimulatedCounter {
    fn drop(&mut self) {
        if self.task.is_some() {
            warn!("simulated counter dropped without stop()");
        }
        self.running.store(false, Ordering::SeqCst);
    }
}
