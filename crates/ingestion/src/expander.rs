//! ArrivalExpander - window counts to photon arrival times
//!
//! Modes:
//! - arrival sequences: one tick entry per counted photon, per channel
//! - photon stream: one chronological (tick, detector) stream
//! - expanded: same-tick photons spread over distinct ticks
//! - aggregate bins: per-channel sums over fixed display bins

use contracts::{ArrivalTimes, DetectorId, PhotonBatch, Tick};

use crate::error::{IngestionError, Result};
use crate::window::WindowSnapshot;

/// Per-channel arrival ticks, the i-th sample of the window at `base_tick + i`
pub fn arrival_times(snapshot: &WindowSnapshot, base_tick: Tick) -> Vec<ArrivalTimes> {
    let mut arrivals = vec![ArrivalTimes::new(); snapshot.channel_count()];
    for (channel, times) in arrivals.iter_mut().enumerate() {
        times.reserve(snapshot.channel_total(channel) as usize);
    }
    for (offset, sample) in snapshot.samples().enumerate() {
        let tick = base_tick + offset as Tick;
        for (times, &count) in arrivals.iter_mut().zip(sample) {
            times.extend(std::iter::repeat_n(tick, count as usize));
        }
    }
    arrivals
}

/// Arrival ticks of a single channel
pub fn channel_arrival_times(
    snapshot: &WindowSnapshot,
    channel: usize,
    base_tick: Tick,
) -> ArrivalTimes {
    let mut times = ArrivalTimes::with_capacity(snapshot.channel_total(channel) as usize);
    for (offset, sample) in snapshot.samples().enumerate() {
        if let Some(&count) = sample.get(channel) {
            times.extend(std::iter::repeat_n(base_tick + offset as Tick, count as usize));
        }
    }
    times
}

/// Arrival ticks of every channel merged into one non-decreasing sequence
pub fn merged_arrival_times(snapshot: &WindowSnapshot, base_tick: Tick) -> ArrivalTimes {
    photon_stream(snapshot, base_tick, 1.0).timestamps
}

/// Flatten a window into one chronological photon stream
///
/// Within a tick, photons are ordered by detector id.
pub fn photon_stream(
    snapshot: &WindowSnapshot,
    base_tick: Tick,
    timestamps_unit: f64,
) -> PhotonBatch {
    let mut batch = PhotonBatch::new(timestamps_unit, snapshot.channel_count());
    let total = snapshot.total() as usize;
    batch.timestamps.reserve(total);
    batch.detectors.reserve(total);
    for (offset, sample) in snapshot.samples().enumerate() {
        let tick = base_tick + offset as Tick;
        for (detector, &count) in sample.iter().enumerate() {
            let count = count as usize;
            batch.timestamps.extend(std::iter::repeat_n(tick, count));
            batch
                .detectors
                .extend(std::iter::repeat_n(detector as DetectorId, count));
        }
    }
    batch
}

/// Make every timestamp of a chronological batch unique
///
/// All ticks are multiplied by `expand_by`, the largest number of photons
/// sharing one tick, and the n-th photon of a tick is offset by n. The
/// returned batch's `timestamps_unit` is divided by the same factor.
pub fn expand_batch(batch: &PhotonBatch) -> (PhotonBatch, u64) {
    let expand_by = longest_run(&batch.timestamps).max(1) as u64;
    let factor = expand_by as Tick;

    let mut expanded = PhotonBatch::new(
        batch.timestamps_unit / expand_by as f64,
        batch.channel_count,
    );
    expanded.detectors = batch.detectors.clone();
    expanded.timestamps.reserve(batch.len());

    let mut previous = None;
    let mut rank: Tick = 0;
    for &tick in &batch.timestamps {
        if previous == Some(tick) {
            rank += 1;
        } else {
            previous = Some(tick);
            rank = 0;
        }
        expanded.timestamps.push(tick * factor + rank);
    }
    (expanded, expand_by)
}

/// Per-channel arrival ticks with duplicates spread by `expand_batch`
///
/// Returns the sequences and the factor the clock resolution was
/// multiplied by.
pub fn expanded_arrival_times(
    snapshot: &WindowSnapshot,
    base_tick: Tick,
) -> (Vec<ArrivalTimes>, u64) {
    let (batch, expand_by) = expand_batch(&photon_stream(snapshot, base_tick, 1.0));
    let mut arrivals = vec![ArrivalTimes::new(); snapshot.channel_count()];
    for (&tick, &detector) in batch.timestamps.iter().zip(&batch.detectors) {
        if let Some(times) = arrivals.get_mut(detector as usize) {
            times.push(tick);
        }
    }
    (arrivals, expand_by)
}

fn longest_run(ticks: &[Tick]) -> usize {
    let mut longest = 0;
    let mut run = 0;
    let mut previous = None;
    for &tick in ticks {
        if previous == Some(tick) {
            run += 1;
        } else {
            previous = Some(tick);
            run = 1;
        }
        longest = longest.max(run);
    }
    longest
}

/// Per-channel sums over consecutive display bins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedBins {
    /// `sums[channel][bin]`
    pub sums: Vec<Vec<u64>>,

    /// Samples covered by the returned bins (whole bins only)
    pub consumed_samples: usize,
}

impl AggregatedBins {
    /// Number of complete bins
    pub fn bin_count(&self) -> usize {
        self.sums.first().map_or(0, Vec::len)
    }
}

/// Sum counts per channel over groups of `samples_per_bin` samples
///
/// A trailing partial bin is left out and not counted as consumed.
pub fn aggregate_bins(snapshot: &WindowSnapshot, samples_per_bin: usize) -> Result<AggregatedBins> {
    if samples_per_bin == 0 {
        return Err(IngestionError::EmptyDisplayBin);
    }
    let channel_count = snapshot.channel_count();
    let bins = snapshot.sample_count() / samples_per_bin;
    let mut sums = vec![vec![0u64; bins]; channel_count];

    let bin_slots = samples_per_bin * channel_count;
    for (bin, block) in snapshot
        .counts()
        .chunks_exact(bin_slots)
        .take(bins)
        .enumerate()
    {
        for sample in block.chunks_exact(channel_count) {
            for (channel, &count) in sample.iter().enumerate() {
                sums[channel][bin] += count;
            }
        }
    }

    Ok(AggregatedBins {
        sums,
        consumed_samples: bins * samples_per_bin,
    })
}

/// Stateful expander numbering ticks continuously across windows
///
/// Each window continues where the previous one ended, so consecutive
/// batches form one chronological recording starting at tick 0.
#[derive(Debug, Clone)]
pub struct ArrivalExpander {
    next_tick: Tick,
    timestamps_unit: f64,
}

impl ArrivalExpander {
    /// Create an expander starting at tick 0
    pub fn new(timestamps_unit: f64) -> Self {
        Self {
            next_tick: 0,
            timestamps_unit,
        }
    }

    /// Tick assigned to the next sample
    pub fn next_tick(&self) -> Tick {
        self.next_tick
    }

    /// Convert one window and advance the tick counter past it
    pub fn next_batch(&mut self, snapshot: &WindowSnapshot) -> PhotonBatch {
        let batch = photon_stream(snapshot, self.next_tick, self.timestamps_unit);
        self.next_tick += snapshot.sample_count() as Tick;
        batch
    }
}
