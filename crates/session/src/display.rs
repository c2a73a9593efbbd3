//! Rolling per-channel display trace
//!
//! Each poll sums the unread samples into display bins of
//! `samples_per_bin` samples and writes one point per bin at a wrapping
//! canvas index. Only whole bins are consumed; a trailing partial bin stays
//! unread until the next poll completes it.

use contracts::{SampleProducer, SessionConfig};
use ingestion::{aggregate_bins, RingBufferCursor};
use observability::metrics::{record_display_poll, record_samples_consumed};
use tracing::trace;

use crate::error::{Result, SessionError};

/// What one display poll drew
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayUpdate {
    /// Bins written this poll
    pub bins: usize,
    /// Photons per channel in those bins
    pub photons: Vec<u64>,
    /// Canvas index after the poll (progress marker)
    pub canvas_index: usize,
}

#[derive(Debug, Clone)]
pub struct DisplayTrace {
    cursor: RingBufferCursor,
    samples_per_bin: usize,
    traces: Vec<Vec<Option<u64>>>,
    canvas_index: usize,
}

impl DisplayTrace {
    /// Trace reading from slot 0 of a buffer of `buffer_len` slots
    pub fn new(
        buffer_len: usize,
        channel_count: usize,
        samples_per_bin: usize,
        width: usize,
    ) -> Result<Self> {
        if width == 0 {
            return Err(SessionError::EmptyTrace);
        }
        let cursor = RingBufferCursor::new(buffer_len, channel_count)?;
        Ok(Self {
            cursor,
            samples_per_bin,
            traces: vec![vec![None; width]; channel_count],
            canvas_index: 0,
        })
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        Self::new(
            config.buffer_len(),
            config.acquisition.channels,
            config.samples_per_bin(),
            config.display.trace_width,
        )
    }

    pub fn width(&self) -> usize {
        self.traces.first().map_or(0, Vec::len)
    }

    pub fn canvas_index(&self) -> usize {
        self.canvas_index
    }

    pub fn samples_per_bin(&self) -> usize {
        self.samples_per_bin
    }

    /// Points of one channel; `None` where nothing was drawn yet
    pub fn trace(&self, channel: usize) -> Option<&[Option<u64>]> {
        self.traces.get(channel).map(Vec::as_slice)
    }

    /// Draw every complete bin produced since the last poll
    pub fn poll(&mut self, producer: &dyn SampleProducer) -> Result<DisplayUpdate> {
        let window = self.cursor.peek(producer.current_write_index());
        let mut update = DisplayUpdate {
            bins: 0,
            photons: vec![0; self.traces.len()],
            canvas_index: self.canvas_index,
        };
        if window.is_empty() {
            return Ok(update);
        }

        let snapshot = window.snapshot(&producer.read_buffer());
        let binned = aggregate_bins(&snapshot, self.samples_per_bin)?;
        self.cursor.advance(binned.consumed_samples);

        let width = self.width();
        for bin in 0..binned.bin_count() {
            for (channel, sums) in binned.sums.iter().enumerate() {
                self.traces[channel][self.canvas_index] = Some(sums[bin]);
                update.photons[channel] += sums[bin];
            }
            self.canvas_index = (self.canvas_index + 1) % width;
        }

        update.bins = binned.bin_count();
        update.canvas_index = self.canvas_index;

        record_samples_consumed("display", binned.consumed_samples);
        record_display_poll(update.bins, &update.photons);
        trace!(
            bins = update.bins,
            canvas_index = self.canvas_index,
            pending = snapshot.sample_count() - binned.consumed_samples,
            "display poll"
        );
        Ok(update)
    }
}
