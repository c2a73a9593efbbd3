//! RingBufferCursor - per-consumer read position into the shared buffer
//!
//! Each consumer role (display, correlation, recorder) owns one cursor and
//! is the only one advancing it. All arithmetic is modulo the buffer length.
//!
//! Known limitation: when the producer advances by exactly one buffer length
//! between two polls, the aligned producer index equals `last_read` and the
//! poll is reported as "no progress". That buffer's worth of samples is
//! silently lost. Consumers rely on "equal means nothing new", so the check
//! is kept as is; poll often enough that a full wrap cannot happen, or
//! read with `extract_latest` when a lap may have been missed.

use contracts::{SampleBuffer, SampleProducer};

use crate::error::{IngestionError, Result};
use crate::window::Window;

/// Read position into a channel-interleaved circular buffer
#[derive(Debug, Clone)]
pub struct RingBufferCursor {
    last_read: usize,
    buffer_len: usize,
    channel_count: usize,
}

impl RingBufferCursor {
    /// Create a cursor at slot 0
    ///
    /// # Errors
    /// `BufferLayout` when the length is zero or not a whole number of samples.
    pub fn new(buffer_len: usize, channel_count: usize) -> Result<Self> {
        if buffer_len == 0 || channel_count == 0 || buffer_len % channel_count != 0 {
            return Err(IngestionError::BufferLayout {
                buffer_len,
                channel_count,
            });
        }
        Ok(Self {
            last_read: 0,
            buffer_len,
            channel_count,
        })
    }

    /// Create a cursor matching a buffer's layout, positioned at slot 0
    pub fn for_buffer(buffer: &SampleBuffer) -> Self {
        Self {
            last_read: 0,
            buffer_len: buffer.len(),
            channel_count: buffer.channel_count(),
        }
    }

    /// Create a cursor positioned at the producer's current index
    ///
    /// Used by consumers that must ignore everything written before they
    /// started (the recorder, the measurement function).
    pub fn at_producer(producer: &dyn SampleProducer) -> Self {
        let mut cursor = Self::for_buffer(&producer.read_buffer());
        cursor.last_read = cursor.align(producer.current_write_index());
        cursor
    }

    /// Current read position (slot index)
    pub fn last_read(&self) -> usize {
        self.last_read
    }

    /// Total slot count of the buffer
    pub fn buffer_len(&self) -> usize {
        self.buffer_len
    }

    /// Interleaved channel count
    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    /// Round a producer index down to a whole sample, modulo buffer length
    pub fn align(&self, producer_index: usize) -> usize {
        (producer_index - producer_index % self.channel_count) % self.buffer_len
    }

    /// Unread window up to `producer_index` without moving the cursor
    pub fn peek(&self, producer_index: usize) -> Window {
        let producer_index = self.align(producer_index);
        let last_read = self.last_read;
        if producer_index == last_read {
            Window::empty(self.channel_count)
        } else if producer_index < last_read {
            Window::new(
                last_read..self.buffer_len,
                0..producer_index,
                self.channel_count,
            )
        } else {
            Window::new(last_read..producer_index, 0..0, self.channel_count)
        }
    }

    /// Move the cursor forward by `samples` whole samples
    pub fn advance(&mut self, samples: usize) {
        let slots = (samples % (self.buffer_len / self.channel_count)) * self.channel_count;
        self.last_read = (self.last_read + slots) % self.buffer_len;
    }

    /// Take the whole unread window and move the cursor to its end
    pub fn extract(&mut self, producer_index: usize) -> Window {
        let window = self.peek(producer_index);
        self.advance(window.sample_count());
        window
    }

    /// The whole buffer ending at `producer_index`, oldest sample first;
    /// moves the cursor there
    ///
    /// For a consumer that may have fallen a full lap behind: it gets the
    /// most recent buffer's worth of samples instead of an ambiguous window.
    /// The oldest slots can already hold a block the producer is writing.
    pub fn extract_latest(&mut self, producer_index: usize) -> Window {
        let producer_index = self.align(producer_index);
        self.last_read = producer_index;
        Window::new(
            producer_index..self.buffer_len,
            0..producer_index,
            self.channel_count,
        )
    }

    /// The unread window, reaching back before `last_read` when it holds
    /// fewer than `min_samples` samples; moves the cursor to the producer
    ///
    /// Samples read by the previous call may be read again. No progress
    /// still yields an empty window, and `min_samples` of a lap or more
    /// yields the whole buffer.
    pub fn extract_trailing(&mut self, producer_index: usize, min_samples: usize) -> Window {
        let unread = self.peek(producer_index);
        if unread.is_empty() || unread.sample_count() >= min_samples {
            self.advance(unread.sample_count());
            return unread;
        }
        if min_samples >= self.buffer_len / self.channel_count {
            return self.extract_latest(producer_index);
        }

        let end = self.align(producer_index);
        let slots = min_samples * self.channel_count;
        self.last_read = end;
        if slots <= end {
            Window::new(end - slots..end, 0..0, self.channel_count)
        } else {
            Window::new(
                self.buffer_len - (slots - end)..self.buffer_len,
                0..end,
                self.channel_count,
            )
        }
    }

    /// Extract against a producer's current write index
    pub fn extract_from(&mut self, producer: &dyn SampleProducer) -> Window {
        self.extract(producer.current_write_index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_bad_layout() {
        assert!(RingBufferCursor::new(0, 2).is_err());
        assert!(RingBufferCursor::new(11, 2).is_err());
        assert!(RingBufferCursor::new(12, 0).is_err());
        assert!(RingBufferCursor::new(12, 2).is_ok());
    }

    #[test]
    fn test_two_polls_with_wrap() {
        let mut cursor = RingBufferCursor::new(12, 2).unwrap();

        let first = cursor.extract(10);
        assert_eq!(first.ranges(), [0..10, 0..0]);
        assert_eq!(cursor.last_read(), 10);

        let second = cursor.extract(2);
        assert_eq!(second.ranges(), [10..12, 0..2]);
        assert_eq!(cursor.last_read(), 2);

        let mut visits = [0usize; 12];
        for slot in first.slots().chain(second.slots()) {
            visits[slot] += 1;
        }
        assert_eq!(visits, [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1]);
    }

    #[test]
    fn test_partial_sample_is_not_consumed() {
        let mut cursor = RingBufferCursor::new(12, 2).unwrap();
        let window = cursor.extract(7);
        assert_eq!(window.ranges(), [0..6, 0..0]);
        assert_eq!(cursor.last_read(), 6);
    }

    #[test]
    fn test_no_progress_is_empty() {
        let mut cursor = RingBufferCursor::new(12, 2).unwrap();
        cursor.extract(4);
        assert!(cursor.extract(4).is_empty());
        assert!(cursor.extract(5).is_empty());
        assert_eq!(cursor.last_read(), 4);
    }

    #[test]
    fn test_full_wrap_reads_as_no_progress() {
        let mut cursor = RingBufferCursor::new(12, 2).unwrap();
        cursor.extract(4);
        // producer wrote exactly one buffer length since the last poll
        let window = cursor.extract(4 + 12);
        assert!(window.is_empty());
        assert_eq!(cursor.last_read(), 4);
    }

    #[test]
    fn test_every_cursor_pair_visits_each_slot_once() {
        for channels in 1..=3 {
            let len = 6 * channels;
            for start in (0..len).step_by(channels) {
                for end in (0..len).step_by(channels) {
                    let mut cursor = RingBufferCursor::new(len, channels).unwrap();
                    cursor.advance(start / channels);
                    let window = cursor.extract(end);

                    let expected = (end + len - start) % len;
                    assert_eq!(window.slot_count(), expected);

                    let slots: Vec<usize> = window.slots().collect();
                    let chronological: Vec<usize> =
                        (0..expected).map(|k| (start + k) % len).collect();
                    assert_eq!(slots, chronological);
                    assert_eq!(cursor.last_read(), end);
                }
            }
        }
    }

    #[test]
    fn test_peek_then_partial_advance() {
        let mut cursor = RingBufferCursor::new(12, 2).unwrap();
        let window = cursor.peek(10);
        assert_eq!(window.sample_count(), 5);
        cursor.advance(4);
        assert_eq!(cursor.last_read(), 8);
        assert_eq!(cursor.peek(10).sample_count(), 1);
    }

    #[test]
    fn test_at_producer_skips_history() {
        let buffer = SampleBuffer::from_counts(&[1; 12], 2, 9);
        let mut cursor = RingBufferCursor::at_producer(&buffer);
        assert_eq!(cursor.last_read(), 8);
        assert!(cursor.extract_from(&buffer).is_empty());
    }

    #[test]
    fn test_extract_latest_covers_one_lap() {
        let mut cursor = RingBufferCursor::new(12, 2).unwrap();
        cursor.advance(2);

        let window = cursor.extract_latest(9);
        assert_eq!(window.ranges(), [8..12, 0..8]);
        assert_eq!(window.sample_count(), 6);
        assert_eq!(cursor.last_read(), 8);

        let window = cursor.extract_latest(0);
        assert_eq!(window.ranges(), [0..12, 0..0]);
        assert!(!window.is_wrapped());
    }

    #[test]
    fn test_extract_trailing_reaches_back() {
        let mut cursor = RingBufferCursor::new(12, 2).unwrap();
        cursor.advance(2);

        // two unread samples, four wanted
        let window = cursor.extract_trailing(8, 4);
        assert_eq!(window.ranges(), [0..8, 0..0]);
        assert_eq!(cursor.last_read(), 8);

        let window = cursor.extract_trailing(10, 4);
        assert_eq!(window.ranges(), [2..10, 0..0]);

        // reaching back across the wrap
        let window = cursor.extract_trailing(2, 3);
        assert_eq!(window.ranges(), [8..12, 0..2]);
        assert_eq!(window.sample_count(), 3);
        assert_eq!(cursor.last_read(), 2);

        // no progress stays empty
        assert!(cursor.extract_trailing(2, 3).is_empty());
    }

    #[test]
    fn test_extract_trailing_long_enough_or_whole_lap() {
        let mut cursor = RingBufferCursor::new(12, 2).unwrap();
        let window = cursor.extract_trailing(10, 3);
        assert_eq!(window.ranges(), [0..10, 0..0]);
        assert_eq!(cursor.last_read(), 10);

        let window = cursor.extract_trailing(2, 9);
        assert_eq!(window.ranges(), [2..12, 0..2]);
        assert_eq!(window.sample_count(), 6);
    }
}
