//! Measurement function for an external alignment controller
//!
//! The controller moves its optics, asks for a measurement over a few
//! seconds and climbs towards the highest value. Only the measurement lives
//! here: it reads the samples produced while it waits, through its own
//! cursor, without disturbing the other consumers.

use std::sync::Arc;
use std::time::Duration;

use contracts::SampleProducer;
use ingestion::{RingBufferCursor, WindowSnapshot};
use observability::metrics::record_samples_consumed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Mean counts per millisecond-scaled tick per channel
///
/// `mean(slots) * 1000 / channel_count`, `None` for an empty window.
pub fn count_rate(snapshot: &WindowSnapshot) -> Option<f64> {
    let slots = snapshot.counts().len();
    if slots == 0 {
        return None;
    }
    let mean = snapshot.total() as f64 / slots as f64;
    Some(mean * 1000.0 / snapshot.channel_count() as f64)
}

pub struct Measurement {
    producer: Arc<dyn SampleProducer>,
    cancel: CancellationToken,
}

impl Measurement {
    pub fn new(producer: Arc<dyn SampleProducer>) -> Self {
        Self {
            producer,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that aborts pending and future measurements when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn abort(&self) {
        info!("measurement aborted");
        self.cancel.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Accept measurements again after an abort
    pub fn rearm(&mut self) {
        self.cancel = CancellationToken::new();
    }

    /// Measure over `duration`
    ///
    /// Returns `None` if aborted before or during the wait, or if the
    /// producer wrote no complete sample in the meantime.
    pub async fn measure(&self, duration: Duration) -> Option<f64> {
        if self.cancel.is_cancelled() {
            return None;
        }
        let cursor = RingBufferCursor::at_producer(self.producer.as_ref());

        tokio::select! {
            biased;

            _ = self.cancel.cancelled() => {
                debug!("measurement cancelled while waiting");
                return None;
            }
            _ = tokio::time::sleep(duration) => {}
        }

        let window = cursor.peek(self.producer.current_write_index());
        let snapshot = window.snapshot(&self.producer.read_buffer());
        record_samples_consumed("measure", snapshot.sample_count());

        let rate = count_rate(&snapshot);
        debug!(
            samples = snapshot.sample_count(),
            rate = ?rate,
            duration_ms = duration.as_millis() as u64,
            "measurement done"
        );
        rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SampleBuffer;

    #[test]
    fn test_count_rate() {
        // mean slot value 2.5, two channels
        let snapshot = WindowSnapshot::new(vec![1, 4, 2, 3], 2);
        assert_eq!(count_rate(&snapshot), Some(1250.0));
        assert_eq!(count_rate(&WindowSnapshot::new(vec![], 2)), None);
    }

    #[tokio::test]
    async fn test_measures_samples_written_during_wait() {
        let (mut writer, buffer) = SampleBuffer::allocate(16, 2);
        // written before the measurement starts: ignored
        writer.store(0, 100);
        writer.publish(2);

        let measurement = Measurement::new(Arc::new(buffer));
        let write = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            writer.store(2, 3);
            writer.store(3, 1);
            writer.store(4, 0);
            writer.store(5, 0);
            writer.publish(6);
        });

        let rate = measurement.measure(Duration::from_millis(100)).await;
        write.await.unwrap();
        // slots 2..6: mean 1.0, two channels
        assert_eq!(rate, Some(500.0));
    }

    #[tokio::test]
    async fn test_no_samples_is_none() {
        let (_writer, buffer) = SampleBuffer::allocate(8, 1);
        let measurement = Measurement::new(Arc::new(buffer));
        assert_eq!(measurement.measure(Duration::from_millis(5)).await, None);
    }

    #[tokio::test]
    async fn test_abort_during_wait() {
        let (_writer, buffer) = SampleBuffer::allocate(8, 1);
        let mut measurement = Measurement::new(Arc::new(buffer));
        let token = measurement.cancellation_token();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        let started = tokio::time::Instant::now();
        assert_eq!(measurement.measure(Duration::from_secs(30)).await, None);
        assert!(started.elapsed() < Duration::from_secs(30));
        assert!(measurement.is_aborted());

        // stays aborted until rearmed
        assert_eq!(measurement.measure(Duration::from_millis(1)).await, None);
        measurement.rearm();
        assert!(!measurement.is_aborted());
    }
}
