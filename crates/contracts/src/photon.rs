//! Photon data - ArrivalExpander output / sink input

use serde::{Deserialize, Serialize};

/// Integer clock tick (one acquisition sample)
pub type Tick = i64;

/// Detector (channel) id of a photon
pub type DetectorId = u8;

/// Ordered arrival times of one channel, one entry per detected photon
pub type ArrivalTimes = Vec<Tick>;

/// A chronological run of photons handed to an acquisition sink
///
/// `timestamps` and `detectors` are index-aligned. Timestamps are
/// non-decreasing and expressed in `timestamps_unit` seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotonBatch {
    /// Photon arrival ticks
    pub timestamps: Vec<Tick>,

    /// Detector id of every photon
    pub detectors: Vec<DetectorId>,

    /// Duration of one tick in seconds
    pub timestamps_unit: f64,

    /// Number of detector channels in the acquisition
    pub channel_count: usize,
}

impl PhotonBatch {
    /// Create an empty batch
    pub fn new(timestamps_unit: f64, channel_count: usize) -> Self {
        Self {
            timestamps: Vec::new(),
            detectors: Vec::new(),
            timestamps_unit,
            channel_count,
        }
    }

    /// Number of photons
    #[inline]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// True when the batch holds no photon
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Append another batch recorded after this one
    pub fn extend(&mut self, other: &PhotonBatch) {
        self.timestamps.extend_from_slice(&other.timestamps);
        self.detectors.extend_from_slice(&other.detectors);
    }

    /// Photon count per detector
    pub fn counts_per_detector(&self) -> Vec<usize> {
        let mut counts = vec![0; self.channel_count];
        for &det in &self.detectors {
            if let Some(count) = counts.get_mut(det as usize) {
                *count += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_per_detector() {
        let batch = PhotonBatch {
            timestamps: vec![0, 0, 3, 5],
            detectors: vec![0, 1, 1, 1],
            timestamps_unit: 1e-5,
            channel_count: 2,
        };
        assert_eq!(batch.counts_per_detector(), vec![1, 3]);
    }

    #[test]
    fn test_extend_keeps_alignment() {
        let mut a = PhotonBatch::new(1e-5, 2);
        let b = PhotonBatch {
            timestamps: vec![1, 2],
            detectors: vec![0, 1],
            timestamps_unit: 1e-5,
            channel_count: 2,
        };
        a.extend(&b);
        a.extend(&b);
        assert_eq!(a.len(), 4);
        assert_eq!(a.timestamps.len(), a.detectors.len());
    }
}
