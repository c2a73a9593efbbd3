//! Detector selection for recorded photon streams
//!
//! A recording interleaves every detector in one `(timestamp, detector)`
//! stream. Auto-correlation takes one group of detectors against itself;
//! cross-correlation takes two groups.

use std::collections::BTreeSet;

use contracts::{ArrivalTimes, DetectorId, Tick};
use serde::Serialize;

use crate::correlator::correlate_checked;
use crate::error::{CorrelationError, Result};
use crate::lag_bins::LagBins;

/// Which detectors feed each side of the correlation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorSelection {
    /// One group against itself (`None` = every photon)
    Auto { detectors: Option<Vec<DetectorId>> },
    /// Group `a` against group `b`
    ///
    /// With both `None`, the stream must hold exactly two distinct detector
    /// ids, taken in ascending order.
    Cross {
        a: Option<Vec<DetectorId>>,
        b: Option<Vec<DetectorId>>,
    },
}

impl Default for DetectorSelection {
    fn default() -> Self {
        Self::Auto { detectors: None }
    }
}

/// Correlation of a recorded photon stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamCorrelation {
    /// Lag bin midpoints in seconds
    pub lag_centers: Vec<f64>,

    /// Normalized values (`None` where undefined)
    pub values: Vec<Option<f64>>,
}

/// Timestamps whose detector is in `wanted`
pub fn select_times(
    timestamps: &[Tick],
    detectors: &[DetectorId],
    wanted: &[DetectorId],
) -> ArrivalTimes {
    timestamps
        .iter()
        .zip(detectors)
        .filter(|(_, det)| wanted.contains(det))
        .map(|(&tick, _)| tick)
        .collect()
}

/// Correlate a recorded stream according to `selection`
///
/// `bins` must be expressed in the stream's own ticks (for an expanded
/// stream, build them with `clock_period / expand_by`).
///
/// # Errors
/// - `LengthMismatch` when timestamps and detectors are not aligned
/// - `DetectorSelection` when the cross groups cannot be resolved
/// - any error of `check_span`
pub fn correlate_stream(
    timestamps: &[Tick],
    detectors: &[DetectorId],
    selection: &DetectorSelection,
    bins: &LagBins,
) -> Result<StreamCorrelation> {
    if timestamps.len() != detectors.len() {
        return Err(CorrelationError::LengthMismatch {
            timestamps: timestamps.len(),
            detectors: detectors.len(),
        });
    }

    let values = match selection {
        DetectorSelection::Auto { detectors: None } => {
            correlate_checked(timestamps, timestamps, bins.edges())?
        }
        DetectorSelection::Auto {
            detectors: Some(group),
        } => {
            let times = select_times(timestamps, detectors, group);
            correlate_checked(&times, &times, bins.edges())?
        }
        DetectorSelection::Cross { a, b } => {
            let (a, b) = resolve_cross(detectors, a.as_deref(), b.as_deref())?;
            let t = select_times(timestamps, detectors, &a);
            let u = select_times(timestamps, detectors, &b);
            correlate_checked(&t, &u, bins.edges())?
        }
    };

    Ok(StreamCorrelation {
        lag_centers: bins.centers().to_vec(),
        values,
    })
}

fn resolve_cross(
    detectors: &[DetectorId],
    a: Option<&[DetectorId]>,
    b: Option<&[DetectorId]>,
) -> Result<(Vec<DetectorId>, Vec<DetectorId>)> {
    match (a, b) {
        (Some(a), Some(b)) => Ok((a.to_vec(), b.to_vec())),
        (None, None) => {
            let present: Vec<DetectorId> = detectors
                .iter()
                .copied()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            match present.as_slice() {
                [first, second] => Ok((vec![*first], vec![*second])),
                other => Err(CorrelationError::detector_selection(format!(
                    "cross correlation needs exactly two detectors, stream has {}",
                    other.len()
                ))),
            }
        }
        _ => Err(CorrelationError::detector_selection(
            "give both detector groups or neither",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream() -> (Vec<Tick>, Vec<DetectorId>) {
        // detector 0 every 10 ticks, detector 1 three ticks later
        let mut timestamps = Vec::new();
        let mut detectors = Vec::new();
        for i in 0..20 {
            timestamps.push(i * 10);
            detectors.push(0);
            timestamps.push(i * 10 + 3);
            detectors.push(1);
        }
        (timestamps, detectors)
    }

    #[test]
    fn test_select_times() {
        let (timestamps, detectors) = stream();
        let zeros = select_times(&timestamps, &detectors, &[0]);
        assert_eq!(zeros.len(), 20);
        assert!(zeros.iter().all(|t| t % 10 == 0));
        assert_eq!(select_times(&timestamps, &detectors, &[0, 1]).len(), 40);
    }

    #[test]
    fn test_cross_finds_delay() {
        let (timestamps, detectors) = stream();
        let bins = LagBins::from_edges(vec![1, 3, 4, 10], 1e-5).unwrap();
        let selection = DetectorSelection::Cross { a: None, b: None };

        let result = correlate_stream(&timestamps, &detectors, &selection, &bins).unwrap();
        assert_eq!(result.lag_centers.len(), 3);
        assert_eq!(result.values[0], Some(0.0));
        assert!(result.values[1].unwrap() > 0.0);
        assert_eq!(result.values[2], Some(0.0));
    }

    #[test]
    fn test_auto_with_group() {
        let (timestamps, detectors) = stream();
        let bins = LagBins::from_edges(vec![1, 10, 11], 1e-5).unwrap();
        let selection = DetectorSelection::Auto {
            detectors: Some(vec![1]),
        };
        let result = correlate_stream(&timestamps, &detectors, &selection, &bins).unwrap();
        assert_eq!(result.values[0], Some(0.0));
        assert!(result.values[1].unwrap() > 0.0);
    }

    #[test]
    fn test_cross_needs_two_detectors() {
        let timestamps = vec![0, 50, 100];
        let detectors = vec![0, 0, 0];
        let bins = LagBins::from_edges(vec![1, 2], 1.0).unwrap();
        let err = correlate_stream(
            &timestamps,
            &detectors,
            &DetectorSelection::Cross { a: None, b: None },
            &bins,
        )
        .unwrap_err();
        assert!(matches!(err, CorrelationError::DetectorSelection { .. }));

        let err = correlate_stream(
            &timestamps,
            &detectors,
            &DetectorSelection::Cross {
                a: Some(vec![0]),
                b: None,
            },
            &bins,
        )
        .unwrap_err();
        assert!(matches!(err, CorrelationError::DetectorSelection { .. }));
    }

    #[test]
    fn test_length_mismatch() {
        let bins = LagBins::from_edges(vec![1, 2], 1.0).unwrap();
        let err =
            correlate_stream(&[1, 2], &[0], &DetectorSelection::default(), &bins).unwrap_err();
        assert_eq!(
            err,
            CorrelationError::LengthMismatch {
                timestamps: 2,
                detectors: 1
            }
        );
    }
}
