use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

use crate::error::{ReviewError, Result};

/// One recorded point of the lead: seconds since recording start and millivolts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: f64,
    pub value: f64,
}

impl Sample {
    pub fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

/// Immutable single-lead recording.
///
/// Holds at least one sample, ordered by non-decreasing time.
#[derive(Debug, Clone)]
pub struct SignalStore {
    samples: Vec<Sample>,
}

impl SignalStore {
    /// Parse a CSV table with `time` and `data` columns.
    pub fn load<R: Read>(reader: R) -> Result<Self> {
        let samples = crate::io::csv::read_signal_csv(reader)?;
        Self::from_samples(samples)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let samples = crate::io::csv::read_signal_csv_path(path)?;
        Self::from_samples(samples)
    }

    pub fn from_samples(samples: Vec<Sample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(ReviewError::format("recording contains no samples"));
        }
        if let Some(idx) = samples.windows(2).position(|w| w[1].time < w[0].time) {
            return Err(ReviewError::format(format!(
                "time decreases at sample {} ({} after {})",
                idx + 1,
                samples[idx + 1].time,
                samples[idx].time
            )));
        }
        log::info!(
            "loaded recording: {} samples spanning {:.2}s",
            samples.len(),
            samples[samples.len() - 1].time - samples[0].time
        );
        Ok(Self { samples })
    }

    pub fn total_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn first_time(&self) -> f64 {
        self.samples[0].time
    }

    pub fn last_time(&self) -> f64 {
        self.samples[self.samples.len() - 1].time
    }

    pub fn duration_seconds(&self) -> f64 {
        self.last_time() - self.first_time()
    }

    /// Samples with index in `start..end`.
    pub fn slice(&self, start: usize, end: usize) -> Result<&[Sample]> {
        if start > end || end > self.samples.len() {
            return Err(ReviewError::range(format!(
                "slice {}..{} outside 0..{}",
                start,
                end,
                self.samples.len()
            )));
        }
        Ok(&self.samples[start..end])
    }

    /// Samples whose time lies in `[start_time, end_time]`, both ends inclusive.
    ///
    /// Returns an empty slice when nothing matches.
    pub fn samples_in_range(&self, start_time: f64, end_time: f64) -> &[Sample] {
        let lo = self.samples.partition_point(|s| s.time < start_time);
        let hi = self.samples.partition_point(|s| s.time <= end_time);
        &self.samples[lo..hi.max(lo)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize, fs: f64) -> SignalStore {
        let samples = (0..n)
            .map(|i| Sample::new(i as f64 / fs, (i as f64 * 0.01).sin()))
            .collect();
        SignalStore::from_samples(samples).unwrap()
    }

    #[test]
    fn rejects_empty_recording() {
        let err = SignalStore::from_samples(Vec::new()).unwrap_err();
        assert!(matches!(err, ReviewError::Format(_)));
    }

    #[test]
    fn rejects_decreasing_time() {
        let samples = vec![
            Sample::new(0.0, 0.1),
            Sample::new(0.5, 0.2),
            Sample::new(0.4, 0.3),
        ];
        let err = SignalStore::from_samples(samples).unwrap_err();
        assert!(err.to_string().contains("decreases at sample 2"));
    }

    #[test]
    fn allows_repeated_timestamps() {
        let samples = vec![Sample::new(0.0, 0.1), Sample::new(0.0, 0.2)];
        assert_eq!(SignalStore::from_samples(samples).unwrap().total_samples(), 2);
    }

    #[test]
    fn slice_bounds() {
        let store = ramp(10, 2.0);
        assert_eq!(store.slice(2, 5).unwrap().len(), 3);
        assert_eq!(store.slice(10, 10).unwrap().len(), 0);
        assert!(matches!(store.slice(5, 2), Err(ReviewError::Range(_))));
        assert!(matches!(store.slice(0, 11), Err(ReviewError::Range(_))));
    }

    #[test]
    fn samples_in_range_is_inclusive() {
        let store = ramp(10, 1.0);
        let hits = store.samples_in_range(2.0, 5.0);
        let times: Vec<f64> = hits.iter().map(|s| s.time).collect();
        assert_eq!(times, vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn samples_in_range_outside_recording_is_empty() {
        let store = ramp(10, 1.0);
        assert!(store.samples_in_range(100.0, 110.0).is_empty());
        assert!(store.samples_in_range(-20.0, -10.0).is_empty());
        assert!(store.samples_in_range(5.0, 4.0).is_empty());
    }

    #[test]
    fn samples_in_range_matches_linear_filter() {
        let store = ramp(500, 200.0);
        let (a, b) = (0.3337, 1.2001);
        let linear: Vec<Sample> = store
            .samples()
            .iter()
            .filter(|s| s.time >= a && s.time <= b)
            .copied()
            .collect();
        assert_eq!(store.samples_in_range(a, b), linear.as_slice());
    }
}
