use serde::{Deserialize, Serialize};

use crate::error::{ReviewError, Result};
use crate::signal::{Sample, SignalStore};

pub const DEFAULT_SAMPLING_RATE_HZ: u32 = 200;
pub const DEFAULT_WINDOW_SECONDS: u32 = 3600;

/// Sample-index bounds of one viewing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub hour_index: usize,
    pub start_sample: usize,
    pub end_sample: usize,
}

impl WindowSpec {
    pub fn len(&self) -> usize {
        self.end_sample - self.start_sample
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn samples<'a>(&self, store: &'a SignalStore) -> Result<&'a [Sample]> {
        store.slice(self.start_sample, self.end_sample)
    }
}

/// Maps window indices onto sample ranges using a fixed sampling rate.
///
/// Both rate and window length are positive for every constructed value,
/// including ones read from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "NavigatorFields")]
pub struct WindowNavigator {
    sampling_rate_hz: u32,
    window_seconds: u32,
}

#[derive(Deserialize)]
#[serde(default)]
struct NavigatorFields {
    sampling_rate_hz: u32,
    window_seconds: u32,
}

impl Default for NavigatorFields {
    fn default() -> Self {
        Self {
            sampling_rate_hz: DEFAULT_SAMPLING_RATE_HZ,
            window_seconds: DEFAULT_WINDOW_SECONDS,
        }
    }
}

impl TryFrom<NavigatorFields> for WindowNavigator {
    type Error = ReviewError;

    fn try_from(fields: NavigatorFields) -> Result<Self> {
        Self::new(fields.sampling_rate_hz, fields.window_seconds)
    }
}

impl Default for WindowNavigator {
    fn default() -> Self {
        Self {
            sampling_rate_hz: DEFAULT_SAMPLING_RATE_HZ,
            window_seconds: DEFAULT_WINDOW_SECONDS,
        }
    }
}

impl WindowNavigator {
    pub fn new(sampling_rate_hz: u32, window_seconds: u32) -> Result<Self> {
        if sampling_rate_hz == 0 || window_seconds == 0 {
            return Err(ReviewError::format(format!(
                "sampling_rate_hz ({}) and window_seconds ({}) must be positive",
                sampling_rate_hz, window_seconds
            )));
        }
        Ok(Self {
            sampling_rate_hz,
            window_seconds,
        })
    }

    pub fn sampling_rate_hz(&self) -> u32 {
        self.sampling_rate_hz
    }

    pub fn window_seconds(&self) -> u32 {
        self.window_seconds
    }

    pub fn samples_per_window(&self) -> usize {
        self.sampling_rate_hz as usize * self.window_seconds as usize
    }

    /// Number of complete windows; a trailing partial window sits at this index.
    pub fn total_windows(&self, total_samples: usize) -> usize {
        total_samples / self.samples_per_window()
    }

    /// Number of windows that contain at least one sample.
    pub fn window_count(&self, total_samples: usize) -> usize {
        total_samples.div_ceil(self.samples_per_window())
    }

    pub fn window_for(&self, store: &SignalStore, hour_index: usize) -> Result<WindowSpec> {
        let total = store.total_samples();
        let per_window = self.samples_per_window();
        let start_sample = hour_index.saturating_mul(per_window);
        if hour_index > self.total_windows(total) || start_sample >= total {
            return Err(ReviewError::range(format!(
                "window {} outside 0..{} for {} samples",
                hour_index,
                self.window_count(total),
                total
            )));
        }
        Ok(WindowSpec {
            hour_index,
            start_sample,
            end_sample: (start_sample + per_window).min(total),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(n: usize) -> SignalStore {
        let samples = (0..n).map(|i| Sample::new(i as f64 / 200.0, 0.0)).collect();
        SignalStore::from_samples(samples).unwrap()
    }

    #[test]
    fn reference_window_is_one_hour_at_200hz() {
        assert_eq!(WindowNavigator::default().samples_per_window(), 720_000);
    }

    #[test]
    fn windows_cover_recording() {
        // 2 s windows = 400 samples; 1000 samples -> 2 full + 1 partial
        let nav = WindowNavigator::new(200, 2).unwrap();
        let store = store(1000);
        assert_eq!(nav.total_windows(1000), 2);
        assert_eq!(nav.window_count(1000), 3);
        for hour in 0..=nav.total_windows(store.total_samples()) {
            let w = nav.window_for(&store, hour).unwrap();
            assert_eq!(w.start_sample, hour * 400);
            assert!(w.len() <= 400);
            assert!(w.start_sample < store.total_samples());
        }
        let last = nav.window_for(&store, 2).unwrap();
        assert_eq!((last.start_sample, last.end_sample), (800, 1000));
    }

    #[test]
    fn index_past_end_is_range_error() {
        let nav = WindowNavigator::new(200, 2).unwrap();
        let store = store(1000);
        assert!(matches!(nav.window_for(&store, 3), Err(ReviewError::Range(_))));
        assert!(matches!(
            nav.window_for(&store, usize::MAX),
            Err(ReviewError::Range(_))
        ));
    }

    #[test]
    fn exact_multiple_has_no_empty_trailing_window() {
        let nav = WindowNavigator::new(200, 2).unwrap();
        let store = store(800);
        assert_eq!(nav.total_windows(800), 2);
        assert!(nav.window_for(&store, 1).is_ok());
        assert!(matches!(nav.window_for(&store, 2), Err(ReviewError::Range(_))));
    }

    #[test]
    fn zero_rate_or_length_is_rejected() {
        assert!(matches!(
            WindowNavigator::new(0, 3600),
            Err(ReviewError::Format(_))
        ));
        assert!(WindowNavigator::new(200, 0).is_err());
        assert!(serde_json::from_str::<WindowNavigator>(r#"{"window_seconds": 0}"#).is_err());
        let nav: WindowNavigator = serde_json::from_str(r#"{"window_seconds": 60}"#).unwrap();
        assert_eq!(nav.sampling_rate_hz(), 200);
        assert_eq!(nav.samples_per_window(), 12_000);
    }

    #[test]
    fn short_recording_has_single_partial_window() {
        let nav = WindowNavigator::default();
        let store = store(10);
        let w = nav.window_for(&store, 0).unwrap();
        assert_eq!((w.start_sample, w.end_sample), (0, 10));
        assert_eq!(w.samples(&store).unwrap().len(), 10);
    }
}
