//! Personal baseline computation
//!
//! Derives per-metric mean and spread from a person's recent validated samples,
//! so later stages can read a new day relative to that person's own normal.
//! An empty history falls back to fixed population defaults.

use crate::config::DEFAULT_BASELINE_WINDOW;
use crate::types::{BaselineMetric, Metric, PersonalBaseline, ValidatedSample};
use tracing::debug;

/// Population defaults used when there is no personal history
pub const FALLBACK_BASELINE: PersonalBaseline = PersonalBaseline {
    resting_heart_rate: BaselineMetric::new(63.0, 5.0),
    hrv_index: BaselineMetric::new(55.0, 12.0),
    hrv_raw_ms: BaselineMetric::new(44.0, 15.0),
    sleep_duration_hours: BaselineMetric::new(7.0, 1.0),
    sleep_quality_score: BaselineMetric::new(70.0, 10.0),
    // Deviation is a magnitude; a regular sleeper still drifts 15-20 minutes.
    sleep_regularity_deviation_minutes: BaselineMetric::new(18.0, 12.0),
    awakenings_count: BaselineMetric::new(3.0, 1.5),
    stress_score: BaselineMetric::new(40.0, 12.0),
    spo2_percent: BaselineMetric::new(97.0, 1.2),
    body_temperature_celsius: BaselineMetric::new(36.8, 0.3),
    days_used: 0,
    is_fallback: true,
};

/// Baseline calculator with a bounded recency window
#[derive(Debug, Clone, Copy)]
pub struct BaselineCalculator {
    window_size: usize,
}

impl Default for BaselineCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_BASELINE_WINDOW)
    }
}

impl BaselineCalculator {
    /// Create a calculator folding at most `window_size` samples (minimum 1)
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Compute a baseline over the most recent samples of `history`.
    ///
    /// Recency is decided by `date`, so the history may come in any order.
    /// A metric with no observations inside the window keeps its fallback.
    pub fn compute(&self, history: &[ValidatedSample]) -> PersonalBaseline {
        if history.is_empty() {
            debug!("empty history, using fallback baseline");
            return FALLBACK_BASELINE;
        }

        let mut recent: Vec<&ValidatedSample> = history.iter().collect();
        recent.sort_by(|a, b| b.date.cmp(&a.date));
        recent.truncate(self.window_size);

        let mut baseline = FALLBACK_BASELINE;
        for metric in Metric::ALL {
            let values: Vec<f64> = recent.iter().filter_map(|s| s.metric(metric)).collect();
            if let Some(stats) = summarize(&values) {
                *baseline.metric_mut(metric) = stats;
            }
        }
        baseline.days_used = recent.len() as u32;
        baseline.is_fallback = false;

        debug!(
            days_used = baseline.days_used,
            window = self.window_size,
            "computed personal baseline"
        );
        baseline
    }
}

/// Compute a baseline with the default window.
pub fn compute_baseline(history: &[ValidatedSample]) -> PersonalBaseline {
    BaselineCalculator::default().compute(history)
}

/// Mean and sample standard deviation; one value has a spread of zero.
fn summarize(values: &[f64]) -> Option<BaselineMetric> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let standard_deviation = if values.len() < 2 {
        0.0
    } else {
        let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (squares / (n - 1.0)).sqrt()
    };
    Some(BaselineMetric::new(mean, standard_deviation))
}
