//! Signal normalization
//!
//! This module turns a validated sample into comparable, bounded signals:
//! - HRV milliseconds mapped onto a fixed 0-100 index
//! - every other metric expressed as a z-score against the personal baseline,
//!   then squashed into a signed delta in [-1, 1] (positive = favorable)

use crate::config::EngineConfig;
use crate::types::{
    BaselineMetric, HrvSource, Metric, MetricDeltas, NormalizedSignals, PersonalBaseline,
    QualityFlag, ValidatedSample,
};
use tracing::debug;

/// Calibration anchors `(ms, index)` for the HRV curve: low, typical and high
/// HRV land below 40, mid-range and above 70 respectively.
pub const DEFAULT_HRV_CURVE: [(f64, f64); 5] = [
    (5.0, 0.0),
    (20.0, 25.0),
    (44.0, 50.0),
    (80.0, 75.0),
    (150.0, 100.0),
];

/// Map raw HRV (ms) onto a 0-100 index with the default curve.
pub fn normalize_hrv_ms_to_index(ms: f64) -> f64 {
    hrv_index_from_curve(&DEFAULT_HRV_CURVE, ms)
}

/// Piecewise-linear interpolation through `curve`, flat outside its domain.
///
/// `curve` must be ascending in both coordinates (checked by
/// `EngineConfig::validate`); the result is always within 0-100.
pub fn hrv_index_from_curve(curve: &[(f64, f64)], ms: f64) -> f64 {
    let (first, last) = match (curve.first(), curve.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return 0.0,
    };

    let index = if ms.is_nan() || ms <= first.0 {
        first.1
    } else if ms >= last.0 {
        last.1
    } else {
        curve
            .windows(2)
            .find(|pair| ms <= pair[1].0)
            .map(|pair| {
                let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
                y0 + (ms - x0) / (x1 - x0) * (y1 - y0)
            })
            .unwrap_or(last.1)
    };

    index.clamp(0.0, 100.0)
}

/// Standard score of `value` against a baseline metric.
///
/// A zero (or unusable) spread means no deviation is representable and
/// yields 0. This is a simplification, not a "no variability" signal.
pub fn z_score(value: f64, metric: &BaselineMetric) -> f64 {
    let spread = metric.standard_deviation;
    if !(spread.is_finite() && spread > 0.0) {
        return 0.0;
    }
    let z = (value - metric.mean) / spread;
    if z.is_finite() {
        z
    } else {
        0.0
    }
}

/// Temperature drift (in standard deviations) read as normal day-to-day noise
pub const TEMPERATURE_TOLERANCE_Z: f64 = 1.0;

/// Capped linear transform of a z-score into [-1, 1]
pub fn bounded_delta(z: f64, sensitivity: f64) -> f64 {
    (z * sensitivity).clamp(-1.0, 1.0)
}

/// Normalizer for converting validated samples into baseline-relative signals
pub struct Normalizer;

impl Normalizer {
    /// Normalize a validated sample against a personal baseline
    pub fn normalize(
        sample: &ValidatedSample,
        baseline: &PersonalBaseline,
        config: &EngineConfig,
    ) -> NormalizedSignals {
        let k = config.sensitivity;
        let mut quality_flags = Vec::new();

        let delta = |metric: Metric, value: f64| bounded_delta(z_score(value, baseline.metric(metric)), k);

        if baseline.is_fallback {
            quality_flags.push(QualityFlag::FallbackBaseline);
        }

        // HRV: reported index first, then the fixed-range curve over raw ms.
        let (hrv_index, hrv_source) = match (sample.hrv_index, sample.hrv_raw_ms) {
            (Some(index), _) => (Some(index), HrvSource::Reported),
            (None, Some(ms)) => {
                let index = hrv_index_from_curve(&config.hrv_curve, ms);
                debug!(ms, index, "derived HRV index from raw milliseconds");
                quality_flags.push(QualityFlag::HrvDerivedFromRawMs);
                (Some(index), HrvSource::DerivedFromRawMs)
            }
            (None, None) => {
                quality_flags.push(QualityFlag::MissingHrv);
                (None, HrvSource::Unavailable)
            }
        };

        let spo2 = match sample.spo2_percent {
            Some(value) => delta(Metric::Spo2Percent, value),
            None => {
                quality_flags.push(QualityFlag::MissingSpo2);
                0.0
            }
        };

        // Drift in either direction is unfavorable for temperature, past the tolerance band.
        let body_temperature = match sample.body_temperature_celsius {
            Some(value) => {
                let z = z_score(value, baseline.metric(Metric::BodyTemperatureCelsius));
                -bounded_delta((z.abs() - TEMPERATURE_TOLERANCE_Z).max(0.0), k)
            }
            None => {
                quality_flags.push(QualityFlag::MissingBodyTemperature);
                0.0
            }
        };

        let deltas = MetricDeltas {
            resting_heart_rate: -delta(Metric::RestingHeartRate, sample.resting_heart_rate),
            hrv: hrv_index.map_or(0.0, |index| delta(Metric::HrvIndex, index)),
            sleep_duration: delta(Metric::SleepDurationHours, sample.sleep_duration_hours),
            sleep_quality: delta(Metric::SleepQualityScore, sample.sleep_quality_score),
            sleep_regularity: -delta(
                Metric::SleepRegularityDeviationMinutes,
                sample.sleep_regularity_deviation_minutes,
            ),
            awakenings: -delta(Metric::AwakeningsCount, sample.awakenings_count),
            stress: -delta(Metric::StressScore, sample.stress_score),
            spo2,
            body_temperature,
        };

        NormalizedSignals {
            sample: sample.clone(),
            deltas,
            hrv_index,
            hrv_source,
            quality_flags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::FALLBACK_BASELINE;
    use crate::types::{ActivityLevel, RawSample};
    use crate::validator::validate;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn make_sample() -> ValidatedSample {
        validate(&RawSample {
            date: NaiveDate::from_ymd_opt(2026, 2, 9).unwrap(),
            resting_heart_rate: 63.0,
            hrv_index: Some(55.0),
            hrv_raw_ms: None,
            sleep_duration_hours: 7.0,
            sleep_quality_score: 70.0,
            sleep_regularity_deviation_minutes: 18.0,
            awakenings_count: 3.0,
            previous_day_activity_level: ActivityLevel::Medium,
            stress_score: 40.0,
            spo2_percent: Some(97.0),
            body_temperature_celsius: Some(36.8),
        })
    }

    #[test]
    fn test_hrv_anchors() {
        assert!(normalize_hrv_ms_to_index(20.0) < 40.0);
        let mid = normalize_hrv_ms_to_index(44.0);
        assert!((30.0..=70.0).contains(&mid));
        assert!(normalize_hrv_ms_to_index(100.0) > 70.0);
    }

    #[test]
    fn test_hrv_clamps_extremes() {
        assert!(normalize_hrv_ms_to_index(1.0) >= 0.0);
        assert!(normalize_hrv_ms_to_index(500.0) <= 100.0);
        assert_eq!(normalize_hrv_ms_to_index(-10.0), 0.0);
        assert_eq!(normalize_hrv_ms_to_index(f64::NAN), 0.0);
        assert_eq!(normalize_hrv_ms_to_index(f64::INFINITY), 100.0);
    }

    #[test]
    fn test_zero_spread_yields_zero_z() {
        let metric = BaselineMetric::new(60.0, 0.0);
        assert_eq!(z_score(75.0, &metric), 0.0);
        assert_eq!(z_score(75.0, &BaselineMetric::new(60.0, 5.0)), 3.0);
    }

    #[test]
    fn test_bounded_delta_caps() {
        assert_eq!(bounded_delta(3.0, 0.75), 1.0);
        assert_eq!(bounded_delta(-3.0, 0.75), -1.0);
        assert!((bounded_delta(1.0, 0.75) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_sample_at_baseline_is_neutral() {
        let signals =
            Normalizer::normalize(&make_sample(), &FALLBACK_BASELINE, &EngineConfig::default());

        assert_eq!(signals.deltas, MetricDeltas::default());
        assert_eq!(signals.hrv_source, HrvSource::Reported);
        assert!(signals.quality_flags.contains(&QualityFlag::FallbackBaseline));
    }

    #[test]
    fn test_directions() {
        let mut raw = make_sample().into_raw();
        raw.resting_heart_rate = 55.0;
        raw.stress_score = 70.0;
        raw.body_temperature_celsius = Some(36.2);
        let signals =
            Normalizer::normalize(&validate(&raw), &FALLBACK_BASELINE, &EngineConfig::default());

        assert!(signals.deltas.resting_heart_rate > 0.0);
        assert!(signals.deltas.stress < 0.0);
        assert!(signals.deltas.body_temperature < 0.0);
    }

    #[test]
    fn test_temperature_within_tolerance_is_neutral() {
        let mut raw = make_sample().into_raw();
        raw.body_temperature_celsius = Some(36.6);
        let signals =
            Normalizer::normalize(&validate(&raw), &FALLBACK_BASELINE, &EngineConfig::default());
        assert_eq!(signals.deltas.body_temperature, 0.0);

        raw.body_temperature_celsius = Some(37.7);
        let signals =
            Normalizer::normalize(&validate(&raw), &FALLBACK_BASELINE, &EngineConfig::default());
        assert!(signals.deltas.body_temperature <= -1.0 + 1e-9);
    }

    #[test]
    fn test_typical_regularity_is_not_a_penalty() {
        let mut raw = make_sample().into_raw();
        raw.sleep_regularity_deviation_minutes = 15.0;
        let signals =
            Normalizer::normalize(&validate(&raw), &FALLBACK_BASELINE, &EngineConfig::default());
        assert!(signals.deltas.sleep_regularity > 0.0);

        raw.sleep_regularity_deviation_minutes = 60.0;
        let signals =
            Normalizer::normalize(&validate(&raw), &FALLBACK_BASELINE, &EngineConfig::default());
        assert!(signals.deltas.sleep_regularity < 0.0);
    }

    #[test]
    fn test_sentinel_uses_raw_ms() {
        let mut raw = make_sample().into_raw();
        raw.hrv_index = None;
        raw.hrv_raw_ms = Some(44.0);
        let signals =
            Normalizer::normalize(&validate(&raw), &FALLBACK_BASELINE, &EngineConfig::default());

        assert_eq!(signals.hrv_source, HrvSource::DerivedFromRawMs);
        assert_eq!(signals.hrv_index, Some(50.0));
        assert!(signals.deltas.hrv > -0.5);
        assert!(signals.quality_flags.contains(&QualityFlag::HrvDerivedFromRawMs));
    }

    #[test]
    fn test_missing_hrv_is_neutral() {
        let mut raw = make_sample().into_raw();
        raw.hrv_index = None;
        let signals =
            Normalizer::normalize(&validate(&raw), &FALLBACK_BASELINE, &EngineConfig::default());

        assert_eq!(signals.hrv_source, HrvSource::Unavailable);
        assert_eq!(signals.deltas.hrv, 0.0);
        assert!(signals.quality_flags.contains(&QualityFlag::MissingHrv));
    }

    proptest! {
        #[test]
        fn prop_hrv_index_is_monotonic(a in -50.0..1000.0f64, b in -50.0..1000.0f64) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let (ilo, ihi) = (normalize_hrv_ms_to_index(lo), normalize_hrv_ms_to_index(hi));
            prop_assert!(ilo <= ihi);
            prop_assert!((0.0..=100.0).contains(&ilo));
            prop_assert!((0.0..=100.0).contains(&ihi));
        }
    }
}
