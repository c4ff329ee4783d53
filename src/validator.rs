//! Sample validation
//!
//! Repairs one raw sample into physiologically bounded values. Validation is a
//! total function: absurd readings are clamped, never rejected, because
//! consumer wearable data is routinely partial or erroneous.

use crate::types::{Metric, QualityFlag, RawSample, ValidatedSample};
use tracing::debug;

/// Physiological bounds applied by the validator, as `(lower, upper)`
pub mod bounds {
    pub const RESTING_HEART_RATE: (f64, f64) = (35.0, 110.0);
    pub const HRV_INDEX: (f64, f64) = (0.0, 100.0);
    pub const HRV_RAW_MS: (f64, f64) = (0.0, 300.0);
    pub const SLEEP_DURATION_HOURS: (f64, f64) = (0.0, 14.0);
    pub const SLEEP_QUALITY_SCORE: (f64, f64) = (0.0, 100.0);
    pub const SLEEP_REGULARITY_DEVIATION_MINUTES: (f64, f64) = (0.0, 180.0);
    pub const AWAKENINGS_COUNT: (f64, f64) = (0.0, 20.0);
    pub const STRESS_SCORE: (f64, f64) = (0.0, 100.0);
    pub const SPO2_PERCENT: (f64, f64) = (50.0, 100.0);
    pub const BODY_TEMPERATURE_CELSIUS: (f64, f64) = (34.0, 42.0);
}

/// Bound for a metric
pub fn bounds_for(metric: Metric) -> (f64, f64) {
    match metric {
        Metric::RestingHeartRate => bounds::RESTING_HEART_RATE,
        Metric::HrvIndex => bounds::HRV_INDEX,
        Metric::HrvRawMs => bounds::HRV_RAW_MS,
        Metric::SleepDurationHours => bounds::SLEEP_DURATION_HOURS,
        Metric::SleepQualityScore => bounds::SLEEP_QUALITY_SCORE,
        Metric::SleepRegularityDeviationMinutes => bounds::SLEEP_REGULARITY_DEVIATION_MINUTES,
        Metric::AwakeningsCount => bounds::AWAKENINGS_COUNT,
        Metric::StressScore => bounds::STRESS_SCORE,
        Metric::Spo2Percent => bounds::SPO2_PERCENT,
        Metric::BodyTemperatureCelsius => bounds::BODY_TEMPERATURE_CELSIUS,
    }
}

/// Repair a raw sample. See [`validate_with_report`] for the repair flags.
pub fn validate(raw: &RawSample) -> ValidatedSample {
    validate_with_report(raw).0
}

/// Repair a raw sample and report which fields were touched.
pub fn validate_with_report(raw: &RawSample) -> (ValidatedSample, Vec<QualityFlag>) {
    let mut flags = Vec::new();
    let mut repair = |metric: Metric, value: f64| -> f64 {
        let repaired = clamp_metric(metric, value);
        if repaired != value {
            debug!(
                metric = metric.as_str(),
                original = value,
                repaired,
                "repaired out-of-range sample field"
            );
            flags.push(QualityFlag::Repaired(metric));
        }
        repaired
    };

    let resting_heart_rate = repair(Metric::RestingHeartRate, raw.resting_heart_rate);

    // A negative or zero index clamps onto the sentinel and reads as unavailable.
    let hrv_index = raw
        .hrv_index
        .map(|v| repair(Metric::HrvIndex, v))
        .filter(|v| *v > 0.0);
    let hrv_raw_ms = raw.hrv_raw_ms.map(|v| repair(Metric::HrvRawMs, v));

    let sleep_duration_hours = repair(Metric::SleepDurationHours, raw.sleep_duration_hours);
    let sleep_quality_score = repair(Metric::SleepQualityScore, raw.sleep_quality_score);

    // Regularity is a magnitude; a signed deviation (early vs late) keeps its size.
    let sleep_regularity_deviation_minutes = repair(
        Metric::SleepRegularityDeviationMinutes,
        raw.sleep_regularity_deviation_minutes.abs(),
    );

    let awakenings_count = repair(Metric::AwakeningsCount, raw.awakenings_count.round());
    let stress_score = repair(Metric::StressScore, raw.stress_score);
    let spo2_percent = raw.spo2_percent.map(|v| repair(Metric::Spo2Percent, v));
    let body_temperature_celsius = raw
        .body_temperature_celsius
        .map(|v| repair(Metric::BodyTemperatureCelsius, v));

    if hrv_index.is_none() {
        flags.push(QualityFlag::HrvUnavailable);
    }

    let sample = RawSample {
        date: raw.date,
        resting_heart_rate,
        hrv_index,
        hrv_raw_ms,
        sleep_duration_hours,
        sleep_quality_score,
        sleep_regularity_deviation_minutes,
        awakenings_count,
        previous_day_activity_level: raw.previous_day_activity_level,
        stress_score,
        spo2_percent,
        body_temperature_celsius,
    };

    (ValidatedSample(sample), flags)
}

/// Clamp a value into its metric's bound. Non-finite values land on a bound
/// (`NaN` on the lower one) so the bounded invariant holds unconditionally.
fn clamp_metric(metric: Metric, value: f64) -> f64 {
    let (lower, upper) = bounds_for(metric);
    if value.is_nan() {
        return lower;
    }
    value.clamp(lower, upper)
}
