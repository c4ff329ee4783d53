//! Core types for the VYR engine
//!
//! This module defines the values that flow through each stage of the engine:
//! raw and validated samples, personal baselines, normalized deltas, pillars,
//! and the final computed state. Every value is transient; the engine keeps no
//! state between calls.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::Deref;

/// Previous-day activity load reported by the wearable or entered manually
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Low,
    Medium,
    High,
}

impl ActivityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Low => "low",
            ActivityLevel::Medium => "medium",
            ActivityLevel::High => "high",
        }
    }
}

/// Numeric metrics carried by a daily sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    RestingHeartRate,
    HrvIndex,
    HrvRawMs,
    SleepDurationHours,
    SleepQualityScore,
    SleepRegularityDeviationMinutes,
    AwakeningsCount,
    StressScore,
    Spo2Percent,
    BodyTemperatureCelsius,
}

impl Metric {
    pub const ALL: [Metric; 10] = [
        Metric::RestingHeartRate,
        Metric::HrvIndex,
        Metric::HrvRawMs,
        Metric::SleepDurationHours,
        Metric::SleepQualityScore,
        Metric::SleepRegularityDeviationMinutes,
        Metric::AwakeningsCount,
        Metric::StressScore,
        Metric::Spo2Percent,
        Metric::BodyTemperatureCelsius,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::RestingHeartRate => "restingHeartRate",
            Metric::HrvIndex => "hrvIndex",
            Metric::HrvRawMs => "hrvRawMs",
            Metric::SleepDurationHours => "sleepDurationHours",
            Metric::SleepQualityScore => "sleepQualityScore",
            Metric::SleepRegularityDeviationMinutes => "sleepRegularityDeviationMinutes",
            Metric::AwakeningsCount => "awakeningsCount",
            Metric::StressScore => "stressScore",
            Metric::Spo2Percent => "spo2Percent",
            Metric::BodyTemperatureCelsius => "bodyTemperatureCelsius",
        }
    }
}

/// One calendar day of biometric inputs, as supplied by the acquisition layer.
///
/// On the wire an `hrvIndex` of `0` means "unavailable"; it is read as `None`
/// here and written back as `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSample {
    /// Calendar day this sample describes
    pub date: NaiveDate,
    /// Resting heart rate (bpm)
    pub resting_heart_rate: f64,
    /// Device-precomputed HRV index (0-100), `None` when unavailable
    #[serde(
        default,
        deserialize_with = "hrv_sentinel::deserialize",
        serialize_with = "hrv_sentinel::serialize"
    )]
    pub hrv_index: Option<f64>,
    /// Raw heart rate variability (ms), used when the index is unavailable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hrv_raw_ms: Option<f64>,
    /// Total sleep (hours)
    pub sleep_duration_hours: f64,
    /// Sleep quality (0-100)
    pub sleep_quality_score: f64,
    /// Deviation from the usual sleep/wake time (minutes)
    pub sleep_regularity_deviation_minutes: f64,
    /// Number of awakenings during the night
    pub awakenings_count: f64,
    /// Activity load of the previous day
    pub previous_day_activity_level: ActivityLevel,
    /// Stress (0-100)
    pub stress_score: f64,
    /// Blood oxygen saturation (%)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spo2_percent: Option<f64>,
    /// Body temperature (celsius)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_temperature_celsius: Option<f64>,
}

impl RawSample {
    /// Read a single sample from JSON; structural problems become `MalformedSample`.
    pub fn from_json(json: &str) -> Result<Self, crate::EngineError> {
        serde_json::from_str(json).map_err(crate::EngineError::malformed)
    }

    /// Value of a numeric metric, if present
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::RestingHeartRate => Some(self.resting_heart_rate),
            Metric::HrvIndex => self.hrv_index,
            Metric::HrvRawMs => self.hrv_raw_ms,
            Metric::SleepDurationHours => Some(self.sleep_duration_hours),
            Metric::SleepQualityScore => Some(self.sleep_quality_score),
            Metric::SleepRegularityDeviationMinutes => {
                Some(self.sleep_regularity_deviation_minutes)
            }
            Metric::AwakeningsCount => Some(self.awakenings_count),
            Metric::StressScore => Some(self.stress_score),
            Metric::Spo2Percent => self.spo2_percent,
            Metric::BodyTemperatureCelsius => self.body_temperature_celsius,
        }
    }

    /// Reject non-numeric values (NaN, infinities) that cannot come from a sensor.
    ///
    /// `validate` repairs these silently; callers that want the strict
    /// contract check here first.
    pub fn check_structure(&self) -> Result<(), crate::EngineError> {
        for metric in Metric::ALL {
            if let Some(value) = self.metric(metric) {
                if !value.is_finite() {
                    return Err(crate::EngineError::MalformedSample(format!(
                        "{} is not a finite number ({})",
                        metric.as_str(),
                        value
                    )));
                }
            }
        }
        Ok(())
    }
}

mod hrv_sentinel {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<f64>::deserialize(deserializer)?;
        Ok(value.filter(|v| *v != 0.0))
    }

    pub fn serialize<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.unwrap_or(0.0))
    }
}

/// A sample whose every field lies inside its physiological bound.
///
/// Only `validator::validate` builds one; deserializing re-validates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSample", into = "RawSample")]
pub struct ValidatedSample(pub(crate) RawSample);

impl ValidatedSample {
    pub fn into_raw(self) -> RawSample {
        self.0
    }
}

impl Deref for ValidatedSample {
    type Target = RawSample;

    fn deref(&self) -> &RawSample {
        &self.0
    }
}

impl From<RawSample> for ValidatedSample {
    fn from(raw: RawSample) -> Self {
        crate::validator::validate(&raw)
    }
}

impl From<ValidatedSample> for RawSample {
    fn from(sample: ValidatedSample) -> Self {
        sample.0
    }
}

/// Mean and spread of one metric over a personal history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineMetric {
    pub mean: f64,
    pub standard_deviation: f64,
}

impl BaselineMetric {
    pub const fn new(mean: f64, standard_deviation: f64) -> Self {
        Self {
            mean,
            standard_deviation,
        }
    }
}

/// Per-metric personal baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalBaseline {
    pub resting_heart_rate: BaselineMetric,
    pub hrv_index: BaselineMetric,
    pub hrv_raw_ms: BaselineMetric,
    pub sleep_duration_hours: BaselineMetric,
    pub sleep_quality_score: BaselineMetric,
    pub sleep_regularity_deviation_minutes: BaselineMetric,
    pub awakenings_count: BaselineMetric,
    pub stress_score: BaselineMetric,
    pub spo2_percent: BaselineMetric,
    pub body_temperature_celsius: BaselineMetric,
    /// Number of samples folded into the statistics
    pub days_used: u32,
    /// True when this is the population fallback
    pub is_fallback: bool,
}

impl PersonalBaseline {
    pub fn metric(&self, metric: Metric) -> &BaselineMetric {
        match metric {
            Metric::RestingHeartRate => &self.resting_heart_rate,
            Metric::HrvIndex => &self.hrv_index,
            Metric::HrvRawMs => &self.hrv_raw_ms,
            Metric::SleepDurationHours => &self.sleep_duration_hours,
            Metric::SleepQualityScore => &self.sleep_quality_score,
            Metric::SleepRegularityDeviationMinutes => &self.sleep_regularity_deviation_minutes,
            Metric::AwakeningsCount => &self.awakenings_count,
            Metric::StressScore => &self.stress_score,
            Metric::Spo2Percent => &self.spo2_percent,
            Metric::BodyTemperatureCelsius => &self.body_temperature_celsius,
        }
    }

    pub(crate) fn metric_mut(&mut self, metric: Metric) -> &mut BaselineMetric {
        match metric {
            Metric::RestingHeartRate => &mut self.resting_heart_rate,
            Metric::HrvIndex => &mut self.hrv_index,
            Metric::HrvRawMs => &mut self.hrv_raw_ms,
            Metric::SleepDurationHours => &mut self.sleep_duration_hours,
            Metric::SleepQualityScore => &mut self.sleep_quality_score,
            Metric::SleepRegularityDeviationMinutes => {
                &mut self.sleep_regularity_deviation_minutes
            }
            Metric::AwakeningsCount => &mut self.awakenings_count,
            Metric::StressScore => &mut self.stress_score,
            Metric::Spo2Percent => &mut self.spo2_percent,
            Metric::BodyTemperatureCelsius => &mut self.body_temperature_celsius,
        }
    }

    /// Load a baseline from JSON.
    ///
    /// `daysUsed` of 0 must coincide with `isFallback`; a mismatch is rejected.
    pub fn from_json(json: &str) -> Result<Self, crate::EngineError> {
        let baseline: PersonalBaseline = serde_json::from_str(json)?;
        if (baseline.days_used == 0) != baseline.is_fallback {
            return Err(crate::EngineError::InvalidHistory(format!(
                "baseline has daysUsed {} but isFallback {}",
                baseline.days_used, baseline.is_fallback
            )));
        }
        Ok(baseline)
    }

    /// Serialize a baseline to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Where the HRV index used for clareza came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HrvSource {
    Reported,
    DerivedFromRawMs,
    Unavailable,
}

/// Data-quality notes collected while computing a state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    /// The field was outside its physiological bound and was clamped
    Repaired(Metric),
    /// HRV index was the "unavailable" sentinel
    HrvUnavailable,
    /// HRV index was derived from raw milliseconds
    HrvDerivedFromRawMs,
    /// No HRV signal at all; clareza used a neutral HRV contribution
    MissingHrv,
    MissingSpo2,
    MissingBodyTemperature,
    /// The population fallback baseline was used
    FallbackBaseline,
}

/// Signed, bounded deltas in [-1, 1]; positive is always favorable
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDeltas {
    pub resting_heart_rate: f64,
    pub hrv: f64,
    pub sleep_duration: f64,
    pub sleep_quality: f64,
    pub sleep_regularity: f64,
    pub awakenings: f64,
    pub stress: f64,
    pub spo2: f64,
    pub body_temperature: f64,
}

/// A validated sample expressed relative to a personal baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedSignals {
    pub sample: ValidatedSample,
    pub deltas: MetricDeltas,
    /// HRV index (0-100) used for clareza, if any
    pub hrv_index: Option<f64>,
    pub hrv_source: HrvSource,
    pub quality_flags: Vec<QualityFlag>,
}

/// The three readiness pillars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pillar {
    Energia,
    Clareza,
    Estabilidade,
}

impl Pillar {
    pub const ALL: [Pillar; 3] = [Pillar::Energia, Pillar::Clareza, Pillar::Estabilidade];

    pub fn as_str(&self) -> &'static str {
        match self {
            Pillar::Energia => "energia",
            Pillar::Clareza => "clareza",
            Pillar::Estabilidade => "estabilidade",
        }
    }

    /// Capitalized name for the start of a sentence
    pub fn title(&self) -> &'static str {
        match self {
            Pillar::Energia => "Energia",
            Pillar::Clareza => "Clareza",
            Pillar::Estabilidade => "Estabilidade",
        }
    }
}

/// Pillar values, each in [1, 5]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PillarSet {
    pub energia: f64,
    pub clareza: f64,
    pub estabilidade: f64,
}

impl PillarSet {
    pub fn get(&self, pillar: Pillar) -> f64 {
        match pillar {
            Pillar::Energia => self.energia,
            Pillar::Clareza => self.clareza,
            Pillar::Estabilidade => self.estabilidade,
        }
    }

    pub fn min(&self) -> f64 {
        self.energia.min(self.clareza).min(self.estabilidade)
    }
}

/// Qualitative tier of a pillar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextStatus {
    Favorable,
    Attention,
    Limiting,
}

/// Qualitative tier of the VYR score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateLevel {
    Critical,
    Low,
    Moderate,
    Good,
    Optimal,
}

/// Score classification with its pt-BR label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreClass {
    pub level: StateLevel,
    pub label: &'static str,
}

/// The three phases of the daily action cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MomentAction {
    /// Activation
    Boot,
    /// Sustain
    Hold,
    /// Recovery
    Clear,
}

impl MomentAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MomentAction::Boot => "BOOT",
            MomentAction::Hold => "HOLD",
            MomentAction::Clear => "CLEAR",
        }
    }

    /// Next phase of the day; CLEAR does not wrap around.
    pub fn next(self) -> MomentAction {
        match self {
            MomentAction::Boot => MomentAction::Hold,
            MomentAction::Hold | MomentAction::Clear => MomentAction::Clear,
        }
    }
}

impl std::str::FromStr for MomentAction {
    type Err = crate::EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BOOT" => Ok(MomentAction::Boot),
            "HOLD" => Ok(MomentAction::Hold),
            "CLEAR" => Ok(MomentAction::Clear),
            other => Err(crate::EngineError::MalformedSample(format!(
                "unknown moment action: {}",
                other
            ))),
        }
    }
}

/// Time-of-day context supplied by the caller for a recommendation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionContext {
    /// Local hour (0-23)
    pub hour_of_day: u8,
    /// Actions already taken today, in order
    #[serde(default)]
    pub sachets_taken_today: Vec<MomentAction>,
}

/// One pillar rendered as a qualitative context line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    pub pillar: Pillar,
    pub label: String,
    pub status: ContextStatus,
}

/// Whether a focused-work window is available today
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CognitiveWindow {
    pub available: bool,
    pub duration: String,
    pub suggestion: String,
}

/// A suggested move to another phase of the cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedTransition {
    pub available: bool,
    pub target_action: MomentAction,
    pub reason: String,
}

/// Full engine output for one sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedState {
    pub date: NaiveDate,
    /// Aggregate readiness score (0-100)
    pub vyr_score: u8,
    pub pillars: PillarSet,
    pub state_level: StateLevel,
    pub state_label: String,
    pub recommended_action: MomentAction,
    pub action_reason: String,
    pub dominant_pillar: Pillar,
    pub limiting_pillar: Pillar,
    pub hrv_source: HrvSource,
    pub baseline_days_used: u32,
    pub quality_flags: Vec<QualityFlag>,
}

/// pt-BR interpretation of each pillar value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PillarDescriptions {
    pub energia: &'static str,
    pub clareza: &'static str,
    pub estabilidade: &'static str,
}

/// Home-screen reading of a computed state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemReading {
    pub why_score: String,
    pub limiting_factor: String,
    pub day_risk: &'static str,
}

/// A recurring pattern found in a person's recent history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedPattern {
    /// Stable identifier (`weekday-clarity`, `activity-impact`, `sleep-clarity`)
    pub id: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation: Option<String>,
    /// Span of history the pattern was read from
    pub period: String,
}
