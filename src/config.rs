//! Engine configuration
//!
//! Every tunable coefficient of the engine lives here so the model can be
//! recalibrated without touching the algorithms. Defaults are the calibrated
//! production values.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default recency window for the personal baseline, in days
pub const DEFAULT_BASELINE_WINDOW: usize = 30;

/// Default gain from z-score to pillar delta
pub const DEFAULT_SENSITIVITY: f64 = 0.75;

/// Neutral pillar value every pillar starts from
pub const PILLAR_MIDPOINT: f64 = 3.0;

/// Weights for the energia pillar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnergiaWeights {
    pub resting_heart_rate: f64,
    pub sleep_duration: f64,
    /// Additive adjustment for a low-load previous day
    pub low_activity: f64,
    pub medium_activity: f64,
    /// Additive adjustment for a high-load previous day (a penalty)
    pub high_activity: f64,
}

impl Default for EnergiaWeights {
    fn default() -> Self {
        Self {
            resting_heart_rate: 0.9,
            sleep_duration: 0.9,
            low_activity: 0.25,
            medium_activity: 0.0,
            high_activity: -0.5,
        }
    }
}

/// Weights for the clareza pillar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClarezaWeights {
    pub hrv: f64,
    pub sleep_quality: f64,
    pub stress: f64,
}

impl Default for ClarezaWeights {
    fn default() -> Self {
        Self {
            hrv: 0.9,
            sleep_quality: 0.8,
            stress: 0.7,
        }
    }
}

/// Weights for the estabilidade pillar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EstabilidadeWeights {
    pub sleep_regularity: f64,
    pub awakenings: f64,
    pub spo2: f64,
    pub body_temperature: f64,
}

impl Default for EstabilidadeWeights {
    fn default() -> Self {
        Self {
            sleep_regularity: 0.7,
            awakenings: 0.6,
            spo2: 0.3,
            body_temperature: 0.4,
        }
    }
}

/// Weights for the aggregate score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoreWeights {
    pub energia: f64,
    pub clareza: f64,
    pub estabilidade: f64,
    /// Share of the score taken by the lowest pillar (0-1)
    pub limiting_blend: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            energia: 1.0,
            clareza: 1.0,
            estabilidade: 1.0,
            limiting_blend: 0.4,
        }
    }
}

/// Complete tunable surface of the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Most recent samples folded into a baseline
    pub baseline_window_days: usize,
    /// Gain `k` in `delta = clamp(z * k, -1, 1)`
    pub sensitivity: f64,
    /// `(ms, index)` anchors of the fixed-range HRV curve, ascending in both
    pub hrv_curve: Vec<(f64, f64)>,
    pub energia: EnergiaWeights,
    pub clareza: ClarezaWeights,
    pub estabilidade: EstabilidadeWeights,
    pub score: ScoreWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            baseline_window_days: DEFAULT_BASELINE_WINDOW,
            sensitivity: DEFAULT_SENSITIVITY,
            hrv_curve: crate::normalizer::DEFAULT_HRV_CURVE.to_vec(),
            energia: EnergiaWeights::default(),
            clareza: ClarezaWeights::default(),
            estabilidade: EstabilidadeWeights::default(),
            score: ScoreWeights::default(),
        }
    }
}

impl EngineConfig {
    /// Load and validate a configuration from JSON. Missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check that the configuration keeps every engine invariant reachable.
    pub fn validate(&self) -> Result<(), EngineError> {
        let result = self.check();
        if let Err(ref e) = result {
            warn!(error = %e, "rejected engine configuration");
        }
        result
    }

    fn check(&self) -> Result<(), EngineError> {
        if self.baseline_window_days == 0 {
            return Err(EngineError::InvalidConfig(
                "baselineWindowDays must be at least 1".to_string(),
            ));
        }

        if !(self.sensitivity.is_finite() && self.sensitivity > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "sensitivity must be positive, got {}",
                self.sensitivity
            )));
        }

        if self.hrv_curve.len() < 2 {
            return Err(EngineError::InvalidConfig(
                "hrvCurve needs at least two anchors".to_string(),
            ));
        }
        for pair in self.hrv_curve.windows(2) {
            let ((ms_a, idx_a), (ms_b, idx_b)) = (pair[0], pair[1]);
            if !(ms_b > ms_a && idx_b >= idx_a) {
                return Err(EngineError::InvalidConfig(format!(
                    "hrvCurve must be increasing: ({}, {}) then ({}, {})",
                    ms_a, idx_a, ms_b, idx_b
                )));
            }
        }
        for &(_, idx) in &self.hrv_curve {
            if !(0.0..=100.0).contains(&idx) {
                return Err(EngineError::InvalidConfig(format!(
                    "hrvCurve index {} outside 0-100",
                    idx
                )));
            }
        }

        let weights = [
            ("energia.restingHeartRate", self.energia.resting_heart_rate),
            ("energia.sleepDuration", self.energia.sleep_duration),
            ("clareza.hrv", self.clareza.hrv),
            ("clareza.sleepQuality", self.clareza.sleep_quality),
            ("clareza.stress", self.clareza.stress),
            ("estabilidade.sleepRegularity", self.estabilidade.sleep_regularity),
            ("estabilidade.awakenings", self.estabilidade.awakenings),
            ("estabilidade.spo2", self.estabilidade.spo2),
            ("estabilidade.bodyTemperature", self.estabilidade.body_temperature),
            ("score.energia", self.score.energia),
            ("score.clareza", self.score.clareza),
            ("score.estabilidade", self.score.estabilidade),
        ];
        for (name, weight) in weights {
            if !(weight.is_finite() && weight >= 0.0) {
                return Err(EngineError::InvalidConfig(format!(
                    "{} must be a non-negative weight, got {}",
                    name, weight
                )));
            }
        }

        let pillar_total = self.score.energia + self.score.clareza + self.score.estabilidade;
        if pillar_total <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "score pillar weights must not all be zero".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.score.limiting_blend) {
            return Err(EngineError::InvalidConfig(format!(
                "score.limitingBlend must be within 0-1, got {}",
                self.score.limiting_blend
            )));
        }

        let activity = [
            self.energia.low_activity,
            self.energia.medium_activity,
            self.energia.high_activity,
        ];
        if activity.iter().any(|a| !a.is_finite()) {
            return Err(EngineError::InvalidConfig(
                "energia activity adjustments must be finite".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = EngineConfig::from_json(r#"{"sensitivity": 0.5, "clareza": {"hrv": 1.2}}"#)
            .unwrap();

        assert_eq!(config.sensitivity, 0.5);
        assert_eq!(config.clareza.hrv, 1.2);
        assert_eq!(config.clareza.stress, ClarezaWeights::default().stress);
        assert_eq!(config.baseline_window_days, DEFAULT_BASELINE_WINDOW);
    }

    #[test]
    fn test_rejects_non_monotonic_curve() {
        let result = EngineConfig::from_json(r#"{"hrvCurve": [[10, 0], [40, 60], [30, 70]]}"#);
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_bad_blend_and_weights() {
        let mut config = EngineConfig::default();
        config.score.limiting_blend = 1.5;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.estabilidade.spo2 = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = EngineConfig::default();
        let loaded = EngineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(config, loaded);
    }
}
