//! Pillar composition
//!
//! Each pillar starts at a neutral midpoint and moves by the weighted,
//! baseline-relative deltas of the metrics assigned to it:
//! - energia: resting heart rate, sleep duration, previous-day activity load
//! - clareza: HRV, sleep quality, stress
//! - estabilidade: sleep regularity, awakenings, SpO2, body temperature

use crate::config::{EngineConfig, PILLAR_MIDPOINT};
use crate::normalizer::Normalizer;
use crate::score::classify_pillar;
use crate::types::{
    ActivityLevel, ContextItem, ContextStatus, NormalizedSignals, PersonalBaseline, Pillar,
    PillarSet, ValidatedSample,
};
use tracing::trace;

pub const PILLAR_MIN: f64 = 1.0;
pub const PILLAR_MAX: f64 = 5.0;

/// Composer turning normalized signals into pillars
pub struct PillarComposer;

impl PillarComposer {
    /// Compose the three pillars, each clamped to [1, 5] and rounded to 0.1
    pub fn compose(signals: &NormalizedSignals, config: &EngineConfig) -> PillarSet {
        let d = &signals.deltas;

        let e = &config.energia;
        let activity = match signals.sample.previous_day_activity_level {
            ActivityLevel::Low => e.low_activity,
            ActivityLevel::Medium => e.medium_activity,
            ActivityLevel::High => e.high_activity,
        };
        let energia = PILLAR_MIDPOINT
            + e.resting_heart_rate * d.resting_heart_rate
            + e.sleep_duration * d.sleep_duration
            + activity;

        let c = &config.clareza;
        let clareza = PILLAR_MIDPOINT
            + c.hrv * d.hrv
            + c.sleep_quality * d.sleep_quality
            + c.stress * d.stress;

        let s = &config.estabilidade;
        let estabilidade = PILLAR_MIDPOINT
            + s.sleep_regularity * d.sleep_regularity
            + s.awakenings * d.awakenings
            + s.spo2 * d.spo2
            + s.body_temperature * d.body_temperature;

        trace!(energia, clareza, estabilidade, "unclamped pillars");

        PillarSet {
            energia: finish(energia),
            clareza: finish(clareza),
            estabilidade: finish(estabilidade),
        }
    }
}

/// Compose pillars for a validated sample with the default configuration.
pub fn compose_pillars(sample: &ValidatedSample, baseline: &PersonalBaseline) -> PillarSet {
    let config = EngineConfig::default();
    let signals = Normalizer::normalize(sample, baseline, &config);
    PillarComposer::compose(&signals, &config)
}

fn finish(value: f64) -> f64 {
    let clamped = if value.is_nan() {
        PILLAR_MIDPOINT
    } else {
        value.clamp(PILLAR_MIN, PILLAR_MAX)
    };
    (clamped * 10.0).round() / 10.0
}

/// Highest pillar; ties go to clareza, then energia.
pub fn dominant_pillar(pillars: &PillarSet) -> Pillar {
    let PillarSet {
        energia,
        clareza,
        estabilidade,
    } = *pillars;

    if clareza >= energia && clareza >= estabilidade {
        Pillar::Clareza
    } else if energia >= clareza && energia >= estabilidade {
        Pillar::Energia
    } else {
        Pillar::Estabilidade
    }
}

/// Lowest pillar; ties go to energia, then clareza.
pub fn limiting_pillar(pillars: &PillarSet) -> Pillar {
    let PillarSet {
        energia,
        clareza,
        estabilidade,
    } = *pillars;

    if energia <= clareza && energia <= estabilidade {
        Pillar::Energia
    } else if clareza <= energia && clareza <= estabilidade {
        Pillar::Clareza
    } else {
        Pillar::Estabilidade
    }
}

impl Pillar {
    /// Qualitative pt-BR label for this pillar in a given status
    pub fn context_label(&self, status: ContextStatus) -> &'static str {
        match (self, status) {
            (Pillar::Energia, ContextStatus::Favorable) => "Energia preservada",
            (Pillar::Energia, ContextStatus::Attention) => "Energia moderada",
            (Pillar::Energia, ContextStatus::Limiting) => "Energia reduzida",
            (Pillar::Clareza, ContextStatus::Favorable) => "Clareza disponível",
            (Pillar::Clareza, ContextStatus::Attention) => "Clareza parcial",
            (Pillar::Clareza, ContextStatus::Limiting) => "Clareza comprometida",
            (Pillar::Estabilidade, ContextStatus::Favorable) => "Estabilidade sustentada",
            (Pillar::Estabilidade, ContextStatus::Attention) => "Estabilidade parcial",
            (Pillar::Estabilidade, ContextStatus::Limiting) => "Estabilidade reduzida",
        }
    }
}

/// One qualitative line per pillar, in pillar order
pub fn physiological_context(pillars: &PillarSet) -> Vec<ContextItem> {
    Pillar::ALL
        .iter()
        .map(|&pillar| {
            let status = classify_pillar(pillars.get(pillar));
            ContextItem {
                pillar,
                label: pillar.context_label(status).to_string(),
                status,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::FALLBACK_BASELINE;
    use crate::types::RawSample;
    use crate::validator::validate;
    use chrono::NaiveDate;

    fn neutral() -> RawSample {
        RawSample {
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
        }
    }

    #[test]
    fn test_neutral_sample_sits_at_midpoint() {
        let pillars = compose_pillars(&validate(&neutral()), &FALLBACK_BASELINE);

        assert_eq!(pillars.energia, 3.0);
        assert_eq!(pillars.clareza, 3.0);
        assert_eq!(pillars.estabilidade, 3.0);
    }

    #[test]
    fn test_high_activity_penalizes_energia() {
        let mut raw = neutral();
        raw.previous_day_activity_level = ActivityLevel::High;
        let pillars = compose_pillars(&validate(&raw), &FALLBACK_BASELINE);

        assert_eq!(pillars.energia, 2.5);
        assert_eq!(pillars.clareza, 3.0);
    }

    #[test]
    fn test_extremes_stay_within_range() {
        let mut best = neutral();
        best.resting_heart_rate = 40.0;
        best.sleep_duration_hours = 10.0;
        best.previous_day_activity_level = ActivityLevel::Low;
        best.hrv_index = Some(100.0);
        best.sleep_quality_score = 100.0;
        best.stress_score = 0.0;
        let high = compose_pillars(&validate(&best), &FALLBACK_BASELINE);
        assert_eq!(high.energia, 5.0);
        assert_eq!(high.clareza, 5.0);

        let mut worst = neutral();
        worst.resting_heart_rate = 110.0;
        worst.sleep_duration_hours = 0.0;
        worst.previous_day_activity_level = ActivityLevel::High;
        worst.sleep_regularity_deviation_minutes = 180.0;
        worst.awakenings_count = 20.0;
        worst.spo2_percent = Some(50.0);
        worst.body_temperature_celsius = Some(42.0);
        let low = compose_pillars(&validate(&worst), &FALLBACK_BASELINE);
        assert_eq!(low.energia, 1.0);
        assert!(low.estabilidade >= PILLAR_MIN);
    }

    #[test]
    fn test_dominant_and_limiting() {
        let pillars = PillarSet {
            energia: 2.5,
            clareza: 4.0,
            estabilidade: 3.1,
        };
        assert_eq!(dominant_pillar(&pillars), Pillar::Clareza);
        assert_eq!(limiting_pillar(&pillars), Pillar::Energia);

        let tied = PillarSet {
            energia: 3.0,
            clareza: 3.0,
            estabilidade: 3.0,
        };
        assert_eq!(dominant_pillar(&tied), Pillar::Clareza);
        assert_eq!(limiting_pillar(&tied), Pillar::Energia);
    }

    #[test]
    fn test_physiological_context_labels() {
        let items = physiological_context(&PillarSet {
            energia: 4.2,
            clareza: 3.4,
            estabilidade: 2.1,
        });

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].label, "Energia preservada");
        assert_eq!(items[1].status, ContextStatus::Attention);
        assert_eq!(items[2].label, "Estabilidade reduzida");
    }
}
