//! Score composition and classification

use crate::config::ScoreWeights;
use crate::pillars::{PILLAR_MAX, PILLAR_MIN};
use crate::types::{ContextStatus, PillarSet, ScoreClass, StateLevel};

/// Aggregate the pillars into a 0-100 score with the default weights.
pub fn compose_score(pillars: &PillarSet) -> u8 {
    compose_score_with(pillars, &ScoreWeights::default())
}

/// Aggregate the pillars into a 0-100 score.
///
/// The weighted mean is blended with the lowest pillar, so a single weak
/// pillar pulls the score down. Both terms are non-decreasing in every
/// pillar, and so is the score.
pub fn compose_score_with(pillars: &PillarSet, weights: &ScoreWeights) -> u8 {
    let total = weights.energia + weights.clareza + weights.estabilidade;
    let mean = if total > 0.0 {
        (weights.energia * pillars.energia
            + weights.clareza * pillars.clareza
            + weights.estabilidade * pillars.estabilidade)
            / total
    } else {
        (pillars.energia + pillars.clareza + pillars.estabilidade) / 3.0
    };

    let blend = weights.limiting_blend.clamp(0.0, 1.0);
    let blended = (1.0 - blend) * mean + blend * pillars.min();

    let scaled = (blended - PILLAR_MIN) / (PILLAR_MAX - PILLAR_MIN) * 100.0;
    if scaled.is_nan() {
        return 0;
    }
    scaled.round().clamp(0.0, 100.0) as u8
}

/// Classify a score into its qualitative tier.
pub fn classify_score(score: u8) -> ScoreClass {
    debug_assert!(score <= 100, "score {} outside 0-100", score);

    let level = match score {
        85..=u8::MAX => StateLevel::Optimal,
        70..=84 => StateLevel::Good,
        55..=69 => StateLevel::Moderate,
        40..=54 => StateLevel::Low,
        _ => StateLevel::Critical,
    };
    ScoreClass {
        level,
        label: level.label(),
    }
}

/// Classify a pillar value into a context status.
pub fn classify_pillar(value: f64) -> ContextStatus {
    debug_assert!(
        (PILLAR_MIN..=PILLAR_MAX).contains(&value),
        "pillar {} outside 1-5",
        value
    );

    if value >= 4.0 {
        ContextStatus::Favorable
    } else if value >= 3.0 {
        ContextStatus::Attention
    } else {
        ContextStatus::Limiting
    }
}

impl StateLevel {
    /// pt-BR label shown for this tier
    pub fn label(&self) -> &'static str {
        match self {
            StateLevel::Optimal => "Ótimo",
            StateLevel::Good => "Bom",
            StateLevel::Moderate => "Moderado",
            StateLevel::Low => "Baixo",
            StateLevel::Critical => "Crítico",
        }
    }
}
