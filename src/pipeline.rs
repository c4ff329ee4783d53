//! Pipeline orchestration
//!
//! This module provides the public entry points of the engine. It chains the
//! stages for one day's sample:
//! validation → normalization → pillars → score → classification → recommendation.

use crate::baseline::BaselineCalculator;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::normalizer::Normalizer;
use crate::pillars::{dominant_pillar, limiting_pillar, PillarComposer};
use crate::recommender::{action_reason, recommend_action};
use crate::score::{classify_score, compose_score_with};
use crate::types::{
    ActionContext, ComputedState, PersonalBaseline, RawSample, ValidatedSample,
};
use crate::validator::validate_with_report;
use std::collections::HashSet;

/// Compute the full state for one raw sample with the default configuration.
///
/// # Arguments
/// * `sample` - One day of raw biometric inputs
/// * `baseline` - The person's baseline (or the fallback)
/// * `context` - Hour of day and actions already taken today
///
/// # Example
/// ```ignore
/// let baseline = compute_baseline(&history);
/// let state = compute_state(&sample, &baseline, &ActionContext::default())?;
/// ```
pub fn compute_state(
    sample: &RawSample,
    baseline: &PersonalBaseline,
    context: &ActionContext,
) -> Result<ComputedState, EngineError> {
    StateEngine::default().compute_state(sample, baseline, context)
}

/// Compute a state from JSON inputs and return it as JSON.
///
/// `baseline_json` may be `None`, in which case the fallback baseline is used.
pub fn compute_state_json(
    sample_json: &str,
    baseline_json: Option<&str>,
    context_json: &str,
) -> Result<String, EngineError> {
    let engine = StateEngine::default();
    let sample = RawSample::from_json(sample_json)?;
    let baseline = match baseline_json {
        Some(json) => PersonalBaseline::from_json(json)?,
        None => engine.compute_baseline(&[]),
    };
    let context: ActionContext = serde_json::from_str(context_json)?;

    let state = engine.compute_state(&sample, &baseline, &context)?;
    Ok(serde_json::to_string(&state)?)
}

/// Compute a baseline from a JSON array of samples and return it as JSON.
pub fn compute_baseline_json(history_json: &str) -> Result<String, EngineError> {
    let history: Vec<RawSample> =
        serde_json::from_str(history_json).map_err(EngineError::malformed)?;
    let validated: Vec<ValidatedSample> = history.iter().map(crate::validate).collect();
    let baseline = StateEngine::default().compute_baseline(&validated);
    Ok(baseline.to_json()?)
}

/// Engine bound to one configuration. Holds no per-user state.
#[derive(Debug, Clone, Default)]
pub struct StateEngine {
    config: EngineConfig,
}

impl StateEngine {
    /// Create an engine after checking the configuration
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Baseline over the configured recency window
    pub fn compute_baseline(&self, history: &[ValidatedSample]) -> PersonalBaseline {
        BaselineCalculator::new(self.config.baseline_window_days).compute(history)
    }

    /// Run the full pipeline for one sample.
    ///
    /// Fails only on structural problems (non-finite numbers); every range
    /// problem is repaired by validation.
    pub fn compute_state(
        &self,
        sample: &RawSample,
        baseline: &PersonalBaseline,
        context: &ActionContext,
    ) -> Result<ComputedState, EngineError> {
        sample.check_structure()?;

        // Stage 1: Repair the sample into bounded values
        let (validated, mut quality_flags) = validate_with_report(sample);

        // Stage 2: Express it relative to the baseline
        let signals = Normalizer::normalize(&validated, baseline, &self.config);

        // Stage 3: Pillars and score
        let pillars = PillarComposer::compose(&signals, &self.config);
        let vyr_score = compose_score_with(&pillars, &self.config.score);
        let class = classify_score(vyr_score);

        // Stage 4: Recommendation
        let recommended_action = recommend_action(&pillars, vyr_score, context);

        // First occurrence wins; later stages may repeat a flag.
        let mut seen = HashSet::new();
        quality_flags.extend(signals.quality_flags.iter().copied());
        quality_flags.retain(|flag| seen.insert(*flag));

        Ok(ComputedState {
            date: validated.date,
            vyr_score,
            pillars,
            state_level: class.level,
            state_label: class.label.to_string(),
            recommended_action,
            action_reason: action_reason(&pillars, vyr_score, recommended_action).to_string(),
            dominant_pillar: dominant_pillar(&pillars),
            limiting_pillar: limiting_pillar(&pillars),
            hrv_source: signals.hrv_source,
            baseline_days_used: baseline.days_used,
            quality_flags,
        })
    }
}
