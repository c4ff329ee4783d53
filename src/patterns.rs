//! Pattern detection over a person's recent history
//!
//! Looks at computed days side by side and reports recurring relationships:
//! - clareza that depends on the day of the week
//! - lower estabilidade on days that follow intense activity
//! - clareza that tracks sleep regularity

use crate::types::{ActivityLevel, ComputedState, DetectedPattern, ValidatedSample};
use chrono::Datelike;
use std::collections::BTreeMap;
use tracing::debug;

/// Fewer days than this and no pattern is reported
pub const MIN_HISTORY_DAYS: usize = 7;

/// Only the most recent days are read
pub const PATTERN_WINDOW_DAYS: usize = 14;

/// Sleep deviation (minutes) below which a night counts as regular
pub const REGULAR_SLEEP_MINUTES: f64 = 25.0;

const WEEKDAY_SPREAD: f64 = 0.8;
const MIN_HIGH_ACTIVITY_DAYS: usize = 3;
const LOW_STABILITY_RATIO: f64 = 0.5;
const MIN_DAYS_PER_SLEEP_GROUP: usize = 3;
const SLEEP_CLARITY_GAP: f64 = 0.6;

const WEEKDAY_NAMES: [&str; 7] = [
    "domingo", "segunda", "terça", "quarta", "quinta", "sexta", "sábado",
];

/// Detect patterns in a history of `(sample, state)` days, in any order.
pub fn detect_patterns(history: &[(ValidatedSample, ComputedState)]) -> Vec<DetectedPattern> {
    if history.len() < MIN_HISTORY_DAYS {
        return Vec::new();
    }

    let mut days: Vec<&(ValidatedSample, ComputedState)> = history.iter().collect();
    days.sort_by_key(|(sample, _)| std::cmp::Reverse(sample.date));
    days.truncate(PATTERN_WINDOW_DAYS);

    let period = format!("Últimos {} dias", PATTERN_WINDOW_DAYS);
    let pattern = |id: &str, description: String, correlation: Option<&str>| DetectedPattern {
        id: id.to_string(),
        description,
        correlation: correlation.map(str::to_string),
        period: period.clone(),
    };

    let mut patterns = Vec::new();
    if let Some(description) = weekday_clarity(&days) {
        patterns.push(pattern("weekday-clarity", description, None));
    }
    if activity_impact(&days) {
        patterns.push(pattern(
            "activity-impact",
            "Dias após atividade intensa mostram menor estabilidade.".to_string(),
            None,
        ));
    }
    if sleep_clarity(&days) {
        patterns.push(pattern(
            "sleep-clarity",
            "Regularidade do sono correlaciona positivamente com clareza.".to_string(),
            Some("positiva"),
        ));
    }

    debug!(days = days.len(), found = patterns.len(), "pattern detection");
    patterns
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Best two weekdays when average clareza spreads by more than 0.8
fn weekday_clarity(days: &[&(ValidatedSample, ComputedState)]) -> Option<String> {
    let mut by_weekday: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
    for (sample, state) in days {
        let weekday = sample.date.weekday().num_days_from_sunday() as usize;
        by_weekday.entry(weekday).or_default().push(state.pillars.clareza);
    }

    let mut averages: Vec<(usize, f64)> = by_weekday
        .into_iter()
        .filter_map(|(weekday, values)| Some((weekday, mean(values.into_iter())?)))
        .collect();
    averages.sort_by(|a, b| b.1.total_cmp(&a.1));

    let (best, worst) = (averages.first()?, averages.last()?);
    if averages.len() < 2 || best.1 - worst.1 <= WEEKDAY_SPREAD {
        return None;
    }
    Some(format!(
        "Clareza tende a ser maior às manhãs de {} e {}.",
        WEEKDAY_NAMES[averages[0].0], WEEKDAY_NAMES[averages[1].0]
    ))
}

/// Most days that follow high activity show a limiting estabilidade
fn activity_impact(days: &[&(ValidatedSample, ComputedState)]) -> bool {
    let after_high: Vec<f64> = days
        .iter()
        .filter(|(sample, _)| sample.previous_day_activity_level == ActivityLevel::High)
        .map(|(_, state)| state.pillars.estabilidade)
        .collect();

    if after_high.len() < MIN_HIGH_ACTIVITY_DAYS {
        return false;
    }
    let low = after_high.iter().filter(|&&v| v < 3.0).count();
    low as f64 / after_high.len() as f64 > LOW_STABILITY_RATIO
}

/// Regular-sleep days carry clearly more clareza than irregular ones
fn sleep_clarity(days: &[&(ValidatedSample, ComputedState)]) -> bool {
    let (regular, irregular): (Vec<_>, Vec<_>) = days
        .iter()
        .partition(|(sample, _)| sample.sleep_regularity_deviation_minutes < REGULAR_SLEEP_MINUTES);

    if regular.len() < MIN_DAYS_PER_SLEEP_GROUP || irregular.len() < MIN_DAYS_PER_SLEEP_GROUP {
        return false;
    }

    let clareza = |group: &[&&(ValidatedSample, ComputedState)]| {
        mean(group.iter().map(|(_, state)| state.pillars.clareza)).unwrap_or(0.0)
    };
    clareza(regular.as_slice()) - clareza(irregular.as_slice()) > SLEEP_CLARITY_GAP
}
