//! In-memory sample store
//!
//! Holds validated samples keyed by user and date, plus the moment actions
//! logged per day. This is the orchestration side of the engine: it owns the
//! history, re-derives the baseline on demand, and supplies the action context.
//! Durable persistence stays with the caller; snapshots go through JSON.

use crate::error::EngineError;
use crate::patterns::detect_patterns;
use crate::pipeline::StateEngine;
use crate::types::{
    ActionContext, ComputedState, DetectedPattern, MomentAction, PersonalBaseline, QualityFlag,
    RawSample, ValidatedSample,
};
use crate::validator::validate_with_report;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

/// Samples and logged actions for any number of users
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleStore {
    samples: BTreeMap<Uuid, BTreeMap<NaiveDate, ValidatedSample>>,
    actions: BTreeMap<Uuid, BTreeMap<NaiveDate, Vec<MomentAction>>>,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a sample, replacing any sample for the same day.
    ///
    /// Returns the repair flags raised by validation.
    pub fn upsert(&mut self, user: Uuid, raw: &RawSample) -> Result<Vec<QualityFlag>, EngineError> {
        raw.check_structure()?;
        let (sample, flags) = validate_with_report(raw);
        let replaced = self
            .samples
            .entry(user)
            .or_default()
            .insert(sample.date, sample)
            .is_some();
        debug!(%user, date = %raw.date, replaced, "stored sample");
        Ok(flags)
    }

    /// Sample stored for one day
    pub fn get(&self, user: Uuid, date: NaiveDate) -> Option<&ValidatedSample> {
        self.samples.get(&user)?.get(&date)
    }

    /// All samples of a user, oldest first
    pub fn history(&self, user: Uuid) -> Vec<ValidatedSample> {
        self.samples
            .get(&user)
            .map(|days| days.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Samples of a user strictly before `date`, oldest first
    pub fn history_before(&self, user: Uuid, date: NaiveDate) -> Vec<ValidatedSample> {
        self.samples
            .get(&user)
            .map(|days| days.range(..date).map(|(_, s)| s.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of days stored for a user
    pub fn day_count(&self, user: Uuid) -> usize {
        self.samples.get(&user).map_or(0, |days| days.len())
    }

    /// Personal baseline over everything stored for a user
    pub fn baseline(&self, user: Uuid, engine: &StateEngine) -> PersonalBaseline {
        engine.compute_baseline(&self.history(user))
    }

    /// Record that an action was taken on a day
    pub fn log_action(&mut self, user: Uuid, date: NaiveDate, action: MomentAction) {
        self.actions
            .entry(user)
            .or_default()
            .entry(date)
            .or_default()
            .push(action);
    }

    /// Actions taken on a day, in the order they were logged
    pub fn sachets_taken(&self, user: Uuid, date: NaiveDate) -> Vec<MomentAction> {
        self.actions
            .get(&user)
            .and_then(|days| days.get(&date))
            .cloned()
            .unwrap_or_default()
    }

    /// Compute today's state for a user.
    ///
    /// The baseline is built from the days before the sample's date, and the
    /// action context from what was logged on that date. Nothing is stored.
    pub fn compute_state(
        &self,
        engine: &StateEngine,
        user: Uuid,
        raw: &RawSample,
        hour_of_day: u8,
    ) -> Result<ComputedState, EngineError> {
        let baseline = engine.compute_baseline(&self.history_before(user, raw.date));
        let context = ActionContext {
            hour_of_day,
            sachets_taken_today: self.sachets_taken(user, raw.date),
        };
        engine.compute_state(raw, &baseline, &context)
    }

    /// Recompute the state of every stored day, oldest first.
    ///
    /// Each day is read against the baseline of the days before it.
    pub fn history_states(
        &self,
        engine: &StateEngine,
        user: Uuid,
        hour_of_day: u8,
    ) -> Result<Vec<(ValidatedSample, ComputedState)>, EngineError> {
        self.history(user)
            .into_iter()
            .map(|sample| {
                let state = self.compute_state(engine, user, &sample, hour_of_day)?;
                Ok((sample, state))
            })
            .collect()
    }

    /// Patterns across a user's recent stored days
    pub fn detect_patterns(
        &self,
        engine: &StateEngine,
        user: Uuid,
    ) -> Result<Vec<DetectedPattern>, EngineError> {
        // Pillars do not depend on the hour; any hour works for a replay.
        let states = self.history_states(engine, user, 12)?;
        Ok(detect_patterns(&states))
    }

    /// Drop every row of a user
    pub fn remove_user(&mut self, user: Uuid) -> bool {
        let had_samples = self.samples.remove(&user).is_some();
        let had_actions = self.actions.remove(&user).is_some();
        had_samples || had_actions
    }

    /// Load a store snapshot from JSON. Samples are re-validated on load.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let store: SampleStore = serde_json::from_str(json)?;
        for (user, days) in &store.samples {
            for (date, sample) in days {
                if sample.date != *date {
                    return Err(EngineError::InvalidHistory(format!(
                        "user {} has a sample dated {} stored under {}",
                        user, sample.date, date
                    )));
                }
            }
        }
        Ok(store)
    }

    /// Serialize the store to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActivityLevel;
    use chrono::Duration;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap() + Duration::days(offset)
    }

    fn make_raw(offset: i64, rhr: f64) -> RawSample {
        RawSample {
            date: day(offset),
            resting_heart_rate: rhr,
            hrv_index: Some(60.0),
            hrv_raw_ms: None,
            sleep_duration_hours: 7.5,
            sleep_quality_score: 80.0,
            sleep_regularity_deviation_minutes: 10.0,
            awakenings_count: 2.0,
            previous_day_activity_level: ActivityLevel::Medium,
            stress_score: 35.0,
            spo2_percent: Some(97.0),
            body_temperature_celsius: Some(36.6),
        }
    }

    #[test]
    fn test_upsert_replaces_same_day() {
        let user = Uuid::new_v4();
        let mut store = SampleStore::new();

        store.upsert(user, &make_raw(0, 60.0)).unwrap();
        store.upsert(user, &make_raw(0, 62.0)).unwrap();

        assert_eq!(store.day_count(user), 1);
        assert_eq!(store.get(user, day(0)).unwrap().resting_heart_rate, 62.0);
    }

    #[test]
    fn test_upsert_reports_repairs() {
        let user = Uuid::new_v4();
        let mut store = SampleStore::new();

        let flags = store.upsert(user, &make_raw(0, 250.0)).unwrap();

        assert!(flags.contains(&QualityFlag::Repaired(crate::types::Metric::RestingHeartRate)));
        assert_eq!(store.get(user, day(0)).unwrap().resting_heart_rate, 110.0);
    }

    #[test]
    fn test_users_are_isolated() {
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let mut store = SampleStore::new();
        for i in 0..5 {
            store.upsert(alice, &make_raw(i, 60.0)).unwrap();
        }
        store.upsert(bob, &make_raw(0, 70.0)).unwrap();

        let engine = StateEngine::default();
        assert_eq!(store.baseline(alice, &engine).days_used, 5);
        assert_eq!(store.baseline(bob, &engine).days_used, 1);
        assert!(store.baseline(Uuid::new_v4(), &engine).is_fallback);
    }

    #[test]
    fn test_compute_state_uses_prior_days_and_logged_actions() {
        let user = Uuid::new_v4();
        let mut store = SampleStore::new();
        for i in 0..7 {
            store.upsert(user, &make_raw(i, 60.0 + i as f64)).unwrap();
        }
        store.log_action(user, day(7), MomentAction::Boot);

        let engine = StateEngine::default();
        let state = store
            .compute_state(&engine, user, &make_raw(7, 58.0), 8)
            .unwrap();

        assert_eq!(state.baseline_days_used, 7);
        assert_ne!(state.recommended_action, MomentAction::Boot);
        assert_eq!(store.sachets_taken(user, day(7)), vec![MomentAction::Boot]);
        assert!(store.get(user, day(7)).is_none());
    }

    #[test]
    fn test_history_before_excludes_the_day() {
        let user = Uuid::new_v4();
        let mut store = SampleStore::new();
        for i in 0..3 {
            store.upsert(user, &make_raw(i, 60.0)).unwrap();
        }

        assert_eq!(store.history_before(user, day(2)).len(), 2);
        assert_eq!(store.history(user).len(), 3);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let user = Uuid::new_v4();
        let mut store = SampleStore::new();
        store.upsert(user, &make_raw(0, 60.0)).unwrap();
        store.log_action(user, day(0), MomentAction::Hold);

        let loaded = SampleStore::from_json(&store.to_json().unwrap()).unwrap();

        assert_eq!(loaded, store);
    }

    #[test]
    fn test_history_states_use_prior_days() {
        let user = Uuid::new_v4();
        let mut store = SampleStore::new();
        for i in 0..4 {
            store.upsert(user, &make_raw(i, 60.0)).unwrap();
        }

        let states = store
            .history_states(&StateEngine::default(), user, 9)
            .unwrap();

        let days_used: Vec<u32> = states.iter().map(|(_, s)| s.baseline_days_used).collect();
        assert_eq!(days_used, vec![0, 1, 2, 3]);
        assert_eq!(states[3].0.date, day(3));
    }

    #[test]
    fn test_detect_patterns_from_store() {
        let user = Uuid::new_v4();
        let mut store = SampleStore::new();
        let engine = StateEngine::default();
        assert!(store.detect_patterns(&engine, user).unwrap().is_empty());

        for i in 0..10 {
            let mut raw = make_raw(i, 60.0);
            if i % 2 == 1 {
                raw.sleep_regularity_deviation_minutes = 90.0;
                raw.sleep_quality_score = 40.0;
                raw.stress_score = 80.0;
            }
            store.upsert(user, &raw).unwrap();
        }

        let patterns = store.detect_patterns(&engine, user).unwrap();
        assert!(patterns.iter().any(|p| p.id == "sleep-clarity"));
    }

    #[test]
    fn test_remove_user() {
        let user = Uuid::new_v4();
        let mut store = SampleStore::new();
        store.upsert(user, &make_raw(0, 60.0)).unwrap();
        store.log_action(user, day(0), MomentAction::Hold);

        assert!(store.remove_user(user));
        assert_eq!(store.day_count(user), 0);
        assert!(store.sachets_taken(user, day(0)).is_empty());
        assert!(!store.remove_user(user));
    }

    #[test]
    fn test_snapshot_with_mismatched_date_is_rejected() {
        let user = Uuid::new_v4();
        let mut store = SampleStore::new();
        store.upsert(user, &make_raw(0, 60.0)).unwrap();
        let json = store
            .to_json()
            .unwrap()
            .replacen("\"2026-03-01\":", "\"2026-03-05\":", 1);

        let result = SampleStore::from_json(&json);
        assert!(matches!(result, Err(EngineError::InvalidHistory(_))));
    }
}
