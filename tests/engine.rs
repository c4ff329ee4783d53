//! End-to-end tests over the public engine API

use chrono::{Duration, NaiveDate};
use pretty_assertions::assert_eq;

use vyr_engine::{
    classify_score, compute_baseline, compute_state, validate, ActionContext, ActivityLevel,
    ComputedState, HrvSource, MomentAction, PersonalBaseline, RawSample, SampleStore,
    StateEngine, StateLevel, FALLBACK_BASELINE,
};

fn date(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 2).unwrap() + Duration::days(offset)
}

fn high_performance() -> RawSample {
    RawSample::from_json(
        r#"{
            "date": "2026-02-09",
            "restingHeartRate": 56,
            "hrvIndex": 75,
            "sleepDurationHours": 7.8,
            "sleepQualityScore": 88,
            "sleepRegularityDeviationMinutes": -5,
            "awakeningsCount": 1,
            "previousDayActivityLevel": "low",
            "stressScore": 25
        }"#,
    )
    .unwrap()
}

fn recovery() -> RawSample {
    RawSample::from_json(
        r#"{
            "date": "2026-02-09",
            "restingHeartRate": 68,
            "hrvIndex": 42,
            "sleepDurationHours": 5.2,
            "sleepQualityScore": 55,
            "sleepRegularityDeviationMinutes": 90,
            "awakeningsCount": 6,
            "previousDayActivityLevel": "high",
            "stressScore": 58
        }"#,
    )
    .unwrap()
}

fn protocol_start() -> RawSample {
    RawSample::from_json(
        r#"{
            "date": "2026-02-09",
            "restingHeartRate": 62,
            "hrvIndex": 58,
            "sleepDurationHours": 6.5,
            "sleepQualityScore": 72,
            "sleepRegularityDeviationMinutes": 15,
            "awakeningsCount": 3,
            "previousDayActivityLevel": "medium",
            "stressScore": 42
        }"#,
    )
    .unwrap()
}

fn week_of_history() -> Vec<RawSample> {
    [
        (62.0, 58.0, 7.1),
        (64.0, 55.0, 6.8),
        (61.0, 60.0, 7.4),
        (65.0, 52.0, 6.5),
        (63.0, 57.0, 7.0),
        (60.0, 62.0, 7.6),
        (66.0, 50.0, 6.4),
    ]
    .iter()
    .enumerate()
    .map(|(i, &(rhr, hrv, sleep))| RawSample {
        date: date(i as i64),
        resting_heart_rate: rhr,
        hrv_index: Some(hrv),
        hrv_raw_ms: None,
        sleep_duration_hours: sleep,
        sleep_quality_score: 75.0,
        sleep_regularity_deviation_minutes: 15.0,
        awakenings_count: 2.0,
        previous_day_activity_level: ActivityLevel::Medium,
        stress_score: 38.0,
        spo2_percent: Some(97.0),
        body_temperature_celsius: Some(36.7),
    })
    .collect()
}

fn state_at(sample: &RawSample, baseline: &PersonalBaseline, hour: u8) -> ComputedState {
    let context = ActionContext {
        hour_of_day: hour,
        sachets_taken_today: Vec::new(),
    };
    compute_state(sample, baseline, &context).unwrap()
}

fn assert_bounded(state: &ComputedState) {
    assert!(state.vyr_score <= 100);
    for value in [
        state.pillars.energia,
        state.pillars.clareza,
        state.pillars.estabilidade,
    ] {
        assert!((1.0..=5.0).contains(&value), "pillar {} out of range", value);
        assert!(((value * 10.0).round() - value * 10.0).abs() < 1e-9);
    }
    assert_eq!(state.state_level, classify_score(state.vyr_score).level);
}

#[test]
fn high_performance_outscores_recovery() {
    let high = state_at(&high_performance(), &FALLBACK_BASELINE, 9);
    let low = state_at(&recovery(), &FALLBACK_BASELINE, 9);

    assert_bounded(&high);
    assert_bounded(&low);
    assert!(high.vyr_score > low.vyr_score);
    assert!(high.pillars.energia > low.pillars.energia);
    assert!(high.pillars.clareza > low.pillars.clareza);
    assert!(high.pillars.estabilidade > low.pillars.estabilidade);
}

#[test]
fn scenario_tiers_and_actions() {
    let high = state_at(&high_performance(), &FALLBACK_BASELINE, 9);
    assert!(high.vyr_score >= 70);
    assert_eq!(high.recommended_action, MomentAction::Boot);

    let low = state_at(&recovery(), &FALLBACK_BASELINE, 9);
    assert_eq!(low.state_level, StateLevel::Critical);
    assert_eq!(low.recommended_action, MomentAction::Clear);
    assert_eq!(low.state_label, "Crítico");
}

#[test]
fn sentinel_hrv_falls_back_to_raw_ms() {
    let mut sample = high_performance();
    sample.hrv_index = None;
    sample.hrv_raw_ms = Some(44.0);

    let json = serde_json::to_string(&sample).unwrap();
    assert!(json.contains("\"hrvIndex\":0.0"));

    let reparsed = RawSample::from_json(&json).unwrap();
    assert_eq!(reparsed.hrv_index, None);

    let state = state_at(&reparsed, &FALLBACK_BASELINE, 14);
    assert_eq!(state.hrv_source, HrvSource::DerivedFromRawMs);
    assert!(state.pillars.estabilidade > 1.0);
    assert_bounded(&state);
}

#[test]
fn seven_day_baseline() {
    let history: Vec<_> = week_of_history().iter().map(validate).collect();
    let baseline = compute_baseline(&history);

    assert_eq!(baseline.days_used, 7);
    assert!(!baseline.is_fallback);
    assert!((baseline.resting_heart_rate.mean - 63.0).abs() < 1e-9);
    assert!((baseline.resting_heart_rate.standard_deviation - 2.160246899).abs() < 1e-6);
    assert_eq!(baseline.sleep_quality_score.standard_deviation, 0.0);

    // Matching the baseline's own mean lands near the midpoint
    let mut typical = high_performance();
    typical.resting_heart_rate = 63.0;
    let state = state_at(&typical, &baseline, 12);
    assert_bounded(&state);
    assert_eq!(state.baseline_days_used, 7);
}

#[test]
fn empty_history_uses_fallback() {
    let baseline = compute_baseline(&[]);
    assert_eq!(baseline, FALLBACK_BASELINE);

    let state = state_at(&recovery(), &baseline, 20);
    assert_eq!(state.baseline_days_used, 0);
}

#[test]
fn out_of_range_sample_is_repaired_not_rejected() {
    let mut sample = recovery();
    sample.resting_heart_rate = 250.0;
    sample.stress_score = -10.0;
    sample.awakenings_count = 40.0;

    let validated = validate(&sample);
    assert_eq!(validated.resting_heart_rate, 110.0);
    assert_eq!(validated.stress_score, 0.0);
    assert_eq!(validated.awakenings_count, 20.0);

    assert_bounded(&state_at(&sample, &FALLBACK_BASELINE, 3));
}

#[test]
fn store_drives_baseline_and_context() {
    let user = uuid::Uuid::new_v4();
    let mut store = SampleStore::new();
    for sample in week_of_history() {
        store.upsert(user, &sample).unwrap();
    }
    store.log_action(user, date(7), MomentAction::Boot);

    let mut today = high_performance();
    today.date = date(7);

    let engine = StateEngine::default();
    let state = store.compute_state(&engine, user, &today, 9).unwrap();

    assert_eq!(state.baseline_days_used, 7);
    assert_eq!(state.recommended_action, MomentAction::Hold);
}

#[test]
fn ordinary_day_does_not_trip_stability_override() {
    let state = state_at(&protocol_start(), &FALLBACK_BASELINE, 8);

    assert_bounded(&state);
    assert!(state.pillars.estabilidade >= 3.0);
    assert_eq!(state.recommended_action, MomentAction::Boot);

    let high = state_at(&high_performance(), &FALLBACK_BASELINE, 8);
    let low = state_at(&recovery(), &FALLBACK_BASELINE, 8);
    assert!(state.vyr_score < high.vyr_score);
    assert!(state.vyr_score > low.vyr_score);
}
