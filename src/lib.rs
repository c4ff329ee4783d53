//! VYR Engine - On-device physiological-to-cognitive state engine
//!
//! The engine turns one day of wearable biometrics into a bounded cognitive
//! state through a deterministic pipeline: validation → baseline-relative
//! normalization → pillars (Energia, Clareza, Estabilidade) → VYR score and
//! tier → moment action (BOOT, HOLD, CLEAR).
//!
//! Every stage is a pure function of its inputs. The only stateful piece is
//! [`SampleStore`], an optional in-memory history for callers that want the
//! engine to derive baselines and action context for them.

pub mod baseline;
pub mod config;
pub mod error;
pub mod normalizer;
pub mod patterns;
pub mod pillars;
pub mod pipeline;
pub mod reading;
pub mod recommender;
pub mod score;
pub mod store;
pub mod types;
pub mod validator;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use baseline::{compute_baseline, BaselineCalculator, FALLBACK_BASELINE};
pub use config::EngineConfig;
pub use error::EngineError;
pub use normalizer::normalize_hrv_ms_to_index;
pub use patterns::detect_patterns;
pub use pillars::{compose_pillars, physiological_context};
pub use pipeline::{compute_baseline_json, compute_state, compute_state_json, StateEngine};
pub use reading::{pillar_descriptions, system_diagnosis, system_reading, today_meaning};
pub use recommender::{action_reason, cognitive_window, recommend_action, suggested_transition};
pub use score::{classify_pillar, classify_score, compose_score};
pub use store::SampleStore;
pub use validator::{validate, validate_with_report};

pub use types::{
    ActionContext, ActivityLevel, BaselineMetric, ComputedState, ContextStatus, DetectedPattern,
    HrvSource, MomentAction, PersonalBaseline, Pillar, PillarDescriptions, PillarSet, QualityFlag,
    RawSample, ScoreClass, StateLevel, SystemReading, ValidatedSample,
};

/// Engine version reported by the CLI and FFI
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for emitted payloads
pub const PRODUCER_NAME: &str = "vyr-engine";
