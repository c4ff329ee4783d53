//! Action recommendation
//!
//! A small deterministic procedure over the daily cycle BOOT → HOLD → CLEAR:
//! 1. the hour of day selects a phase,
//! 2. a phase already taken today advances to the next one (no wraparound),
//! 3. a limiting estabilidade forces CLEAR regardless of the above.

use crate::pillars::limiting_pillar;
use crate::score::classify_pillar;
use crate::types::{
    ActionContext, CognitiveWindow, ContextStatus, MomentAction, Pillar, PillarSet,
    SuggestedTransition,
};
use tracing::debug;

/// Phase window for a local hour: [5,11) BOOT, [11,17) HOLD, otherwise CLEAR.
pub fn phase_for_hour(hour_of_day: u8) -> MomentAction {
    match hour_of_day {
        5..=10 => MomentAction::Boot,
        11..=16 => MomentAction::Hold,
        _ => MomentAction::Clear,
    }
}

/// Recommend the next moment action. Always returns one of the three phases.
pub fn recommend_action(pillars: &PillarSet, score: u8, context: &ActionContext) -> MomentAction {
    debug_assert!(score <= 100, "score {} outside 0-100", score);

    if classify_pillar(pillars.estabilidade) == ContextStatus::Limiting {
        debug!(
            estabilidade = pillars.estabilidade,
            score, "limiting estabilidade, forcing CLEAR"
        );
        return MomentAction::Clear;
    }

    let phase = phase_for_hour(context.hour_of_day);
    let mut action = phase;
    while action != MomentAction::Clear && context.sachets_taken_today.contains(&action) {
        action = action.next();
    }

    if action != phase {
        debug!(
            phase = phase.as_str(),
            action = action.as_str(),
            "phase already taken today, advancing"
        );
    }
    action
}

/// Short pt-BR explanation of why an action is recommended
pub fn action_reason(pillars: &PillarSet, score: u8, action: MomentAction) -> &'static str {
    match action {
        MomentAction::Boot if score >= 85 => {
            "Sistema em condições ideais para ativação completa."
        }
        MomentAction::Boot => "Sistema pronto para ativação cognitiva.",
        MomentAction::Hold => match limiting_pillar(pillars) {
            Pillar::Energia => "Manutenção conservadora sugerida. Energia moderada.",
            Pillar::Estabilidade => "Janela de sustentação favorável. Evite picos de demanda.",
            Pillar::Clareza => "Sustentação estável disponível.",
        },
        MomentAction::Clear if classify_pillar(pillars.estabilidade) == ContextStatus::Limiting => {
            "Estabilidade reduzida. Recuperação tende a ser mais eficaz que exigência hoje."
        }
        MomentAction::Clear if score < 45 => {
            "Recuperação tende a ser mais eficaz que exigência hoje."
        }
        MomentAction::Clear => "Encerramento cognitivo disponível.",
    }
}

/// Whether a focused-work window is available and for roughly how long
pub fn cognitive_window(score: u8, pillars: &PillarSet) -> CognitiveWindow {
    let window = |duration: &str, suggestion: &str| CognitiveWindow {
        available: !duration.is_empty(),
        duration: duration.to_string(),
        suggestion: suggestion.to_string(),
    };

    if score >= 75 && pillars.clareza >= 4.0 && pillars.estabilidade >= 3.5 {
        window(
            "3-4 horas",
            "Considere priorizar tarefas que exigem concentração profunda.",
        )
    } else if score >= 65 && pillars.clareza >= 3.5 && pillars.estabilidade >= 3.0 {
        window("2-3 horas", "Bom momento para tarefas que exigem foco moderado.")
    } else if score >= 55 && pillars.clareza >= 3.0 {
        window(
            "1-2 horas",
            "Janela breve disponível. Priorize tarefas mais curtas.",
        )
    } else {
        window("", "O sistema sugere aguardar condições mais favoráveis.")
    }
}

/// Suggest moving on from the current phase after enough time has passed.
pub fn suggested_transition(
    current: MomentAction,
    score: u8,
    pillars: &PillarSet,
    hours_since_last_action: f64,
) -> SuggestedTransition {
    let suggest = |target: MomentAction, reason: &str| SuggestedTransition {
        available: true,
        target_action: target,
        reason: reason.to_string(),
    };

    match current {
        MomentAction::Boot
            if hours_since_last_action >= 3.0
                && (pillars.estabilidade <= 3.0 || pillars.energia <= 3.0) =>
        {
            suggest(
                MomentAction::Hold,
                "Sinais de estabilização detectados. Sustentação pode preservar melhor o estado.",
            )
        }
        MomentAction::Hold
            if hours_since_last_action >= 4.0 && (score < 55 || pillars.energia <= 2.5) =>
        {
            suggest(
                MomentAction::Clear,
                "O sistema sugere transição para recuperação.",
            )
        }
        MomentAction::Clear
            if hours_since_last_action >= 6.0 && score >= 65 && pillars.energia >= 3.5 =>
        {
            suggest(MomentAction::Boot, "Nova janela de ativação disponível.")
        }
        _ => SuggestedTransition {
            available: false,
            target_action: current,
            reason: String::new(),
        },
    }
}
