//! pt-BR readings of a computed state
//!
//! Text shown next to the score: what each pillar means today, why the score
//! is where it is, and what the day calls for. Pure functions of the state.

use crate::types::{ComputedState, MomentAction, PillarDescriptions, PillarSet, SystemReading};

/// Describe each pillar value in one sentence
pub fn pillar_descriptions(pillars: &PillarSet) -> PillarDescriptions {
    let energia = match pillars.energia {
        v if v >= 4.5 => "Energia elevada e disponível para demandas intensas.",
        v if v >= 3.5 => "Energia disponível, porém controlada.",
        v if v >= 2.5 => "Energia moderada. Economia recomendada.",
        _ => "Reserva energética baixa. Priorize recuperação.",
    };
    let clareza = match pillars.clareza {
        v if v >= 4.5 => "Excelente capacidade de foco e processamento.",
        v if v >= 3.5 => "Boa capacidade de foco e processamento.",
        v if v >= 2.5 => "Clareza funcional, com variações possíveis.",
        _ => "Clareza comprometida. Tarefas simples indicadas.",
    };
    let estabilidade = match pillars.estabilidade {
        v if v >= 4.5 => "Alta sustentação ao longo do tempo.",
        v if v >= 3.5 => "Boa sustentação com variações controladas.",
        v if v >= 2.5 => "Sustentação moderada. Pausas ajudam.",
        _ => "Sustentação limitada. Evite longos períodos de foco.",
    };

    PillarDescriptions {
        energia,
        clareza,
        estabilidade,
    }
}

/// Why the score is what it is, the limiting factor, and the risk of the day
pub fn system_reading(state: &ComputedState) -> SystemReading {
    let pillars = &state.pillars;
    let limiting = state.limiting_pillar;

    let why_score = match state.vyr_score {
        80..=u8::MAX => "O sistema identificou condições favoráveis em todos os pilares.".to_string(),
        65..=79 => format!(
            "{} preservada, com {} moderada.",
            state.dominant_pillar.title(),
            limiting.as_str()
        ),
        50..=64 => format!(
            "Estado funcional com {} como principal atenção.",
            limiting.as_str()
        ),
        _ => "O sistema indica sinais de sobrecarga residual.".to_string(),
    };

    let limiting_value = pillars.get(limiting);
    let limiting_factor = if limiting_value >= 4.0 {
        "Todos os pilares em níveis adequados.".to_string()
    } else if limiting_value >= 3.0 {
        format!("O limitante hoje é a {} ao longo do tempo.", limiting.as_str())
    } else {
        format!("{} requer atenção prioritária.", limiting.title())
    };

    let day_risk = if pillars.estabilidade < 3.0 {
        "Pausas estratégicas tendem a preservar melhor o rendimento."
    } else if pillars.energia < 3.0 {
        "Economia de energia mental é indicada."
    } else if state.vyr_score >= 75 {
        "Hoje há espaço para exigência cognitiva elevada."
    } else {
        "Mantenha ritmo consistente para preservar o estado."
    };

    SystemReading {
        why_score,
        limiting_factor,
        day_risk,
    }
}

/// Expanded diagnosis for the state detail view
pub fn system_diagnosis(state: &ComputedState) -> String {
    let limiting = state.limiting_pillar.as_str();
    let mut diagnosis = match state.vyr_score {
        80..=u8::MAX => "O sistema indica um estado favorável para execução. Há boa capacidade para demandas cognitivas elevadas hoje.".to_string(),
        65..=79 => format!(
            "O sistema indica um estado funcional para execução. O principal cuidado hoje é monitorar a {}.",
            limiting
        ),
        50..=64 => format!(
            "O sistema sugere cautela. A {} está abaixo do ideal e pode limitar o desempenho.",
            limiting
        ),
        _ => "O sistema indica necessidade de recuperação. Forçar demandas intensas tende a gerar custo desproporcional.".to_string(),
    };

    diagnosis.push_str(match state.recommended_action {
        MomentAction::Boot => " Ativação cognitiva está disponível.",
        MomentAction::Hold => " Sustentação estável é a estratégia indicada.",
        MomentAction::Clear => " Encerramento e recuperação são prioritários.",
    });
    diagnosis
}

/// Two bullets: today's capacity, then the strategy that fits it
pub fn today_meaning(state: &ComputedState) -> Vec<&'static str> {
    let pillars = &state.pillars;
    let score = state.vyr_score;

    let capacity = match score {
        80..=u8::MAX => "Boa capacidade para trabalho profundo e contínuo",
        65..=79 => "Capacidade de foco disponível, mas com limite de duração",
        50..=64 => "Capacidade funcional para tarefas moderadas",
        _ => "Não é o momento ideal para demandas intensas",
    };

    let strategy = if pillars.estabilidade < 3.5 {
        "Pausas estratégicas preservam melhor o rendimento"
    } else if pillars.energia < 3.5 {
        "Economia de energia mental prolonga a janela útil"
    } else if score >= 75 {
        "O sistema suporta demandas intensas com menor desgaste"
    } else if score >= 55 {
        "Melhor desempenho com ritmo constante"
    } else {
        "O sistema prioriza restauração sobre performance"
    };

    vec![capacity, strategy]
}
