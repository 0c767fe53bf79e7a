pub mod aki;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod flare;
pub mod goal_urate;
pub mod labs;
pub mod messages;
pub mod models;
pub mod ppx;
pub mod source;
pub mod treatment;
pub mod ult;

use tracing_subscriber::EnvFilter;

use crate::aki::AkiResult;
use crate::config::EngineSettings;
use crate::error::DecisionError;
use crate::evaluation::Evaluation;
use crate::flare::FlareRiskResult;
use crate::goal_urate::GoalUrateResult;
use crate::models::ClinicalSnapshot;
use crate::ppx::PpxIndicationResult;
use crate::treatment::{RecommendationResult, TreatmentCatalog};
use crate::ult::UltIndicationResult;

/// Install the fmt subscriber. `RUST_LOG` overrides the default filter.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} v{} tracing initialized", config::APP_NAME, config::APP_VERSION);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Calculators with default settings
//
// Each one validates the snapshot first and rejects it with every field
// error. Goal urate reads histories only and cannot fail.
// ═══════════════════════════════════════════════════════════════════════════

pub fn classify_aki(snapshot: &ClinicalSnapshot) -> Result<AkiResult, DecisionError> {
    Evaluation::new(snapshot, EngineSettings::defaults()).aki()
}

pub fn score_flare(snapshot: &ClinicalSnapshot) -> Result<FlareRiskResult, DecisionError> {
    Evaluation::new(snapshot, EngineSettings::defaults()).flare()
}

pub fn indicate_ult(snapshot: &ClinicalSnapshot) -> Result<UltIndicationResult, DecisionError> {
    Evaluation::new(snapshot, EngineSettings::defaults()).ult()
}

pub fn indicate_ppx(snapshot: &ClinicalSnapshot) -> Result<PpxIndicationResult, DecisionError> {
    Evaluation::new(snapshot, EngineSettings::defaults()).ppx()
}

pub fn goal_urate(snapshot: &ClinicalSnapshot) -> GoalUrateResult {
    goal_urate::goal(snapshot)
}

pub fn recommend(
    catalog: &TreatmentCatalog,
    snapshot: &ClinicalSnapshot,
) -> Result<RecommendationResult, DecisionError> {
    Evaluation::new(snapshot, EngineSettings::defaults()).recommend(catalog)
}
