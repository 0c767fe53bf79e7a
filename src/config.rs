//! Engine configuration.
//!
//! `EngineSettings` holds the clinician-adjustable treatment defaults and the
//! lab-series parameters. `ContextConfig` states, per decision context, which
//! snapshot fields are required, which medical histories apply and which
//! treatment catalog is recommended from.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::labs::renal::DEFAULT_BASELINE_TOLERANCE;
use crate::labs::series::DEFAULT_TREND_WINDOW;
use crate::labs::urate::{DEFAULT_MONTHS_AT_GOAL, MAX_MONTHS_AT_GOAL};
use crate::models::enums::{CkdStage, MedHistoryType, Treatment, TreatmentContext};

/// Application-level constants
pub const APP_NAME: &str = "Goutaid";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// File name of the optional settings override.
pub const SETTINGS_FILE: &str = "settings.json";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "goutaid=info"
}

/// Per-user settings location: `<config dir>/Goutaid/settings.json`.
pub fn settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join(SETTINGS_FILE))
}

// ═══════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings {0}: {1}")]
    Load(String, String),

    #[error("Failed to parse settings {0}: {1}")]
    Parse(String, String),

    #[error("Invalid setting {field}: {message}")]
    Invalid { field: String, message: String },
}

// ═══════════════════════════════════════════════════════════════════════════
// Treatment settings
// ═══════════════════════════════════════════════════════════════════════════

/// Treatment defaults a clinician may override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreatmentSettings {
    /// Use renally-dosed colchicine in CKD stage III or better.
    pub colchicine_in_ckd: bool,
    /// Renal colchicine adjustment lowers the dose; otherwise the frequency.
    pub colchicine_dose_adjust: bool,
    /// Allow NSAIDs after age 65.
    pub nsaids_over_65: bool,
    /// One contraindicated NSAID contraindicates all of them.
    pub nsaids_equivalent: bool,
    /// Allow low-dose steroids with well-controlled diabetes.
    pub steroids_in_diabetes: bool,
    pub steroids_equivalent: bool,
    /// Fixed 50 mg allopurinol start in CKD regardless of stage.
    pub allopurinol_ckd_fixed_dose: bool,
    pub allopurinol_in_dialysis: bool,
    /// Allow allopurinol without ethnicity or HLA-B*58:01 result.
    pub allopurinol_unknown_ethnicity_untested: bool,
    /// Allow allopurinol in high-risk ethnicities without HLA-B*58:01 result.
    pub allopurinol_high_risk_ethnicity_untested: bool,
    pub febuxostat_ckd_initial_dose_mg: f64,
    pub febuxostat_in_cv_disease: bool,
    /// Probenecid is contraindicated from this CKD stage on.
    pub probenecid_ckd_stage_limit: CkdStage,
    pub flare_preference: Vec<Treatment>,
    pub prophylaxis_preference: Vec<Treatment>,
    pub ult_preference: Vec<Treatment>,
}

impl Default for TreatmentSettings {
    fn default() -> Self {
        Self {
            colchicine_in_ckd: true,
            colchicine_dose_adjust: true,
            nsaids_over_65: true,
            nsaids_equivalent: true,
            steroids_in_diabetes: true,
            steroids_equivalent: true,
            allopurinol_ckd_fixed_dose: true,
            allopurinol_in_dialysis: true,
            allopurinol_unknown_ethnicity_untested: true,
            allopurinol_high_risk_ethnicity_untested: false,
            febuxostat_ckd_initial_dose_mg: 20.0,
            febuxostat_in_cv_disease: true,
            probenecid_ckd_stage_limit: CkdStage::Three,
            flare_preference: FLARE_PREFERENCE.to_vec(),
            prophylaxis_preference: FLARE_PREFERENCE.to_vec(),
            ult_preference: ULT_PREFERENCE.to_vec(),
        }
    }
}

impl TreatmentSettings {
    pub fn preference(&self, context: TreatmentContext) -> &[Treatment] {
        match context {
            TreatmentContext::Flare => &self.flare_preference,
            TreatmentContext::Prophylaxis => &self.prophylaxis_preference,
            TreatmentContext::Ult => &self.ult_preference,
        }
    }
}

/// Acute flare and prophylaxis preference order.
pub const FLARE_PREFERENCE: &[Treatment] = &[
    Treatment::Naproxen,
    Treatment::Colchicine,
    Treatment::Prednisone,
    Treatment::Ibuprofen,
    Treatment::Indomethacin,
    Treatment::Diclofenac,
    Treatment::Meloxicam,
    Treatment::Celecoxib,
    Treatment::Methylprednisolone,
];

pub const ULT_PREFERENCE: &[Treatment] =
    &[Treatment::Allopurinol, Treatment::Febuxostat, Treatment::Probenecid];

// ═══════════════════════════════════════════════════════════════════════════
// Engine settings
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Most recent readings a creatinine trend is read over.
    pub trend_window: usize,
    /// Creatinine within this factor of baseline is back at baseline.
    pub baseline_tolerance: f64,
    pub months_at_goal: u32,
    pub treatment: TreatmentSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            trend_window: DEFAULT_TREND_WINDOW,
            baseline_tolerance: DEFAULT_BASELINE_TOLERANCE,
            months_at_goal: DEFAULT_MONTHS_AT_GOAL,
            treatment: TreatmentSettings::default(),
        }
    }
}

static DEFAULT_SETTINGS: LazyLock<EngineSettings> = LazyLock::new(EngineSettings::default);

impl EngineSettings {
    /// Shared default settings.
    pub fn defaults() -> &'static EngineSettings {
        &DEFAULT_SETTINGS
    }

    /// Load settings from a JSON file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::Load(path.display().to_string(), e.to_string()))?;
        let settings: Self = serde_json::from_str(&json)
            .map_err(|e| SettingsError::Parse(path.display().to_string(), e.to_string()))?;
        settings.validate()?;

        tracing::info!(path = %path.display(), "Loaded engine settings");
        Ok(settings)
    }

    /// Settings from [`settings_path`] when present, defaults otherwise.
    pub fn load_or_default() -> Result<Self, SettingsError> {
        match settings_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.trend_window < 2 {
            return Err(SettingsError::Invalid {
                field: "trend_window".into(),
                message: "a trend needs at least two readings".into(),
            });
        }
        if !self.baseline_tolerance.is_finite() || self.baseline_tolerance < 1.0 {
            return Err(SettingsError::Invalid {
                field: "baseline_tolerance".into(),
                message: "must be a factor of 1.0 or more".into(),
            });
        }
        if self.months_at_goal == 0 || self.months_at_goal > MAX_MONTHS_AT_GOAL {
            return Err(SettingsError::Invalid {
                field: "months_at_goal".into(),
                message: format!("must be between 1 and {MAX_MONTHS_AT_GOAL} months"),
            });
        }
        let dose = self.treatment.febuxostat_ckd_initial_dose_mg;
        if !dose.is_finite() || dose <= 0.0 {
            return Err(SettingsError::Invalid {
                field: "febuxostat_ckd_initial_dose_mg".into(),
                message: "must be a positive dose".into(),
            });
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Decision contexts
// ═══════════════════════════════════════════════════════════════════════════

/// A clinical question the engine answers for one patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecisionContext {
    FlareAid,
    PpxAid,
    UltAid,
    Flare,
    Ult,
    GoalUrate,
}

impl DecisionContext {
    pub const ALL: [DecisionContext; 6] = [
        Self::FlareAid,
        Self::PpxAid,
        Self::UltAid,
        Self::Flare,
        Self::Ult,
        Self::GoalUrate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlareAid => "flare_aid",
            Self::PpxAid => "ppx_aid",
            Self::UltAid => "ult_aid",
            Self::Flare => "flare",
            Self::Ult => "ult",
            Self::GoalUrate => "goal_urate",
        }
    }
}

/// Snapshot fields a context may declare as required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapshotField {
    Age,
    Sex,
    Ethnicity,
    Flare,
    UltFacts,
}

impl SnapshotField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Sex => "sex",
            Self::Ethnicity => "ethnicity",
            Self::Flare => "flare",
            Self::UltFacts => "ult",
        }
    }
}

/// What a decision context needs from the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextConfig {
    pub context: DecisionContext,
    pub required_fields: Vec<SnapshotField>,
    pub applicable_histories: Vec<MedHistoryType>,
    pub catalog: Option<TreatmentContext>,
}

use MedHistoryType as M;

const FLARE_HISTORIES: &[MedHistoryType] = &[
    M::Angina,
    M::Cad,
    M::Chf,
    M::Ckd,
    M::Gout,
    M::HeartAttack,
    M::Hypertension,
    M::Menopause,
    M::Pvd,
    M::Stroke,
];

const FLARE_AID_HISTORIES: &[MedHistoryType] = &[
    M::Angina,
    M::Anticoagulation,
    M::Bleed,
    M::Cad,
    M::Chf,
    M::Ckd,
    M::ColchicineInteraction,
    M::Diabetes,
    M::GastricBypass,
    M::HeartAttack,
    M::Hypertension,
    M::Ibd,
    M::Pud,
    M::Pvd,
    M::Stroke,
];

const ULT_HISTORIES: &[MedHistoryType] = &[
    M::Ckd,
    M::Erosions,
    M::Hyperuricemia,
    M::Tophi,
    M::UrateStones,
];

/// Flare-aid histories plus what decides prophylaxis.
const PPX_AID_HISTORIES: &[MedHistoryType] = &[
    M::Angina,
    M::Anticoagulation,
    M::Bleed,
    M::Cad,
    M::Chf,
    M::Ckd,
    M::ColchicineInteraction,
    M::Diabetes,
    M::GastricBypass,
    M::Gout,
    M::HeartAttack,
    M::Hypertension,
    M::Ibd,
    M::Pud,
    M::Pvd,
    M::Stroke,
    M::Tophi,
];

/// Erosions and tophi stay so the goal urate reported alongside is right.
const ULT_AID_HISTORIES: &[MedHistoryType] = &[
    M::Angina,
    M::Cad,
    M::Chf,
    M::Ckd,
    M::Erosions,
    M::HeartAttack,
    M::Pvd,
    M::Stroke,
    M::Tophi,
    M::UrateStones,
    M::XoiInteraction,
];

const GOAL_URATE_HISTORIES: &[MedHistoryType] = &[M::Erosions, M::Tophi];

impl ContextConfig {
    pub fn for_context(context: DecisionContext) -> Self {
        let (required_fields, histories, catalog) = match context {
            DecisionContext::FlareAid => (
                vec![SnapshotField::Age],
                FLARE_AID_HISTORIES,
                Some(TreatmentContext::Flare),
            ),
            // Prophylaxis shares the flare-aid contraindications.
            DecisionContext::PpxAid => (
                vec![SnapshotField::Age],
                PPX_AID_HISTORIES,
                Some(TreatmentContext::Prophylaxis),
            ),
            DecisionContext::UltAid => (
                vec![SnapshotField::Ethnicity],
                ULT_AID_HISTORIES,
                Some(TreatmentContext::Ult),
            ),
            DecisionContext::Flare => (
                vec![SnapshotField::Age, SnapshotField::Sex, SnapshotField::Flare],
                FLARE_HISTORIES,
                None,
            ),
            DecisionContext::Ult => (vec![SnapshotField::UltFacts], ULT_HISTORIES, None),
            DecisionContext::GoalUrate => (vec![], GOAL_URATE_HISTORIES, None),
        };

        Self {
            context,
            required_fields,
            applicable_histories: histories.to_vec(),
            catalog,
        }
    }

    pub fn applies(&self, history: MedHistoryType) -> bool {
        self.applicable_histories.contains(&history)
    }
}
