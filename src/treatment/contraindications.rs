//! Per-treatment contraindication predicates and renal dose adjustments.

use serde::{Deserialize, Serialize};

use crate::config::TreatmentSettings;
use crate::labs::CkdStatus;
use crate::messages::MessageTemplates;
use crate::models::enums::{
    AllergySeverity, CkdStage, DialysisType, Ethnicity, MedHistoryType, Treatment, TreatmentClass,
    TreatmentContext,
};
use crate::models::ClinicalSnapshot;

/// NSAIDs may be restricted past this age.
pub const NSAID_AGE_LIMIT: u32 = 65;

const ALLOPURINOL_CKD_DOSE_MG: f64 = 50.0;
const COLCHICINE_RENAL_DOSE_MG: f64 = 0.3;

/// Histories that contraindicate every NSAID.
const NSAID_HISTORIES: &[MedHistoryType] = &[
    MedHistoryType::Anticoagulation,
    MedHistoryType::Bleed,
    MedHistoryType::GastricBypass,
    MedHistoryType::Ibd,
    MedHistoryType::Pud,
];

/// Why a treatment is unsafe for the patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Contraindication {
    /// Recorded allergy, with the reaction severity when known.
    Allergy(Option<AllergySeverity>),
    History(MedHistoryType),
    /// CKD too advanced; `None` when CKD is present but unstaged.
    AdvancedCkd(Option<CkdStage>),
    Dialysis,
    Age(u32),
    Diabetes { poorly_controlled: bool },
    Hlab5801Positive,
    Hlab5801Untested { ethnicity: Option<Ethnicity> },
    /// Excluded because an equivalent treatment of the same class is.
    EquivalentTo(Treatment),
}

impl Contraindication {
    pub fn message(&self, treatment: Treatment) -> String {
        match self {
            Self::Allergy(severity) => MessageTemplates::allergy(treatment, *severity),
            Self::History(history) => MessageTemplates::contraindicated_by(history.label()),
            Self::AdvancedCkd(Some(stage)) => {
                MessageTemplates::contraindicated_by(&format!("CKD stage {}", stage.roman()))
            }
            Self::AdvancedCkd(None) => MessageTemplates::contraindicated_by("CKD of unknown stage"),
            Self::Dialysis => MessageTemplates::contraindicated_by("dialysis"),
            Self::Age(age) => MessageTemplates::contraindicated_by(&format!("age {age}")),
            Self::Diabetes { poorly_controlled: true } => {
                MessageTemplates::contraindicated_by("poorly controlled diabetes")
            }
            Self::Diabetes { poorly_controlled: false } => {
                MessageTemplates::contraindicated_by("diabetes")
            }
            Self::Hlab5801Positive => MessageTemplates::contraindicated_by("HLA-B*58:01 positivity"),
            Self::Hlab5801Untested { ethnicity: Some(e) } => MessageTemplates::contraindicated_by(
                &format!("{e} ethnicity without an HLA-B*58:01 result"),
            ),
            Self::Hlab5801Untested { ethnicity: None } => MessageTemplates::contraindicated_by(
                "unknown ethnicity without an HLA-B*58:01 result",
            ),
            Self::EquivalentTo(source) => match treatment.class() {
                TreatmentClass::Steroid => MessageTemplates::steroids_equivalent(*source),
                _ => MessageTemplates::nsaids_equivalent(*source),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoseFrequency {
    Daily,
    EveryOtherDay,
    TwiceWeekly,
    ThreeTimesWeekly,
}

/// A change to the standard dosing of a treatment that stays recommended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseAdjustment {
    pub dose_mg: Option<f64>,
    pub frequency: Option<DoseFrequency>,
    pub reason: String,
}

/// Outcome of checking one treatment against the patient.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Assessment {
    pub contraindications: Vec<Contraindication>,
    pub dose_adjustments: Vec<DoseAdjustment>,
}

impl Assessment {
    pub fn is_contraindicated(&self) -> bool {
        !self.contraindications.is_empty()
    }
}

/// Patient facts every predicate reads.
pub struct PatientFactors<'a> {
    pub snapshot: &'a ClinicalSnapshot,
    pub ckd: CkdStatus,
    pub settings: &'a TreatmentSettings,
    pub context: TreatmentContext,
}

impl PatientFactors<'_> {
    fn dialysis_type(&self) -> Option<DialysisType> {
        self.snapshot
            .ckd_detail
            .as_ref()
            .filter(|d| d.dialysis)
            .and_then(|d| d.dialysis_type)
    }

    /// CKD that needs renal dosing: unstaged, stage III+ or dialysis.
    fn renal_dosing(&self) -> bool {
        match self.ckd {
            CkdStatus::NoCkd => false,
            CkdStatus::Unstaged => true,
            CkdStatus::Staged(stage) => stage >= CkdStage::Three,
        }
    }

    fn ckd_contraindication(&self) -> Contraindication {
        if self.snapshot.on_dialysis() {
            Contraindication::Dialysis
        } else {
            Contraindication::AdvancedCkd(self.ckd.stage())
        }
    }

    fn histories(&self, histories: &[MedHistoryType]) -> Vec<Contraindication> {
        histories
            .iter()
            .filter(|h| self.snapshot.has(**h))
            .map(|h| Contraindication::History(*h))
            .collect()
    }

    fn cardiovascular(&self) -> Vec<Contraindication> {
        self.histories(MedHistoryType::CARDIOVASCULAR)
    }
}

/// Check one treatment. Allergies and class equivalence are applied by the
/// caller, which sees the whole catalog.
pub fn assess(treatment: Treatment, f: &PatientFactors) -> Assessment {
    let mut a = Assessment::default();
    match treatment.class() {
        TreatmentClass::Nsaid => assess_nsaid(f, &mut a),
        TreatmentClass::Colchicine => assess_colchicine(f, &mut a),
        TreatmentClass::Steroid => assess_steroid(f, &mut a),
        TreatmentClass::Xoi if treatment == Treatment::Allopurinol => assess_allopurinol(f, &mut a),
        TreatmentClass::Xoi => assess_febuxostat(f, &mut a),
        TreatmentClass::Uricosuric => assess_probenecid(f, &mut a),
    }
    if let Some(allergy) = f.snapshot.allergy_to(treatment) {
        a.contraindications.push(Contraindication::Allergy(allergy.severity));
    }
    a
}

// ---------------------------------------------------------------------------
// Flare and prophylaxis agents
// ---------------------------------------------------------------------------

fn assess_nsaid(f: &PatientFactors, a: &mut Assessment) {
    a.contraindications.extend(f.histories(NSAID_HISTORIES));
    a.contraindications.extend(f.cardiovascular());
    if f.renal_dosing() {
        a.contraindications.push(f.ckd_contraindication());
    }
    if let Some(age) = f.snapshot.age {
        if !f.settings.nsaids_over_65 && age > NSAID_AGE_LIMIT {
            a.contraindications.push(Contraindication::Age(age));
        }
    }
}

fn assess_colchicine(f: &PatientFactors, a: &mut Assessment) {
    a.contraindications
        .extend(f.histories(&[MedHistoryType::ColchicineInteraction]));

    let renally_dosed = match f.ckd {
        CkdStatus::NoCkd => return,
        CkdStatus::Staged(stage) if !f.snapshot.on_dialysis() => {
            stage <= CkdStage::Three && f.settings.colchicine_in_ckd
        }
        _ => false,
    };

    if !renally_dosed {
        a.contraindications.push(f.ckd_contraindication());
    } else if f.settings.colchicine_dose_adjust {
        a.dose_adjustments.push(DoseAdjustment {
            dose_mg: Some(COLCHICINE_RENAL_DOSE_MG),
            frequency: None,
            reason: "Colchicine dose reduced for CKD.".into(),
        });
    } else {
        let frequency = match f.context {
            TreatmentContext::Prophylaxis => DoseFrequency::EveryOtherDay,
            _ => DoseFrequency::Daily,
        };
        a.dose_adjustments.push(DoseAdjustment {
            dose_mg: None,
            frequency: Some(frequency),
            reason: "Colchicine frequency reduced for CKD.".into(),
        });
    }
}

fn assess_steroid(f: &PatientFactors, a: &mut Assessment) {
    if !f.snapshot.has(MedHistoryType::Diabetes) {
        return;
    }
    let poorly_controlled = f
        .snapshot
        .diabetes_detail
        .as_ref()
        .is_some_and(|d| d.poorly_controlled);
    if poorly_controlled || !f.settings.steroids_in_diabetes {
        a.contraindications
            .push(Contraindication::Diabetes { poorly_controlled });
    }
}

// ---------------------------------------------------------------------------
// Urate-lowering agents
// ---------------------------------------------------------------------------

fn assess_allopurinol(f: &PatientFactors, a: &mut Assessment) {
    let s = f.snapshot;
    match (s.hlab5801, s.ethnicity) {
        (Some(true), _) => a.contraindications.push(Contraindication::Hlab5801Positive),
        (Some(false), _) => {}
        (None, Some(ethnicity)) => {
            if ethnicity.hlab5801_high_risk()
                && !f.settings.allopurinol_high_risk_ethnicity_untested
            {
                a.contraindications.push(Contraindication::Hlab5801Untested {
                    ethnicity: Some(ethnicity),
                });
            }
        }
        (None, None) => {
            if !f.settings.allopurinol_unknown_ethnicity_untested {
                a.contraindications
                    .push(Contraindication::Hlab5801Untested { ethnicity: None });
            }
        }
    }
    a.contraindications
        .extend(f.histories(&[MedHistoryType::XoiInteraction]));
    if s.on_dialysis() && !f.settings.allopurinol_in_dialysis {
        a.contraindications.push(Contraindication::Dialysis);
    }

    if !f.renal_dosing() {
        return;
    }
    let frequency = match (f.dialysis_type(), f.ckd.stage()) {
        (Some(DialysisType::Hemodialysis), _) => Some(DoseFrequency::ThreeTimesWeekly),
        (Some(DialysisType::Peritoneal), _) => None,
        (None, _) if f.settings.allopurinol_ckd_fixed_dose => None,
        (None, Some(CkdStage::Four)) => Some(DoseFrequency::EveryOtherDay),
        (None, Some(CkdStage::Five)) => Some(DoseFrequency::TwiceWeekly),
        (None, _) => None,
    };
    a.dose_adjustments.push(DoseAdjustment {
        dose_mg: Some(ALLOPURINOL_CKD_DOSE_MG),
        frequency,
        reason: "Allopurinol started at a renal dose for CKD.".into(),
    });
}

fn assess_febuxostat(f: &PatientFactors, a: &mut Assessment) {
    a.contraindications
        .extend(f.histories(&[MedHistoryType::XoiInteraction]));
    if !f.settings.febuxostat_in_cv_disease {
        a.contraindications.extend(f.cardiovascular());
    }
    if f.renal_dosing() {
        a.dose_adjustments.push(DoseAdjustment {
            dose_mg: Some(f.settings.febuxostat_ckd_initial_dose_mg),
            frequency: None,
            reason: "Febuxostat started at a lower dose for CKD.".into(),
        });
    }
}

fn assess_probenecid(f: &PatientFactors, a: &mut Assessment) {
    let too_advanced = match f.ckd {
        CkdStatus::NoCkd => false,
        CkdStatus::Unstaged => true,
        CkdStatus::Staged(stage) => stage >= f.settings.probenecid_ckd_stage_limit,
    };
    if too_advanced {
        a.contraindications.push(f.ckd_contraindication());
    }
    a.contraindications
        .extend(f.histories(&[MedHistoryType::UrateStones]));
}
