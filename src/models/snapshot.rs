use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{contradictions, DecisionError, FieldError};
use crate::labs::renal;

use super::allergy::MedAllergy;
use super::enums::{
    AkiStatus, Ethnicity, FlareFreq, FlareNum, LabKind, MedHistoryType, Sex, Treatment,
};
use super::flare::FlareEpisode;
use super::history::{CkdDetail, DiabetesDetail, GoutDetail};
use super::lab::LabReading;

/// Baseline creatinine above this usually means the patient is on dialysis.
pub const BASELINE_CREATININE_MAX: f64 = 10.0;

/// AKI recorded for the current episode. An explicit status is optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AkiFlag {
    pub status: Option<AkiStatus>,
}

/// Flare history used for the ULT indication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UltFacts {
    pub flare_count: FlareNum,
    pub flare_frequency: Option<FlareFreq>,
}

/// Pre-fetched clinical facts for one decision call.
/// Assembled by the caller so every calculator stays pure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalSnapshot {
    pub id: Uuid,
    /// Date the decisions are made for; durations and recency count to here.
    pub as_of: NaiveDate,
    pub age: Option<u32>,
    pub sex: Option<Sex>,
    pub ethnicity: Option<Ethnicity>,
    pub histories: BTreeSet<MedHistoryType>,
    pub ckd_detail: Option<CkdDetail>,
    pub diabetes_detail: Option<DiabetesDetail>,
    pub gout_detail: Option<GoutDetail>,
    pub baseline_creatinine: Option<f64>,
    pub creatinines: Vec<LabReading>,
    pub urates: Vec<LabReading>,
    pub allergies: Vec<MedAllergy>,
    pub flare: Option<FlareEpisode>,
    pub aki: Option<AkiFlag>,
    pub ult: Option<UltFacts>,
    pub hlab5801: Option<bool>,
}

impl ClinicalSnapshot {
    pub fn new(id: Uuid, as_of: NaiveDate) -> Self {
        Self {
            id,
            as_of,
            age: None,
            sex: None,
            ethnicity: None,
            histories: BTreeSet::new(),
            ckd_detail: None,
            diabetes_detail: None,
            gout_detail: None,
            baseline_creatinine: None,
            creatinines: Vec::new(),
            urates: Vec::new(),
            allergies: Vec::new(),
            flare: None,
            aki: None,
            ult: None,
            hlab5801: None,
        }
    }

    pub fn with_demographics(mut self, age: u32, sex: Sex) -> Self {
        self.age = Some(age);
        self.sex = Some(sex);
        self
    }

    pub fn with_history(mut self, history: MedHistoryType) -> Self {
        self.histories.insert(history);
        self
    }

    /// Records CKD together with its details.
    pub fn with_ckd(mut self, detail: CkdDetail) -> Self {
        self.histories.insert(MedHistoryType::Ckd);
        self.ckd_detail = Some(detail);
        self
    }

    /// Records gout together with its treatment state.
    pub fn with_gout(mut self, detail: GoutDetail) -> Self {
        self.histories.insert(MedHistoryType::Gout);
        self.gout_detail = Some(detail);
        self
    }

    pub fn with_reading(mut self, reading: LabReading) -> Self {
        match reading.kind() {
            LabKind::Creatinine => self.creatinines.push(reading),
            LabKind::Urate => self.urates.push(reading),
        }
        self
    }

    pub fn has(&self, history: MedHistoryType) -> bool {
        self.histories.contains(&history)
    }

    pub fn has_any(&self, histories: &[MedHistoryType]) -> bool {
        histories.iter().any(|h| self.has(*h))
    }

    pub fn has_cardiovascular_disease(&self) -> bool {
        self.has_any(MedHistoryType::CARDIOVASCULAR)
    }

    pub fn on_dialysis(&self) -> bool {
        self.ckd_detail.as_ref().is_some_and(|d| d.dialysis)
    }

    pub fn allergy_to(&self, treatment: Treatment) -> Option<&MedAllergy> {
        self.allergies.iter().find(|a| a.treatment == treatment)
    }

    /// Check the snapshot-wide invariants.
    /// Every violation is reported, keyed by the offending field.
    pub fn validate(&self) -> Result<(), DecisionError> {
        let mut errors = Vec::new();

        if self.ckd_detail.is_some() && !self.has(MedHistoryType::Ckd) {
            errors.push(FieldError::new(
                "ckd_detail",
                "CKD details were provided without a CKD history.",
            ));
        }
        if self.diabetes_detail.is_some() && !self.has(MedHistoryType::Diabetes) {
            errors.push(FieldError::new(
                "diabetes_detail",
                "Diabetes details were provided without a diabetes history.",
            ));
        }
        if self.gout_detail.is_some() && !self.has(MedHistoryType::Gout) {
            errors.push(FieldError::new(
                "gout_detail",
                "Gout details were provided without a gout history.",
            ));
        }

        check_readings(LabKind::Creatinine, &self.creatinines, &mut errors);
        check_readings(LabKind::Urate, &self.urates, &mut errors);

        if let Some(value) = self.baseline_creatinine {
            if !value.is_finite() || value < 0.0 {
                errors.push(FieldError::new(
                    "baseline_creatinine",
                    "Baseline creatinine must be a non-negative number.",
                ));
            } else if value > BASELINE_CREATININE_MAX {
                errors.push(FieldError::new(
                    "baseline_creatinine",
                    "A baseline creatinine greater than 10 mg/dL isn't very likely. \
                     This would typically mean the patient is on dialysis.",
                ));
            }
        }

        errors.extend(renal::ckd_detail_errors(self));

        contradictions(errors)
    }
}

fn check_readings(kind: LabKind, readings: &[LabReading], errors: &mut Vec<FieldError>) {
    let field = kind.field_name();
    for reading in readings {
        if reading.kind() != kind {
            errors.push(FieldError::new(
                field,
                format!("A {} reading was listed among {}.", reading.kind(), field),
            ));
        } else if !reading.is_plausible() {
            errors.push(FieldError::new(
                field,
                format!(
                    "{} {} {} is not a plausible value.",
                    kind,
                    reading.value(),
                    kind.units()
                ),
            ));
        }
    }
}
