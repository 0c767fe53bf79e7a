//! Renal function: CKD-EPI 2021 eGFR, CKD staging and the checks that keep
//! recorded CKD details consistent with the creatinine they were derived from.

use serde::{Deserialize, Serialize};

use crate::error::{DecisionError, FieldError};
use crate::models::enums::{CkdStage, MedHistoryType, Sex};
use crate::models::ClinicalSnapshot;

use super::series::LabSeries;

/// Creatinine within this factor of baseline counts as back at baseline.
pub const DEFAULT_BASELINE_TOLERANCE: f64 = 1.1;

// ═══════════════════════════════════════════════════════════════════════════
// CKD-EPI 2021
// ═══════════════════════════════════════════════════════════════════════════

struct EpiCoefficients {
    kappa: f64,
    alpha: f64,
    sex_factor: f64,
}

fn coefficients(sex: Sex) -> EpiCoefficients {
    match sex {
        Sex::Male => EpiCoefficients {
            kappa: 0.9,
            alpha: -0.302,
            sex_factor: 1.0,
        },
        Sex::Female => EpiCoefficients {
            kappa: 0.7,
            alpha: -0.241,
            sex_factor: 1.012,
        },
    }
}

fn age_sex_term(age: u32, c: &EpiCoefficients) -> f64 {
    142.0 * 0.9938_f64.powi(age as i32) * c.sex_factor
}

fn egfr_unrounded(creatinine: f64, age: u32, sex: Sex) -> f64 {
    let c = coefficients(sex);
    let ratio = creatinine / c.kappa;
    age_sex_term(age, &c) * ratio.min(1.0).powf(c.alpha) * ratio.max(1.0).powf(-1.2)
}

/// eGFR (mL/min/1.73m²) rounded to a whole number.
pub fn egfr(creatinine: f64, age: u32, sex: Sex) -> f64 {
    egfr_unrounded(creatinine, age, sex).round()
}

/// Creatinine that yields `target_egfr` for this age and sex.
pub fn creatinine_for_egfr(target_egfr: f64, age: u32, sex: Sex) -> f64 {
    let c = coefficients(sex);
    let t = target_egfr / age_sex_term(age, &c);
    if t >= 1.0 {
        c.kappa * t.powf(1.0 / c.alpha)
    } else {
        c.kappa * t.powf(-1.0 / 1.2)
    }
}

pub fn stage_for_egfr(egfr: f64) -> CkdStage {
    if egfr >= 90.0 {
        CkdStage::One
    } else if egfr >= 60.0 {
        CkdStage::Two
    } else if egfr >= 30.0 {
        CkdStage::Three
    } else if egfr >= 15.0 {
        CkdStage::Four
    } else {
        CkdStage::Five
    }
}

/// eGFR band of a stage as (lower, upper). Stage I has no upper bound.
pub fn egfr_range_for_stage(stage: CkdStage) -> (f64, Option<f64>) {
    match stage {
        CkdStage::One => (90.0, None),
        CkdStage::Two => (60.0, Some(90.0)),
        CkdStage::Three => (30.0, Some(60.0)),
        CkdStage::Four => (15.0, Some(30.0)),
        CkdStage::Five => (0.0, Some(15.0)),
    }
}

/// Creatinine band of a stage as (lowest, highest). Stage V has no ceiling.
pub fn creatinine_range_for_stage(stage: CkdStage, age: u32, sex: Sex) -> (f64, Option<f64>) {
    let (egfr_low, egfr_high) = egfr_range_for_stage(stage);
    let lowest = egfr_high.map_or(0.0, |e| creatinine_for_egfr(e, age, sex));
    let highest = (egfr_low > 0.0).then(|| creatinine_for_egfr(egfr_low, age, sex));
    (lowest, highest)
}

/// Creatinine corresponds to `stage` or to better renal function.
pub fn creatinine_within_range_for_stage(
    creatinine: f64,
    stage: CkdStage,
    age: u32,
    sex: Sex,
) -> bool {
    stage_for_egfr(egfr(creatinine, age, sex)) <= stage
}

pub fn creatinine_at_baseline(creatinine: f64, baseline: f64, tolerance: f64) -> bool {
    creatinine <= baseline * tolerance
}

// ═══════════════════════════════════════════════════════════════════════════
// Snapshot-level renal function
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreatinineSource {
    Baseline,
    Latest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenalFunction {
    pub creatinine: f64,
    pub source: CreatinineSource,
    pub egfr: f64,
    pub stage: CkdStage,
}

/// eGFR and stage for the snapshot.
///
/// The baseline creatinine is preferred because a current value may be
/// distorted by an AKI. Undefined without age, sex or any creatinine.
pub fn renal_function(
    snapshot: &ClinicalSnapshot,
    creatinines: &LabSeries,
) -> Result<RenalFunction, DecisionError> {
    let age = snapshot.age.ok_or_else(|| DecisionError::missing("age"))?;
    let sex = snapshot.sex.ok_or_else(|| DecisionError::missing("sex"))?;
    let (creatinine, source) = match (snapshot.baseline_creatinine, creatinines.latest_value()) {
        (Some(baseline), _) => (baseline, CreatinineSource::Baseline),
        (None, Some(latest)) => (latest, CreatinineSource::Latest),
        (None, None) => return Err(DecisionError::missing("creatinine")),
    };

    let egfr = egfr(creatinine, age, sex);
    Ok(RenalFunction {
        creatinine,
        source,
        egfr,
        stage: stage_for_egfr(egfr),
    })
}

/// What is known about the patient's chronic kidney disease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CkdStatus {
    NoCkd,
    /// CKD recorded without a stage or the data to calculate one.
    Unstaged,
    Staged(CkdStage),
}

impl CkdStatus {
    pub fn stage(&self) -> Option<CkdStage> {
        match self {
            Self::Staged(stage) => Some(*stage),
            _ => None,
        }
    }

    /// Known to be stage III or worse.
    pub fn stage_three_or_worse(&self) -> bool {
        self.stage().is_some_and(|s| s >= CkdStage::Three)
    }

    pub fn has_ckd(&self) -> bool {
        !matches!(self, Self::NoCkd)
    }
}

/// Dialysis means stage V; otherwise the recorded stage, then the stage
/// calculated from baseline creatinine.
pub fn ckd_status(snapshot: &ClinicalSnapshot) -> CkdStatus {
    if !snapshot.has(MedHistoryType::Ckd) {
        return CkdStatus::NoCkd;
    }
    if snapshot.on_dialysis() {
        return CkdStatus::Staged(CkdStage::Five);
    }
    if let Some(stage) = snapshot.ckd_detail.as_ref().and_then(|d| d.stage) {
        return CkdStatus::Staged(stage);
    }
    match (snapshot.baseline_creatinine, snapshot.age, snapshot.sex) {
        (Some(baseline), Some(age), Some(sex)) => {
            CkdStatus::Staged(stage_for_egfr(egfr(baseline, age, sex)))
        }
        _ => CkdStatus::Unstaged,
    }
}

/// Conflicts between the recorded CKD details and everything they imply.
pub fn ckd_detail_errors(snapshot: &ClinicalSnapshot) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if let Some(detail) = &snapshot.ckd_detail {
        if detail.dialysis {
            if detail.stage.is_some_and(|s| s != CkdStage::Five) {
                errors.push(FieldError::new(
                    "stage",
                    "If the patient is on dialysis, the CKD stage is V.",
                ));
            }
            if detail.dialysis_type.is_none() {
                errors.push(FieldError::new(
                    "dialysis_type",
                    "Select the type of dialysis the patient is on.",
                ));
            }
            if detail.dialysis_duration.is_none() {
                errors.push(FieldError::new(
                    "dialysis_duration",
                    "Select how long the patient has been on dialysis.",
                ));
            }
        } else if detail.dialysis_type.is_some() || detail.dialysis_duration.is_some() {
            errors.push(FieldError::new(
                "dialysis",
                "Dialysis type and duration only apply to patients on dialysis.",
            ));
        }
    }

    if let Some(baseline) = snapshot.baseline_creatinine {
        if snapshot.age.is_none() {
            errors.push(FieldError::new(
                "age",
                "Age is required to interpret a baseline creatinine.",
            ));
        }
        if snapshot.sex.is_none() {
            errors.push(FieldError::new(
                "sex",
                "Sex is required to interpret a baseline creatinine.",
            ));
        }

        let recorded = snapshot
            .ckd_detail
            .as_ref()
            .filter(|d| !d.dialysis)
            .and_then(|d| d.stage);
        if let (Some(stage), Some(age), Some(sex)) = (recorded, snapshot.age, snapshot.sex) {
            let calculated = stage_for_egfr(egfr(baseline, age, sex));
            if baseline <= crate::models::snapshot::BASELINE_CREATININE_MAX && calculated != stage {
                errors.push(FieldError::new(
                    "stage",
                    format!(
                        "The stage ({}) doesn't match the stage ({}) calculated from the \
                         baseline creatinine, age and sex.",
                        stage.roman(),
                        calculated.roman()
                    ),
                ));
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{DialysisDuration, DialysisType, LabKind};
    use crate::models::{CkdDetail, LabReading};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn snapshot() -> ClinicalSnapshot {
        ClinicalSnapshot::new(Uuid::nil(), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    #[test]
    fn egfr_known_values() {
        assert_eq!(egfr(3.0, 50, Sex::Male), 25.0);
        assert_eq!(egfr(3.0, 50, Sex::Female), 18.0);
    }

    #[test]
    fn egfr_falls_as_creatinine_rises() {
        assert!(egfr(1.0, 60, Sex::Male) > egfr(1.5, 60, Sex::Male));
        assert!(egfr(0.5, 60, Sex::Female) > egfr(0.6, 60, Sex::Female));
    }

    #[test]
    fn stage_boundaries() {
        assert_eq!(stage_for_egfr(90.0), CkdStage::One);
        assert_eq!(stage_for_egfr(89.0), CkdStage::Two);
        assert_eq!(stage_for_egfr(60.0), CkdStage::Two);
        assert_eq!(stage_for_egfr(59.0), CkdStage::Three);
        assert_eq!(stage_for_egfr(30.0), CkdStage::Three);
        assert_eq!(stage_for_egfr(29.0), CkdStage::Four);
        assert_eq!(stage_for_egfr(15.0), CkdStage::Four);
        assert_eq!(stage_for_egfr(14.0), CkdStage::Five);
    }

    #[test]
    fn inverse_recovers_creatinine() {
        for (creatinine, sex) in [(0.6, Sex::Female), (1.0, Sex::Male), (2.5, Sex::Male)] {
            let e = egfr_unrounded(creatinine, 45, sex);
            let back = creatinine_for_egfr(e, 45, sex);
            assert!((back - creatinine).abs() < 1e-9, "{creatinine} -> {e} -> {back}");
        }
    }

    #[test]
    fn creatinine_range_for_stage_three() {
        let (low, high) = creatinine_range_for_stage(CkdStage::Three, 50, Sex::Male);
        let high = high.unwrap();
        assert!(low < 2.0 && 2.0 < high);
        assert!(creatinine_within_range_for_stage(2.0, CkdStage::Three, 40, Sex::Male));
        assert!(creatinine_within_range_for_stage(2.0, CkdStage::Three, 50, Sex::Male));
        assert!(!creatinine_within_range_for_stage(4.0, CkdStage::Three, 50, Sex::Male));
    }

    #[test]
    fn at_baseline_tolerance() {
        assert!(creatinine_at_baseline(2.0, 2.20, DEFAULT_BASELINE_TOLERANCE));
        assert!(!creatinine_at_baseline(2.21, 1.20, DEFAULT_BASELINE_TOLERANCE));
    }

    #[test]
    fn renal_function_prefers_baseline() {
        let mut s = snapshot().with_demographics(50, Sex::Male);
        s.baseline_creatinine = Some(3.0);
        let readings = vec![LabReading::new(
            LabKind::Creatinine,
            1.0,
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
        )];
        let series = LabSeries::new(LabKind::Creatinine, &readings);

        let rf = renal_function(&s, &series).unwrap();
        assert_eq!(rf.source, CreatinineSource::Baseline);
        assert_eq!(rf.egfr, 25.0);
        assert_eq!(rf.stage, CkdStage::Four);
    }

    #[test]
    fn renal_function_undefined_without_demographics() {
        let series = LabSeries::new(LabKind::Creatinine, &[]);
        let err = renal_function(&snapshot(), &series).unwrap_err();
        assert_eq!(err, DecisionError::missing("age"));

        let s = snapshot().with_demographics(50, Sex::Female);
        let err = renal_function(&s, &series).unwrap_err();
        assert_eq!(err, DecisionError::missing("creatinine"));
    }

    #[test]
    fn ckd_status_sources() {
        assert_eq!(ckd_status(&snapshot()), CkdStatus::NoCkd);

        let unstaged = snapshot().with_history(MedHistoryType::Ckd);
        assert_eq!(ckd_status(&unstaged), CkdStatus::Unstaged);

        let dialysis = snapshot().with_ckd(CkdDetail::on_dialysis(
            DialysisType::Hemodialysis,
            DialysisDuration::MoreThanYear,
        ));
        assert_eq!(ckd_status(&dialysis), CkdStatus::Staged(CkdStage::Five));

        let mut calculated = snapshot()
            .with_history(MedHistoryType::Ckd)
            .with_demographics(50, Sex::Male);
        calculated.baseline_creatinine = Some(2.0);
        assert_eq!(ckd_status(&calculated), CkdStatus::Staged(CkdStage::Three));
        assert!(ckd_status(&calculated).stage_three_or_worse());
    }

    #[test]
    fn recorded_stage_must_match_baseline() {
        let mut s = snapshot()
            .with_ckd(CkdDetail::staged(CkdStage::Two))
            .with_demographics(50, Sex::Male);
        s.baseline_creatinine = Some(2.0);
        let errors = ckd_detail_errors(&s);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "stage");

        s.ckd_detail = Some(CkdDetail::staged(CkdStage::Three));
        assert!(ckd_detail_errors(&s).is_empty());
    }

    #[test]
    fn baseline_needs_age_and_sex() {
        let mut s = snapshot().with_history(MedHistoryType::Ckd);
        s.baseline_creatinine = Some(1.8);
        let fields: Vec<String> = ckd_detail_errors(&s).into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["age", "sex"]);
    }

    #[test]
    fn dialysis_fields_without_dialysis() {
        let s = snapshot().with_ckd(CkdDetail {
            stage: Some(CkdStage::Four),
            dialysis: false,
            dialysis_type: Some(DialysisType::Peritoneal),
            dialysis_duration: None,
        });
        let errors = ckd_detail_errors(&s);
        assert_eq!(errors[0].field, "dialysis");
    }
}
