//! Settings-aware access to every calculator for one snapshot.
//!
//! Lab series, CKD status and snapshot validation are derived once per
//! `Evaluation` and shared by the calculators that read them. Nothing
//! outlives the evaluation. A snapshot that fails validation is rejected by
//! every calculator that reads lab values.

use std::cell::OnceCell;

use crate::aki::{self, AkiResult};
use crate::config::EngineSettings;
use crate::error::DecisionError;
use crate::flare::{self, FlareRiskResult};
use crate::goal_urate::{self, GoalUrateResult};
use crate::labs::renal::{ckd_status, renal_function, CkdStatus, RenalFunction};
use crate::labs::LabSeries;
use crate::models::enums::LabKind;
use crate::models::ClinicalSnapshot;
use crate::ppx::{self, PpxIndicationResult};
use crate::treatment::{self, RecommendationResult, TreatmentCatalog};
use crate::ult::{self, UltIndicationResult};

pub struct Evaluation<'a> {
    snapshot: &'a ClinicalSnapshot,
    settings: &'a EngineSettings,
    creatinines: OnceCell<LabSeries>,
    urates: OnceCell<LabSeries>,
    ckd: OnceCell<CkdStatus>,
    validation: OnceCell<Result<(), DecisionError>>,
}

impl<'a> Evaluation<'a> {
    pub fn new(snapshot: &'a ClinicalSnapshot, settings: &'a EngineSettings) -> Self {
        Self {
            snapshot,
            settings,
            creatinines: OnceCell::new(),
            urates: OnceCell::new(),
            ckd: OnceCell::new(),
            validation: OnceCell::new(),
        }
    }

    pub fn snapshot(&self) -> &ClinicalSnapshot {
        self.snapshot
    }

    pub fn creatinines(&self) -> &LabSeries {
        self.creatinines
            .get_or_init(|| LabSeries::new(LabKind::Creatinine, &self.snapshot.creatinines))
    }

    pub fn urates(&self) -> &LabSeries {
        self.urates
            .get_or_init(|| LabSeries::new(LabKind::Urate, &self.snapshot.urates))
    }

    pub fn ckd(&self) -> CkdStatus {
        *self.ckd.get_or_init(|| ckd_status(self.snapshot))
    }

    /// `ClinicalSnapshot::validate`, run once.
    pub fn validate(&self) -> Result<(), DecisionError> {
        self.validation
            .get_or_init(|| self.snapshot.validate())
            .clone()
    }

    pub fn aki(&self) -> Result<AkiResult, DecisionError> {
        self.validate()?;
        aki::classify(self.snapshot, self.creatinines(), self.ckd(), self.settings)
    }

    pub fn flare(&self) -> Result<FlareRiskResult, DecisionError> {
        self.validate()?;
        flare::score(self.snapshot, self.urates())
    }

    pub fn ult(&self) -> Result<UltIndicationResult, DecisionError> {
        self.validate()?;
        ult::indicate(self.snapshot, self.ckd())
    }

    pub fn ppx(&self) -> Result<PpxIndicationResult, DecisionError> {
        self.validate()?;
        ppx::indicate(self.snapshot, self.urates(), self.settings.months_at_goal)
    }

    /// Reads histories only, so it never fails.
    pub fn goal_urate(&self) -> GoalUrateResult {
        goal_urate::goal(self.snapshot)
    }

    pub fn renal_function(&self) -> Result<RenalFunction, DecisionError> {
        self.validate()?;
        renal_function(self.snapshot, self.creatinines())
    }

    pub fn recommend(
        &self,
        catalog: &TreatmentCatalog,
    ) -> Result<RecommendationResult, DecisionError> {
        self.validate()?;
        Ok(treatment::recommend(
            catalog,
            self.snapshot,
            self.ckd(),
            &self.settings.treatment,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{CkdStage, Indication, MedHistoryType, Sex, TreatmentContext};
    use crate::models::{CkdDetail, GoutDetail, LabReading};
    use chrono::{NaiveDate, NaiveDateTime};
    use uuid::Uuid;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn snapshot() -> ClinicalSnapshot {
        ClinicalSnapshot::new(Uuid::nil(), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
            .with_demographics(60, Sex::Male)
    }

    #[test]
    fn series_are_built_once() {
        let s = snapshot().with_reading(LabReading::new(LabKind::Urate, 6.5, at(2024, 5, 1)));
        let settings = EngineSettings::default();
        let eval = Evaluation::new(&s, &settings);
        let first: *const LabSeries = eval.urates();
        let second: *const LabSeries = eval.urates();
        assert_eq!(first, second);
        assert_eq!(eval.urates().len(), 1);
    }

    #[test]
    fn negative_reading_rejected_before_classification() {
        let mut s = snapshot()
            .with_reading(LabReading::new(LabKind::Creatinine, 2.1, at(2024, 5, 1)))
            .with_reading(LabReading::new(LabKind::Creatinine, -5.0, at(2024, 5, 3)));
        s.aki = Some(crate::models::AkiFlag::default());
        let settings = EngineSettings::default();
        let eval = Evaluation::new(&s, &settings);

        for err in [
            eval.aki().unwrap_err(),
            eval.renal_function().unwrap_err(),
            eval.flare().unwrap_err(),
        ] {
            assert!(matches!(err, DecisionError::Contradiction(_)));
            let fields: Vec<_> = err.field_errors().into_iter().map(|f| f.field).collect();
            assert_eq!(fields, vec!["creatinines"]);
        }
    }

    #[test]
    fn ppx_uses_goal_for_tophi() {
        let s = snapshot()
            .with_gout(GoutDetail {
                on_ult: true,
                ..Default::default()
            })
            .with_reading(LabReading::new(LabKind::Urate, 5.5, at(2024, 5, 1)));
        let settings = EngineSettings::default();
        assert_eq!(
            Evaluation::new(&s, &settings).ppx().unwrap().indication,
            Indication::NotIndicated
        );

        let tophi = s.with_history(MedHistoryType::Tophi);
        assert_eq!(
            Evaluation::new(&tophi, &settings).ppx().unwrap().indication,
            Indication::Conditional
        );
    }

    #[test]
    fn ppx_reads_configured_months_at_goal() {
        let s = snapshot()
            .with_gout(GoutDetail {
                on_ult: true,
                starting_ult: true,
                ..Default::default()
            })
            .with_reading(LabReading::new(LabKind::Urate, 5.0, at(2023, 10, 1)))
            .with_reading(LabReading::new(LabKind::Urate, 5.2, at(2024, 1, 15)))
            .with_reading(LabReading::new(LabKind::Urate, 4.9, at(2024, 5, 20)));
        let settings = EngineSettings::default();
        let ppx = Evaluation::new(&s, &settings).ppx().unwrap();
        assert!(ppx.at_goal_long_term);
        assert!(ppx.recent_urate);
        assert_eq!(ppx.indication, Indication::NotIndicated);

        let strict = EngineSettings {
            months_at_goal: 12,
            ..EngineSettings::default()
        };
        let ppx = Evaluation::new(&s, &strict).ppx().unwrap();
        assert!(!ppx.at_goal_long_term);
        assert_eq!(ppx.indication, Indication::Indicated);
    }

    #[test]
    fn recommendation_uses_calculated_stage() {
        // Baseline 2.5 mg/dL at 60 stages as IV.
        let mut s = snapshot().with_history(MedHistoryType::Ckd);
        s.baseline_creatinine = Some(2.5);
        let settings = EngineSettings::default();
        let eval = Evaluation::new(&s, &settings);
        assert_eq!(eval.ckd(), CkdStatus::Staged(CkdStage::Four));

        let catalog =
            TreatmentCatalog::from_settings(TreatmentContext::Flare, &settings.treatment).unwrap();
        let result = eval.recommend(&catalog).unwrap();
        assert_eq!(
            result.primary().map(|r| r.treatment),
            Some(crate::models::enums::Treatment::Prednisone)
        );
    }

    #[test]
    fn renal_function_prefers_baseline() {
        let mut s = snapshot()
            .with_ckd(CkdDetail::default())
            .with_reading(LabReading::new(LabKind::Creatinine, 3.0, at(2024, 5, 1)));
        s.baseline_creatinine = Some(1.0);
        let settings = EngineSettings::default();
        let renal = Evaluation::new(&s, &settings).renal_function().unwrap();
        assert_eq!(renal.creatinine, 1.0);
    }
}
