use serde::{Deserialize, Serialize};

use crate::error::{DecisionError, FieldError};
use crate::labs::LabSeries;
use crate::messages::MessageTemplates;
use crate::models::enums::{
    LessLikely, Likelihood, MedHistoryType, MoreLikely, Prevalence, Sex,
};
use crate::models::ClinicalSnapshot;

// Diagnostic rule weights.
const POINTS_MALE: f64 = 2.0;
const POINTS_PRIOR_GOUT: f64 = 2.0;
const POINTS_RAPID_ONSET: f64 = 0.5;
const POINTS_REDNESS: f64 = 1.0;
const POINTS_MTP1: f64 = 2.5;
const POINTS_CV_OR_HYPERTENSION: f64 = 1.5;
const POINTS_HIGH_URATE: f64 = 3.5;

/// Urate strictly above this scores as elevated.
const URATE_POINTS_THRESHOLD: f64 = 5.88;

/// Scores strictly above these fall in the higher bucket.
const HIGH_PREVALENCE_ABOVE: f64 = 8.0;
const MEDIUM_PREVALENCE_ABOVE: f64 = 4.0;

const MIN_ADULT_AGE: u32 = 18;
const FEMALE_PREMENOPAUSAL_AGE: u32 = 60;
const TOO_LONG_DAYS: i64 = 14;
const TOO_SHORT_DAYS: i64 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlareRiskResult {
    pub likelihood: Likelihood,
    pub prevalence: Prevalence,
    pub points: f64,
    pub less_likelys: Vec<LessLikely>,
    pub more_likelys: Vec<MoreLikely>,
    pub rationale: String,
}

/// Boundary scores resolve to the lower bucket.
pub fn prevalence_for_points(points: f64) -> Prevalence {
    if points > HIGH_PREVALENCE_ABOVE {
        Prevalence::High
    } else if points > MEDIUM_PREVALENCE_ABOVE {
        Prevalence::Medium
    } else {
        Prevalence::Low
    }
}

/// Field errors in the reported flare. Every problem is listed.
fn flare_errors(snapshot: &ClinicalSnapshot) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let Some(flare) = &snapshot.flare else {
        return errors;
    };

    if flare.diagnosed == Some(true) && flare.aspiration.is_none() {
        errors.push(FieldError::new(
            "aspiration",
            MessageTemplates::flare_aspiration_required(),
        ));
    }
    if flare.aspiration == Some(true) && flare.crystal_analysis.is_none() {
        errors.push(FieldError::new(
            "crystal_analysis",
            MessageTemplates::flare_crystals_required(),
        ));
    }
    if flare.date_ended.is_some_and(|end| end < flare.date_started) {
        errors.push(FieldError::new(
            "date_ended",
            MessageTemplates::flare_end_before_start(),
        ));
    }
    if flare.date_started > snapshot.as_of {
        errors.push(FieldError::new(
            "date_started",
            MessageTemplates::flare_starts_in_future(),
        ));
    }
    errors
}

/// Score the reported flare.
pub fn score(snapshot: &ClinicalSnapshot, urates: &LabSeries) -> Result<FlareRiskResult, DecisionError> {
    let flare = snapshot
        .flare
        .as_ref()
        .ok_or_else(|| DecisionError::missing("flare"))?;
    if flare.joints.is_empty() {
        return Err(DecisionError::missing("joints"));
    }

    let errors = flare_errors(snapshot);
    if !errors.is_empty() {
        return Err(DecisionError::Contradiction(errors));
    }

    let age = snapshot.age.ok_or_else(|| DecisionError::missing("age"))?;
    let sex = snapshot.sex.ok_or_else(|| DecisionError::missing("sex"))?;

    // ---- prevalence points ----
    let mut points = 0.0;
    if sex == Sex::Male {
        points += POINTS_MALE;
    }
    if snapshot.has(MedHistoryType::Gout) {
        points += POINTS_PRIOR_GOUT;
    }
    if flare.rapid_onset() {
        points += POINTS_RAPID_ONSET;
    }
    if flare.redness == Some(true) {
        points += POINTS_REDNESS;
    }
    if flare.involves_mtp1() {
        points += POINTS_MTP1;
    }
    if snapshot.has_cardiovascular_disease() || snapshot.has(MedHistoryType::Hypertension) {
        points += POINTS_CV_OR_HYPERTENSION;
    }
    if urates
        .latest_value()
        .is_some_and(|v| v > URATE_POINTS_THRESHOLD)
    {
        points += POINTS_HIGH_URATE;
    }
    let prevalence = prevalence_for_points(points);

    // ---- atypical features ----
    let mut less_likelys = Vec::new();
    if sex == Sex::Female
        && age < FEMALE_PREMENOPAUSAL_AGE
        && !snapshot.has(MedHistoryType::Menopause)
        && !snapshot.has(MedHistoryType::Ckd)
    {
        less_likelys.push(LessLikely::FemaleUnderSixty);
    }
    if age < MIN_ADULT_AGE {
        less_likelys.push(LessLikely::TooYoung);
    }
    let duration = flare.duration_days(snapshot.as_of);
    if duration >= TOO_LONG_DAYS {
        less_likelys.push(LessLikely::TooLong);
    } else if flare.date_ended.is_some() && duration <= TOO_SHORT_DAYS {
        less_likelys.push(LessLikely::TooShort);
    }
    if !flare.joints.iter().any(|j| j.is_common_gout_joint()) {
        less_likelys.push(LessLikely::JointsAtypical);
    }
    if flare.crystal_analysis == Some(false) {
        less_likelys.push(LessLikely::CrystalsNegative);
    }

    let mut more_likelys = Vec::new();
    if flare.crystal_analysis == Some(true) {
        more_likelys.push(MoreLikely::CrystalsPositive);
    }

    let likelihood = if flare.diagnosed == Some(true) && flare.crystal_analysis == Some(true) {
        Likelihood::Likely
    } else if flare.diagnosed == Some(false) && flare.crystal_analysis == Some(false) {
        Likelihood::Unlikely
    } else if !less_likelys.is_empty() {
        match prevalence {
            Prevalence::High => Likelihood::Equivocal,
            _ => Likelihood::Unlikely,
        }
    } else {
        match prevalence {
            Prevalence::High => Likelihood::Likely,
            Prevalence::Medium => Likelihood::Equivocal,
            Prevalence::Low => Likelihood::Unlikely,
        }
    };

    Ok(FlareRiskResult {
        likelihood,
        prevalence,
        points,
        less_likelys,
        more_likelys,
        rationale: MessageTemplates::flare_summary(likelihood, prevalence, points),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{JointSite, LabKind, Onset};
    use crate::models::{FlareEpisode, LabReading};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn flare(joints: Vec<JointSite>) -> FlareEpisode {
        let mut f = FlareEpisode::new(date(5, 20), joints);
        f.date_ended = Some(date(5, 27));
        f
    }

    fn patient(age: u32, sex: Sex, episode: FlareEpisode) -> ClinicalSnapshot {
        let mut s = ClinicalSnapshot::new(Uuid::nil(), date(6, 1)).with_demographics(age, sex);
        s.flare = Some(episode);
        s
    }

    fn with_urate(s: ClinicalSnapshot, value: f64) -> ClinicalSnapshot {
        s.with_reading(LabReading::new(
            LabKind::Urate,
            value,
            date(5, 21).and_hms_opt(9, 0, 0).unwrap(),
        ))
    }

    fn run(s: &ClinicalSnapshot) -> Result<FlareRiskResult, DecisionError> {
        let urates = LabSeries::new(LabKind::Urate, &s.urates);
        score(s, &urates)
    }

    fn fields(err: DecisionError) -> Vec<String> {
        err.field_errors().into_iter().map(|f| f.field).collect()
    }

    #[test]
    fn classic_presentation_is_likely() {
        let mut episode = flare(vec![JointSite::Mtp1Right]);
        episode.onset = Some(Onset::Rapid);
        episode.redness = Some(true);
        let s = with_urate(
            patient(55, Sex::Male, episode).with_history(MedHistoryType::Gout),
            9.0,
        );

        let result = run(&s).unwrap();
        assert_eq!(result.points, 11.5);
        assert_eq!(result.prevalence, Prevalence::High);
        assert_eq!(result.likelihood, Likelihood::Likely);
        assert!(result.less_likelys.is_empty());
    }

    #[test]
    fn negative_crystal_analysis_overrides_high_prevalence() {
        let mut episode = flare(vec![JointSite::Mtp1Right]);
        episode.onset = Some(Onset::Rapid);
        episode.redness = Some(true);
        episode.diagnosed = Some(false);
        episode.aspiration = Some(true);
        episode.crystal_analysis = Some(false);
        let s = with_urate(
            patient(55, Sex::Male, episode).with_history(MedHistoryType::Gout),
            9.0,
        );

        let result = run(&s).unwrap();
        assert_eq!(result.prevalence, Prevalence::High);
        assert_eq!(result.likelihood, Likelihood::Unlikely);
    }

    #[test]
    fn low_score_is_unlikely() {
        let s = patient(70, Sex::Female, flare(vec![JointSite::KneeLeft]));
        let result = run(&s).unwrap();
        assert_eq!(result.points, 0.0);
        assert_eq!(result.prevalence, Prevalence::Low);
        assert_eq!(result.likelihood, Likelihood::Unlikely);
    }

    /// Male + MTP1 + urate = exactly 8 points stays in the medium bucket.
    #[test]
    fn high_boundary_resolves_to_medium() {
        let s = with_urate(patient(50, Sex::Male, flare(vec![JointSite::Mtp1Left])), 6.0);
        let result = run(&s).unwrap();
        assert_eq!(result.points, 8.0);
        assert_eq!(result.prevalence, Prevalence::Medium);
        assert_eq!(result.likelihood, Likelihood::Equivocal);
    }

    /// Male + gout = exactly 4 points stays in the low bucket.
    #[test]
    fn medium_boundary_resolves_to_low() {
        let s = patient(50, Sex::Male, flare(vec![JointSite::AnkleLeft]))
            .with_history(MedHistoryType::Gout);
        let result = run(&s).unwrap();
        assert_eq!(result.points, 4.0);
        assert_eq!(result.prevalence, Prevalence::Low);
    }

    /// Adding one feature never lowers the bucket, and a boundary never rounds up.
    #[test]
    fn one_feature_apart_is_never_less_conservative() {
        assert!(prevalence_for_points(8.0) <= prevalence_for_points(8.5));
        assert_eq!(prevalence_for_points(8.0), Prevalence::Medium);
        assert_eq!(prevalence_for_points(8.5), Prevalence::High);
        assert_eq!(prevalence_for_points(4.0), Prevalence::Low);
        assert_eq!(prevalence_for_points(4.5), Prevalence::Medium);
    }

    #[test]
    fn premenopausal_female_is_less_likely() {
        let s = with_urate(patient(40, Sex::Female, flare(vec![JointSite::Mtp1Left])), 8.0);
        let result = run(&s).unwrap();
        assert!(result.less_likelys.contains(&LessLikely::FemaleUnderSixty));
        assert_eq!(result.likelihood, Likelihood::Unlikely);

        let post = s.clone().with_history(MedHistoryType::Menopause);
        assert!(!run(&post).unwrap().less_likelys.contains(&LessLikely::FemaleUnderSixty));
    }

    #[test]
    fn less_likely_with_high_prevalence_is_equivocal() {
        let mut episode = flare(vec![JointSite::Mtp1Right, JointSite::HipLeft]);
        episode.onset = Some(Onset::Rapid);
        episode.redness = Some(true);
        episode.date_ended = Some(date(5, 21));
        let s = with_urate(
            patient(60, Sex::Male, episode).with_history(MedHistoryType::Gout),
            9.0,
        );
        let result = run(&s).unwrap();
        assert_eq!(result.less_likelys, vec![LessLikely::TooShort]);
        assert_eq!(result.prevalence, Prevalence::High);
        assert_eq!(result.likelihood, Likelihood::Equivocal);
    }

    #[test]
    fn duration_and_joint_factors() {
        let mut long = flare(vec![JointSite::ShoulderLeft]);
        long.date_ended = None;
        long.date_started = date(5, 1);
        let result = run(&patient(16, Sex::Male, long)).unwrap();
        assert_eq!(
            result.less_likelys,
            vec![LessLikely::TooYoung, LessLikely::TooLong, LessLikely::JointsAtypical]
        );
    }

    #[test]
    fn crystals_drive_likelihood() {
        let mut positive = flare(vec![JointSite::KneeRight]);
        positive.diagnosed = Some(true);
        positive.aspiration = Some(true);
        positive.crystal_analysis = Some(true);
        let result = run(&patient(30, Sex::Female, positive)).unwrap();
        assert_eq!(result.likelihood, Likelihood::Likely);
        assert_eq!(result.more_likelys, vec![MoreLikely::CrystalsPositive]);

        let mut negative = flare(vec![JointSite::Mtp1Right]);
        negative.aspiration = Some(true);
        negative.crystal_analysis = Some(false);
        let result = run(&patient(65, Sex::Male, negative)).unwrap();
        assert!(result.less_likelys.contains(&LessLikely::CrystalsNegative));
    }

    #[test]
    fn diagnosed_without_aspiration_is_field_error() {
        let mut episode = flare(vec![JointSite::Mtp1Right]);
        episode.diagnosed = Some(true);
        let err = run(&patient(50, Sex::Male, episode)).unwrap_err();
        assert_eq!(fields(err), vec!["aspiration"]);
    }

    #[test]
    fn aspiration_without_crystals_is_field_error() {
        let mut episode = flare(vec![JointSite::Mtp1Right]);
        episode.aspiration = Some(true);
        let err = run(&patient(50, Sex::Male, episode)).unwrap_err();
        assert_eq!(fields(err), vec!["crystal_analysis"]);
    }

    #[test]
    fn date_errors_all_reported() {
        let mut episode = FlareEpisode::new(date(6, 10), vec![JointSite::Mtp1Right]);
        episode.date_ended = Some(date(6, 5));
        let err = run(&patient(50, Sex::Male, episode)).unwrap_err();
        assert_eq!(fields(err), vec!["date_ended", "date_started"]);
    }

    #[test]
    fn missing_inputs_are_undefined() {
        let mut s = patient(50, Sex::Male, flare(vec![JointSite::Mtp1Right]));
        s.sex = None;
        assert_eq!(run(&s).unwrap_err(), DecisionError::missing("sex"));

        s.flare = None;
        assert_eq!(run(&s).unwrap_err(), DecisionError::missing("flare"));
    }
}
