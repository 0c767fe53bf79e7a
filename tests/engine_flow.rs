use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use goutaid::config::{DecisionContext, EngineSettings};
use goutaid::engine::{requires_update, Decision, DecisionEngine, DefaultDecisionEngine};
use goutaid::models::enums::{
    AkiStatus, Ethnicity, FlareNum, Indication, JointSite, LabKind, Likelihood, MedHistoryType,
    Onset, Prevalence, Sex, Treatment, TreatmentContext,
};
use goutaid::error::DecisionError;
use goutaid::models::{
    AkiFlag, ClinicalSnapshot, FlareEpisode, GoutDetail, LabReading, MedAllergy, UltFacts,
};
use goutaid::source::MemorySnapshotSource;
use goutaid::treatment::{Contraindication, TreatmentCatalog};

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

fn drawn(m: u32, d: u32) -> NaiveDateTime {
    date(m, d).and_hms_opt(8, 30, 0).unwrap()
}

/// Man with tophaceous gout starting ULT, an acute first-MTP flare and a
/// resolving AKI.
fn patient() -> ClinicalSnapshot {
    let mut flare = FlareEpisode::new(date(5, 28), vec![JointSite::Mtp1Left]);
    flare.onset = Some(Onset::Rapid);
    flare.redness = Some(true);

    let mut snapshot = ClinicalSnapshot::new(Uuid::new_v4(), date(6, 1))
        .with_demographics(62, Sex::Male)
        .with_gout(GoutDetail {
            on_ult: true,
            starting_ult: true,
            flaring: Some(true),
            ..Default::default()
        })
        .with_history(MedHistoryType::Hypertension)
        .with_history(MedHistoryType::Tophi)
        .with_reading(LabReading::new(LabKind::Urate, 8.4, drawn(5, 29)))
        .with_reading(LabReading::new(LabKind::Creatinine, 2.4, drawn(5, 28)))
        .with_reading(LabReading::new(LabKind::Creatinine, 1.9, drawn(5, 30)))
        .with_reading(LabReading::new(LabKind::Creatinine, 1.5, drawn(5, 31)));
    snapshot.ethnicity = Some(Ethnicity::Korean);
    snapshot.flare = Some(flare);
    snapshot.aki = Some(AkiFlag { status: None });
    snapshot.ult = Some(UltFacts {
        flare_count: FlareNum::One,
        flare_frequency: None,
    });
    snapshot.allergies.push(MedAllergy::new(Treatment::Naproxen));
    snapshot
}

fn engine(snapshot: ClinicalSnapshot) -> DefaultDecisionEngine<MemorySnapshotSource> {
    let source = MemorySnapshotSource::new();
    source.insert(snapshot).unwrap();
    DefaultDecisionEngine::new(source, EngineSettings::default())
}

#[test]
fn default_calculators_agree_with_engine() {
    let snapshot = patient();

    let flare = goutaid::score_flare(&snapshot).unwrap();
    assert_eq!(flare.points, 13.0);
    assert_eq!(flare.prevalence, Prevalence::High);
    assert_eq!(flare.likelihood, Likelihood::Likely);

    let aki = goutaid::classify_aki(&snapshot).unwrap();
    assert_eq!(aki.status, AkiStatus::Improving);

    let ult = goutaid::indicate_ult(&snapshot).unwrap();
    assert_eq!(ult.indication, Indication::Indicated);

    assert_eq!(goutaid::goal_urate(&snapshot).target.mg_dl(), 5.0);

    let ppx = goutaid::indicate_ppx(&snapshot).unwrap();
    assert_eq!(ppx.indication, Indication::Indicated);
    assert!(!ppx.at_goal);

    let catalog =
        TreatmentCatalog::from_settings(TreatmentContext::Ult, &EngineSettings::default().treatment)
            .unwrap();
    let ult_aid = goutaid::recommend(&catalog, &snapshot).unwrap();
    assert_eq!(ult_aid.primary().unwrap().treatment, Treatment::Febuxostat);
    assert_eq!(
        ult_aid.exclusion(Treatment::Allopurinol).unwrap().reasons,
        vec![Contraindication::Hlab5801Untested {
            ethnicity: Some(Ethnicity::Korean)
        }]
    );
}

#[test]
fn engine_reports_every_context() {
    let snapshot = patient();
    let id = snapshot.id;
    let engine = engine(snapshot);

    let reports = engine.evaluate_all(&id).unwrap();
    assert_eq!(reports.len(), DecisionContext::ALL.len());

    let flare_aid = reports
        .iter()
        .find(|r| r.context == DecisionContext::FlareAid)
        .unwrap();
    let rec = flare_aid.recommendation.as_ref().and_then(Decision::decided).unwrap();
    // A naproxen allergy rules out every NSAID.
    assert_eq!(rec.primary().unwrap().treatment, Treatment::Colchicine);
    assert!(rec.exclusion(Treatment::Ibuprofen).is_some());

    let flare = reports.iter().find(|r| r.context == DecisionContext::Flare).unwrap();
    let aki = flare.aki.as_ref().and_then(Decision::decided).unwrap();
    assert_eq!(aki.status, AkiStatus::Improving);

    // Tophi reach the UltAid snapshot, so its goal matches the GoalUrate context.
    let ult_aid = reports.iter().find(|r| r.context == DecisionContext::UltAid).unwrap();
    let goal = ult_aid.goal_urate.as_ref().and_then(Decision::decided).unwrap();
    assert_eq!(goal.target.mg_dl(), 5.0);
    let goal_context = reports
        .iter()
        .find(|r| r.context == DecisionContext::GoalUrate)
        .unwrap();
    assert_eq!(goal_context.goal_urate, ult_aid.goal_urate);

    let ppx_aid = reports.iter().find(|r| r.context == DecisionContext::PpxAid).unwrap();
    let ppx = ppx_aid.ppx.as_ref().and_then(Decision::decided).unwrap();
    assert_eq!(ppx.indication, Indication::Indicated);
}

#[test]
fn recomputation_is_idempotent() {
    let snapshot = patient();
    let id = snapshot.id;
    let engine = engine(snapshot);

    let first = engine.evaluate(&id, DecisionContext::Flare).unwrap();
    let second = engine.evaluate(&id, DecisionContext::Flare).unwrap();
    assert!(!requires_update(Some(&first), &second));

    let json = serde_json::to_string(&first).unwrap();
    let restored: goutaid::engine::DecisionReport = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, first);
}

#[test]
fn contradictory_aki_is_field_attributed() {
    let mut snapshot = patient();
    snapshot.aki = Some(AkiFlag {
        status: Some(AkiStatus::Ongoing),
    });
    let id = snapshot.id;
    let report = engine(snapshot).evaluate(&id, DecisionContext::Flare).unwrap();

    match report.aki.unwrap() {
        Decision::Rejected { errors } => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].field, "creatinines");
        }
        other => panic!("expected a rejected AKI decision, got {other:?}"),
    }
    assert!(report.flare.unwrap().is_decided());
}

#[test]
fn negative_creatinine_is_rejected_by_entry_points() {
    let mut snapshot = patient();
    snapshot
        .creatinines
        .push(LabReading::new(LabKind::Creatinine, -5.0, drawn(6, 1)));

    match goutaid::classify_aki(&snapshot) {
        Err(DecisionError::Contradiction(errors)) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].field, "creatinines");
        }
        other => panic!("expected a contradiction, got {other:?}"),
    }
    assert!(goutaid::score_flare(&snapshot).is_err());
    assert!(goutaid::indicate_ult(&snapshot).is_err());
    assert!(goutaid::indicate_ppx(&snapshot).is_err());

    let catalog =
        TreatmentCatalog::from_settings(TreatmentContext::Flare, &EngineSettings::default().treatment)
            .unwrap();
    assert!(goutaid::recommend(&catalog, &snapshot).is_err());
}
