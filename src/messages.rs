use crate::models::enums::{
    AkiStatus, AllergySeverity, CkdStage, Indication, Likelihood, Prevalence, Treatment, Trend,
};

/// Message template builder for rationale and field errors.
/// Plain clinical wording; every message names the facts it rests on.
pub struct MessageTemplates;

impl MessageTemplates {
    // -----------------------------------------------------------------------
    // AKI
    // -----------------------------------------------------------------------

    pub fn aki_not_flagged() -> String {
        "No AKI is recorded for this episode.".into()
    }

    pub fn aki_no_creatinines(status: AkiStatus, explicit: bool) -> String {
        if explicit {
            format!("AKI marked as {status}; no creatinines to check it against.")
        } else {
            "AKI without creatinines is presumed ongoing.".into()
        }
    }

    pub fn aki_dialysis() -> String {
        "AKI status can't be derived from creatinines for a patient on dialysis, \
         because dialysis clears creatinine independent of kidney recovery."
            .into()
    }

    pub fn aki_flag_none() -> String {
        "AKI is recorded, so its status can't be none.".into()
    }

    pub fn aki_trend(trend: Trend, count: usize) -> String {
        format!("Creatinine trend over the last {count} reading(s) is {trend}.")
    }

    pub fn aki_resolved_normal(value: f64) -> String {
        format!("Most recent creatinine {value:.2} mg/dL is not above the upper limit of normal.")
    }

    pub fn aki_resolved_baseline(value: f64, baseline: f64) -> String {
        format!("Most recent creatinine {value:.2} mg/dL is back at baseline ({baseline:.2} mg/dL).")
    }

    pub fn aki_resolved_stage(value: f64, stage: CkdStage) -> String {
        format!(
            "Most recent creatinine {value:.2} mg/dL is within the range expected for CKD stage {}.",
            stage.roman()
        )
    }

    pub fn aki_marked_ongoing_but(derived: AkiStatus) -> String {
        format!("The AKI is marked as ongoing, but the creatinines suggest it is {derived}.")
    }

    pub fn aki_marked_improving_but_resolved() -> String {
        "AKI marked as improving, but the creatinines suggest it is resolved.".into()
    }

    pub fn aki_marked_improving_but_not() -> String {
        "AKI marked as improving, but the creatinines suggest it is not.".into()
    }

    pub fn aki_marked_resolved_but(improving: bool) -> String {
        if improving {
            "AKI marked as resolved, but the creatinines suggest it is still improving.".into()
        } else {
            "AKI marked as resolved, but the creatinines suggest it is not.".into()
        }
    }

    // -----------------------------------------------------------------------
    // Flare
    // -----------------------------------------------------------------------

    pub fn flare_aspiration_required() -> String {
        "Joint aspiration must be selected if a clinician diagnosed the flare.".into()
    }

    pub fn flare_crystals_required() -> String {
        "Crystal analysis results must be selected if a joint aspiration was performed.".into()
    }

    pub fn flare_end_before_start() -> String {
        "The flare can't end before it started.".into()
    }

    pub fn flare_starts_in_future() -> String {
        "The flare can't start in the future.".into()
    }

    pub fn flare_summary(likelihood: Likelihood, prevalence: Prevalence, points: f64) -> String {
        format!(
            "Gout is {likelihood} for this flare; {points:.1} points places it in the {prevalence} \
             prevalence group ({:.1}% of similar patients have gout).",
            prevalence.percent()
        )
    }

    // -----------------------------------------------------------------------
    // ULT
    // -----------------------------------------------------------------------

    pub fn ult_count_without_frequency() -> String {
        "Flare frequency is required when there have been two or more flares.".into()
    }

    pub fn ult_frequency_without_count() -> String {
        "Flare frequency only applies when there have been two or more flares.".into()
    }

    pub fn ult_indication(indication: Indication, reasons: &[&str]) -> String {
        let label = indication_label(indication);
        if reasons.is_empty() {
            format!("ULT is {label}.")
        } else {
            format!("ULT is {label}: {}.", reasons.join(", "))
        }
    }

    // -----------------------------------------------------------------------
    // Prophylaxis
    // -----------------------------------------------------------------------

    pub fn ppx_settled(months: u32) -> String {
        format!("urate at goal for {months} months with a reading in the last 90 days")
    }

    pub fn ppx_indication(indication: Indication, reasons: &[String]) -> String {
        let label = indication_label(indication);
        if reasons.is_empty() {
            format!("Prophylaxis is {label}.")
        } else {
            format!("Prophylaxis is {label}: {}.", reasons.join(", "))
        }
    }

    // -----------------------------------------------------------------------
    // Goal urate
    // -----------------------------------------------------------------------

    pub fn goal_urate(target: f64, tophi: bool) -> String {
        if tophi {
            format!("Goal urate is {target:.1} mg/dL because of tophi.")
        } else {
            format!("Goal urate is {target:.1} mg/dL.")
        }
    }

    // -----------------------------------------------------------------------
    // Treatments
    // -----------------------------------------------------------------------

    pub fn allergy(treatment: Treatment, severity: Option<AllergySeverity>) -> String {
        match severity {
            Some(severity) => format!("Allergic to {treatment} ({severity})."),
            None => format!("Allergic to {treatment}."),
        }
    }

    pub fn contraindicated_by(condition: &str) -> String {
        format!("Contraindicated by {condition}.")
    }

    pub fn nsaids_equivalent(source: Treatment) -> String {
        format!("NSAIDs are treated as equivalent and {source} is contraindicated.")
    }

    pub fn steroids_equivalent(source: Treatment) -> String {
        format!("Steroids are treated as equivalent and {source} is contraindicated.")
    }

    pub fn no_safe_treatment(catalog_size: usize) -> String {
        format!("All {catalog_size} treatment(s) in the catalog are contraindicated.")
    }
}

fn indication_label(indication: Indication) -> &'static str {
    match indication {
        Indication::NotIndicated => "not indicated",
        Indication::Conditional => "conditionally indicated",
        Indication::Indicated => "indicated",
    }
}
