use serde::{Deserialize, Serialize};

use crate::config::EngineSettings;
use crate::error::DecisionError;
use crate::labs::renal::{self, CkdStatus};
use crate::labs::{LabSeries, SeriesNotice};
use crate::messages::MessageTemplates;
use crate::models::enums::{AkiStatus, Trend};
use crate::models::ClinicalSnapshot;

/// Field contradictions against the creatinines are reported on.
pub const CREATININES_FIELD: &str = "creatinines";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AkiResult {
    pub status: AkiStatus,
    pub trend: Trend,
    pub rationale: Vec<String>,
    pub notices: Vec<SeriesNotice>,
}

/// How the newest creatinine shows the AKI has resolved, if it does.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Resolution {
    NotAboveNormal(f64),
    AtBaseline(f64, f64),
    WithinStage(f64, crate::models::enums::CkdStage),
}

impl Resolution {
    fn rationale(&self) -> String {
        match *self {
            Self::NotAboveNormal(v) => MessageTemplates::aki_resolved_normal(v),
            Self::AtBaseline(v, b) => MessageTemplates::aki_resolved_baseline(v, b),
            Self::WithinStage(v, s) => MessageTemplates::aki_resolved_stage(v, s),
        }
    }
}

fn resolution(
    snapshot: &ClinicalSnapshot,
    creatinines: &LabSeries,
    ckd: CkdStatus,
    tolerance: f64,
) -> Option<Resolution> {
    let newest = creatinines.latest()?;
    let value = newest.value();

    if !newest.is_high() {
        return Some(Resolution::NotAboveNormal(value));
    }
    if let Some(baseline) = snapshot.baseline_creatinine {
        return renal::creatinine_at_baseline(value, baseline, tolerance)
            .then_some(Resolution::AtBaseline(value, baseline));
    }
    match (ckd.stage(), snapshot.age, snapshot.sex) {
        (Some(stage), Some(age), Some(sex))
            if renal::creatinine_within_range_for_stage(value, stage, age, sex) =>
        {
            Some(Resolution::WithinStage(value, stage))
        }
        _ => None,
    }
}

/// Classify the AKI recorded in the snapshot.
///
/// An explicit status is kept when the creatinines agree with it; when they
/// disagree the conflict is returned instead of a status.
pub fn classify(
    snapshot: &ClinicalSnapshot,
    creatinines: &LabSeries,
    ckd: CkdStatus,
    settings: &EngineSettings,
) -> Result<AkiResult, DecisionError> {
    let trend = creatinines.trend(settings.trend_window);
    let notices = creatinines.notices().to_vec();

    let Some(flag) = &snapshot.aki else {
        return Ok(AkiResult {
            status: AkiStatus::None,
            trend,
            rationale: vec![MessageTemplates::aki_not_flagged()],
            notices,
        });
    };

    if flag.status == Some(AkiStatus::None) {
        return Err(DecisionError::contradiction(
            "aki_status",
            MessageTemplates::aki_flag_none(),
        ));
    }

    if creatinines.is_empty() {
        let status = flag.status.unwrap_or(AkiStatus::Ongoing);
        return Ok(AkiResult {
            status,
            trend,
            rationale: vec![MessageTemplates::aki_no_creatinines(
                status,
                flag.status.is_some(),
            )],
            notices,
        });
    }

    if snapshot.on_dialysis() {
        return Err(DecisionError::contradiction(
            "dialysis",
            MessageTemplates::aki_dialysis(),
        ));
    }

    let resolved = resolution(snapshot, creatinines, ckd, settings.baseline_tolerance);
    let improving = trend == Trend::Improving;
    let derived = match (resolved, improving) {
        (Some(_), _) => AkiStatus::Resolved,
        (None, true) => AkiStatus::Improving,
        (None, false) => AkiStatus::Ongoing,
    };

    // Conflicts between an explicit status and the creatinines.
    let conflict = match flag.status {
        Some(AkiStatus::Ongoing) if derived != AkiStatus::Ongoing => {
            Some(MessageTemplates::aki_marked_ongoing_but(derived))
        }
        Some(AkiStatus::Improving) if resolved.is_some() => {
            Some(MessageTemplates::aki_marked_improving_but_resolved())
        }
        Some(AkiStatus::Improving) if trend != Trend::Unknown && !improving => {
            Some(MessageTemplates::aki_marked_improving_but_not())
        }
        Some(AkiStatus::Resolved) if resolved.is_none() => {
            Some(MessageTemplates::aki_marked_resolved_but(improving))
        }
        _ => None,
    };
    if let Some(message) = conflict {
        return Err(DecisionError::contradiction(CREATININES_FIELD, message));
    }

    let mut rationale = vec![MessageTemplates::aki_trend(
        trend,
        creatinines.len().min(settings.trend_window),
    )];
    if let Some(r) = resolved {
        rationale.push(r.rationale());
    }

    Ok(AkiResult {
        status: flag.status.unwrap_or(derived),
        trend,
        rationale,
        notices,
    })
}
