//! Flare prophylaxis indication.
//!
//! Prophylaxis follows urate-lowering therapy: starting ULT calls for it
//! unless the urate has already been at goal long enough, and a patient
//! established on ULT only needs it while still flaring or above goal.

use serde::{Deserialize, Serialize};

use crate::error::DecisionError;
use crate::goal_urate;
use crate::labs::urate::{self, RECENT_URATE_DAYS};
use crate::labs::LabSeries;
use crate::messages::MessageTemplates;
use crate::models::enums::{Indication, MedHistoryType};
use crate::models::ClinicalSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PpxIndicationResult {
    pub indication: Indication,
    pub at_goal: bool,
    pub at_goal_long_term: bool,
    pub recent_urate: bool,
    pub rationale: String,
}

/// Decide whether flare prophylaxis is indicated.
///
/// Urate readings decide `at_goal` and `at_goal_long_term` when there are
/// any; otherwise the values recorded on the gout detail are used, and an
/// unknown value counts as not at goal.
pub fn indicate(
    snapshot: &ClinicalSnapshot,
    urates: &LabSeries,
    months_at_goal: u32,
) -> Result<PpxIndicationResult, DecisionError> {
    if !snapshot.has(MedHistoryType::Gout) {
        return Err(DecisionError::missing("gout"));
    }
    let detail = snapshot
        .gout_detail
        .as_ref()
        .ok_or_else(|| DecisionError::missing("gout_detail"))?;

    let goal = goal_urate::goal(snapshot).target.mg_dl();
    let (at_goal, at_goal_long_term) = if urates.is_empty() {
        (
            detail.at_goal == Some(true),
            detail.at_goal_long_term == Some(true),
        )
    } else {
        (
            urate::last_at_goal(urates, goal),
            urate::months_at_goal(urates, goal, months_at_goal),
        )
    };
    let recent_urate = urate::has_recent(urates, snapshot.as_of);
    let settled = at_goal_long_term && recent_urate;

    let mut reasons = Vec::new();
    let indication = if !(detail.on_ult || detail.starting_ult) {
        reasons.push("not on or starting ULT".to_string());
        Indication::NotIndicated
    } else if detail.starting_ult {
        if settled {
            reasons.push(MessageTemplates::ppx_settled(months_at_goal));
            Indication::NotIndicated
        } else {
            reasons.push("starting ULT".to_string());
            Indication::Indicated
        }
    } else if detail.flaring == Some(true) {
        reasons.push("still flaring on ULT".to_string());
        Indication::Conditional
    } else if !at_goal && !settled {
        reasons.push(format!("urate above goal of {goal:.1} mg/dL on ULT"));
        Indication::Conditional
    } else {
        reasons.push("at goal on ULT without flares".to_string());
        Indication::NotIndicated
    };

    if !recent_urate && (detail.on_ult || detail.starting_ult) {
        tracing::debug!(
            snapshot_id = %snapshot.id,
            days = RECENT_URATE_DAYS,
            "No recent urate for prophylaxis decision"
        );
    }

    Ok(PpxIndicationResult {
        indication,
        at_goal,
        at_goal_long_term,
        recent_urate,
        rationale: MessageTemplates::ppx_indication(indication, &reasons),
    })
}
