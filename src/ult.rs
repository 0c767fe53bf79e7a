use serde::{Deserialize, Serialize};

use crate::error::DecisionError;
use crate::labs::CkdStatus;
use crate::messages::MessageTemplates;
use crate::models::enums::{FlareFreq, FlareNum, Indication, MedHistoryType};
use crate::models::ClinicalSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UltIndicationResult {
    pub indication: Indication,
    pub rationale: String,
}

/// Decide whether urate-lowering therapy is indicated.
///
/// Rules are checked in order and the first match wins: erosions, tophi or
/// frequent flares indicate ULT; infrequent recurrent flares, or a single
/// flare with CKD stage III+, hyperuricemia or urate stones, make it
/// conditional.
pub fn indicate(snapshot: &ClinicalSnapshot, ckd: CkdStatus) -> Result<UltIndicationResult, DecisionError> {
    let facts = snapshot
        .ult
        .as_ref()
        .ok_or_else(|| DecisionError::missing("ult"))?;

    match (facts.flare_count, facts.flare_frequency) {
        (FlareNum::TwoPlus, None) => {
            return Err(DecisionError::structural(
                "flare_frequency",
                MessageTemplates::ult_count_without_frequency(),
            ))
        }
        (FlareNum::Zero | FlareNum::One, Some(_)) => {
            return Err(DecisionError::structural(
                "flare_frequency",
                MessageTemplates::ult_frequency_without_count(),
            ))
        }
        _ => {}
    }

    let erosions = snapshot.has(MedHistoryType::Erosions);
    let tophi = snapshot.has(MedHistoryType::Tophi);
    let frequent = facts.flare_frequency == Some(FlareFreq::TwoOrMore);

    let mut reasons = Vec::new();
    let indication = if erosions || tophi || frequent {
        if erosions {
            reasons.push("erosions");
        }
        if tophi {
            reasons.push("tophi");
        }
        if frequent {
            reasons.push("two or more flares per year");
        }
        Indication::Indicated
    } else if facts.flare_count == FlareNum::TwoPlus {
        reasons.push("recurrent but infrequent flares");
        Indication::Conditional
    } else if facts.flare_count == FlareNum::One {
        if ckd.stage_three_or_worse() {
            reasons.push("CKD stage III or worse");
        }
        if snapshot.has(MedHistoryType::Hyperuricemia) {
            reasons.push("hyperuricemia");
        }
        if snapshot.has(MedHistoryType::UrateStones) {
            reasons.push("urate kidney stones");
        }
        if reasons.is_empty() {
            Indication::NotIndicated
        } else {
            Indication::Conditional
        }
    } else {
        Indication::NotIndicated
    };

    Ok(UltIndicationResult {
        indication,
        rationale: MessageTemplates::ult_indication(indication, &reasons),
    })
}
