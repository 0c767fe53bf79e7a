use serde::{Deserialize, Serialize};

use crate::messages::MessageTemplates;
use crate::models::enums::MedHistoryType;
use crate::models::ClinicalSnapshot;

/// Target serum urate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalUrate {
    Five,
    Six,
}

impl GoalUrate {
    pub fn mg_dl(&self) -> f64 {
        match self {
            Self::Five => 5.0,
            Self::Six => 6.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalUrateResult {
    pub target: GoalUrate,
    pub rationale: String,
}

impl GoalUrateResult {
    /// Whether a stored result needs replacing with this one.
    pub fn changed_from(&self, previous: Option<&GoalUrateResult>) -> bool {
        previous.map_or(true, |p| p.target != self.target)
    }
}

/// 6 mg/dL, lowered to 5 mg/dL with tophi.
pub fn goal(snapshot: &ClinicalSnapshot) -> GoalUrateResult {
    let tophi = snapshot.has(MedHistoryType::Tophi);
    let target = if tophi { GoalUrate::Five } else { GoalUrate::Six };
    GoalUrateResult {
        target,
        rationale: MessageTemplates::goal_urate(target.mg_dl(), tophi),
    }
}
