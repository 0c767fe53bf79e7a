use serde::{Deserialize, Serialize};

use super::enums::{CkdStage, DialysisDuration, DialysisType};

/// Details recorded alongside a CKD history entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CkdDetail {
    pub stage: Option<CkdStage>,
    pub dialysis: bool,
    pub dialysis_type: Option<DialysisType>,
    pub dialysis_duration: Option<DialysisDuration>,
}

impl CkdDetail {
    pub fn staged(stage: CkdStage) -> Self {
        Self {
            stage: Some(stage),
            ..Default::default()
        }
    }

    pub fn on_dialysis(dialysis_type: DialysisType, duration: DialysisDuration) -> Self {
        Self {
            stage: Some(CkdStage::Five),
            dialysis: true,
            dialysis_type: Some(dialysis_type),
            dialysis_duration: Some(duration),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiabetesDetail {
    pub poorly_controlled: bool,
}

/// Treatment state recorded alongside a gout history entry.
///
/// `at_goal` and `at_goal_long_term` are what the clinician recorded; urate
/// readings take precedence when there are any.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GoutDetail {
    pub on_ult: bool,
    pub starting_ult: bool,
    pub flaring: Option<bool>,
    pub at_goal: Option<bool>,
    pub at_goal_long_term: Option<bool>,
}
