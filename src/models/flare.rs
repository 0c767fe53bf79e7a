use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::{JointSite, Onset};

/// Descriptors of a single reported flare episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlareEpisode {
    pub joints: Vec<JointSite>,
    pub onset: Option<Onset>,
    pub redness: Option<bool>,
    pub date_started: NaiveDate,
    pub date_ended: Option<NaiveDate>,
    /// Whether a clinician diagnosed the flare as gout. `None` = unknown.
    pub diagnosed: Option<bool>,
    /// Whether a joint aspiration was performed.
    pub aspiration: Option<bool>,
    /// Crystal analysis result: `Some(true)` = urate crystals seen.
    pub crystal_analysis: Option<bool>,
}

impl FlareEpisode {
    pub fn new(date_started: NaiveDate, joints: Vec<JointSite>) -> Self {
        Self {
            joints,
            onset: None,
            redness: None,
            date_started,
            date_ended: None,
            diagnosed: None,
            aspiration: None,
            crystal_analysis: None,
        }
    }

    /// Episode length in days, counting an ongoing flare up to `as_of`.
    pub fn duration_days(&self, as_of: NaiveDate) -> i64 {
        let end = self.date_ended.unwrap_or(as_of);
        (end - self.date_started).num_days()
    }

    pub fn involves_mtp1(&self) -> bool {
        self.joints.iter().any(JointSite::is_mtp1)
    }

    pub fn rapid_onset(&self) -> bool {
        self.onset == Some(Onset::Rapid)
    }
}
