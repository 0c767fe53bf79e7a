use serde::{Deserialize, Serialize};

use super::enums::{AllergySeverity, Treatment};

/// A recorded allergy to one of the catalog treatments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedAllergy {
    pub treatment: Treatment,
    pub severity: Option<AllergySeverity>,
}

impl MedAllergy {
    pub fn new(treatment: Treatment) -> Self {
        Self {
            treatment,
            severity: None,
        }
    }
}
