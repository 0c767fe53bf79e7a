use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::LabKind;

impl LabKind {
    /// Lower limit of normal, mg/dL.
    pub fn lower_limit(&self) -> f64 {
        match self {
            Self::Creatinine => 0.74,
            Self::Urate => 3.5,
        }
    }

    /// Upper limit of normal, mg/dL.
    pub fn upper_limit(&self) -> f64 {
        match self {
            Self::Creatinine => 1.35,
            Self::Urate => 7.2,
        }
    }

    /// Highest value accepted as a real measurement.
    pub fn max_plausible(&self) -> f64 {
        match self {
            Self::Creatinine => 30.0,
            Self::Urate => 30.0,
        }
    }

    pub fn units(&self) -> &'static str {
        "mg/dL"
    }

    /// Snapshot field holding readings of this kind.
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Creatinine => "creatinines",
            Self::Urate => "urates",
        }
    }
}

/// A dated lab value. Fields are read-only once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabReading {
    id: Uuid,
    kind: LabKind,
    value: f64,
    drawn_at: NaiveDateTime,
}

impl LabReading {
    pub fn new(kind: LabKind, value: f64, drawn_at: NaiveDateTime) -> Self {
        Self::with_id(Uuid::new_v4(), kind, value, drawn_at)
    }

    /// Rebuild a reading already stored under `id`.
    pub fn with_id(id: Uuid, kind: LabKind, value: f64, drawn_at: NaiveDateTime) -> Self {
        Self {
            id,
            kind,
            value,
            drawn_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> LabKind {
        self.kind
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn drawn_at(&self) -> NaiveDateTime {
        self.drawn_at
    }

    pub fn is_high(&self) -> bool {
        self.value > self.kind.upper_limit()
    }

    pub fn is_low(&self) -> bool {
        self.value < self.kind.lower_limit()
    }

    pub fn is_within_normal_limits(&self) -> bool {
        !self.is_high() && !self.is_low()
    }

    /// Finite, non-negative and below the plausibility ceiling.
    pub fn is_plausible(&self) -> bool {
        self.value.is_finite() && self.value >= 0.0 && self.value <= self.kind.max_plausible()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    #[test]
    fn creatinine_limits() {
        assert!(LabReading::new(LabKind::Creatinine, 1.36, at(1)).is_high());
        assert!(LabReading::new(LabKind::Creatinine, 0.70, at(1)).is_low());
        assert!(LabReading::new(LabKind::Creatinine, 1.35, at(1)).is_within_normal_limits());
    }

    #[test]
    fn urate_limits() {
        assert!(LabReading::new(LabKind::Urate, 7.3, at(1)).is_high());
        assert!(LabReading::new(LabKind::Urate, 3.5, at(1)).is_within_normal_limits());
    }

    #[test]
    fn negative_and_nan_values_are_implausible() {
        assert!(!LabReading::new(LabKind::Urate, -0.1, at(1)).is_plausible());
        assert!(!LabReading::new(LabKind::Urate, f64::NAN, at(1)).is_plausible());
        assert!(!LabReading::new(LabKind::Urate, 31.0, at(1)).is_plausible());
        assert!(LabReading::new(LabKind::Urate, 0.0, at(1)).is_plausible());
    }
}
