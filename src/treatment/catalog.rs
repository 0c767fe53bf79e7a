use serde::{Deserialize, Serialize};

use crate::config::TreatmentSettings;
use crate::error::DecisionError;
use crate::models::enums::{Treatment, TreatmentContext};

/// Whether `treatment` is used in `context` at all.
pub fn belongs_to(treatment: Treatment, context: TreatmentContext) -> bool {
    match context {
        TreatmentContext::Flare | TreatmentContext::Prophylaxis => !treatment.is_ult(),
        TreatmentContext::Ult => treatment.is_ult(),
    }
}

/// Treatments for one clinical context, in preference order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentCatalog {
    context: TreatmentContext,
    treatments: Vec<Treatment>,
}

impl TreatmentCatalog {
    /// Rejects treatments foreign to the context and duplicates.
    pub fn new(context: TreatmentContext, treatments: Vec<Treatment>) -> Result<Self, DecisionError> {
        for (i, treatment) in treatments.iter().enumerate() {
            if !belongs_to(*treatment, context) {
                return Err(DecisionError::structural(
                    "catalog",
                    format!("{treatment} is not a {context} treatment."),
                ));
            }
            if treatments[..i].contains(treatment) {
                return Err(DecisionError::structural(
                    "catalog",
                    format!("{treatment} is listed more than once."),
                ));
            }
        }
        Ok(Self {
            context,
            treatments,
        })
    }

    /// Catalog in the preference order configured for `context`.
    pub fn from_settings(
        context: TreatmentContext,
        settings: &TreatmentSettings,
    ) -> Result<Self, DecisionError> {
        Self::new(context, settings.preference(context).to_vec())
    }

    pub fn context(&self) -> TreatmentContext {
        self.context
    }

    pub fn treatments(&self) -> &[Treatment] {
        &self.treatments
    }

    pub fn len(&self) -> usize {
        self.treatments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.treatments.is_empty()
    }
}
