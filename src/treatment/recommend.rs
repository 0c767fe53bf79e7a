use serde::{Deserialize, Serialize};

use super::catalog::TreatmentCatalog;
use super::contraindications::{assess, Assessment, Contraindication, DoseAdjustment, PatientFactors};
use crate::config::TreatmentSettings;
use crate::labs::CkdStatus;
use crate::messages::MessageTemplates;
use crate::models::enums::{Treatment, TreatmentClass, TreatmentContext};
use crate::models::ClinicalSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedTreatment {
    pub treatment: Treatment,
    pub dose_adjustments: Vec<DoseAdjustment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Recommendation {
    Recommended {
        primary: RecommendedTreatment,
        alternatives: Vec<RecommendedTreatment>,
    },
    /// Every catalog entry is contraindicated.
    NoSafeTreatment { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    pub treatment: Treatment,
    pub reasons: Vec<Contraindication>,
}

impl Exclusion {
    pub fn messages(&self) -> Vec<String> {
        self.reasons.iter().map(|r| r.message(self.treatment)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub context: TreatmentContext,
    pub recommendation: Recommendation,
    pub excluded: Vec<Exclusion>,
}

impl RecommendationResult {
    pub fn primary(&self) -> Option<&RecommendedTreatment> {
        match &self.recommendation {
            Recommendation::Recommended { primary, .. } => Some(primary),
            Recommendation::NoSafeTreatment { .. } => None,
        }
    }

    pub fn alternatives(&self) -> &[RecommendedTreatment] {
        match &self.recommendation {
            Recommendation::Recommended { alternatives, .. } => alternatives,
            Recommendation::NoSafeTreatment { .. } => &[],
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.recommendation, Recommendation::NoSafeTreatment { .. })
    }

    pub fn exclusion(&self, treatment: Treatment) -> Option<&Exclusion> {
        self.excluded.iter().find(|e| e.treatment == treatment)
    }
}

/// Rank the catalog for this patient.
///
/// Every catalog treatment ends up either recommended or excluded. Survivors
/// keep catalog order; the first is the primary recommendation.
pub fn recommend(
    catalog: &TreatmentCatalog,
    snapshot: &ClinicalSnapshot,
    ckd: CkdStatus,
    settings: &TreatmentSettings,
) -> RecommendationResult {
    let factors = PatientFactors {
        snapshot,
        ckd,
        settings,
        context: catalog.context(),
    };

    let nsaid_source = settings
        .nsaids_equivalent
        .then(|| first_contraindicated(TreatmentClass::Nsaid, &factors))
        .flatten();
    let steroid_source = settings
        .steroids_equivalent
        .then(|| first_contraindicated(TreatmentClass::Steroid, &factors))
        .flatten();

    let mut survivors = Vec::new();
    let mut excluded = Vec::new();

    for &treatment in catalog.treatments() {
        let Assessment {
            mut contraindications,
            dose_adjustments,
        } = assess(treatment, &factors);

        let source = match treatment.class() {
            TreatmentClass::Nsaid => nsaid_source,
            TreatmentClass::Steroid => steroid_source,
            _ => None,
        };
        if let Some(source) = source {
            if contraindications.is_empty() && source != treatment {
                contraindications.push(Contraindication::EquivalentTo(source));
            }
        }

        if contraindications.is_empty() {
            survivors.push(RecommendedTreatment {
                treatment,
                dose_adjustments,
            });
        } else {
            tracing::debug!(
                treatment = treatment.as_str(),
                reasons = contraindications.len(),
                "Treatment excluded"
            );
            excluded.push(Exclusion {
                treatment,
                reasons: contraindications,
            });
        }
    }

    let recommendation = if survivors.is_empty() {
        Recommendation::NoSafeTreatment {
            reason: MessageTemplates::no_safe_treatment(catalog.len()),
        }
    } else {
        let primary = survivors.remove(0);
        Recommendation::Recommended {
            primary,
            alternatives: survivors,
        }
    };

    RecommendationResult {
        context: catalog.context(),
        recommendation,
        excluded,
    }
}

/// First treatment of `class`, in or out of the catalog, that is
/// contraindicated on its own.
fn first_contraindicated(class: TreatmentClass, factors: &PatientFactors) -> Option<Treatment> {
    Treatment::ALL
        .iter()
        .copied()
        .filter(|t| t.class() == class)
        .find(|t| assess(*t, factors).is_contraindicated())
}
