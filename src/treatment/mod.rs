//! Treatment recommendation: catalogs in preference order, per-treatment
//! contraindications and the ranking that combines them.

pub mod catalog;
pub mod contraindications;
pub mod recommend;

pub use catalog::TreatmentCatalog;
pub use contraindications::{Contraindication, DoseAdjustment, DoseFrequency};
pub use recommend::{
    recommend, Exclusion, Recommendation, RecommendationResult, RecommendedTreatment,
};
