pub mod allergy;
pub mod enums;
pub mod flare;
pub mod history;
pub mod lab;
pub mod snapshot;

pub use allergy::MedAllergy;
pub use flare::FlareEpisode;
pub use history::{CkdDetail, DiabetesDetail, GoutDetail};
pub use lab::LabReading;
pub use snapshot::{AkiFlag, ClinicalSnapshot, UltFacts};
