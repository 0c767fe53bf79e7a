use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A message attached to one offending input field.
/// Callers render these next to the field they name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors returned by the decision calculators.
///
/// None of these abort the caller: a missing field is reported as an
/// undefined decision, contradictions carry every offending field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecisionError {
    #[error("Missing required data: {field}")]
    MissingData { field: String },

    #[error("Contradictory input ({} field error(s))", .0.len())]
    Contradiction(Vec<FieldError>),

    #[error("Invalid input for {field}: {message}")]
    StructuralInput { field: String, message: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },
}

impl DecisionError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingData {
            field: field.into(),
        }
    }

    /// Single-field contradiction.
    pub fn contradiction(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Contradiction(vec![FieldError::new(field, message)])
    }

    pub fn structural(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StructuralInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Flatten any variant into (field, message) pairs.
    pub fn field_errors(&self) -> Vec<FieldError> {
        match self {
            Self::MissingData { field } => {
                vec![FieldError::new(field.as_str(), format!("{field} is required."))]
            }
            Self::Contradiction(errors) => errors.clone(),
            Self::StructuralInput { field, message } => {
                vec![FieldError::new(field.as_str(), message.as_str())]
            }
            Self::InvalidEnum { field, value } => vec![FieldError::new(
                field.as_str(),
                format!("{value} is not a valid choice."),
            )],
        }
    }

    pub fn is_missing_data(&self) -> bool {
        matches!(self, Self::MissingData { .. })
    }
}

/// Collect field errors into a single contradiction, or `Ok` when empty.
pub fn contradictions(errors: Vec<FieldError>) -> Result<(), DecisionError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(DecisionError::Contradiction(errors))
    }
}
