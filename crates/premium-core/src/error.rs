use thiserror::Error;

/// Raw input outside its declared range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("age must be greater than 0 and less than 120, got {0}")]
    AgeOutOfRange(i64),

    #[error("height must be greater than 0 and less than 2.5 meters, got {0}")]
    HeightOutOfRange(f64),

    #[error("{field} must be greater than 0, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::AgeOutOfRange(_) => "age",
            ValidationError::HeightOutOfRange(_) => "height",
            ValidationError::NotPositive { field, .. } | ValidationError::NotFinite { field } => {
                *field
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Model does not support predict_proba")]
    CapabilityUnavailable,

    #[error("inference failed: {0:#}")]
    Inference(#[from] anyhow::Error),
}
