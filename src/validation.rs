//! Input validation for resource drafts
//!
//! Field rules shared by bank account, signup and transaction drafts.
//! A draft that fails here never leaves the machine as an adapter call.

// ============================================================================
// Validation Errors
// ============================================================================

/// Validation errors for draft fields
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("Invalid length for {field}: expected {min}-{max}, got {actual}")]
    InvalidLength {
        field: &'static str,
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("Invalid format for {field} (expected: {expected})")]
    InvalidFormat {
        field: &'static str,
        expected: &'static str,
    },

    #[error("{field} does not match {other}")]
    Mismatch {
        field: &'static str,
        other: &'static str,
    },

    #[error("{field} must be different from {other}")]
    Same {
        field: &'static str,
        other: &'static str,
    },

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },
}

impl ValidationError {
    /// Name of the offending field (for inline display next to the input)
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Required { field }
            | ValidationError::InvalidLength { field, .. }
            | ValidationError::TooShort { field, .. }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::Mismatch { field, .. }
            | ValidationError::Same { field, .. }
            | ValidationError::NotPositive { field } => field,
        }
    }
}

// ============================================================================
// Field Rules
// ============================================================================

/// Trimmed value must be non-empty
pub fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(value)
}

/// Trimmed value must be non-empty and hold `min..=max` characters
pub fn length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let value = required(field, value)?;
    let actual = value.chars().count();
    if actual < min || actual > max {
        return Err(ValidationError::InvalidLength {
            field,
            min,
            max,
            actual,
        });
    }
    Ok(())
}

/// Value must be `min..=max` ASCII digits
pub fn digits(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let value = required(field, value)?;
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field,
            expected: "digits only",
        });
    }
    length(field, value, min, max)
}
