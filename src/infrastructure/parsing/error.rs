//! Parsing error types
//!
//! Only structural failures are errors. A missing optional detail field is
//! represented as `None` and never reaches this module.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParsingError {
    #[error("Required field '{field}' not found in item {index} of the listing")]
    RequiredFieldMissing {
        field: String,
        index: usize,
    },

    #[error("Field '{field}' in item {index} has unusable value '{value}': {reason}")]
    InvalidField {
        field: String,
        index: usize,
        value: String,
        reason: String,
    },

    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector {
        selector: String,
        reason: String,
    },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },
}

impl ParsingError {
    pub fn required_field_missing(field: &str, index: usize) -> Self {
        Self::RequiredFieldMissing {
            field: field.to_string(),
            index,
        }
    }

    pub fn invalid_field(field: &str, index: usize, value: &str, reason: &str) -> Self {
        Self::InvalidField {
            field: field.to_string(),
            index,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_selector(selector: &str, reason: &str) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error describes the document (as opposed to our own setup).
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::RequiredFieldMissing { .. } | Self::InvalidField { .. }
        )
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
