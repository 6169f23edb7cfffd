//! Error types for the calculator SDK.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalculatorError {
    #[error("{message}")]
    Validation { message: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Internal error")]
    Internal,
}

impl CalculatorError {
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal() -> Self {
        Self::Internal
    }
}
