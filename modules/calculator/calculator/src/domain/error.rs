use calculator_sdk::CalculatorError;

use super::evaluator::EvalError;
use super::repo::StorageError;
use super::validator::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("unsupported operator '{0}'")]
    UnsupportedOperator(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<EvalError> for DomainError {
    fn from(e: EvalError) -> Self {
        match e {
            EvalError::DivisionByZero => Self::DivisionByZero,
            EvalError::UnsupportedOperator(symbol) => Self::UnsupportedOperator(symbol),
        }
    }
}

impl From<DomainError> for CalculatorError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(v) => Self::validation(v.to_string()),
            DomainError::DivisionByZero => Self::DivisionByZero,
            DomainError::UnsupportedOperator(_) | DomainError::Storage(_) => Self::internal(),
        }
    }
}
