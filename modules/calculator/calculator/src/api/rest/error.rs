use axum::http::StatusCode;
use calc_errors::Problem;

use crate::domain::error::DomainError;

pub const ERROR_TYPE_BASE: &str = "https://errors.calcspot.dev";

pub const INVALID_PAYLOAD: &str = "Invalid payload";

impl From<DomainError> for Problem {
    fn from(e: DomainError) -> Self {
        let (status, code, title, detail) = match &e {
            DomainError::Validation(v) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Bad Request",
                v.to_string(),
            ),
            DomainError::DivisionByZero => (
                StatusCode::BAD_REQUEST,
                "DIVISION_BY_ZERO",
                "Bad Request",
                "Division by zero".to_owned(),
            ),
            DomainError::UnsupportedOperator(_) => {
                tracing::error!(error = %e, "Computation error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "COMPUTATION_ERROR",
                    "Internal Server Error",
                    "Computation error".to_owned(),
                )
            }
            DomainError::Storage(_) => {
                tracing::error!(error = %e, "Storage error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "Internal Server Error",
                    "Could not clear history".to_owned(),
                )
            }
        };

        Problem::new(status, title, detail)
            .with_type(format!("{ERROR_TYPE_BASE}/{code}"))
            .with_code(code)
    }
}

/// Problem for a request body that could not be decoded at all.
pub fn invalid_payload() -> Problem {
    calc_errors::bad_request(INVALID_PAYLOAD)
        .with_type(format!("{ERROR_TYPE_BASE}/INVALID_PAYLOAD"))
        .with_code("INVALID_PAYLOAD")
}
