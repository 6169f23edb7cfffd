use std::sync::Arc;

use calculator_sdk::{ComputationEntry, SessionKey};
use serde_json::Value;
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::error::DomainError;
use super::evaluator::{EvalError, evaluate};
use super::repo::HistoryRepository;
use super::validator::{ValidatedInput, validate_payload};

/// Result of a successful computation.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputeOutcome {
    pub entry: ComputationEntry,
    /// `false` when the entry could not be written to history.
    pub persisted: bool,
}

pub struct Service {
    repo: Arc<dyn HistoryRepository>,
}

impl Service {
    #[must_use]
    pub fn new(repo: Arc<dyn HistoryRepository>) -> Self {
        Self { repo }
    }

    /// Validate `payload`, evaluate it, and append the entry to the
    /// session's history.
    ///
    /// A failed history write does not fail the computation; it is logged
    /// and reported through `ComputeOutcome::persisted`.
    ///
    /// # Errors
    /// `DomainError::Validation` for a malformed payload and
    /// `DomainError::DivisionByZero` for a zero divisor.
    #[instrument(name = "calculator.compute", skip(self, session, payload), fields(sid = %session))]
    pub async fn compute(
        &self,
        session: &SessionKey,
        payload: &Value,
    ) -> Result<ComputeOutcome, DomainError> {
        let input = validate_payload(payload).inspect_err(|e| {
            info!(error = %e, "Validation error");
        })?;
        self.compute_validated(session, input).await
    }

    /// Evaluate already-typed input and record it.
    ///
    /// # Errors
    /// Same as [`Service::compute`] minus payload validation.
    #[instrument(name = "calculator.compute_validated", skip(self, session, input), fields(sid = %session))]
    pub async fn compute_validated(
        &self,
        session: &SessionKey,
        input: ValidatedInput,
    ) -> Result<ComputeOutcome, DomainError> {
        let ValidatedInput { a, b, op } = input;

        let result = evaluate(a, b, op).map_err(|e| {
            match &e {
                EvalError::DivisionByZero => info!(a, b, "Division by zero attempt"),
                EvalError::UnsupportedOperator(symbol) => {
                    error!(op = %symbol, "Computation error");
                }
            }
            DomainError::from(e)
        })?;

        let entry = ComputationEntry {
            id: Uuid::new_v4(),
            a,
            b,
            op,
            result,
        };

        let persisted = match self.repo.append(session, entry.clone()).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, entry_id = %entry.id, "Failed to write history file");
                false
            }
        };

        info!(a, op = %op, b, result, entry_id = %entry.id, "Computed");
        Ok(ComputeOutcome { entry, persisted })
    }

    /// Full history of the session, oldest first.
    #[instrument(name = "calculator.history", skip(self, session), fields(sid = %session))]
    pub async fn history(&self, session: &SessionKey) -> Vec<ComputationEntry> {
        self.repo.load(session).await
    }

    /// # Errors
    /// `DomainError::Storage` when existing history could not be removed.
    #[instrument(name = "calculator.clear_history", skip(self, session), fields(sid = %session))]
    pub async fn clear_history(&self, session: &SessionKey) -> Result<(), DomainError> {
        self.repo.clear(session).await.map_err(|e| {
            error!(error = %e, "Could not clear history");
            DomainError::from(e)
        })?;
        info!("History cleared");
        Ok(())
    }
}
