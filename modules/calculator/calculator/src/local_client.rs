use std::sync::Arc;

use async_trait::async_trait;
use calculator_sdk::{CalculatorClientV1, CalculatorError, ComputationEntry, Operator, SessionKey};

use crate::domain::error::DomainError;
use crate::domain::service::Service;
use crate::domain::validator::ValidatedInput;

/// In-process client backed by the module's domain service.
pub struct LocalClient {
    service: Arc<Service>,
}

impl LocalClient {
    #[must_use]
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl CalculatorClientV1 for LocalClient {
    async fn compute(
        &self,
        session: &SessionKey,
        a: f64,
        b: f64,
        op: Operator,
    ) -> Result<ComputationEntry, CalculatorError> {
        let input = ValidatedInput::new(a, b, op).map_err(DomainError::from)?;
        let outcome = self.service.compute_validated(session, input).await?;
        Ok(outcome.entry)
    }

    async fn history(&self, session: &SessionKey) -> Result<Vec<ComputationEntry>, CalculatorError> {
        Ok(self.service.history(session).await)
    }

    async fn clear_history(&self, session: &SessionKey) -> Result<(), CalculatorError> {
        self.service.clear_history(session).await.map_err(Into::into)
    }
}
