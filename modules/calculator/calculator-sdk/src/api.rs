//! `CalculatorClientV1` trait definition.
//!
//! Every method takes the caller's `SessionKey` explicitly; there is no
//! ambient session state behind the client.

use async_trait::async_trait;

use crate::errors::CalculatorError;
use crate::models::{ComputationEntry, Operator, SessionKey};

/// Public API trait for the calculator module (Version 1).
#[async_trait]
pub trait CalculatorClientV1: Send + Sync {
    /// Evaluate `a op b` and record the entry in the session's history.
    ///
    /// A failed computation records nothing.
    async fn compute(
        &self,
        session: &SessionKey,
        a: f64,
        b: f64,
        op: Operator,
    ) -> Result<ComputationEntry, CalculatorError>;

    /// Full history of the session, oldest first. Empty when nothing was recorded.
    async fn history(&self, session: &SessionKey) -> Result<Vec<ComputationEntry>, CalculatorError>;

    /// Delete the session's history. Clearing an empty history succeeds.
    async fn clear_history(&self, session: &SessionKey) -> Result<(), CalculatorError>;
}
