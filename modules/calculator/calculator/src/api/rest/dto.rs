use calculator_sdk::ComputationEntry;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A recorded computation as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ComputationEntryDto {
    pub a: f64,
    pub b: f64,
    /// One of `+`, `-`, `*`, `/`.
    pub op: String,
    /// A number, or `"Infinity"`/`"-Infinity"` when the result overflows.
    #[serde(with = "crate::float_repr")]
    pub result: f64,
    #[schema(value_type = String)]
    pub id: Uuid,
}

impl From<ComputationEntry> for ComputationEntryDto {
    fn from(e: ComputationEntry) -> Self {
        Self {
            a: e.a,
            b: e.b,
            op: e.op.symbol().to_owned(),
            result: e.result,
            id: e.id,
        }
    }
}

/// Body of `POST /calculate`.
///
/// Only used for documentation: the handler accepts JSON or form data and
/// validates the raw payload itself. Operands may also be numeric strings.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ComputeRequest {
    #[schema(example = 10)]
    pub a: f64,
    #[schema(example = 4)]
    pub b: f64,
    #[schema(example = "/")]
    pub op: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
