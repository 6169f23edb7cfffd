use calculator_sdk::{ComputationEntry, Operator, UnknownOperator};

use super::entity::StoredEntry;

impl From<&ComputationEntry> for StoredEntry {
    fn from(e: &ComputationEntry) -> Self {
        Self {
            a: e.a,
            b: e.b,
            op: e.op.symbol().to_owned(),
            result: e.result,
            id: e.id,
        }
    }
}

impl TryFrom<StoredEntry> for ComputationEntry {
    type Error = UnknownOperator;

    fn try_from(e: StoredEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            id: e.id,
            a: e.a,
            b: e.b,
            op: e.op.parse::<Operator>()?,
            result: e.result,
        })
    }
}
