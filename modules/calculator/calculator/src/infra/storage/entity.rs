use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// On-disk shape of one history entry.
///
/// A session file holds a JSON array of these, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub a: f64,
    pub b: f64,
    pub op: String,
    #[serde(with = "crate::float_repr")]
    pub result: f64,
    pub id: Uuid,
}
