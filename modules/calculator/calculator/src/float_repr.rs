//! JSON encoding for results that may overflow to infinity.
//!
//! JSON has no literal for non-finite numbers and `serde_json` writes them
//! as `null`. Finite values stay plain numbers; `inf`, `-inf` and `NaN` are
//! written as the strings `"Infinity"`, `"-Infinity"` and `"NaN"`.

use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

pub const INFINITY: &str = "Infinity";
pub const NEG_INFINITY: &str = "-Infinity";
pub const NAN: &str = "NaN";

/// # Errors
/// Propagates the serializer's error.
#[allow(clippy::trivially_copy_pass_by_ref)]
pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else if value.is_nan() {
        serializer.serialize_str(NAN)
    } else if value.is_sign_positive() {
        serializer.serialize_str(INFINITY)
    } else {
        serializer.serialize_str(NEG_INFINITY)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr {
    Number(f64),
    Text(String),
}

/// # Errors
/// Fails on anything other than a number or one of the three names.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Repr::deserialize(deserializer)? {
        Repr::Number(n) => Ok(n),
        Repr::Text(s) => match s.as_str() {
            INFINITY => Ok(f64::INFINITY),
            NEG_INFINITY => Ok(f64::NEG_INFINITY),
            NAN => Ok(f64::NAN),
            other => Err(D::Error::custom(format!(
                "expected a number, \"{INFINITY}\", \"{NEG_INFINITY}\" or \"{NAN}\", got \"{other}\""
            ))),
        },
    }
}
