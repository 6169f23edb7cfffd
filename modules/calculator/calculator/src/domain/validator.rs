//! Request payload validation.
//!
//! Checks run in a fixed order and the first failure wins: payload shape,
//! field presence, numeric operands, operator.

use calculator_sdk::Operator;
use serde_json::{Map, Value};

/// Operands and operator that passed validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedInput {
    pub a: f64,
    pub b: f64,
    pub op: Operator,
}

impl ValidatedInput {
    /// Build input from already-typed values, applying the operand checks.
    ///
    /// # Errors
    /// Returns `ValidationError::NotANumber` when an operand is NaN or infinite.
    pub fn new(a: f64, b: f64, op: Operator) -> Result<Self, ValidationError> {
        if !a.is_finite() {
            return Err(ValidationError::NotANumber { field: "a" });
        }
        if !b.is_finite() {
            return Err(ValidationError::NotANumber { field: "b" });
        }
        Ok(Self { a, b, op })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Payload must be a JSON object")]
    NotAnObject,

    #[error("Payload requires 'a', 'b' and 'op' fields")]
    MissingFields,

    #[error("'a' and 'b' must be numbers")]
    NotANumber { field: &'static str },

    #[error("Operator must be one of: +, -, *, /")]
    UnsupportedOperator,
}

/// Validate a decoded request payload.
///
/// Operands may be JSON numbers or strings holding a decimal number
/// (surrounding whitespace is ignored); the result must be finite. The
/// operator must be one of the four symbols exactly.
///
/// # Errors
/// Returns the first `ValidationError` in check order.
pub fn validate_payload(payload: &Value) -> Result<ValidatedInput, ValidationError> {
    let Value::Object(fields) = payload else {
        return Err(ValidationError::NotAnObject);
    };

    // Presence only: a `null` value is present and fails the type checks below.
    let (Some(a), Some(b), Some(op)) = (fields.get("a"), fields.get("b"), fields.get("op")) else {
        return Err(ValidationError::MissingFields);
    };

    let a = parse_operand(a).ok_or(ValidationError::NotANumber { field: "a" })?;
    let b = parse_operand(b).ok_or(ValidationError::NotANumber { field: "b" })?;

    let op = op
        .as_str()
        .and_then(|symbol| symbol.parse::<Operator>().ok())
        .ok_or(ValidationError::UnsupportedOperator)?;

    Ok(ValidatedInput { a, b, op })
}

fn parse_operand(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Build a payload object from decoded form pairs.
///
/// Missing fields become `null`, so an incomplete form is reported as a
/// non-numeric operand or an unsupported operator.
#[must_use]
pub fn payload_from_form(pairs: Vec<(String, String)>) -> Value {
    let mut fields = Map::new();
    for key in ["a", "b", "op"] {
        fields.insert(key.to_owned(), Value::Null);
    }
    for (key, value) in pairs {
        if let Some(slot) = fields.get_mut(&key)
            && slot.is_null()
        {
            *slot = Value::String(value);
        }
    }
    Value::Object(fields)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_numbers_and_numeric_strings() {
        let input = validate_payload(&json!({"a": 10, "b": 2.5, "op": "*"})).unwrap();
        assert_eq!(input.a, 10.0);
        assert_eq!(input.b, 2.5);
        assert_eq!(input.op, Operator::Multiply);

        let input = validate_payload(&json!({"a": " 3 ", "b": "-1e2", "op": "-"})).unwrap();
        assert_eq!(input.a, 3.0);
        assert_eq!(input.b, -100.0);
        assert_eq!(input.op, Operator::Subtract);
    }

    #[test]
    fn non_object_payloads_are_rejected() {
        for payload in [json!(null), json!([1, 2]), json!("1+2"), json!(42)] {
            assert_eq!(
                validate_payload(&payload),
                Err(ValidationError::NotAnObject),
                "{payload}"
            );
        }
    }

    #[test]
    fn absent_fields_are_rejected() {
        assert_eq!(
            validate_payload(&json!({"a": 1, "b": 2})),
            Err(ValidationError::MissingFields)
        );
        assert_eq!(
            validate_payload(&json!({})),
            Err(ValidationError::MissingFields)
        );
    }

    #[test]
    fn null_fields_fail_the_type_checks() {
        assert_eq!(
            validate_payload(&json!({"a": 1, "b": null, "op": "+"})),
            Err(ValidationError::NotANumber { field: "b" })
        );
        assert_eq!(
            validate_payload(&json!({"a": null, "b": null, "op": null})),
            Err(ValidationError::NotANumber { field: "a" })
        );
        assert_eq!(
            validate_payload(&json!({"a": 1, "b": 2, "op": null})),
            Err(ValidationError::UnsupportedOperator)
        );
    }

    #[test]
    fn non_numeric_operands_are_rejected() {
        let cases = [
            (json!({"a": "x", "b": 2, "op": "+"}), "a"),
            (json!({"a": 1, "b": true, "op": "+"}), "b"),
            (json!({"a": [1], "b": 2, "op": "+"}), "a"),
            (json!({"a": 1, "b": {"v": 2}, "op": "+"}), "b"),
            (json!({"a": "NaN", "b": 2, "op": "+"}), "a"),
            (json!({"a": 1, "b": "inf", "op": "+"}), "b"),
            (json!({"a": "", "b": 2, "op": "+"}), "a"),
        ];
        for (payload, field) in cases {
            assert_eq!(
                validate_payload(&payload),
                Err(ValidationError::NotANumber { field }),
                "{payload}"
            );
        }
    }

    #[test]
    fn operand_errors_win_over_operator_errors() {
        assert_eq!(
            validate_payload(&json!({"a": "x", "b": 2, "op": "^"})),
            Err(ValidationError::NotANumber { field: "a" })
        );
    }

    #[test]
    fn unknown_operators_are_rejected() {
        for op in [json!("^"), json!("plus"), json!(" +"), json!(1), json!("")] {
            assert_eq!(
                validate_payload(&json!({"a": 1, "b": 2, "op": op})),
                Err(ValidationError::UnsupportedOperator),
                "{op}"
            );
        }
    }

    #[test]
    fn messages_match_the_public_contract() {
        assert_eq!(
            ValidationError::NotANumber { field: "b" }.to_string(),
            "'a' and 'b' must be numbers"
        );
        assert_eq!(
            ValidationError::UnsupportedOperator.to_string(),
            "Operator must be one of: +, -, *, /"
        );
    }

    #[test]
    fn typed_input_rejects_non_finite_operands() {
        assert!(ValidatedInput::new(1.0, 2.0, Operator::Add).is_ok());
        assert_eq!(
            ValidatedInput::new(f64::NAN, 2.0, Operator::Add),
            Err(ValidationError::NotANumber { field: "a" })
        );
        assert_eq!(
            ValidatedInput::new(1.0, f64::NEG_INFINITY, Operator::Add),
            Err(ValidationError::NotANumber { field: "b" })
        );
    }

    #[test]
    fn form_pairs_fill_missing_fields_with_null() {
        let payload = payload_from_form(vec![
            ("a".to_owned(), "4".to_owned()),
            ("op".to_owned(), "+".to_owned()),
            ("extra".to_owned(), "ignored".to_owned()),
        ]);
        assert_eq!(payload, json!({"a": "4", "b": null, "op": "+"}));
        assert_eq!(
            validate_payload(&payload),
            Err(ValidationError::NotANumber { field: "b" })
        );
    }

    #[test]
    fn form_keeps_first_value_of_repeated_field() {
        let payload = payload_from_form(vec![
            ("a".to_owned(), "1".to_owned()),
            ("a".to_owned(), "2".to_owned()),
            ("b".to_owned(), "3".to_owned()),
            ("op".to_owned(), "/".to_owned()),
        ]);
        let input = validate_payload(&payload).unwrap();
        assert_eq!(input.a, 1.0);
    }
}
