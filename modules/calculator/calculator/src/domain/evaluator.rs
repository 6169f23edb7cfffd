//! Pure arithmetic over validated operands.

use calculator_sdk::Operator;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("unsupported operator '{0}'")]
    UnsupportedOperator(String),
}

/// Apply `op` to `a` and `b` with IEEE-754 double semantics.
///
/// Division by zero (including negative zero) is an error rather than an
/// infinity. Overflow of the other operators follows IEEE rules.
///
/// # Errors
/// Returns `EvalError::DivisionByZero` for `/` with `b == 0`.
pub fn evaluate(a: f64, b: f64, op: Operator) -> Result<f64, EvalError> {
    match op {
        Operator::Add => Ok(a + b),
        Operator::Subtract => Ok(a - b),
        Operator::Multiply => Ok(a * b),
        Operator::Divide if b == 0.0 => Err(EvalError::DivisionByZero),
        Operator::Divide => Ok(a / b),
    }
}

/// Same as [`evaluate`] for an operator given as its textual symbol.
///
/// # Errors
/// Returns `EvalError::UnsupportedOperator` for anything but `+ - * /`, and
/// the errors of [`evaluate`] otherwise.
pub fn evaluate_symbol(a: f64, b: f64, symbol: &str) -> Result<f64, EvalError> {
    let op = symbol
        .parse::<Operator>()
        .map_err(|e| EvalError::UnsupportedOperator(e.0))?;
    evaluate(a, b, op)
}
