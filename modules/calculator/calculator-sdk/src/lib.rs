#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Calculator SDK
//!
//! This crate provides the public API for the calculator module:
//! - `CalculatorClientV1` trait for in-process consumers
//! - Model types (`ComputationEntry`, `Operator`, `SessionKey`)
//! - Error type (`CalculatorError`)
//!
//! ```ignore
//! let entry = client.compute(&session, 10.0, 2.0, Operator::Divide).await?;
//! assert_eq!(entry.result, 5.0);
//! ```

#![forbid(unsafe_code)]

pub mod api;
pub mod errors;
pub mod models;

pub use api::CalculatorClientV1;
pub use errors::CalculatorError;
pub use models::{ComputationEntry, Operator, SessionKey, UnknownOperator};
