#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Calculator module
//!
//! Validates and evaluates binary arithmetic requests and keeps a
//! per-session history of results in one JSON file per session.
//!
//! Layout:
//! - `domain`: validator, evaluator, repository contract and service
//! - `infra::storage`: file-backed history repository
//! - `api::rest`: DTOs, handlers, routes, session cookie middleware, OpenAPI
//! - `local_client`: `CalculatorClientV1` implementation for in-process use

pub mod api;
pub mod config;
pub mod domain;
mod float_repr;
pub mod infra;
pub mod local_client;
pub mod module;

pub use calculator_sdk::{
    CalculatorClientV1, CalculatorError, ComputationEntry, Operator, SessionKey,
};
pub use config::CalculatorConfig;
pub use module::CalculatorModule;
