#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Problem Details (RFC 9457) shared by every calcspot HTTP route.

pub mod problem;

pub use problem::{
    APPLICATION_PROBLEM_JSON, Problem, bad_request, internal_error, not_found,
};
