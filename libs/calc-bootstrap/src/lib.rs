#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Host bootstrap for calcspot processes
//!
//! This crate provides configuration loading, logging initialization,
//! signal handling, and path utilities for the server binary.

pub mod config;
pub mod logging;
pub mod paths;
pub mod signals;

pub use config::*;
pub use logging::*;
pub use paths::{PathError, ensure_dir, expand_tilde};
pub use signals::*;
