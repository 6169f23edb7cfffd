pub mod error;
pub mod evaluator;
pub mod repo;
pub mod service;
pub mod validator;
