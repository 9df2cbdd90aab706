//! Helpers used across the application:
//!
//! - [`code_generator`] - Random code generation and custom code validation
//! - [`url_validator`] - Target URL validation

pub mod code_generator;
pub mod url_validator;
