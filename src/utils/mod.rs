//! Utility functions for input validation and short code generation.
//!
//! - [`validator`] - Long URL and custom code validation
//! - [`code_generator`] - Base-62 codec and short code generators

pub mod code_generator;
pub mod validator;
