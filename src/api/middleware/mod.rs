//! HTTP middleware for request processing.
//!
//! Provides permissive CORS and request tracing.

pub mod cors;
pub mod tracing;
