//! Core error types for httpwrap
//!
//! This crate provides pure data types for HTTP error handling. It includes:
//! - the basic status + message + content type error (`HttpError`)
//! - RFC 9457 Problem Details (`Problem`), the recommended representation
//! - RFC 7807 Problem Details (`Rfc7807Problem`), the legacy representation
//! - a fixed registry of well-known problem types (`CommonProblemType`)
//!
//! With the `axum` feature every error type implements `IntoResponse`.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod catalog;
mod document;
pub mod http_error;
pub mod problem;
#[cfg(feature = "axum")]
pub mod response;
pub mod rfc7807;
pub mod wire;

// Re-export commonly used types
pub use catalog::CommonProblemType;
pub use document::ABOUT_BLANK;
pub use http_error::HttpError;
pub use problem::{
    APPLICATION_PROBLEM_JSON, PROBLEMS_KEY, Problem, ProblemValidationError, RETRY_AFTER_KEY,
    TRACE_ID_KEY, ValidationViolation,
};
pub use rfc7807::Rfc7807Problem;

/// Helper to attach instance and `trace_id` to a Problem
///
/// This is a convenience function for enriching Problem instances with
/// request-specific context before returning them as HTTP responses.
pub fn finalize(mut p: Problem, instance: &str, trace_id: Option<String>) -> Problem {
    p = p.with_instance(instance);
    if let Some(tid) = trace_id {
        p = p.with_trace_id(tid);
    }
    p
}
