//! Fallible HTTP handlers with structured error responses.
//!
//! A handler returns `Result<_, HandlerError>`. On failure the router shell renders the
//! error with one shared rule (see [`dispatch::dispatch`]) and then reports it to the
//! configured [`ErrorObserver`].
//!
//! Shells (all enabled by default):
//! - `axum`: [`Router`] wrapper; `HandlerError` implements `IntoResponse`
//! - `mux`: [`Mux`], a `matchit` multiplexer servable by hyper and tower
//! - `tower`: [`handler_fn`] turns one handler into a `tower::Service`
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod dispatch;
pub mod failure;
pub mod observer;
pub mod routers;
pub mod sink;

pub use dispatch::{dispatch, dispatch_result};
pub use failure::{BoxError, HandlerError};
pub use observer::{ErrorObserver, tracing_observer};
pub use sink::{BufferedSink, ResponseSink};

#[cfg(feature = "axum")]
pub use routers::axum::Router;
#[cfg(feature = "mux")]
pub use routers::mux::{Mux, MuxError, MuxResponse, PathParams};
#[cfg(feature = "tower")]
pub use routers::tower::{HandlerService, handler_fn};

// The error model, re-exported so handlers need a single import.
pub use httpwrap_errors::{
    CommonProblemType, HttpError, Problem, ProblemValidationError, Rfc7807Problem,
    ValidationViolation,
};
