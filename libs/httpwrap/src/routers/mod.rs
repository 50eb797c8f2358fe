//! Router shells. Each one feeds handler failures through [`crate::dispatch`].

#[cfg(feature = "axum")]
pub mod axum;
#[cfg(feature = "mux")]
pub mod mux;
#[cfg(feature = "tower")]
pub mod tower;
