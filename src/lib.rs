//! Core library for the `loadflow` CLI.
//!
//! Endpoints are described declaratively, with values that may be derived
//! from a per-user context filled by earlier responses. A run authenticates
//! once, drives a number of virtual users through a simple or flow scenario,
//! and folds every response into latency and error statistics.
pub mod auth;
pub mod config;
pub mod context;
pub mod dynamic;
pub mod error;
pub mod extract;
pub mod http;
pub mod metrics;
pub mod runner;
pub mod scenario;
pub mod shutdown;

#[cfg(test)]
pub(crate) mod test_support;
