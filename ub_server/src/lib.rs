//! HTTP server library for the userbase account service.
//!
//! Exposes the router, configuration, logging, and metrics so the binary
//! and the integration tests share one wiring path.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
