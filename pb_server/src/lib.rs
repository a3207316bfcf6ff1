//! HTTP front end for poker_bridge matches.
//!
//! - [`api`]: router, handlers and middleware
//! - [`config`]: environment configuration
//! - [`logging`]: tracing subscriber setup
//! - [`metrics`]: Prometheus exporter and HTTP metrics

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
