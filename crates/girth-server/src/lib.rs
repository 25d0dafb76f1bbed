//! Girth prediction service
//!
//! Hosts one loaded model package behind a JSON API, together with
//! health probes and Prometheus metrics.

pub mod api;
pub mod config;
