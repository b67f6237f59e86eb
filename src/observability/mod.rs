//! # Observability Infrastructure
//!
//! Structured logging for the Setu control plane core. Metrics and
//! distributed tracing belong to the embedding service; the core only emits
//! `tracing` events and spans.

pub mod logging;

pub use logging::init_logging;
