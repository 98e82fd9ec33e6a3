//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via `tracing`; level from config, `RUST_LOG` wins
//! - Metrics are cheap (atomic increments) and exposed on a separate
//!   listener only when configured
//! - The request id set by the HTTP layer flows through all log events of
//!   a request's span

pub mod logging;
pub mod metrics;
