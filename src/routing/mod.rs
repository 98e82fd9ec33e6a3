//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     SchemaDocument (paths → methods)
//!     → template.rs (compile `{name}` placeholders into segments)
//!     → registry.rs (one ProxyRoute per method+path pair)
//!     → Freeze as immutable RouteTable
//!
//! Per request:
//!     axum match → captured path parameters
//!     → template substitution → outbound path
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Templates are kept verbatim for registration; no slash canonicalization
//! - Substitution walks compiled segments instead of doing substring
//!   replacement, so a parameter name being a substring of another segment
//!   cannot corrupt the path

pub mod registry;
pub mod template;

pub use registry::{ProxyRoute, RouteTable};
pub use template::{PathTemplate, RouteError, Segment};
