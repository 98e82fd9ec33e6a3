//! OpenAPI schema subsystem.
//!
//! # Data Flow
//! ```text
//! OPENAPI_SCHEMA_URL
//!     → loader.rs (fetch, parse YAML/JSON)
//!     → SchemaDocument (paths → methods → opaque descriptors)
//!     → filter.rs (optional allow-list narrowing)
//!     → routing (one proxy route per surviving method+path pair)
//! ```
//!
//! # Design Decisions
//! - The document is loaded exactly once, at startup; no hot reload
//! - Operation descriptors are opaque (`serde_json::Value`) — the proxy
//!   never interprets request/response schemas
//! - A schema that cannot be fetched or parsed is fatal: without routes
//!   there is nothing to serve

pub mod document;
pub mod filter;
pub mod loader;

pub use document::SchemaDocument;
pub use filter::{filter_endpoints, AllowListEntry, FilterError};
pub use loader::{load_schema, SchemaError};
