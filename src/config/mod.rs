//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! environment variables (deployment tooling)
//!     → loader.rs (clap env args, parse & validate)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - Delimited values (`FIXED_REQUEST_HEADERS`, `ENDPOINT_ALLOW_LIST`) are
//!   parsed into typed structures at startup, never re-parsed per request
//! - URLs are validated but stored verbatim, so the forwarder never
//!   canonicalizes what the operator configured

pub mod loader;
pub mod schema;

pub use loader::{Cli, ConfigError};
pub use schema::ProxyConfig;
pub use schema::{FixedHeader, ListenerConfig, OAuthConfig, TimeoutConfig};
