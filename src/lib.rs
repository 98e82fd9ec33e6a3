//! Schema-driven reverse proxy library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod schema;
pub mod token;

pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
