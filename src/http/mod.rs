//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, route registration, layers)
//!     → middleware.rs (fixed headers + bearer token injection)
//!     → forward.rs (path substitution, header sanitization,
//!       upstream call, response relay)
//!     → Send to client
//! ```

pub mod forward;
pub mod middleware;
pub mod request;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
