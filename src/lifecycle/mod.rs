//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Fetch schema → Filter → Build routes → Serve
//!
//! Shutdown (shutdown.rs):
//!     SIGTERM / ctrl-c → broadcast → server drains and exits
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
