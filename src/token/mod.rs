//! OAuth2 token subsystem.
//!
//! # Design Decisions
//! - Token state lives behind one async mutex owned by `TokenManager`;
//!   nothing else can observe or mutate it
//! - The mutex is held across the grant call, so concurrent requests that
//!   find an expired token wait for a single in-flight grant instead of
//!   issuing redundant ones
//! - A failed grant never fails the proxied request: the caller forwards
//!   without authorization

pub mod manager;

pub use manager::{TokenError, TokenManager};
