//! # Bugboard Shared Library
//!
//! This crate contains the data layer and the authorization rules used by
//! the Bugboard API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their queries
//! - `auth`: Password hashing, tokens, request authentication, access control
//! - `visibility`: Per-user task listing with the hidden-task overlay
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod visibility;

/// Current version of the Bugboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
