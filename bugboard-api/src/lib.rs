//! # Bugboard API Server Library
//!
//! HTTP layer of the Bugboard task and bug tracker.
//!
//! ## Modules
//!
//! - `app`: Application state, router and authentication layer
//! - `config`: Configuration from environment variables
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Extractors that reject with JSON errors
//! - `middleware`: Security headers
//! - `routes`: Route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
