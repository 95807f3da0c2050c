//! Dealroom API server library.
//!
//! Exposes config, state, error handling, auth extractors and the route tree
//! so the binary entrypoint and the integration tests build the same app.

pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
