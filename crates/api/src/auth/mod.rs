//! Access-token verification.
//!
//! - [`jwt`] -- HS256 claims, the startup-built [`TokenVerifier`](jwt::TokenVerifier)
//!   and a token minting helper for tests and local tooling.

pub mod jwt;
