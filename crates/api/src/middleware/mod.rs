//! Request extractors for authentication, authorization and audit context.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`auth::ClientContext`] -- Client IP and user agent for the NDA audit columns.
//! - [`rbac::RequireSeller`] -- Requires the `seller` or `admin` role.

pub mod auth;
pub mod rbac;
