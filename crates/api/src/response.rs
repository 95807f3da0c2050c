//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Payload for actions whose only result is a human-readable outcome.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
