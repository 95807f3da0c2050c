//! JWT-based authentication extractor for Axum handlers.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;
use dealroom_core::error::CoreError;
use dealroom_core::nda::ActorContext;
use dealroom_core::principal::Principal;
use dealroom_core::types::DbId;

use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the `Authorization` header.
///
/// Deactivated accounts are rejected here, before any handler runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's id (from `claims.sub`).
    pub user_id: DbId,
    /// The user's role name (`"buyer"`, `"seller"` or `"admin"`).
    pub role: String,
}

impl AuthUser {
    /// The caller as the domain services see it.
    pub fn principal(&self) -> Principal {
        Principal::active(self.user_id)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = state.verifier.verify(token).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        let principal = Principal {
            id: claims.sub,
            is_active: claims.active,
        };
        principal.ensure_active()?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}

/// Who is calling, for the audit columns of an NDA.
///
/// The IP is the first `X-Forwarded-For` hop when present, otherwise the
/// peer address (available when the server is run with connect info).
#[derive(Debug, Clone, Default)]
pub struct ClientContext(pub ActorContext);

impl ClientContext {
    pub fn into_actor(self) -> ActorContext {
        self.0
    }
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl<S: Send + Sync> FromRequestParts<S> for ClientContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = header_str(parts, "x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(|hop| hop.trim().to_string())
            .filter(|hop| !hop.is_empty());
        let ip_address = forwarded.or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        });
        let user_agent = header_str(parts, USER_AGENT.as_str()).map(str::to_string);

        Ok(ClientContext(ActorContext {
            ip_address,
            user_agent,
        }))
    }
}
