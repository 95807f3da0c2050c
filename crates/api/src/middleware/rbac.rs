//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does not
//! meet the minimum requirement.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use dealroom_core::error::CoreError;
use dealroom_core::roles::can_sell;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires `seller` or `admin` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn create(RequireSeller(user): RequireSeller) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireSeller(pub AuthUser);

impl FromRequestParts<AppState> for RequireSeller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !can_sell(&user.role) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Seller role required".into(),
            )));
        }
        Ok(RequireSeller(user))
    }
}
