//! Handlers for the `/listings` resource.
//!
//! Only the surface the NDA workflow needs: sellers create and list their
//! own listings, anyone may read the public fields, and financial figures
//! sit behind the same gate as NDA-protected documents.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use dealroom_core::listing::{CreateListing, FinancialsView, ListingView};
use dealroom_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireSeller;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/listings
pub async fn create_listing(
    RequireSeller(user): RequireSeller,
    State(state): State<AppState>,
    Json(input): Json<CreateListing>,
) -> AppResult<(StatusCode, Json<DataResponse<ListingView>>)> {
    let listing = state.listings.create(&user.principal(), input).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: ListingView::from(&listing),
        }),
    ))
}

/// GET /api/v1/listings/mine
pub async fn list_my_listings(
    RequireSeller(user): RequireSeller,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ListingView>>>> {
    let listings = state.listings.list_mine(&user.principal()).await?;
    Ok(Json(DataResponse {
        data: listings.iter().map(ListingView::from).collect(),
    }))
}

/// GET /api/v1/listings/{id}
///
/// Public fields only; no authentication required.
pub async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ListingView>>> {
    let listing = state.listings.get(id).await?;
    Ok(Json(DataResponse {
        data: ListingView::from(&listing),
    }))
}

/// GET /api/v1/listings/{id}/financials
///
/// 403 `NDA_REQUIRED` unless the caller owns the listing or holds a valid NDA.
pub async fn get_financials(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<FinancialsView>>> {
    let financials = state.listings.financials(id, &auth.principal()).await?;
    Ok(Json(DataResponse { data: financials }))
}
