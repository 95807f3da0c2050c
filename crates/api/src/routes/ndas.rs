//! Route definitions for the NDA workflow.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::ndas;
use crate::state::AppState;

/// Routes mounted at `/ndas`.
///
/// ```text
/// GET    /                                list_ndas
/// POST   /request                         request_nda
/// GET    /{id}                            get_nda
/// POST   /{id}/send                       send_nda
/// POST   /{id}/sign                       sign_nda
/// POST   /{id}/reject                     reject_nda
/// GET    /listing/{listing_id}/status     nda_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(ndas::list_ndas))
        .route("/request", post(ndas::request_nda))
        .route("/{id}", get(ndas::get_nda))
        .route("/{id}/send", post(ndas::send_nda))
        .route("/{id}/sign", post(ndas::sign_nda))
        .route("/{id}/reject", post(ndas::reject_nda))
        .route("/listing/{listing_id}/status", get(ndas::nda_status))
}
