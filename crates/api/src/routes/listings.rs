//! Route definitions for listings and their documents.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use dealroom_core::documents::MAX_UPLOAD_BYTES;

use crate::handlers::{documents, listings};
use crate::state::AppState;

/// Multipart framing and the text fields on top of the largest accepted file.
/// Oversized files still reach the service, which answers 413 itself.
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

/// Routes mounted at `/listings`.
///
/// ```text
/// POST   /                       create_listing
/// GET    /mine                   list_my_listings
/// GET    /{id}                   get_listing
/// GET    /{id}/financials        get_financials
/// GET    /{id}/documents         list_documents
/// POST   /{id}/documents         upload_document (multipart)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(listings::create_listing))
        .route("/mine", get(listings::list_my_listings))
        .route("/{id}", get(listings::get_listing))
        .route("/{id}/financials", get(listings::get_financials))
        .route(
            "/{id}/documents",
            get(documents::list_documents)
                .post(documents::upload_document)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
}
