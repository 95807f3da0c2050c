use axum::routing::get;
use axum::Router;

use crate::handlers::documents;
use crate::state::AppState;

/// Routes mounted at `/documents`.
///
/// ```text
/// GET    /{id}                   download_document (signed URL)
/// DELETE /{id}                   delete_document
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{id}",
        get(documents::download_document).delete(documents::delete_document),
    )
}
