pub mod documents;
pub mod health;
pub mod listings;
pub mod ndas;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /listings                                   create (seller)
/// /listings/mine                              own listings (seller)
/// /listings/{id}                              public view
/// /listings/{id}/financials                   NDA-gated financials
/// /listings/{id}/documents                    list, upload (multipart)
///
/// /documents/{id}                             download URL (GET), delete (DELETE)
///
/// /ndas                                       list (?as_seller, ?listing_id)
/// /ndas/request                               request (POST)
/// /ndas/{id}                                  get
/// /ndas/{id}/send                             send (POST, seller)
/// /ndas/{id}/sign                             sign (POST, buyer)
/// /ndas/{id}/reject                           reject (POST, seller)
/// /ndas/listing/{listing_id}/status           access status
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/listings", listings::router())
        .nest("/documents", documents::router())
        .nest("/ndas", ndas::router())
}
