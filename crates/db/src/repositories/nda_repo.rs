//! Repository for the `ndas` table.
//!
//! Status changes are decided in `dealroom_core::nda`; this layer only
//! persists whatever record it is handed.

use dealroom_core::nda::{Nda, NewNda};
use dealroom_core::types::DbId;
use sqlx::PgPool;

use crate::models::nda::NdaRow;

/// Column list for `ndas` queries.
const COLUMNS: &str = "\
    id, listing_id, buyer_id, status, ip_address, user_agent, \
    document_url, signed_document_url, requested_at, sent_at, signed_at, expires_at, \
    created_at, updated_at";

pub struct NdaRepo;

impl NdaRepo {
    /// Insert a `pending` NDA. Fails with a unique violation on
    /// `uq_ndas_listing_buyer` if the pair already has one.
    pub async fn create(pool: &PgPool, input: &NewNda) -> Result<NdaRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO ndas (listing_id, buyer_id, status, ip_address, user_agent, requested_at) \
             VALUES ($1, $2, 'pending', $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NdaRow>(&query)
            .bind(input.listing_id)
            .bind(input.buyer_id)
            .bind(&input.ip_address)
            .bind(&input.user_agent)
            .bind(input.requested_at)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<NdaRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM ndas WHERE id = $1");
        sqlx::query_as::<_, NdaRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The NDA for a (listing, buyer) pair, any status.
    pub async fn find_for_pair(
        pool: &PgPool,
        listing_id: DbId,
        buyer_id: DbId,
    ) -> Result<Option<NdaRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM ndas WHERE listing_id = $1 AND buyer_id = $2");
        sqlx::query_as::<_, NdaRow>(&query)
            .bind(listing_id)
            .bind(buyer_id)
            .fetch_optional(pool)
            .await
    }

    /// The pair's NDA if its stored status is `signed`. Expiry is left to
    /// the caller.
    pub async fn find_signed_for_pair(
        pool: &PgPool,
        listing_id: DbId,
        buyer_id: DbId,
    ) -> Result<Option<NdaRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ndas \
             WHERE listing_id = $1 AND buyer_id = $2 AND status = 'signed'"
        );
        sqlx::query_as::<_, NdaRow>(&query)
            .bind(listing_id)
            .bind(buyer_id)
            .fetch_optional(pool)
            .await
    }

    /// Overwrite the mutable columns. Returns `None` if the row is gone.
    pub async fn update(pool: &PgPool, nda: &Nda) -> Result<Option<NdaRow>, sqlx::Error> {
        let query = format!(
            "UPDATE ndas SET \
                status = $2, ip_address = $3, user_agent = $4, \
                document_url = $5, signed_document_url = $6, \
                requested_at = $7, sent_at = $8, signed_at = $9, expires_at = $10, \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NdaRow>(&query)
            .bind(nda.id)
            .bind(nda.status.as_str())
            .bind(&nda.ip_address)
            .bind(&nda.user_agent)
            .bind(&nda.document_url)
            .bind(&nda.signed_document_url)
            .bind(nda.requested_at)
            .bind(nda.sent_at)
            .bind(nda.signed_at)
            .bind(nda.expires_at)
            .fetch_optional(pool)
            .await
    }

    /// A buyer's NDAs, optionally for one listing, newest request first.
    pub async fn list_for_buyer(
        pool: &PgPool,
        buyer_id: DbId,
        listing_id: Option<DbId>,
    ) -> Result<Vec<NdaRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ndas \
             WHERE buyer_id = $1 AND ($2::BIGINT IS NULL OR listing_id = $2) \
             ORDER BY requested_at DESC, id DESC"
        );
        sqlx::query_as::<_, NdaRow>(&query)
            .bind(buyer_id)
            .bind(listing_id)
            .fetch_all(pool)
            .await
    }

    /// NDAs across a set of listings, newest request first.
    pub async fn list_for_listings(
        pool: &PgPool,
        listing_ids: &[DbId],
    ) -> Result<Vec<NdaRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ndas WHERE listing_id = ANY($1) \
             ORDER BY requested_at DESC, id DESC"
        );
        sqlx::query_as::<_, NdaRow>(&query)
            .bind(listing_ids)
            .fetch_all(pool)
            .await
    }
}
