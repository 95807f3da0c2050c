//! `ndas` rows.

use dealroom_core::error::CoreError;
use dealroom_core::nda::Nda;
use dealroom_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `ndas` table. `status` holds the lowercase status name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NdaRow {
    pub id: DbId,
    pub listing_id: DbId,
    pub buyer_id: DbId,
    pub status: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub document_url: Option<String>,
    pub signed_document_url: Option<String>,
    pub requested_at: Timestamp,
    pub sent_at: Option<Timestamp>,
    pub signed_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<NdaRow> for Nda {
    type Error = CoreError;

    fn try_from(row: NdaRow) -> Result<Self, Self::Error> {
        Ok(Nda {
            id: row.id,
            listing_id: row.listing_id,
            buyer_id: row.buyer_id,
            status: row.status.parse()?,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            document_url: row.document_url,
            signed_document_url: row.signed_document_url,
            requested_at: row.requested_at,
            sent_at: row.sent_at,
            signed_at: row.signed_at,
            expires_at: row.expires_at,
        })
    }
}
