//! `listing_documents` rows.

use dealroom_core::documents::Document;
use dealroom_core::error::CoreError;
use dealroom_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `listing_documents` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DocumentRow {
    pub id: DbId,
    pub listing_id: DbId,
    pub name: String,
    pub document_type: String,
    pub storage_key: String,
    pub file_size: i64,
    pub mime_type: String,
    pub requires_nda: bool,
    pub is_encrypted: bool,
    pub created_at: Timestamp,
}

impl TryFrom<DocumentRow> for Document {
    type Error = CoreError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        Ok(Document {
            id: row.id,
            listing_id: row.listing_id,
            name: row.name,
            document_type: row.document_type.parse()?,
            storage_key: row.storage_key,
            file_size: row.file_size,
            mime_type: row.mime_type,
            requires_nda: row.requires_nda,
            is_encrypted: row.is_encrypted,
            created_at: row.created_at,
        })
    }
}
