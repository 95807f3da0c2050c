//! Repository for the `listing_documents` table.

use dealroom_core::documents::NewDocument;
use dealroom_core::types::DbId;
use sqlx::PgPool;

use crate::models::document::DocumentRow;

/// Column list for `listing_documents` queries.
const COLUMNS: &str = "\
    id, listing_id, name, document_type, storage_key, file_size, mime_type, \
    requires_nda, is_encrypted, created_at";

pub struct DocumentRepo;

impl DocumentRepo {
    /// Register a document whose bytes are already stored.
    pub async fn create(pool: &PgPool, input: &NewDocument) -> Result<DocumentRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO listing_documents \
                (listing_id, name, document_type, storage_key, file_size, mime_type, \
                 requires_nda, is_encrypted) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DocumentRow>(&query)
            .bind(input.listing_id)
            .bind(&input.name)
            .bind(input.document_type.as_str())
            .bind(&input.storage_key)
            .bind(input.file_size)
            .bind(&input.mime_type)
            .bind(input.requires_nda)
            .bind(input.is_encrypted)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<DocumentRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM listing_documents WHERE id = $1");
        sqlx::query_as::<_, DocumentRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A listing's documents, oldest first.
    pub async fn list_by_listing(
        pool: &PgPool,
        listing_id: DbId,
    ) -> Result<Vec<DocumentRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM listing_documents WHERE listing_id = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, DocumentRow>(&query)
            .bind(listing_id)
            .fetch_all(pool)
            .await
    }

    /// Hard delete. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM listing_documents WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Storage keys starting with `prefix`.
    pub async fn keys_with_prefix(pool: &PgPool, prefix: &str) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT storage_key FROM listing_documents WHERE starts_with(storage_key, $1)",
        )
        .bind(prefix)
        .fetch_all(pool)
        .await
    }
}
