//! [`PgStore`]: the core repository traits over PostgreSQL.

use async_trait::async_trait;
use dealroom_core::documents::{Document, NewDocument};
use dealroom_core::error::CoreError;
use dealroom_core::listing::{Listing, NewListing};
use dealroom_core::nda::{Nda, NewNda};
use dealroom_core::repository::{
    DocumentRepository, ListingRepository, MarketplaceStore, NdaRepository,
};
use dealroom_core::types::DbId;
use sqlx::PgPool;

use crate::error::{classify, corrupt_row};
use crate::models::document::DocumentRow;
use crate::models::listing::ListingRow;
use crate::models::nda::NdaRow;
use crate::repositories::{DocumentRepo, ListingRepo, NdaRepo};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn listing(row: ListingRow) -> Result<Listing, CoreError> {
    let id = row.id;
    Listing::try_from(row).map_err(|e| corrupt_row("listings", id, e))
}

fn nda(row: NdaRow) -> Result<Nda, CoreError> {
    let id = row.id;
    Nda::try_from(row).map_err(|e| corrupt_row("ndas", id, e))
}

fn document(row: DocumentRow) -> Result<Document, CoreError> {
    let id = row.id;
    Document::try_from(row).map_err(|e| corrupt_row("listing_documents", id, e))
}

#[async_trait]
impl ListingRepository for PgStore {
    async fn find_listing(&self, id: DbId) -> Result<Option<Listing>, CoreError> {
        ListingRepo::find_by_id(&self.pool, id)
            .await
            .map_err(classify)?
            .map(listing)
            .transpose()
    }

    async fn insert_listing(&self, input: &NewListing) -> Result<Listing, CoreError> {
        listing(ListingRepo::create(&self.pool, input).await.map_err(classify)?)
    }

    async fn list_listings_for_seller(&self, seller_id: DbId) -> Result<Vec<Listing>, CoreError> {
        ListingRepo::list_by_seller(&self.pool, seller_id)
            .await
            .map_err(classify)?
            .into_iter()
            .map(listing)
            .collect()
    }
}

#[async_trait]
impl NdaRepository for PgStore {
    async fn find_nda(&self, id: DbId) -> Result<Option<Nda>, CoreError> {
        NdaRepo::find_by_id(&self.pool, id)
            .await
            .map_err(classify)?
            .map(nda)
            .transpose()
    }

    async fn find_nda_for(
        &self,
        listing_id: DbId,
        buyer_id: DbId,
    ) -> Result<Option<Nda>, CoreError> {
        NdaRepo::find_for_pair(&self.pool, listing_id, buyer_id)
            .await
            .map_err(classify)?
            .map(nda)
            .transpose()
    }

    async fn find_signed_nda(
        &self,
        listing_id: DbId,
        buyer_id: DbId,
    ) -> Result<Option<Nda>, CoreError> {
        NdaRepo::find_signed_for_pair(&self.pool, listing_id, buyer_id)
            .await
            .map_err(classify)?
            .map(nda)
            .transpose()
    }

    async fn insert_nda(&self, input: &NewNda) -> Result<Nda, CoreError> {
        nda(NdaRepo::create(&self.pool, input).await.map_err(classify)?)
    }

    async fn save_nda(&self, record: &Nda) -> Result<Nda, CoreError> {
        match NdaRepo::update(&self.pool, record).await.map_err(classify)? {
            Some(row) => nda(row),
            None => Err(CoreError::NotFound {
                entity: "NDA",
                id: record.id,
            }),
        }
    }

    async fn list_ndas_for_buyer(
        &self,
        buyer_id: DbId,
        listing_id: Option<DbId>,
    ) -> Result<Vec<Nda>, CoreError> {
        NdaRepo::list_for_buyer(&self.pool, buyer_id, listing_id)
            .await
            .map_err(classify)?
            .into_iter()
            .map(nda)
            .collect()
    }

    async fn list_ndas_for_listings(&self, listing_ids: &[DbId]) -> Result<Vec<Nda>, CoreError> {
        NdaRepo::list_for_listings(&self.pool, listing_ids)
            .await
            .map_err(classify)?
            .into_iter()
            .map(nda)
            .collect()
    }
}

#[async_trait]
impl DocumentRepository for PgStore {
    async fn find_document(&self, id: DbId) -> Result<Option<Document>, CoreError> {
        DocumentRepo::find_by_id(&self.pool, id)
            .await
            .map_err(classify)?
            .map(document)
            .transpose()
    }

    async fn list_documents_for_listing(
        &self,
        listing_id: DbId,
    ) -> Result<Vec<Document>, CoreError> {
        DocumentRepo::list_by_listing(&self.pool, listing_id)
            .await
            .map_err(classify)?
            .into_iter()
            .map(document)
            .collect()
    }

    async fn insert_document(&self, input: &NewDocument) -> Result<Document, CoreError> {
        document(DocumentRepo::create(&self.pool, input).await.map_err(classify)?)
    }

    async fn delete_document(&self, id: DbId) -> Result<bool, CoreError> {
        DocumentRepo::delete(&self.pool, id).await.map_err(classify)
    }

    async fn document_keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, CoreError> {
        DocumentRepo::keys_with_prefix(&self.pool, prefix)
            .await
            .map_err(classify)
    }
}

#[async_trait]
impl MarketplaceStore for PgStore {
    async fn ping(&self) -> Result<(), CoreError> {
        crate::health_check(&self.pool).await.map_err(classify)
    }
}
