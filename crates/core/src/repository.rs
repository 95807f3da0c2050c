//! Persistence contracts the services are written against.
//!
//! Method names are unique across the traits so calls on
//! `dyn MarketplaceStore` never need disambiguation.

use async_trait::async_trait;

use crate::documents::{Document, NewDocument};
use crate::error::CoreError;
use crate::listing::{Listing, NewListing};
use crate::nda::{Nda, NewNda};
use crate::types::DbId;

#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn find_listing(&self, id: DbId) -> Result<Option<Listing>, CoreError>;

    async fn insert_listing(&self, input: &NewListing) -> Result<Listing, CoreError>;

    async fn list_listings_for_seller(&self, seller_id: DbId) -> Result<Vec<Listing>, CoreError>;
}

#[async_trait]
pub trait NdaRepository: Send + Sync {
    async fn find_nda(&self, id: DbId) -> Result<Option<Nda>, CoreError>;

    /// The NDA for a (listing, buyer) pair, whatever its status.
    async fn find_nda_for(&self, listing_id: DbId, buyer_id: DbId)
        -> Result<Option<Nda>, CoreError>;

    /// The NDA for a (listing, buyer) pair whose stored status is `signed`.
    /// Expiry is not checked here.
    async fn find_signed_nda(
        &self,
        listing_id: DbId,
        buyer_id: DbId,
    ) -> Result<Option<Nda>, CoreError>;

    async fn insert_nda(&self, input: &NewNda) -> Result<Nda, CoreError>;

    /// Overwrite every mutable column of the row. Last write wins.
    async fn save_nda(&self, nda: &Nda) -> Result<Nda, CoreError>;

    /// Newest `requested_at` first.
    async fn list_ndas_for_buyer(
        &self,
        buyer_id: DbId,
        listing_id: Option<DbId>,
    ) -> Result<Vec<Nda>, CoreError>;

    /// Newest `requested_at` first.
    async fn list_ndas_for_listings(&self, listing_ids: &[DbId]) -> Result<Vec<Nda>, CoreError>;
}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn find_document(&self, id: DbId) -> Result<Option<Document>, CoreError>;

    /// Oldest first.
    async fn list_documents_for_listing(&self, listing_id: DbId)
        -> Result<Vec<Document>, CoreError>;

    async fn insert_document(&self, input: &NewDocument) -> Result<Document, CoreError>;

    /// Returns whether a row was removed.
    async fn delete_document(&self, id: DbId) -> Result<bool, CoreError>;

    /// Storage keys of every document row whose key starts with `prefix`.
    async fn document_keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, CoreError>;
}

/// Everything the services need from the database, plus a liveness probe.
#[async_trait]
pub trait MarketplaceStore: ListingRepository + NdaRepository + DocumentRepository {
    async fn ping(&self) -> Result<(), CoreError>;
}
