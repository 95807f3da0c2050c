//! In-memory collaborators.
//!
//! Used by the service tests and the HTTP tests so neither needs PostgreSQL
//! or an object store. They follow the same contracts as the real
//! implementations, including the unique `(listing_id, buyer_id)` rule.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::clock::{Clock, SystemClock};
use crate::documents::{Document, NewDocument};
use crate::error::CoreError;
use crate::listing::{Financials, Listing, ListingStatus, NewListing};
use crate::nda::{Nda, NdaStatus, NewNda};
use crate::repository::{DocumentRepository, ListingRepository, MarketplaceStore, NdaRepository};
use crate::storage::{DocumentStore, PutObject, SignedUrl, StorageError, StoredObject, UrlMethod};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Database stand-in
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InMemoryStore {
    next_id: AtomicI64,
    listings: RwLock<BTreeMap<DbId, Listing>>,
    ndas: RwLock<BTreeMap<DbId, Nda>>,
    documents: RwLock<BTreeMap<DbId, Document>>,
    fail_document_inserts: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> DbId {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Insert an active listing with placeholder fields.
    pub async fn seed_listing(&self, seller_id: DbId, title: &str) -> Listing {
        let input = NewListing {
            seller_id,
            title: title.to_string(),
            description: format!("{title} for sale"),
            industry: "Services".into(),
            location: "Remote".into(),
            asking_price: 250_000,
            status: ListingStatus::Active,
            financials: Financials {
                revenue: Some(500_000),
                profit: Some(90_000),
                ..Financials::default()
            },
        };
        self.store_listing(&input).await
    }

    /// Make every following `insert_document` fail.
    pub fn fail_document_inserts(&self, fail: bool) {
        self.fail_document_inserts.store(fail, Ordering::Relaxed);
    }

    async fn store_listing(&self, input: &NewListing) -> Listing {
        let now = Utc::now();
        let listing = Listing {
            id: self.next_id(),
            seller_id: input.seller_id,
            title: input.title.clone(),
            description: input.description.clone(),
            industry: input.industry.clone(),
            location: input.location.clone(),
            asking_price: input.asking_price,
            status: input.status,
            financials: input.financials.clone(),
            created_at: now,
            updated_at: now,
        };
        self.listings.write().await.insert(listing.id, listing.clone());
        listing
    }
}

fn newest_first(ndas: &mut [Nda]) {
    ndas.sort_by(|a, b| b.requested_at.cmp(&a.requested_at).then(b.id.cmp(&a.id)));
}

#[async_trait]
impl ListingRepository for InMemoryStore {
    async fn find_listing(&self, id: DbId) -> Result<Option<Listing>, CoreError> {
        Ok(self.listings.read().await.get(&id).cloned())
    }

    async fn insert_listing(&self, input: &NewListing) -> Result<Listing, CoreError> {
        Ok(self.store_listing(input).await)
    }

    async fn list_listings_for_seller(&self, seller_id: DbId) -> Result<Vec<Listing>, CoreError> {
        let mut listings: Vec<Listing> = self
            .listings
            .read()
            .await
            .values()
            .filter(|l| l.seller_id == seller_id)
            .cloned()
            .collect();
        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(listings)
    }
}

#[async_trait]
impl NdaRepository for InMemoryStore {
    async fn find_nda(&self, id: DbId) -> Result<Option<Nda>, CoreError> {
        Ok(self.ndas.read().await.get(&id).cloned())
    }

    async fn find_nda_for(
        &self,
        listing_id: DbId,
        buyer_id: DbId,
    ) -> Result<Option<Nda>, CoreError> {
        Ok(self
            .ndas
            .read()
            .await
            .values()
            .find(|n| n.listing_id == listing_id && n.buyer_id == buyer_id)
            .cloned())
    }

    async fn find_signed_nda(
        &self,
        listing_id: DbId,
        buyer_id: DbId,
    ) -> Result<Option<Nda>, CoreError> {
        Ok(self
            .find_nda_for(listing_id, buyer_id)
            .await?
            .filter(|n| n.status == NdaStatus::Signed))
    }

    async fn insert_nda(&self, input: &NewNda) -> Result<Nda, CoreError> {
        let mut ndas = self.ndas.write().await;
        if ndas
            .values()
            .any(|n| n.listing_id == input.listing_id && n.buyer_id == input.buyer_id)
        {
            return Err(CoreError::Conflict(
                "Duplicate value violates unique constraint 'uq_ndas_listing_buyer'".into(),
            ));
        }
        let nda = Nda {
            id: self.next_id(),
            listing_id: input.listing_id,
            buyer_id: input.buyer_id,
            status: NdaStatus::Pending,
            ip_address: input.ip_address.clone(),
            user_agent: input.user_agent.clone(),
            document_url: None,
            signed_document_url: None,
            requested_at: input.requested_at,
            sent_at: None,
            signed_at: None,
            expires_at: None,
        };
        ndas.insert(nda.id, nda.clone());
        Ok(nda)
    }

    async fn save_nda(&self, nda: &Nda) -> Result<Nda, CoreError> {
        let mut ndas = self.ndas.write().await;
        match ndas.get_mut(&nda.id) {
            Some(slot) => {
                *slot = nda.clone();
                Ok(nda.clone())
            }
            None => Err(CoreError::NotFound {
                entity: "NDA",
                id: nda.id,
            }),
        }
    }

    async fn list_ndas_for_buyer(
        &self,
        buyer_id: DbId,
        listing_id: Option<DbId>,
    ) -> Result<Vec<Nda>, CoreError> {
        let mut ndas: Vec<Nda> = self
            .ndas
            .read()
            .await
            .values()
            .filter(|n| n.buyer_id == buyer_id)
            .filter(|n| listing_id.map_or(true, |id| n.listing_id == id))
            .cloned()
            .collect();
        newest_first(&mut ndas);
        Ok(ndas)
    }

    async fn list_ndas_for_listings(&self, listing_ids: &[DbId]) -> Result<Vec<Nda>, CoreError> {
        let mut ndas: Vec<Nda> = self
            .ndas
            .read()
            .await
            .values()
            .filter(|n| listing_ids.contains(&n.listing_id))
            .cloned()
            .collect();
        newest_first(&mut ndas);
        Ok(ndas)
    }
}

#[async_trait]
impl DocumentRepository for InMemoryStore {
    async fn find_document(&self, id: DbId) -> Result<Option<Document>, CoreError> {
        Ok(self.documents.read().await.get(&id).cloned())
    }

    async fn list_documents_for_listing(
        &self,
        listing_id: DbId,
    ) -> Result<Vec<Document>, CoreError> {
        let mut docs: Vec<Document> = self
            .documents
            .read()
            .await
            .values()
            .filter(|d| d.listing_id == listing_id)
            .cloned()
            .collect();
        docs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(docs)
    }

    async fn insert_document(&self, input: &NewDocument) -> Result<Document, CoreError> {
        if self.fail_document_inserts.load(Ordering::Relaxed) {
            return Err(CoreError::Internal("document insert failed".into()));
        }
        let doc = Document {
            id: self.next_id(),
            listing_id: input.listing_id,
            name: input.name.clone(),
            document_type: input.document_type,
            storage_key: input.storage_key.clone(),
            file_size: input.file_size,
            mime_type: input.mime_type.clone(),
            requires_nda: input.requires_nda,
            is_encrypted: input.is_encrypted,
            created_at: Utc::now(),
        };
        self.documents.write().await.insert(doc.id, doc.clone());
        Ok(doc)
    }

    async fn delete_document(&self, id: DbId) -> Result<bool, CoreError> {
        Ok(self.documents.write().await.remove(&id).is_some())
    }

    async fn document_keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, CoreError> {
        Ok(self
            .documents
            .read()
            .await
            .values()
            .filter(|d| d.storage_key.starts_with(prefix))
            .map(|d| d.storage_key.clone())
            .collect())
    }
}

#[async_trait]
impl MarketplaceStore for InMemoryStore {
    async fn ping(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Blob store stand-in
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct MemoryObject {
    object: PutObject,
    stored_at: Timestamp,
}

/// Keeps every written object and hands out fake signed URLs.
pub struct MemoryDocumentStore {
    objects: RwLock<HashMap<String, MemoryObject>>,
    clock: Arc<dyn Clock>,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
    fail_heads: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Stamp `last_modified` and URL expiry from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            clock,
            fail_puts: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            fail_heads: AtomicBool::new(false),
        }
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::Relaxed);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::Relaxed);
    }

    /// Make existence checks fail as an unreachable backend would.
    pub fn fail_heads(&self, fail: bool) {
        self.fail_heads.store(fail, Ordering::Relaxed);
    }

    /// The write recorded under `key`, if any.
    pub async fn object(&self, key: &str) -> Option<PutObject> {
        self.objects.read().await.get(key).map(|o| o.object.clone())
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn put(&self, object: PutObject) -> Result<(), StorageError> {
        if self.fail_puts.load(Ordering::Relaxed) {
            return Err(StorageError::Backend("put rejected".into()));
        }
        let stored_at = self.clock.now();
        self.objects
            .write()
            .await
            .insert(object.key.clone(), MemoryObject { object, stored_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        if self.fail_deletes.load(Ordering::Relaxed) {
            return Err(StorageError::Backend("delete rejected".into()));
        }
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn sign_url(
        &self,
        key: &str,
        ttl: Duration,
        method: UrlMethod,
    ) -> Result<SignedUrl, StorageError> {
        let ttl_chrono = chrono::Duration::from_std(ttl)
            .map_err(|e| StorageError::Invalid(format!("ttl out of range: {e}")))?;
        let expires_at = self.clock.now() + ttl_chrono;
        let verb = match method {
            UrlMethod::Get => "GET",
            UrlMethod::Put => "PUT",
        };
        Ok(SignedUrl {
            url: format!(
                "memory://documents/{key}?method={verb}&expires={}",
                expires_at.timestamp()
            ),
            expires_in: ttl,
            expires_at,
        })
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        if self.fail_heads.load(Ordering::Relaxed) {
            return Err(StorageError::Backend("head rejected".into()));
        }
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>, StorageError> {
        let mut objects: Vec<StoredObject> = self
            .objects
            .read()
            .await
            .values()
            .filter(|o| o.object.key.starts_with(prefix))
            .map(|o| StoredObject {
                key: o.object.key.clone(),
                size: o.object.bytes.len() as i64,
                last_modified: Some(o.stored_at),
            })
            .collect();
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }
}
