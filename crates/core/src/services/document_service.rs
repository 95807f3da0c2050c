//! Document upload, download credentials, deletion and orphan reconciliation.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::access::{AccessDecision, DocumentListing, DocumentView};
use crate::clock::Clock;
use crate::documents::{
    generate_storage_key, validate_mime_type, validate_upload_size, Document, DocumentSummary,
    DocumentType, NewDocument, STORAGE_ROOT,
};
use crate::error::CoreError;
use crate::listing::Listing;
use crate::principal::Principal;
use crate::repository::MarketplaceStore;
use crate::services::access_gate::AccessGate;
use crate::storage::{DocumentStore, PutObject, UrlMethod, DEFAULT_URL_TTL};
use crate::types::{DbId, Timestamp};

/// One file as received from the client.
#[derive(Debug, Clone)]
pub struct UploadDocument {
    pub filename: String,
    pub content_type: String,
    pub document_type: DocumentType,
    pub requires_nda: bool,
    pub bytes: Vec<u8>,
}

/// A time-limited link to a document's bytes.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DownloadCredential {
    pub document: DocumentSummary,
    pub download_url: String,
    pub expires_in: u64,
    pub expires_at: Timestamp,
}

/// Outcome of one orphan sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub scanned: usize,
    pub deleted: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct DocumentService {
    store: Arc<dyn MarketplaceStore>,
    blobs: Arc<dyn DocumentStore>,
    gate: AccessGate,
    clock: Arc<dyn Clock>,
    url_ttl: Duration,
}

impl DocumentService {
    pub fn new(
        store: Arc<dyn MarketplaceStore>,
        blobs: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gate: AccessGate::new(store.clone(), clock.clone()),
            store,
            blobs,
            clock,
            url_ttl: DEFAULT_URL_TTL,
        }
    }

    /// Lifetime of issued download URLs, never longer than [`DEFAULT_URL_TTL`].
    pub fn with_url_ttl(mut self, ttl: Duration) -> Self {
        self.url_ttl = ttl.min(DEFAULT_URL_TTL);
        self
    }

    pub fn url_ttl(&self) -> Duration {
        self.url_ttl
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    /// Store the bytes (encrypted at rest) and register the document row.
    ///
    /// The blob is written first. If the row insert then fails the blob is
    /// deleted again; a failure of that cleanup is left for
    /// [`sweep_orphans`](Self::sweep_orphans).
    pub async fn upload(
        &self,
        listing_id: DbId,
        uploader: &Principal,
        upload: UploadDocument,
    ) -> Result<Document, CoreError> {
        uploader.ensure_active()?;
        let listing = self.listing(listing_id).await?;
        if !listing.is_owned_by(uploader.id) {
            return Err(CoreError::Forbidden(
                "You don't have permission to upload documents to this listing".into(),
            ));
        }
        validate_upload_size(upload.bytes.len())?;
        let mime_type = validate_mime_type(&upload.content_type)?;

        let storage_key = generate_storage_key(listing_id, upload.document_type, &upload.filename);
        let file_size = upload.bytes.len() as i64;

        let mut metadata = BTreeMap::new();
        metadata.insert("original-filename".to_string(), upload.filename.clone());
        metadata.insert("uploaded-by".to_string(), uploader.id.to_string());

        self.blobs
            .put(PutObject {
                key: storage_key.clone(),
                bytes: upload.bytes,
                content_type: mime_type.clone(),
                encrypt: true,
                metadata,
            })
            .await?;

        let input = NewDocument {
            listing_id,
            name: upload.filename,
            document_type: upload.document_type,
            storage_key: storage_key.clone(),
            file_size,
            mime_type,
            requires_nda: upload.requires_nda,
            is_encrypted: true,
        };
        let document = match self.store.insert_document(&input).await {
            Ok(document) => document,
            Err(e) => {
                if let Err(cleanup) = self.blobs.delete(&storage_key).await {
                    tracing::warn!(
                        storage_key = %storage_key,
                        error = %cleanup,
                        "Failed to remove blob after document insert failed"
                    );
                }
                return Err(e);
            }
        };

        tracing::info!(
            document_id = document.id,
            listing_id,
            user_id = uploader.id,
            storage_key = %document.storage_key,
            file_size,
            requires_nda = document.requires_nda,
            "Document uploaded"
        );
        Ok(document)
    }

    /// Load a document and make sure `requester` may open it.
    pub async fn check_access(
        &self,
        document_id: DbId,
        requester: &Principal,
    ) -> Result<Document, CoreError> {
        requester.ensure_active()?;
        let document = self.document(document_id).await?;
        match self.gate.check_document_access(&document, requester).await? {
            AccessDecision::Allowed => Ok(document),
            AccessDecision::Denied { reason } => {
                tracing::info!(
                    document_id,
                    user_id = requester.id,
                    %reason,
                    "Document access denied"
                );
                Err(CoreError::AccessDenied { reason })
            }
        }
    }

    /// Signed GET URL for a document the requester may open.
    pub async fn issue_download_credential(
        &self,
        document_id: DbId,
        requester: &Principal,
    ) -> Result<DownloadCredential, CoreError> {
        let document = self.check_access(document_id, requester).await?;

        if !self.blobs.exists(&document.storage_key).await? {
            tracing::error!(
                document_id,
                storage_key = %document.storage_key,
                "Document row has no stored object"
            );
            return Err(not_found_document(document_id));
        }

        let signed = self
            .blobs
            .sign_url(&document.storage_key, self.url_ttl, UrlMethod::Get)
            .await?;

        tracing::info!(
            document_id,
            user_id = requester.id,
            expires_at = %signed.expires_at,
            "Download URL issued"
        );
        Ok(DownloadCredential {
            document: DocumentSummary::from(&document),
            download_url: signed.url,
            expires_in: signed.expires_in.as_secs(),
            expires_at: signed.expires_at,
        })
    }

    /// Hard delete by the listing's seller. The row always goes; the blob
    /// delete is best effort.
    pub async fn delete(&self, document_id: DbId, requester: &Principal) -> Result<Document, CoreError> {
        requester.ensure_active()?;
        let document = self.document(document_id).await?;
        let owned = self
            .store
            .find_listing(document.listing_id)
            .await?
            .is_some_and(|listing| listing.is_owned_by(requester.id));
        if !owned {
            return Err(CoreError::Forbidden(
                "You don't have permission to delete this document".into(),
            ));
        }

        if let Err(e) = self.blobs.delete(&document.storage_key).await {
            tracing::warn!(
                document_id,
                storage_key = %document.storage_key,
                error = %e,
                "Failed to delete document blob"
            );
        }
        self.store.delete_document(document_id).await?;

        tracing::info!(document_id, user_id = requester.id, "Document deleted");
        Ok(document)
    }

    /// Every document of a listing with a per-caller `accessible` flag.
    /// Access is resolved once for the whole listing.
    pub async fn list_documents(
        &self,
        listing_id: DbId,
        requester: &Principal,
    ) -> Result<DocumentListing, CoreError> {
        requester.ensure_active()?;
        let listing = self.listing(listing_id).await?;
        let access = self.gate.listing_access(&listing, requester).await?;
        let documents = self.store.list_documents_for_listing(listing_id).await?;

        Ok(DocumentListing {
            documents: documents
                .iter()
                .map(|doc| DocumentView::new(doc, access))
                .collect(),
            has_nda_access: access.has_protected_access(),
        })
    }

    /// Delete blobs under `prefix` (default: every listing) that no document
    /// row references and that are older than `grace`.
    ///
    /// Safe to run repeatedly; a second run over the same state deletes
    /// nothing.
    pub async fn sweep_orphans(
        &self,
        prefix: Option<&str>,
        grace: chrono::Duration,
    ) -> Result<SweepReport, CoreError> {
        let prefix = prefix.unwrap_or(STORAGE_ROOT);
        let objects = self.blobs.list(prefix).await?;
        let known: HashSet<String> = self
            .store
            .document_keys_with_prefix(prefix)
            .await?
            .into_iter()
            .collect();
        let cutoff = self.clock.now() - grace;

        let mut report = SweepReport {
            scanned: objects.len(),
            ..SweepReport::default()
        };
        for object in objects {
            if known.contains(&object.key) {
                continue;
            }
            // Objects without a timestamp may belong to an upload in flight.
            let Some(modified) = object.last_modified else {
                continue;
            };
            if modified > cutoff {
                continue;
            }
            match self.blobs.delete(&object.key).await {
                Ok(()) => {
                    tracing::info!(storage_key = %object.key, size = object.size, "Orphaned blob removed");
                    report.deleted += 1;
                }
                Err(e) => {
                    tracing::warn!(storage_key = %object.key, error = %e, "Failed to remove orphaned blob");
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    async fn document(&self, id: DbId) -> Result<Document, CoreError> {
        self.store
            .find_document(id)
            .await?
            .ok_or_else(|| not_found_document(id))
    }

    async fn listing(&self, id: DbId) -> Result<Listing, CoreError> {
        self.store
            .find_listing(id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Listing",
                id,
            })
    }
}

fn not_found_document(id: DbId) -> CoreError {
    CoreError::NotFound {
        entity: "Document",
        id,
    }
}
