//! Integration tests for `PgStore` against a real database:
//! - listings round-trip their financial columns
//! - the `(listing_id, buyer_id)` pair is unique and surfaces as `Conflict`
//! - `save_nda` overwrites the mutable columns
//! - signed lookups ignore other statuses
//! - document rows delete and list by key prefix

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use dealroom_core::documents::{DocumentType, NewDocument};
use dealroom_core::error::CoreError;
use dealroom_core::listing::{Financials, ListingStatus, NewListing};
use dealroom_core::nda::{NdaStatus, NewNda};
use dealroom_core::repository::{
    DocumentRepository, ListingRepository, MarketplaceStore, NdaRepository,
};
use dealroom_core::types::DbId;
use dealroom_db::PgStore;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_listing(seller_id: DbId, title: &str) -> NewListing {
    NewListing {
        seller_id,
        title: title.to_string(),
        description: "Established neighbourhood cafe".into(),
        industry: "Food & Beverage".into(),
        location: "Portland, OR".into(),
        asking_price: 325_000,
        status: ListingStatus::Active,
        financials: Financials {
            revenue: Some(780_000),
            profit: Some(120_000),
            cash_flow: Some(140_000),
            ebitda: None,
            year_established: Some(2011),
            employees: Some(9),
        },
    }
}

fn new_nda(listing_id: DbId, buyer_id: DbId) -> NewNda {
    NewNda {
        listing_id,
        buyer_id,
        ip_address: Some("203.0.113.7".into()),
        user_agent: Some("integration-test".into()),
        requested_at: Utc::now(),
    }
}

fn new_document(listing_id: DbId, key: &str) -> NewDocument {
    NewDocument {
        listing_id,
        name: "2023 P&L.pdf".into(),
        document_type: DocumentType::FinancialStatement,
        storage_key: key.to_string(),
        file_size: 48_213,
        mime_type: "application/pdf".into(),
        requires_nda: true,
        is_encrypted: true,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_listing_round_trip(pool: PgPool) {
    let store = PgStore::new(pool);
    store.ping().await.unwrap();

    let created = store.insert_listing(&new_listing(10, "Cafe")).await.unwrap();
    let found = store.find_listing(created.id).await.unwrap().unwrap();
    assert_eq!(found, created);
    assert_eq!(found.financials.employees, Some(9));

    store.insert_listing(&new_listing(10, "Second Cafe")).await.unwrap();
    store.insert_listing(&new_listing(11, "Not mine")).await.unwrap();
    assert_eq!(store.list_listings_for_seller(10).await.unwrap().len(), 2);
    assert!(store.find_listing(999_999).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_nda_pair_unique(pool: PgPool) {
    let store = PgStore::new(pool);
    let listing = store.insert_listing(&new_listing(10, "Cafe")).await.unwrap();

    let nda = store.insert_nda(&new_nda(listing.id, 20)).await.unwrap();
    assert_eq!(nda.status, NdaStatus::Pending);

    assert_matches!(
        store.insert_nda(&new_nda(listing.id, 20)).await,
        Err(CoreError::Conflict(msg)) if msg.contains("uq_ndas_listing_buyer")
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_save_nda_overwrites(pool: PgPool) {
    let store = PgStore::new(pool);
    let listing = store.insert_listing(&new_listing(10, "Cafe")).await.unwrap();
    let mut nda = store.insert_nda(&new_nda(listing.id, 20)).await.unwrap();

    assert!(store.find_signed_nda(listing.id, 20).await.unwrap().is_none());

    let now = Utc::now();
    nda.status = NdaStatus::Signed;
    nda.signed_at = Some(now);
    nda.expires_at = Some(now + Duration::days(365));
    nda.signed_document_url = Some("https://docs.example.com/signed.pdf".into());
    let saved = store.save_nda(&nda).await.unwrap();
    assert_eq!(saved.status, NdaStatus::Signed);

    let signed = store.find_signed_nda(listing.id, 20).await.unwrap().unwrap();
    assert_eq!(signed.id, nda.id);
    assert_eq!(signed.signed_document_url, nda.signed_document_url);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_nda_listing_queries(pool: PgPool) {
    let store = PgStore::new(pool);
    let a = store.insert_listing(&new_listing(10, "A")).await.unwrap();
    let b = store.insert_listing(&new_listing(10, "B")).await.unwrap();

    let mut first = new_nda(a.id, 20);
    first.requested_at = Utc::now() - Duration::hours(1);
    store.insert_nda(&first).await.unwrap();
    store.insert_nda(&new_nda(b.id, 20)).await.unwrap();
    store.insert_nda(&new_nda(a.id, 21)).await.unwrap();

    let mine = store.list_ndas_for_buyer(20, None).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert_eq!(mine[0].listing_id, b.id);
    assert_eq!(store.list_ndas_for_buyer(20, Some(a.id)).await.unwrap().len(), 1);
    assert_eq!(store.list_ndas_for_listings(&[a.id]).await.unwrap().len(), 2);
    assert_eq!(store.list_ndas_for_listings(&[a.id, b.id]).await.unwrap().len(), 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_document_rows(pool: PgPool) {
    let store = PgStore::new(pool);
    let listing = store.insert_listing(&new_listing(10, "Cafe")).await.unwrap();
    let prefix = format!("listings/{}/", listing.id);

    let doc = store
        .insert_document(&new_document(listing.id, &format!("{prefix}financial_statement/a1b2c3d4_PL.pdf")))
        .await
        .unwrap();
    assert_eq!(doc.document_type, DocumentType::FinancialStatement);
    assert!(doc.requires_nda);

    assert_eq!(store.list_documents_for_listing(listing.id).await.unwrap().len(), 1);
    assert_eq!(store.document_keys_with_prefix(&prefix).await.unwrap(), vec![doc.storage_key.clone()]);
    assert!(store.document_keys_with_prefix("listings/0/").await.unwrap().is_empty());

    assert!(store.delete_document(doc.id).await.unwrap());
    assert!(!store.delete_document(doc.id).await.unwrap());
    assert!(store.find_document(doc.id).await.unwrap().is_none());
}
