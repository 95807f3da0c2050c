//! Minimal listing surface: create, read and the NDA-gated financials.

use std::sync::Arc;

use validator::Validate;

use crate::access::AccessDecision;
use crate::error::CoreError;
use crate::listing::{CreateListing, FinancialsView, Listing, ListingStatus, NewListing};
use crate::principal::Principal;
use crate::repository::MarketplaceStore;
use crate::services::access_gate::AccessGate;
use crate::types::DbId;

#[derive(Clone)]
pub struct ListingService {
    store: Arc<dyn MarketplaceStore>,
    gate: AccessGate,
}

impl ListingService {
    pub fn new(store: Arc<dyn MarketplaceStore>, gate: AccessGate) -> Self {
        Self { store, gate }
    }

    /// New listings start in `draft`.
    pub async fn create(
        &self,
        seller: &Principal,
        input: CreateListing,
    ) -> Result<Listing, CoreError> {
        seller.ensure_active()?;
        input
            .validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;

        let listing = self
            .store
            .insert_listing(&NewListing {
                seller_id: seller.id,
                title: input.title,
                description: input.description,
                industry: input.industry,
                location: input.location,
                asking_price: input.asking_price,
                status: ListingStatus::Draft,
                financials: input.financials,
            })
            .await?;

        tracing::info!(listing_id = listing.id, user_id = seller.id, "Listing created");
        Ok(listing)
    }

    pub async fn get(&self, listing_id: DbId) -> Result<Listing, CoreError> {
        self.store
            .find_listing(listing_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Listing",
                id: listing_id,
            })
    }

    pub async fn list_mine(&self, seller: &Principal) -> Result<Vec<Listing>, CoreError> {
        seller.ensure_active()?;
        self.store.list_listings_for_seller(seller.id).await
    }

    /// Financial figures, shown only to the owner and to valid NDA holders.
    pub async fn financials(
        &self,
        listing_id: DbId,
        requester: &Principal,
    ) -> Result<FinancialsView, CoreError> {
        requester.ensure_active()?;
        let listing = self.get(listing_id).await?;
        match self.gate.listing_access(&listing, requester).await?.decide(true) {
            AccessDecision::Allowed => Ok(FinancialsView {
                listing_id,
                financials: listing.financials,
            }),
            AccessDecision::Denied { reason } => Err(CoreError::AccessDenied { reason }),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::clock::ManualClock;
    use crate::listing::Financials;
    use crate::memory::InMemoryStore;
    use crate::nda::ActorContext;
    use crate::services::nda_service::NdaService;

    fn create(title: &str) -> CreateListing {
        CreateListing {
            title: title.to_string(),
            description: "Two-bay auto repair shop".into(),
            industry: "Automotive".into(),
            location: "Denver, CO".into(),
            asking_price: 650_000,
            financials: Financials {
                revenue: Some(1_200_000),
                profit: Some(210_000),
                ..Financials::default()
            },
        }
    }

    #[tokio::test]
    async fn create_and_list() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::default());
        let svc = ListingService::new(store.clone(), AccessGate::new(store, clock));
        let seller = Principal::active(7);

        let listing = svc.create(&seller, create("Auto Repair")).await.unwrap();
        assert_eq!(listing.status, ListingStatus::Draft);
        assert_eq!(listing.seller_id, 7);
        assert_eq!(svc.list_mine(&seller).await.unwrap().len(), 1);
        assert!(svc.list_mine(&Principal::active(8)).await.unwrap().is_empty());

        assert_matches!(
            svc.create(&seller, create("")).await,
            Err(CoreError::Validation(_))
        );
    }

    #[tokio::test]
    async fn financials_share_the_document_gate() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::default());
        let gate = AccessGate::new(store.clone(), clock.clone());
        let svc = ListingService::new(store.clone(), gate);
        let ndas = NdaService::new(store.clone(), clock);
        let seller = Principal::active(1);
        let buyer = Principal::active(2);

        let listing = svc.create(&seller, create("Auto Repair")).await.unwrap();
        assert_eq!(
            svc.financials(listing.id, &seller).await.unwrap().financials.revenue,
            Some(1_200_000)
        );
        assert_matches!(
            svc.financials(listing.id, &buyer).await,
            Err(CoreError::AccessDenied { .. })
        );

        let nda = ndas
            .request(listing.id, &buyer, ActorContext::default())
            .await
            .unwrap()
            .nda;
        ndas.sign(nda.id, &buyer, ActorContext::default(), None).await.unwrap();
        assert!(svc.financials(listing.id, &buyer).await.is_ok());
    }
}
