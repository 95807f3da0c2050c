//! The single predicate that guards NDA-protected content.

use std::sync::Arc;

use crate::access::{AccessDecision, ListingAccess};
use crate::clock::Clock;
use crate::documents::Document;
use crate::error::CoreError;
use crate::listing::Listing;
use crate::principal::Principal;
use crate::repository::MarketplaceStore;
use crate::types::DbId;

#[derive(Clone)]
pub struct AccessGate {
    store: Arc<dyn MarketplaceStore>,
    clock: Arc<dyn Clock>,
}

impl AccessGate {
    pub fn new(store: Arc<dyn MarketplaceStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// How `user` relates to `listing`: owner, valid NDA holder or neither.
    pub async fn listing_access(
        &self,
        listing: &Listing,
        user: &Principal,
    ) -> Result<ListingAccess, CoreError> {
        if listing.is_owned_by(user.id) {
            return Ok(ListingAccess::Owner);
        }
        let signed = self.store.find_signed_nda(listing.id, user.id).await?;
        let now = self.clock.now();
        Ok(match signed {
            Some(nda) if nda.is_valid_at(now) => ListingAccess::NdaSigned,
            _ => ListingAccess::Restricted,
        })
    }

    /// Decide whether `user` may open `document`.
    ///
    /// Ungated documents are always allowed. A document whose listing no
    /// longer exists is denied.
    pub async fn check_document_access(
        &self,
        document: &Document,
        user: &Principal,
    ) -> Result<AccessDecision, CoreError> {
        if !document.requires_nda {
            return Ok(AccessDecision::Allowed);
        }
        let Some(listing) = self.store.find_listing(document.listing_id).await? else {
            return Ok(AccessDecision::nda_required());
        };
        Ok(self.listing_access(&listing, user).await?.decide(true))
    }

    /// Whether `user` sees the listing's protected data (financials).
    pub async fn check_listing_access(
        &self,
        listing_id: DbId,
        user: &Principal,
    ) -> Result<AccessDecision, CoreError> {
        let listing = self
            .store
            .find_listing(listing_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Listing",
                id: listing_id,
            })?;
        Ok(self.listing_access(&listing, user).await?.decide(true))
    }
}
