//! NDA workflow: request, send, sign, reject and the read operations.

use std::sync::Arc;

use serde::Serialize;

use crate::clock::Clock;
use crate::error::CoreError;
use crate::listing::Listing;
use crate::nda::{ActorContext, Nda, NdaAction, NdaStatus, NdaView, NewNda, Transition};
use crate::principal::Principal;
use crate::repository::MarketplaceStore;
use crate::types::DbId;

/// What a mutating call actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NdaDisposition {
    Created,
    Renewed,
    AlreadyPending,
    AlreadySigned,
    Sent,
    Signed,
    Rejected,
}

impl NdaDisposition {
    pub fn message(self) -> &'static str {
        match self {
            NdaDisposition::Created => "NDA request submitted successfully",
            NdaDisposition::Renewed => "NDA request renewed",
            NdaDisposition::AlreadyPending => "NDA request already pending",
            NdaDisposition::AlreadySigned => "NDA already signed and valid",
            NdaDisposition::Sent => "NDA sent to buyer",
            NdaDisposition::Signed => {
                "NDA signed successfully. You now have access to financial documents."
            }
            NdaDisposition::Rejected => "NDA request rejected",
        }
    }

    /// Whether the record was written.
    pub fn changed(self) -> bool {
        !matches!(
            self,
            NdaDisposition::AlreadyPending | NdaDisposition::AlreadySigned
        )
    }
}

#[derive(Debug, Clone)]
pub struct NdaOutcome {
    pub nda: Nda,
    pub disposition: NdaDisposition,
}

/// Answer to "may I see this listing's protected content, and why".
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NdaAccessStatus {
    pub has_access: bool,
    pub nda: Option<NdaView>,
}

#[derive(Clone)]
pub struct NdaService {
    store: Arc<dyn MarketplaceStore>,
    clock: Arc<dyn Clock>,
}

impl NdaService {
    pub fn new(store: Arc<dyn MarketplaceStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Render an NDA as of this service's clock.
    pub fn view(&self, nda: &Nda) -> NdaView {
        NdaView::at(nda, self.clock.now())
    }

    /// Buyer asks for NDA access to a listing.
    pub async fn request(
        &self,
        listing_id: DbId,
        buyer: &Principal,
        actor: ActorContext,
    ) -> Result<NdaOutcome, CoreError> {
        buyer.ensure_active()?;
        let listing = self.listing(listing_id).await?;
        if listing.is_owned_by(buyer.id) {
            return Err(CoreError::InvalidRequester(
                "Sellers cannot request NDA for their own listings".into(),
            ));
        }

        if let Some(existing) = self.store.find_nda_for(listing_id, buyer.id).await? {
            return self.rerequest(existing, actor).await;
        }

        let input = NewNda {
            listing_id,
            buyer_id: buyer.id,
            ip_address: actor.ip_address.clone(),
            user_agent: actor.user_agent.clone(),
            requested_at: self.clock.now(),
        };
        match self.store.insert_nda(&input).await {
            Ok(nda) => {
                tracing::info!(
                    nda_id = nda.id,
                    listing_id,
                    buyer_id = buyer.id,
                    "NDA requested"
                );
                Ok(NdaOutcome {
                    nda,
                    disposition: NdaDisposition::Created,
                })
            }
            // A concurrent request for the same pair won the insert.
            Err(CoreError::Conflict(msg)) => {
                tracing::debug!(listing_id, buyer_id = buyer.id, %msg, "NDA insert raced");
                match self.store.find_nda_for(listing_id, buyer.id).await? {
                    Some(existing) => self.rerequest(existing, actor).await,
                    None => Err(CoreError::Conflict(msg)),
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn rerequest(&self, mut nda: Nda, actor: ActorContext) -> Result<NdaOutcome, CoreError> {
        let now = self.clock.now();
        let before = nda.effective_status(now);
        match nda.apply(NdaAction::Request(actor), now)? {
            Transition::Unchanged => Ok(NdaOutcome {
                nda,
                disposition: if before == NdaStatus::Signed {
                    NdaDisposition::AlreadySigned
                } else {
                    NdaDisposition::AlreadyPending
                },
            }),
            Transition::Enter(_) => {
                let nda = self.store.save_nda(&nda).await?;
                tracing::info!(
                    nda_id = nda.id,
                    listing_id = nda.listing_id,
                    buyer_id = nda.buyer_id,
                    "Expired NDA renewed"
                );
                Ok(NdaOutcome {
                    nda,
                    disposition: NdaDisposition::Renewed,
                })
            }
        }
    }

    /// Seller sends the NDA document to the buyer.
    pub async fn send(
        &self,
        nda_id: DbId,
        seller: &Principal,
        document_url: Option<String>,
    ) -> Result<NdaOutcome, CoreError> {
        seller.ensure_active()?;
        let mut nda = self.nda(nda_id).await?;
        self.ensure_listing_seller(&nda, seller).await?;

        nda.apply(NdaAction::Send { document_url }, self.clock.now())?;
        let nda = self.store.save_nda(&nda).await?;

        tracing::info!(nda_id, seller_id = seller.id, "NDA sent");
        Ok(NdaOutcome {
            nda,
            disposition: NdaDisposition::Sent,
        })
    }

    /// Buyer signs. Re-signing a still-valid NDA is a no-op.
    pub async fn sign(
        &self,
        nda_id: DbId,
        buyer: &Principal,
        actor: ActorContext,
        signed_document_url: Option<String>,
    ) -> Result<NdaOutcome, CoreError> {
        buyer.ensure_active()?;
        let mut nda = self.nda(nda_id).await?;
        if nda.buyer_id != buyer.id {
            return Err(CoreError::Forbidden(
                "You don't have permission to sign this NDA".into(),
            ));
        }

        let action = NdaAction::Sign {
            actor,
            signed_document_url,
        };
        match nda.apply(action, self.clock.now())? {
            Transition::Unchanged => Ok(NdaOutcome {
                nda,
                disposition: NdaDisposition::AlreadySigned,
            }),
            Transition::Enter(_) => {
                let nda = self.store.save_nda(&nda).await?;
                tracing::info!(
                    nda_id,
                    buyer_id = buyer.id,
                    expires_at = ?nda.expires_at,
                    "NDA signed"
                );
                Ok(NdaOutcome {
                    nda,
                    disposition: NdaDisposition::Signed,
                })
            }
        }
    }

    /// Seller declines. The reason is not stored on the record; callers pass
    /// it on to notifications.
    pub async fn reject(
        &self,
        nda_id: DbId,
        seller: &Principal,
        reason: Option<&str>,
    ) -> Result<Nda, CoreError> {
        seller.ensure_active()?;
        let mut nda = self.nda(nda_id).await?;
        self.ensure_listing_seller(&nda, seller).await?;

        nda.apply(NdaAction::Reject, self.clock.now())?;
        let nda = self.store.save_nda(&nda).await?;

        tracing::info!(nda_id, seller_id = seller.id, reason = ?reason, "NDA rejected");
        Ok(nda)
    }

    /// Visible to the buyer and to the listing's seller. Anyone else gets
    /// `NotFound`, so existence is not leaked.
    pub async fn get(&self, nda_id: DbId, user: &Principal) -> Result<Nda, CoreError> {
        user.ensure_active()?;
        let nda = self.nda(nda_id).await?;
        if nda.buyer_id == user.id {
            return Ok(nda);
        }
        match self.store.find_listing(nda.listing_id).await? {
            Some(listing) if listing.is_owned_by(user.id) => Ok(nda),
            _ => Err(not_found_nda(nda_id)),
        }
    }

    /// Buyer view: the caller's own NDAs. Seller view: NDAs on the caller's
    /// listings. Either may be narrowed to one listing.
    pub async fn list(
        &self,
        user: &Principal,
        as_seller: bool,
        listing_id: Option<DbId>,
    ) -> Result<Vec<Nda>, CoreError> {
        user.ensure_active()?;
        if !as_seller {
            return self.store.list_ndas_for_buyer(user.id, listing_id).await;
        }

        let owned: Vec<DbId> = self
            .store
            .list_listings_for_seller(user.id)
            .await?
            .into_iter()
            .map(|listing| listing.id)
            .collect();
        let scope = match listing_id {
            Some(id) if owned.contains(&id) => vec![id],
            Some(_) => return Ok(Vec::new()),
            None => owned,
        };
        if scope.is_empty() {
            return Ok(Vec::new());
        }
        self.store.list_ndas_for_listings(&scope).await
    }

    /// Whether `user` currently holds NDA access to `listing_id`.
    pub async fn status(
        &self,
        listing_id: DbId,
        user: &Principal,
    ) -> Result<NdaAccessStatus, CoreError> {
        user.ensure_active()?;
        let listing = self.listing(listing_id).await?;
        if listing.is_owned_by(user.id) {
            return Ok(NdaAccessStatus {
                has_access: true,
                nda: None,
            });
        }

        let now = self.clock.now();
        let nda = self.store.find_nda_for(listing_id, user.id).await?;
        Ok(NdaAccessStatus {
            has_access: nda.as_ref().is_some_and(|n| n.is_valid_at(now)),
            nda: nda.as_ref().map(|n| NdaView::at(n, now)),
        })
    }

    async fn nda(&self, nda_id: DbId) -> Result<Nda, CoreError> {
        self.store
            .find_nda(nda_id)
            .await?
            .ok_or_else(|| not_found_nda(nda_id))
    }

    async fn listing(&self, listing_id: DbId) -> Result<Listing, CoreError> {
        self.store
            .find_listing(listing_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Listing",
                id: listing_id,
            })
    }

    async fn ensure_listing_seller(&self, nda: &Nda, seller: &Principal) -> Result<(), CoreError> {
        match self.store.find_listing(nda.listing_id).await? {
            Some(listing) if listing.is_owned_by(seller.id) => Ok(()),
            _ => Err(CoreError::Forbidden(
                "You don't have permission to manage this NDA".into(),
            )),
        }
    }
}

fn not_found_nda(id: DbId) -> CoreError {
    CoreError::NotFound { entity: "NDA", id }
}
