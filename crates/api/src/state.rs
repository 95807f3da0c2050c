use std::sync::Arc;

use dealroom_core::clock::Clock;
use dealroom_core::repository::MarketplaceStore;
use dealroom_core::services::{AccessGate, DocumentService, ListingService, NdaService};
use dealroom_core::storage::DocumentStore;
use dealroom_events::EventBus;

use crate::auth::jwt::TokenVerifier;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Persistence, used directly only by the health check.
    pub store: Arc<dyn MarketplaceStore>,
    pub ndas: NdaService,
    pub documents: DocumentService,
    pub listings: ListingService,
    /// Centralized event bus for publishing domain events.
    pub event_bus: Arc<EventBus>,
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    /// Wire the services over the given collaborators.
    pub fn new(
        config: Arc<ServerConfig>,
        store: Arc<dyn MarketplaceStore>,
        blobs: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let documents = DocumentService::new(store.clone(), blobs, clock.clone())
            .with_url_ttl(config.download_url_ttl);
        Self {
            ndas: NdaService::new(store.clone(), clock.clone()),
            listings: ListingService::new(store.clone(), AccessGate::new(store.clone(), clock)),
            documents,
            verifier: Arc::new(TokenVerifier::new(&config.jwt)),
            store,
            config,
            event_bus,
        }
    }
}
