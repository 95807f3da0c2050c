//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` in the application state.
//! Publishing never blocks and never fails the request that triggered it.

use chrono::{DateTime, Utc};
use dealroom_core::documents::Document;
use dealroom_core::nda::Nda;
use dealroom_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{ENTITY_DOCUMENT, ENTITY_NDA};

// ---------------------------------------------------------------------------
// DomainEvent
// ---------------------------------------------------------------------------

/// Something that happened to an NDA or a document.
///
/// Built with [`DomainEvent::new`] and the `with_*` builder methods, or with
/// the [`for_nda`](DomainEvent::for_nda) / [`for_document`](DomainEvent::for_document)
/// shortcuts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Dot-separated event name, e.g. `"nda.signed"`.
    pub event_type: String,
    pub source_entity_type: Option<String>,
    pub source_entity_id: Option<DbId>,
    pub listing_id: Option<DbId>,
    pub actor_user_id: Option<DbId>,
    /// Event-specific data.
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source_entity_type: None,
            source_entity_id: None,
            listing_id: None,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id);
        self
    }

    pub fn with_listing(mut self, listing_id: DbId) -> Self {
        self.listing_id = Some(listing_id);
        self
    }

    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// An NDA event carrying the buyer and status in its payload.
    pub fn for_nda(event_type: &str, nda: &Nda, actor: DbId) -> Self {
        Self::new(event_type)
            .with_source(ENTITY_NDA, nda.id)
            .with_listing(nda.listing_id)
            .with_actor(actor)
            .with_payload(serde_json::json!({
                "buyer_id": nda.buyer_id,
                "status": nda.status,
            }))
    }

    /// A document event carrying name and type in its payload.
    pub fn for_document(event_type: &str, document: &Document, actor: DbId) -> Self {
        Self::new(event_type)
            .with_source(ENTITY_DOCUMENT, document.id)
            .with_listing(document.listing_id)
            .with_actor(actor)
            .with_payload(serde_json::json!({
                "name": document.name,
                "document_type": document.document_type,
                "requires_nda": document.requires_nda,
            }))
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out bus: every subscriber sees every event published after it
/// subscribed.
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// When the buffer is full the oldest events are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. Dropped silently when nobody
    /// listens.
    pub fn publish(&self, event: DomainEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
