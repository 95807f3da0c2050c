//! Event names published on the bus.

pub const NDA_REQUESTED: &str = "nda.requested";
pub const NDA_RENEWED: &str = "nda.renewed";
pub const NDA_SENT: &str = "nda.sent";
pub const NDA_SIGNED: &str = "nda.signed";
pub const NDA_REJECTED: &str = "nda.rejected";
pub const DOCUMENT_UPLOADED: &str = "document.uploaded";
pub const DOCUMENT_DELETED: &str = "document.deleted";

/// Entity kinds used in [`DomainEvent::with_source`](crate::DomainEvent::with_source).
pub const ENTITY_NDA: &str = "nda";
pub const ENTITY_DOCUMENT: &str = "document";
