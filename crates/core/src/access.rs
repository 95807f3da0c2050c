//! Access decisions for NDA-protected listing content.
//!
//! The owner bypass and the signed-NDA rule live here as plain functions so
//! the document gate and the financials endpoint share one predicate.

use serde::Serialize;

use crate::documents::{Document, DocumentSummary};

/// Reason attached to every NDA-gated denial.
pub const NDA_REQUIRED: &str = "NDA required";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    Allowed,
    Denied { reason: String },
}

impl AccessDecision {
    pub fn nda_required() -> Self {
        AccessDecision::Denied {
            reason: NDA_REQUIRED.to_string(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed)
    }
}

/// How a requester relates to a listing's protected content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingAccess {
    /// The listing's seller.
    Owner,
    /// A buyer holding a signed, unexpired NDA.
    NdaSigned,
    /// Anyone else.
    Restricted,
}

impl ListingAccess {
    /// Whether NDA-gated content is visible.
    pub fn has_protected_access(self) -> bool {
        !matches!(self, ListingAccess::Restricted)
    }

    /// Decision for one piece of content carrying the given NDA flag.
    pub fn decide(self, requires_nda: bool) -> AccessDecision {
        if !requires_nda || self.has_protected_access() {
            AccessDecision::Allowed
        } else {
            AccessDecision::nda_required()
        }
    }
}

/// One entry of a listing's document list as a particular caller sees it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DocumentView {
    #[serde(flatten)]
    pub document: DocumentSummary,
    pub accessible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl DocumentView {
    pub fn new(document: &Document, access: ListingAccess) -> Self {
        let (accessible, reason) = match access.decide(document.requires_nda) {
            AccessDecision::Allowed => (true, None),
            AccessDecision::Denied { reason } => (false, Some(reason)),
        };
        Self {
            document: DocumentSummary::from(document),
            accessible,
            reason,
        }
    }
}

/// Result of listing a listing's documents.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DocumentListing {
    pub documents: Vec<DocumentView>,
    pub has_nda_access: bool,
}
