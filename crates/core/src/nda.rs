//! NDA lifecycle: statuses, the transition table and the record itself.
//!
//! Every status change goes through [`transition`], which is the only place
//! that decides whether an `(status, event)` pair is legal. Handlers and
//! services never compare statuses on their own.
//!
//! ```text
//! PENDING --send--> SENT --sign--> SIGNED --(time)--> EXPIRED --request--> PENDING
//!    |                |
//!    +----reject------+------> REJECTED (terminal)
//! ```
//!
//! `EXPIRED` is usually derived rather than stored: a `SIGNED` record whose
//! `expires_at` has passed is treated as `EXPIRED` by [`Nda::effective_status`].
//! Validity is recomputed on every read; nothing sweeps expired records.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// How long a signed NDA grants access before the buyer must re-request.
pub const NDA_VALIDITY_DAYS: i64 = 365;

/// Validity window as a chrono duration.
pub fn validity_window() -> Duration {
    Duration::days(NDA_VALIDITY_DAYS)
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NdaStatus {
    Pending,
    Sent,
    Signed,
    Rejected,
    Expired,
}

impl NdaStatus {
    pub const ALL: [NdaStatus; 5] = [
        NdaStatus::Pending,
        NdaStatus::Sent,
        NdaStatus::Signed,
        NdaStatus::Rejected,
        NdaStatus::Expired,
    ];

    /// The lowercase name stored in the `ndas.status` column.
    pub fn as_str(self) -> &'static str {
        match self {
            NdaStatus::Pending => "pending",
            NdaStatus::Sent => "sent",
            NdaStatus::Signed => "signed",
            NdaStatus::Rejected => "rejected",
            NdaStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for NdaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NdaStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NdaStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown NDA status '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// Events that drive the lifecycle. Expiry is not an event; it is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NdaEvent {
    /// Buyer (re-)requests access.
    Request,
    /// Seller sends the NDA document to the buyer.
    Send,
    /// Buyer signs.
    Sign,
    /// Seller declines the request.
    Reject,
}

impl NdaEvent {
    fn verb(self) -> &'static str {
        match self {
            NdaEvent::Request => "requested",
            NdaEvent::Send => "sent",
            NdaEvent::Sign => "signed",
            NdaEvent::Reject => "rejected",
        }
    }
}

/// Result of feeding an event to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The event is accepted but the record must not change (idempotent
    /// re-request, re-sign of a valid NDA).
    Unchanged,
    /// The record moves to the given status.
    Enter(NdaStatus),
}

/// Decide what `event` does to an NDA whose effective status is `current`.
///
/// | current  | Request          | Send      | Sign      | Reject     |
/// |----------|------------------|-----------|-----------|------------|
/// | pending  | unchanged        | -> sent   | -> signed | -> rejected|
/// | sent     | unchanged        | invalid   | -> signed | -> rejected|
/// | signed   | unchanged        | invalid   | unchanged | invalid    |
/// | expired  | -> pending       | invalid   | invalid   | invalid    |
/// | rejected | RequestRejected  | invalid   | invalid   | invalid    |
pub fn transition(current: NdaStatus, event: NdaEvent) -> Result<Transition, CoreError> {
    use NdaEvent as E;
    use NdaStatus as S;

    match (current, event) {
        (S::Pending | S::Sent | S::Signed, E::Request) => Ok(Transition::Unchanged),
        (S::Expired, E::Request) => Ok(Transition::Enter(S::Pending)),
        (S::Rejected, E::Request) => Err(CoreError::RequestRejected(
            "Previous NDA request was rejected".into(),
        )),

        (S::Pending, E::Send) => Ok(Transition::Enter(S::Sent)),
        (_, E::Send) => Err(CoreError::InvalidState(format!(
            "NDA is not in pending status (current: {current})"
        ))),

        (S::Signed, E::Sign) => Ok(Transition::Unchanged),
        (S::Pending | S::Sent, E::Sign) => Ok(Transition::Enter(S::Signed)),

        (S::Pending | S::Sent, E::Reject) => Ok(Transition::Enter(S::Rejected)),

        (_, E::Sign | E::Reject) => Err(CoreError::InvalidState(format!(
            "NDA cannot be {} in current status ({current})",
            event.verb()
        ))),
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One NDA between a buyer and a listing. Never deleted; it is the audit
/// record of the buyer's access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nda {
    pub id: DbId,
    pub listing_id: DbId,
    pub buyer_id: DbId,
    pub status: NdaStatus,
    /// Last actor's IP (request or signature, whichever happened last).
    pub ip_address: Option<String>,
    /// Last actor's user agent, same overwrite rule as `ip_address`.
    pub user_agent: Option<String>,
    /// Unsigned template supplied by the seller.
    pub document_url: Option<String>,
    /// Countersigned copy supplied by the buyer.
    pub signed_document_url: Option<String>,
    pub requested_at: Timestamp,
    pub sent_at: Option<Timestamp>,
    pub signed_at: Option<Timestamp>,
    /// Set only at signing; meaningless unless `status == Signed`.
    pub expires_at: Option<Timestamp>,
}

/// Values for a freshly requested NDA.
#[derive(Debug, Clone)]
pub struct NewNda {
    pub listing_id: DbId,
    pub buyer_id: DbId,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub requested_at: Timestamp,
}

/// Who performed an action, for the audit columns.
#[derive(Debug, Clone, Default)]
pub struct ActorContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// An event plus the data it carries.
#[derive(Debug, Clone)]
pub enum NdaAction {
    Request(ActorContext),
    Send { document_url: Option<String> },
    Sign {
        actor: ActorContext,
        signed_document_url: Option<String>,
    },
    Reject,
}

impl NdaAction {
    pub fn event(&self) -> NdaEvent {
        match self {
            NdaAction::Request(_) => NdaEvent::Request,
            NdaAction::Send { .. } => NdaEvent::Send,
            NdaAction::Sign { .. } => NdaEvent::Sign,
            NdaAction::Reject => NdaEvent::Reject,
        }
    }
}

impl Nda {
    /// `true` iff signed and not past `expires_at` (a missing expiry never
    /// lapses).
    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        self.status == NdaStatus::Signed && self.expires_at.map_or(true, |exp| now <= exp)
    }

    /// [`is_valid_at`](Self::is_valid_at) against the wall clock.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(chrono::Utc::now())
    }

    /// The status the state machine reasons about: a lapsed signature reads
    /// as `Expired` even though the stored column still says `signed`.
    pub fn effective_status(&self, now: Timestamp) -> NdaStatus {
        if self.status == NdaStatus::Signed && !self.is_valid_at(now) {
            NdaStatus::Expired
        } else {
            self.status
        }
    }

    /// Run `action` through [`transition`] and stamp the fields that go with
    /// the new status. Returns the transition taken; on `Unchanged` the
    /// record is untouched.
    pub fn apply(&mut self, action: NdaAction, now: Timestamp) -> Result<Transition, CoreError> {
        let step = transition(self.effective_status(now), action.event())?;
        let Transition::Enter(next) = step else {
            return Ok(step);
        };

        match action {
            NdaAction::Request(actor) => {
                self.requested_at = now;
                self.ip_address = actor.ip_address;
                self.user_agent = actor.user_agent;
                // A renewal starts a new cycle; the lapsed one's stamps go.
                self.sent_at = None;
                self.signed_at = None;
                self.expires_at = None;
                self.signed_document_url = None;
            }
            NdaAction::Send { document_url } => {
                self.sent_at = Some(now);
                if document_url.is_some() {
                    self.document_url = document_url;
                }
            }
            NdaAction::Sign {
                actor,
                signed_document_url,
            } => {
                self.signed_at = Some(now);
                self.expires_at = Some(now + validity_window());
                self.ip_address = actor.ip_address;
                self.user_agent = actor.user_agent;
                if signed_document_url.is_some() {
                    self.signed_document_url = signed_document_url;
                }
            }
            NdaAction::Reject => {}
        }
        self.status = next;
        Ok(step)
    }
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// What callers see of an NDA. `status` is the effective status.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NdaView {
    pub id: DbId,
    pub listing_id: DbId,
    pub buyer_id: DbId,
    pub status: NdaStatus,
    pub document_url: Option<String>,
    pub signed_document_url: Option<String>,
    pub requested_at: Timestamp,
    pub sent_at: Option<Timestamp>,
    pub signed_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
    pub is_valid: bool,
}

impl NdaView {
    pub fn at(nda: &Nda, now: Timestamp) -> Self {
        Self {
            id: nda.id,
            listing_id: nda.listing_id,
            buyer_id: nda.buyer_id,
            status: nda.effective_status(now),
            document_url: nda.document_url.clone(),
            signed_document_url: nda.signed_document_url.clone(),
            requested_at: nda.requested_at,
            sent_at: nda.sent_at,
            signed_at: nda.signed_at,
            expires_at: nda.expires_at,
            is_valid: nda.is_valid_at(now),
        }
    }
}

impl From<&Nda> for NdaView {
    fn from(nda: &Nda) -> Self {
        NdaView::at(nda, chrono::Utc::now())
    }
}
