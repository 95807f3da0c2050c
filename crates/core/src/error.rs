use crate::types::DbId;

/// Domain error shared by every service operation.
///
/// Services never panic or return ad-hoc maps; each operation yields
/// `Result<T, CoreError>` and the HTTP layer translates the variant.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The caller may not take part in this workflow at all (e.g. a seller
    /// requesting an NDA on their own listing).
    #[error("Invalid requester: {0}")]
    InvalidRequester(String),

    /// The NDA is not in a status that permits the requested transition.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A previous NDA request for the same listing was rejected.
    #[error("Request rejected: {0}")]
    RequestRejected(String),

    #[error("Payload too large: {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// NDA-gated content. Kept distinct from `NotFound` so clients can route
    /// the user into the NDA request flow.
    #[error("Access denied: {reason}")]
    AccessDenied { reason: String },

    /// The blob store or another external collaborator failed.
    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
