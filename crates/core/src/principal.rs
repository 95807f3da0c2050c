//! The authenticated caller every operation receives.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::DbId;

/// An already-authenticated user. Authentication itself happens upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: DbId,
    pub is_active: bool,
}

impl Principal {
    /// An active principal with the given id.
    pub fn active(id: DbId) -> Self {
        Self {
            id,
            is_active: true,
        }
    }

    /// Reject deactivated accounts before any operation touches data.
    pub fn ensure_active(&self) -> Result<(), CoreError> {
        if self.is_active {
            Ok(())
        } else {
            Err(CoreError::Forbidden("Account is inactive".into()))
        }
    }
}
