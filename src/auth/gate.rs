//! Ownership-based authorization
//!
//! Every asset mutation asks the gate before it reaches the store. The owner
//! passed in must come from the stored record, never from the request body.

use uuid::Uuid;

use crate::error::AppError;

/// Outcome of an authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }

    /// `Deny` becomes [`AppError::Forbidden`]
    pub fn require(self) -> Result<(), AppError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny => Err(AppError::Forbidden),
        }
    }
}

/// Allow only when the stored owner is the acting identity.
///
/// `owner` is `None` when the owner lookup failed or found nothing; that is
/// always a `Deny`.
pub fn authorize(actor: Uuid, owner: Option<Uuid>) -> Decision {
    match owner {
        Some(owner) if owner == actor => Decision::Allow,
        _ => Decision::Deny,
    }
}
