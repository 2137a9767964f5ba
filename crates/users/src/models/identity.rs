//! Authenticated caller identity.

use petlife_core::{UserId, UserKind};
use serde::{Deserialize, Serialize};

/// Who is making an authenticated request.
///
/// Carried inside the access token and recovered by the
/// [`RequireAuth`](crate::middleware::RequireAuth) extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Identifier of the caller's document.
    pub id: UserId,
    /// Which collection the caller lives in.
    pub kind: UserKind,
}
