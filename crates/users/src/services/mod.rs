//! Request orchestration.
//!
//! Each service parses the raw request for its operation, validates it and
//! calls the document store, translating store errors into [`ServiceError`]s.
//!
//! # Services
//!
//! - [`AuthService`] - credential login, issues access tokens
//! - [`RegistrationService`] - new clients and shops
//! - [`UpdateService`] - partial profile updates
//! - [`RemovalService`] - drop a pet or a service
//! - [`AccountService`] - delete the caller's account
//! - [`ListingService`] - list all shops

mod account;
mod auth;
mod error;
mod listing;
mod registration;
mod removal;
mod update;

pub use account::AccountService;
pub use auth::{AuthService, Authenticated};
pub use error::ServiceError;
pub use listing::ListingService;
pub use registration::RegistrationService;
pub use removal::RemovalService;
pub use update::UpdateService;

use petlife_core::UserKind;

use crate::models::Identity;

/// Reject callers acting on a collection other than their own.
fn ensure_kind(identity: &Identity, kind: UserKind) -> Result<(), ServiceError> {
    if identity.kind == kind {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!(
            "a {} cannot modify a {kind}",
            identity.kind
        )))
    }
}
