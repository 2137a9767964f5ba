//! Core types for PetLife.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod kind;
pub mod tax_id;

pub use email::{Email, EmailError};
pub use id::UserId;
pub use kind::{UnknownUserKind, UserKind};
pub use tax_id::{Cnpj, Cpf, TaxIdError, TaxIdKind};
