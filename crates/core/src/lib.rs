//! PetLife Core - Shared domain types.
//!
//! This crate provides the types shared by the PetLife users service:
//! - `users` - Registration, authentication and profile management for
//!   clients and pet shops
//!
//! # Architecture
//!
//! The core crate contains only types and validation rules - no I/O, no
//! database access, no HTTP. This keeps it lightweight and easy to test.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for emails, tax ids, user ids and user kinds

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
