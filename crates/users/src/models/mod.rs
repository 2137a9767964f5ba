//! Domain models for the users service.
//!
//! - [`document`] - Schemaless user documents as exchanged with the store
//! - [`file`] - Files uploaded alongside a request
//! - [`identity`] - The authenticated caller

pub mod document;
pub mod file;
pub mod identity;

pub use document::{Collections, Document, fields};
pub use file::UploadedFile;
pub use identity::Identity;
