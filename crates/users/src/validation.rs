//! Business-rule validation of parsed fields.
//!
//! Validators run only for fields that are present; an absent field is never
//! defaulted or rejected here. The first failing validator aborts.
//!
//! | Field                        | Rule                                      |
//! |------------------------------|-------------------------------------------|
//! | `email`                      | `local@domain.tld` shape                  |
//! | `cpf` / `cnpj`               | checksum, normalised to digits            |
//! | `profile_pic` / `banner_pic` | uploaded, reference stored under `pics.*` |

use petlife_core::{Cnpj, Cpf, Email, TaxIdError, TaxIdKind};
use thiserror::Error;

use crate::models::document::picture_reference;
use crate::models::{Document, UploadedFile, fields};
use crate::parser::{FieldValue, ParsedFields};
use crate::storage::{FileStorage, StorageError};

/// Picture fields and the `pics` sub-key their reference is stored under.
const PICTURES: [(&str, &str); 2] = [("profile_pic", "profile"), ("banner_pic", "banner")];

/// Errors raised by document validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The email address is malformed.
    #[error("invalid email address")]
    InvalidEmail,

    /// The CPF or CNPJ failed validation.
    #[error("invalid {0}")]
    InvalidTaxId(TaxIdKind),

    /// A validated field held a non-text value.
    #[error("field {0} must be text")]
    NotText(&'static str),

    /// Uploading a picture failed.
    #[error("picture upload failed: {0}")]
    Upload(#[from] StorageError),
}

impl From<TaxIdError> for ValidationError {
    fn from(err: TaxIdError) -> Self {
        Self::InvalidTaxId(err.kind())
    }
}

/// Applies the per-field rules to parsed request fields.
pub struct DocumentValidator<'a> {
    files: &'a dyn FileStorage,
    current: Option<&'a Document>,
}

impl<'a> DocumentValidator<'a> {
    /// Create a validator uploading pictures to `files`.
    #[must_use]
    pub const fn new(files: &'a dyn FileStorage) -> Self {
        Self {
            files,
            current: None,
        }
    }

    /// Validate against a stored document whose pictures new uploads
    /// supersede.
    #[must_use]
    pub const fn with_current(mut self, current: &'a Document) -> Self {
        self.current = Some(current);
        self
    }

    /// Validate and normalise `doc` in place.
    ///
    /// Tax ids are rewritten to bare digits. Pictures are uploaded and their
    /// raw fields replaced by `pics.profile` / `pics.banner` references.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered.
    pub async fn validate(&self, doc: &mut ParsedFields) -> Result<(), ValidationError> {
        if let Some(value) = doc.get("email") {
            let email = value.as_text().ok_or(ValidationError::NotText("email"))?;
            Email::parse(email).map_err(|_| ValidationError::InvalidEmail)?;
        }

        if let Some(value) = doc.get("cpf") {
            let cpf = Cpf::parse(value.as_text().ok_or(ValidationError::NotText("cpf"))?)?;
            doc.insert("cpf", FieldValue::Text(cpf.as_str().to_owned()));
        }

        if let Some(value) = doc.get("cnpj") {
            let cnpj = Cnpj::parse(value.as_text().ok_or(ValidationError::NotText("cnpj"))?)?;
            doc.insert("cnpj", FieldValue::Text(cnpj.as_str().to_owned()));
        }

        for (field, key) in PICTURES {
            let Some(FieldValue::File(file)) = doc.remove(field) else {
                continue;
            };
            let reference = self.store_picture(key, &file).await?;
            tracing::info!(field, reference = %reference, "Picture stored");
            doc.insert(
                format!("{}.{key}", fields::PICS),
                FieldValue::Text(reference),
            );
        }

        Ok(())
    }

    /// Store a picture, reusing the previous reference under `pics.<key>`
    /// when the extension still matches and dropping it otherwise.
    async fn store_picture(&self, key: &str, file: &UploadedFile) -> Result<String, StorageError> {
        let Some(previous) = self.current.and_then(|doc| picture_reference(doc, key)) else {
            return self.files.upload(file).await;
        };

        let extension = file.extension();
        if !extension.is_empty() && previous.ends_with(&extension) {
            match self.files.replace(previous, file).await {
                Err(StorageError::NotFound(_) | StorageError::InvalidReference(_)) => {}
                other => return other,
            }
        }

        let reference = self.files.upload(file).await?;
        if let Err(e) = self.files.delete(previous).await {
            tracing::warn!(reference = %previous, error = %e, "Failed to delete old picture");
        }
        Ok(reference)
    }
}
