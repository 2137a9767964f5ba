//! Request parsing.
//!
//! Turns raw request fields into a [`ParsedFields`] map according to the
//! schema of an [`Operation`]:
//!
//! 1. Each declared field is read from its [`Location`]
//! 2. Missing required fields fail with [`ParseError::MissingField`]
//! 3. Constrained fields must be one of their choices
//! 4. Values are coerced to their [`FieldType`]
//!
//! Fields not declared by the schema are dropped. Parsing has no side effects.

pub mod schema;

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

pub use schema::{FieldDescriptor, FieldType, Location, Operation};

use crate::models::{Document, UploadedFile};

/// Errors raised while parsing request fields.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A required field was not supplied.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A constrained field holds a value outside its choices.
    #[error("invalid value for {0}: {1}")]
    InvalidChoice(&'static str, String),

    /// A value could not be coerced to the declared type.
    #[error("invalid type for field: {0}")]
    TypeMismatch(&'static str),
}

impl ParseError {
    /// Returns the name of the offending field.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::MissingField(name) | Self::InvalidChoice(name, _) | Self::TypeMismatch(name) => {
                name
            }
        }
    }
}

/// Raw request fields, grouped by where they were found.
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    /// Form body text fields.
    pub form: HashMap<String, String>,
    /// Query string parameters.
    pub query: HashMap<String, String>,
    /// Multipart file parts.
    pub files: HashMap<String, UploadedFile>,
}

impl RawRequest {
    /// Add a form field.
    #[must_use]
    pub fn with_form(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.insert(name.into(), value.into());
        self
    }

    /// Add a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Add a file part.
    #[must_use]
    pub fn with_file(mut self, name: impl Into<String>, file: UploadedFile) -> Self {
        self.files.insert(name.into(), file);
        self
    }
}

/// A parsed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Text field.
    Text(String),
    /// Decoded structured field.
    Json(Value),
    /// Uploaded file, replaced by a reference during validation.
    File(UploadedFile),
    /// Optional field that was absent but kept.
    Null,
}

impl FieldValue {
    /// Returns the text content, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Converts into a document value. Files have no document form.
    fn into_value(self) -> Option<Value> {
        match self {
            Self::Text(text) => Some(Value::String(text)),
            Self::Json(value) => Some(value),
            Self::Null => Some(Value::Null),
            Self::File(_) => None,
        }
    }
}

/// Parsed fields, in schema order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFields {
    entries: Vec<(String, FieldValue)>,
}

impl ParsedFields {
    /// Returns the value of a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Returns the text value of a field.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    /// Whether a field is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set a field, replacing any previous value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        let pos = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.remove(pos).1)
    }

    /// Iterate over fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Convert into a store document.
    ///
    /// File values are skipped; the validator replaces them with references
    /// before persistence.
    #[must_use]
    pub fn into_document(self) -> Document {
        self.entries
            .into_iter()
            .filter_map(|(key, value)| value.into_value().map(|v| (key, v)))
            .collect()
    }
}

/// Returns the field schema of an operation.
#[must_use]
pub const fn get_schema(operation: Operation) -> &'static [FieldDescriptor] {
    operation.schema()
}

/// Parse raw request fields for an operation.
///
/// # Errors
///
/// Returns the first [`ParseError`] met while walking the schema in order.
pub fn parse_request(operation: Operation, raw: &RawRequest) -> Result<ParsedFields, ParseError> {
    parse(get_schema(operation), raw)
}

/// Parse raw request fields against a schema.
///
/// # Errors
///
/// Returns the first [`ParseError`] met while walking the schema in order.
pub fn parse(schema: &[FieldDescriptor], raw: &RawRequest) -> Result<ParsedFields, ParseError> {
    let mut parsed = ParsedFields::default();

    for field in schema {
        let Some(value) = extract(field, raw)? else {
            if field.required {
                return Err(ParseError::MissingField(field.name));
            }
            if field.store_if_absent {
                parsed.insert(field.name, FieldValue::Null);
            }
            continue;
        };

        parsed.insert(field.name, value);
    }

    Ok(parsed)
}

/// Read and coerce one field. `Ok(None)` means absent.
fn extract(field: &FieldDescriptor, raw: &RawRequest) -> Result<Option<FieldValue>, ParseError> {
    if field.kind == FieldType::File {
        return match field.location {
            Location::Files => Ok(raw.files.get(field.name).cloned().map(FieldValue::File)),
            // A file cannot arrive as text.
            Location::Form | Location::Query => {
                if raw_text(field, raw).is_some() {
                    Err(ParseError::TypeMismatch(field.name))
                } else {
                    Ok(None)
                }
            }
        };
    }

    if field.location == Location::Files {
        return if raw.files.contains_key(field.name) {
            Err(ParseError::TypeMismatch(field.name))
        } else {
            Ok(None)
        };
    }

    let Some(text) = raw_text(field, raw) else {
        // A file part under a text field's name is a type error, not absence.
        if raw.files.contains_key(field.name) && field.location == Location::Form {
            return Err(ParseError::TypeMismatch(field.name));
        }
        return Ok(None);
    };

    if let Some(choices) = field.choices
        && !choices.contains(&text)
    {
        return Err(ParseError::InvalidChoice(field.name, text.to_owned()));
    }

    match field.kind {
        FieldType::Text => Ok(Some(FieldValue::Text(text.to_owned()))),
        FieldType::Json => serde_json::from_str(text)
            .map(|value| Some(FieldValue::Json(value)))
            .map_err(|_| ParseError::TypeMismatch(field.name)),
        FieldType::File => Err(ParseError::TypeMismatch(field.name)),
    }
}

fn raw_text<'r>(field: &FieldDescriptor, raw: &'r RawRequest) -> Option<&'r str> {
    let source = match field.location {
        Location::Form => &raw.form,
        Location::Query => &raw.query,
        Location::Files => return None,
    };
    source.get(field.name).map(String::as_str)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn client_registration() -> RawRequest {
        RawRequest::default()
            .with_form("username", "bob")
            .with_form("password", "x")
            .with_form("name", "Bob")
            .with_form("email", "bob@example.com")
            .with_form("address", "Rua A, 1")
            .with_form("phone_number", "5511999999999")
    }

    #[test]
    fn test_parse_auth() {
        let raw = RawRequest::default()
            .with_form("username", "alice")
            .with_form("password", "secret")
            .with_form("type", "shop");
        let parsed = parse_request(Operation::Auth, &raw).unwrap();
        assert_eq!(parsed.text("username"), Some("alice"));
        assert_eq!(parsed.text("type"), Some("shop"));
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn test_missing_required_field() {
        let raw = RawRequest::default().with_form("username", "alice");
        assert_eq!(
            parse_request(Operation::Auth, &raw),
            Err(ParseError::MissingField("password"))
        );
    }

    #[test]
    fn test_invalid_choice() {
        let raw = RawRequest::default()
            .with_form("username", "alice")
            .with_form("password", "secret")
            .with_form("type", "admin");
        let err = parse_request(Operation::Auth, &raw).unwrap_err();
        assert_eq!(err, ParseError::InvalidChoice("type", "admin".to_owned()));
        assert_eq!(err.field(), "type");
    }

    #[test]
    fn test_unknown_fields_are_dropped() {
        let raw = client_registration().with_form("is_admin", "true");
        let parsed = parse_request(Operation::ClientRegistration, &raw).unwrap();
        assert!(!parsed.contains("is_admin"));
    }

    #[test]
    fn test_optional_field_omitted_when_absent() {
        let parsed = parse_request(Operation::ClientRegistration, &client_registration()).unwrap();
        assert!(!parsed.contains("cpf"));
        assert_eq!(parsed.len(), 6);
    }

    #[test]
    fn test_store_if_absent_keeps_null() {
        const SCHEMA: &[FieldDescriptor] = &[FieldDescriptor {
            name: "nickname",
            kind: FieldType::Text,
            location: Location::Form,
            required: false,
            choices: None,
            store_if_absent: true,
        }];
        let parsed = parse(SCHEMA, &RawRequest::default()).unwrap();
        assert_eq!(parsed.get("nickname"), Some(&FieldValue::Null));
        assert_eq!(parsed.into_document().get("nickname"), Some(&Value::Null));
    }

    #[test]
    fn test_output_follows_schema_order() {
        let parsed = parse_request(Operation::ClientRegistration, &client_registration()).unwrap();
        let names: Vec<_> = parsed.iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            ["username", "password", "name", "email", "address", "phone_number"]
        );
    }

    #[test]
    fn test_json_field_is_decoded() {
        let raw = RawRequest::default().with_form("pets", r#"{"name": "Rex", "species": "dog"}"#);
        let parsed = parse_request(Operation::ClientUpdate, &raw).unwrap();
        assert_eq!(
            parsed.get("pets"),
            Some(&FieldValue::Json(json!({"name": "Rex", "species": "dog"})))
        );
    }

    #[test]
    fn test_json_field_decode_failure() {
        let raw = RawRequest::default().with_form("services", "{not json");
        assert_eq!(
            parse_request(Operation::ShopUpdate, &raw),
            Err(ParseError::TypeMismatch("services"))
        );
    }

    #[test]
    fn test_file_field() {
        let file = UploadedFile::new("me.png", Some("image/png".to_owned()), vec![1, 2]);
        let raw = RawRequest::default().with_file("profile_pic", file.clone());
        let parsed = parse_request(Operation::ShopUpdate, &raw).unwrap();
        assert_eq!(parsed.get("profile_pic"), Some(&FieldValue::File(file)));
        assert!(parsed.into_document().is_empty());
    }

    #[test]
    fn test_file_sent_as_text_is_type_mismatch() {
        let raw = RawRequest::default().with_form("profile_pic", "me.png");
        assert_eq!(
            parse_request(Operation::ShopUpdate, &raw),
            Err(ParseError::TypeMismatch("profile_pic"))
        );
    }

    #[test]
    fn test_text_sent_as_file_is_type_mismatch() {
        let file = UploadedFile::new("name.txt", None, b"Bob".to_vec());
        let raw = RawRequest::default().with_file("name", file);
        assert_eq!(
            parse_request(Operation::ClientUpdate, &raw),
            Err(ParseError::TypeMismatch("name"))
        );
    }

    #[test]
    fn test_removal_reads_query() {
        let raw = RawRequest::default().with_form("service_id", "abc");
        assert_eq!(
            parse_request(Operation::ServiceRemoval, &raw),
            Err(ParseError::MissingField("service_id"))
        );

        let raw = RawRequest::default().with_query("service_id", "abc");
        let parsed = parse_request(Operation::ServiceRemoval, &raw).unwrap();
        assert_eq!(parsed.text("service_id"), Some("abc"));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut parsed = parse_request(Operation::ClientRegistration, &client_registration()).unwrap();
        parsed.insert("username", FieldValue::Text("robert".to_owned()));
        assert_eq!(parsed.iter().next(), Some(("username", &FieldValue::Text("robert".to_owned()))));
        assert_eq!(parsed.remove("username"), Some(FieldValue::Text("robert".to_owned())));
        assert!(!parsed.contains("username"));
    }
}
