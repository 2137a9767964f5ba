//! User documents.
//!
//! A user (client or shop) is stored as a schemaless document: a JSON object
//! mapping field names to values. Only a handful of fields carry meaning for
//! the service itself; they are named in [`fields`].

use petlife_core::{UserId, UserKind};
use serde_json::Value;

/// A user document: field name to value.
pub type Document = serde_json::Map<String, Value>;

/// Field names with meaning to the service.
pub mod fields {
    /// Store-assigned identifier, exposed as a string.
    pub const ID: &str = "_id";
    /// Unique login name within a collection.
    pub const USERNAME: &str = "username";
    /// Credential; stored but never returned.
    pub const PASSWORD: &str = "password";
    /// Pets owned by a client.
    pub const PETS: &str = "pets";
    /// Services offered by a shop.
    pub const SERVICES: &str = "services";
    /// Array fields that grow by appending instead of being overwritten.
    pub const ARRAY_FIELDS: [&str; 2] = [SERVICES, PETS];
    /// Removal key selecting an entry of `services`.
    pub const SERVICE_ID: &str = "service_id";
    /// Removal key selecting an entry of `pets`.
    pub const PET_NAME: &str = "pet_name";
    /// Nested object holding uploaded picture references.
    pub const PICS: &str = "pics";
    /// Keys of `pics`.
    pub const PICTURE_KEYS: [&str; 2] = ["profile", "banner"];
}

/// Returns the identifier of a stored document, if it has one.
#[must_use]
pub fn document_id(doc: &Document) -> Option<UserId> {
    doc.get(fields::ID)
        .and_then(Value::as_str)
        .map(UserId::from)
}

/// Returns the picture reference stored under `pics.<key>`, if any.
#[must_use]
pub fn picture_reference<'d>(doc: &'d Document, key: &str) -> Option<&'d str> {
    doc.get(fields::PICS)
        .and_then(|pics| pics.get(key))
        .and_then(Value::as_str)
}

/// Physical collection names for each kind of user.
///
/// Resolved once from configuration and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections {
    /// Collection holding clients.
    pub clients: String,
    /// Collection holding shops.
    pub shops: String,
}

impl Collections {
    /// Returns the collection for a kind of user.
    #[must_use]
    pub fn for_kind(&self, kind: UserKind) -> &str {
        match kind {
            UserKind::Client => &self.clients,
            UserKind::Shop => &self.shops,
        }
    }
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            clients: "clients".to_owned(),
            shops: "shops".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_collections_for_kind() {
        let collections = Collections {
            clients: "c".to_owned(),
            shops: "s".to_owned(),
        };
        assert_eq!(collections.for_kind(UserKind::Client), "c");
        assert_eq!(collections.for_kind(UserKind::Shop), "s");
    }

    #[test]
    fn test_document_id() {
        let Value::Object(doc) = json!({"_id": "abc", "username": "bob"}) else {
            unreachable!()
        };
        assert_eq!(document_id(&doc), Some(UserId::new("abc")));
        assert_eq!(document_id(&Document::new()), None);
    }

    #[test]
    fn test_picture_reference() {
        let Value::Object(doc) = json!({"pics": {"profile": "a.png", "banner": 3}}) else {
            unreachable!()
        };
        assert_eq!(picture_reference(&doc, "profile"), Some("a.png"));
        assert_eq!(picture_reference(&doc, "banner"), None);
        assert_eq!(picture_reference(&Document::new(), "profile"), None);
    }
}
