//! User identifier.
//!
//! The document store assigns identifiers on insert. Outside the store they
//! travel as opaque strings; only the store adapter knows their native form.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a stored user document.
///
/// ```
/// use petlife_core::UserId;
///
/// let id = UserId::new("65f1c0ffee0000000000beef");
/// assert_eq!(id.as_str(), "65f1c0ffee0000000000beef");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap an identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `UserId` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// MongoDB support (with mongodb feature)
#[cfg(feature = "mongodb")]
impl From<bson::oid::ObjectId> for UserId {
    fn from(id: bson::oid::ObjectId) -> Self {
        Self(id.to_hex())
    }
}

#[cfg(feature = "mongodb")]
impl TryFrom<&UserId> for bson::oid::ObjectId {
    type Error = bson::oid::Error;

    fn try_from(id: &UserId) -> Result<Self, Self::Error> {
        Self::parse_str(&id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_from() {
        let id = UserId::from("abc123");
        assert_eq!(id.to_string(), "abc123");
        assert_eq!(UserId::from("abc123".to_owned()), id);
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = UserId::new("abc123");
        assert_eq!(serde_json::to_string(&id).ok().as_deref(), Some("\"abc123\""));
    }

    #[cfg(feature = "mongodb")]
    #[test]
    fn test_object_id_roundtrip() {
        let oid = bson::oid::ObjectId::new();
        let id = UserId::from(oid);
        assert_eq!(bson::oid::ObjectId::try_from(&id).ok(), Some(oid));
        assert!(bson::oid::ObjectId::try_from(&UserId::new("not-hex")).is_err());
    }
}
