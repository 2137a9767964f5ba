//! The two sides of the marketplace.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of account: a pet owner or a pet shop.
///
/// Every per-type decision (collection, relationship array, tax id scheme,
/// input schema) is a `match` on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserKind {
    /// Pet owner.
    Client,
    /// Pet shop.
    Shop,
}

/// Error returned when a string names no [`UserKind`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown user type: {0}")]
pub struct UnknownUserKind(pub String);

impl UserKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 2] = [Self::Client, Self::Shop];

    /// Returns the wire name (`client` or `shop`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Shop => "shop",
        }
    }

    /// Returns the array field holding this kind's relationship records.
    ///
    /// Clients keep a list of `pets`, shops a list of `services`.
    #[must_use]
    pub const fn relationship_field(self) -> &'static str {
        match self {
            Self::Client => "pets",
            Self::Shop => "services",
        }
    }
}

impl fmt::Display for UserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserKind {
    type Err = UnknownUserKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Self::Client),
            "shop" => Ok(Self::Shop),
            other => Err(UnknownUserKind(other.to_owned())),
        }
    }
}
