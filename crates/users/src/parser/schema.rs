//! Field schemas for every operation the service accepts.
//!
//! Schemas are static tables of [`FieldDescriptor`]s, one per [`Operation`].
//! They are immutable and shared by every request.

use core::fmt;

use petlife_core::UserKind;

/// Type a field is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Plain text, taken as-is.
    Text,
    /// JSON-encoded structured value (list or object).
    Json,
    /// Uploaded file.
    File,
}

/// Where in the request a field is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Form body (urlencoded or multipart text part).
    Form,
    /// URL query string.
    Query,
    /// Multipart file part.
    Files,
}

/// Declaration of one accepted input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name, both in the request and in the resulting document.
    pub name: &'static str,
    /// Type the raw value is coerced to.
    pub kind: FieldType,
    /// Where the value is read from.
    pub location: Location,
    /// Whether a missing value is an error.
    pub required: bool,
    /// Allowed values, if constrained.
    pub choices: Option<&'static [&'static str]>,
    /// Whether a missing optional field is kept as null.
    pub store_if_absent: bool,
}

impl FieldDescriptor {
    const fn required(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldType::Text,
            location: Location::Form,
            required: true,
            choices: None,
            store_if_absent: false,
        }
    }

    const fn optional(name: &'static str) -> Self {
        Self {
            required: false,
            ..Self::required(name)
        }
    }

    const fn json(self) -> Self {
        Self {
            kind: FieldType::Json,
            ..self
        }
    }

    const fn file(self) -> Self {
        Self {
            kind: FieldType::File,
            location: Location::Files,
            ..self
        }
    }

    const fn query(self) -> Self {
        Self {
            location: Location::Query,
            ..self
        }
    }

    const fn one_of(self, choices: &'static [&'static str]) -> Self {
        Self {
            choices: Some(choices),
            ..self
        }
    }
}

/// Accepted values of the auth `type` field.
pub const USER_TYPES: &[&str] = &["client", "shop"];

const AUTH: &[FieldDescriptor] = &[
    FieldDescriptor::required("username"),
    FieldDescriptor::required("password"),
    FieldDescriptor::required("type").one_of(USER_TYPES),
];

const CLIENT_REGISTRATION: &[FieldDescriptor] = &[
    FieldDescriptor::required("username"),
    FieldDescriptor::required("password"),
    FieldDescriptor::required("name"),
    FieldDescriptor::required("email"),
    FieldDescriptor::required("address"),
    FieldDescriptor::required("phone_number"),
    FieldDescriptor::optional("cpf"),
];

const SHOP_REGISTRATION: &[FieldDescriptor] = &[
    FieldDescriptor::required("username"),
    FieldDescriptor::required("password"),
    FieldDescriptor::required("name"),
    FieldDescriptor::required("email"),
    FieldDescriptor::required("address"),
    FieldDescriptor::required("phone_number"),
    FieldDescriptor::required("cnpj"),
];

const CLIENT_UPDATE: &[FieldDescriptor] = &[
    FieldDescriptor::optional("username"),
    FieldDescriptor::optional("password"),
    FieldDescriptor::optional("name"),
    FieldDescriptor::optional("email"),
    FieldDescriptor::optional("address"),
    FieldDescriptor::optional("phone_number"),
    FieldDescriptor::optional("pets").json(),
    FieldDescriptor::optional("profile_pic").file(),
    FieldDescriptor::optional("banner_pic").file(),
];

const SHOP_UPDATE: &[FieldDescriptor] = &[
    FieldDescriptor::optional("username"),
    FieldDescriptor::optional("password"),
    FieldDescriptor::optional("name"),
    FieldDescriptor::optional("email"),
    FieldDescriptor::optional("address"),
    FieldDescriptor::optional("phone_number"),
    FieldDescriptor::optional("services").json(),
    FieldDescriptor::optional("description"),
    FieldDescriptor::optional("hours"),
    FieldDescriptor::optional("profile_pic").file(),
    FieldDescriptor::optional("banner_pic").file(),
];

const SERVICE_REMOVAL: &[FieldDescriptor] = &[FieldDescriptor::required("service_id").query()];

const PET_REMOVAL: &[FieldDescriptor] = &[FieldDescriptor::required("pet_name").query()];

/// Every operation that parses request fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Credential login.
    Auth,
    /// New client account.
    ClientRegistration,
    /// New shop account.
    ShopRegistration,
    /// Partial update of a client.
    ClientUpdate,
    /// Partial update of a shop.
    ShopUpdate,
    /// Remove one service from a shop.
    ServiceRemoval,
    /// Remove one pet from a client.
    PetRemoval,
}

impl Operation {
    /// All operations, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Auth,
        Self::ClientRegistration,
        Self::ShopRegistration,
        Self::ClientUpdate,
        Self::ShopUpdate,
        Self::ServiceRemoval,
        Self::PetRemoval,
    ];

    /// Registration operation for a kind of user.
    #[must_use]
    pub const fn registration(kind: UserKind) -> Self {
        match kind {
            UserKind::Client => Self::ClientRegistration,
            UserKind::Shop => Self::ShopRegistration,
        }
    }

    /// Update operation for a kind of user.
    #[must_use]
    pub const fn update(kind: UserKind) -> Self {
        match kind {
            UserKind::Client => Self::ClientUpdate,
            UserKind::Shop => Self::ShopUpdate,
        }
    }

    /// Removal operation for a kind of user: clients drop pets, shops drop
    /// services.
    #[must_use]
    pub const fn removal(kind: UserKind) -> Self {
        match kind {
            UserKind::Client => Self::PetRemoval,
            UserKind::Shop => Self::ServiceRemoval,
        }
    }

    /// The field schema of this operation.
    #[must_use]
    pub const fn schema(self) -> &'static [FieldDescriptor] {
        match self {
            Self::Auth => AUTH,
            Self::ClientRegistration => CLIENT_REGISTRATION,
            Self::ShopRegistration => SHOP_REGISTRATION,
            Self::ClientUpdate => CLIENT_UPDATE,
            Self::ShopUpdate => SHOP_UPDATE,
            Self::ServiceRemoval => SERVICE_REMOVAL,
            Self::PetRemoval => PET_REMOVAL,
        }
    }

    /// Operation name as used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::ClientRegistration => "client_registration",
            Self::ShopRegistration => "shop_registration",
            Self::ClientUpdate => "client_update",
            Self::ShopUpdate => "shop_update",
            Self::ServiceRemoval => "service_removal",
            Self::PetRemoval => "pet_removal",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
