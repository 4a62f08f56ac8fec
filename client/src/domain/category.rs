//! Category entity and the payloads used to create or change one.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

/// Validation errors for category payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryValidationError {
    /// Name was missing or blank once trimmed.
    EmptyName,
    /// An update carried no field to change.
    EmptyUpdate,
}

impl fmt::Display for CategoryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "El nombre de la categoría es obligatorio"),
            Self::EmptyUpdate => write!(f, "No hay cambios para guardar"),
        }
    }
}

impl std::error::Error for CategoryValidationError {}

impl From<CategoryValidationError> for DomainError {
    fn from(value: CategoryValidationError) -> Self {
        Self::validation(value.to_string())
    }
}

macro_rules! uuid_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wrap an existing UUID.
            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(raw.trim()).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

uuid_newtype!(
    /// Server-assigned category identifier.
    CategoryId
);
uuid_newtype!(
    /// Owning business identifier. Scoping by it is advisory only.
    BusinessId
);

/// Category as stored by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Server-assigned identifier.
    pub id: CategoryId,
    /// Business the category belongs to.
    pub business_id: BusinessId,
    /// Display name.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Server-assigned creation time.
    pub created_at: DateTime<Utc>,
}

/// Validated insert payload.
///
/// ## Invariants
/// - `name` is trimmed and non-empty.
/// - a blank description is stored as `None`.
///
/// # Examples
/// ```
/// use storefront::domain::{BusinessId, NewCategory};
/// use uuid::Uuid;
///
/// let business = BusinessId::from_uuid(Uuid::new_v4());
/// let new = NewCategory::new(business, "  Drinks ", Some("  ")).unwrap();
/// assert_eq!(new.name(), "Drinks");
/// assert_eq!(new.description(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    business_id: BusinessId,
    name: String,
    description: Option<String>,
}

impl NewCategory {
    /// Validate and build an insert payload.
    pub fn new(
        business_id: BusinessId,
        name: &str,
        description: Option<&str>,
    ) -> Result<Self, CategoryValidationError> {
        Ok(Self {
            business_id,
            name: normalise_name(name)?,
            description: normalise_description(description),
        })
    }

    /// Owning business.
    pub fn business_id(&self) -> BusinessId {
        self.business_id
    }

    /// Trimmed name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Optional description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Change set for an existing category.
///
/// `description: Some(None)` clears the description; `None` leaves it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoryUpdate {
    name: Option<String>,
    description: Option<Option<String>>,
}

impl CategoryUpdate {
    /// Validate and build a change set.
    pub fn new(
        name: Option<&str>,
        description: Option<Option<&str>>,
    ) -> Result<Self, CategoryValidationError> {
        let name = name.map(normalise_name).transpose()?;
        let description = description.map(normalise_description);
        if name.is_none() && description.is_none() {
            return Err(CategoryValidationError::EmptyUpdate);
        }
        Ok(Self { name, description })
    }

    /// New name, if changing.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// New description, if changing; inner `None` clears it.
    pub fn description(&self) -> Option<Option<&str>> {
        self.description.as_ref().map(Option::as_deref)
    }
}

fn normalise_name(raw: &str) -> Result<String, CategoryValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CategoryValidationError::EmptyName);
    }
    Ok(trimmed.to_owned())
}

fn normalise_description(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// Rows returned by a list or search, plus the exact count when reported.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CategoryList {
    /// Categories ordered by name.
    pub items: Vec<Category>,
    /// Exact total reported by the service, if requested.
    pub count: Option<u64>,
}
