//! Starter category sets offered to a business with no categories yet.

use std::fmt;
use std::str::FromStr;

use crate::domain::{BusinessId, CategoryValidationError, NewCategory};

/// Kind of business, used to pick a starter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusinessKind {
    /// Food service.
    Restaurant,
    /// Shop selling goods.
    Retail,
    /// Services by appointment.
    Service,
    /// Anything else.
    #[default]
    General,
}

/// Unknown business kind string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown business kind '{0}'; expected restaurant|retail|service|general")]
pub struct UnknownBusinessKind(String);

impl FromStr for BusinessKind {
    type Err = UnknownBusinessKind;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "restaurant" => Ok(Self::Restaurant),
            "retail" => Ok(Self::Retail),
            "service" => Ok(Self::Service),
            "general" => Ok(Self::General),
            _ => Err(UnknownBusinessKind(raw.to_owned())),
        }
    }
}

impl fmt::Display for BusinessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Restaurant => "restaurant",
            Self::Retail => "retail",
            Self::Service => "service",
            Self::General => "general",
        };
        f.write_str(label)
    }
}

impl BusinessKind {
    /// `(name, description)` pairs of the starter set.
    pub const fn templates(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Restaurant => &[
                ("Entradas", "Platos para comenzar"),
                ("Platos principales", "Platos fuertes del menú"),
                ("Postres", "Dulces y postres"),
                ("Bebidas", "Bebidas frías y calientes"),
            ],
            Self::Retail => &[
                ("Electrónicos", "Dispositivos y aparatos electrónicos"),
                ("Accesorios", "Complementos y accesorios"),
                ("Ropa", "Prendas de vestir"),
                ("Hogar", "Artículos para el hogar"),
            ],
            Self::Service => &[
                ("Consultoría", "Asesoría profesional"),
                ("Mantenimiento", "Servicios de mantenimiento"),
                ("Instalación", "Servicios de instalación"),
            ],
            Self::General => &[
                ("General", "Productos sin categoría específica"),
                ("Destacados", "Productos destacados"),
                ("Ofertas", "Productos en promoción"),
            ],
        }
    }

    /// Insert payloads for the starter set of `business_id`.
    pub fn starter_categories(
        self,
        business_id: BusinessId,
    ) -> Result<Vec<NewCategory>, CategoryValidationError> {
        self.templates()
            .iter()
            .map(|(name, description)| NewCategory::new(business_id, name, Some(description)))
            .collect()
    }
}
