#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ParseEnumError;

/// Account role. Drives every authorization decision on the server.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Platform operator, unrestricted.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ADMIN"))]
    Admin,
    /// Manages one institution, including deleting its courses.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "INSTITUTION_ADMIN"))]
    InstitutionAdmin,
    /// Edits the courses of one institution.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "INSTITUTION_STAFF"))]
    InstitutionStaff,
    /// Student / family member.
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "USER"))]
    User,
}

impl Role {
    pub const ALL: &'static [Role] = &[
        Self::Admin,
        Self::InstitutionAdmin,
        Self::InstitutionStaff,
        Self::User,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::InstitutionAdmin => "INSTITUTION_ADMIN",
            Self::InstitutionStaff => "INSTITUTION_STAFF",
            Self::User => "USER",
        }
    }

    /// Roles that act on behalf of a single institution.
    pub fn is_institution_member(&self) -> bool {
        matches!(self, Self::InstitutionAdmin | Self::InstitutionStaff)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| ParseEnumError::new("role", s, Self::ALL.iter().map(Role::as_str)))
    }
}
