#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ParseEnumError;

/// Generates `ALL`, `as_str`, `Display` and a case-insensitive `FromStr`
/// for a fieldless enum whose wire form is the given string.
macro_rules! string_enum {
    ($ty:ident, $label:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
                    .copied()
                    .ok_or_else(|| ParseEnumError::new($label, s, Self::ALL.iter().map(|v| v.as_str())))
            }
        }
    };
}

/// Lifecycle state of an institution (tenant).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstitutionStatus {
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ACTIVE"))]
    Active,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "INACTIVE"))]
    Inactive,
    /// Signed up, awaiting approval by a platform admin.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "PENDING"))]
    Pending,
}

string_enum!(InstitutionStatus, "institution status", {
    Active => "ACTIVE",
    Inactive => "INACTIVE",
    Pending => "PENDING",
});

/// Publication state of an institution course.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CourseStatus {
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "DRAFT"))]
    Draft,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ACTIVE"))]
    Active,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ARCHIVED"))]
    Archived,
}

string_enum!(CourseStatus, "course status", {
    Draft => "DRAFT",
    Active => "ACTIVE",
    Archived => "ARCHIVED",
});

/// State of a challenge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChallengeStatus {
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ACTIVE"))]
    Active,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "INACTIVE"))]
    Inactive,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "COMPLETED"))]
    Completed,
}

string_enum!(ChallengeStatus, "challenge status", {
    Active => "ACTIVE",
    Inactive => "INACTIVE",
    Completed => "COMPLETED",
});

/// Category of a challenge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChallengeType {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "PHYSICAL"))]
    Physical,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "INTELLECTUAL"))]
    Intellectual,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "SOCIAL"))]
    Social,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "CREATIVE"))]
    Creative,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ENVIRONMENTAL"))]
    Environmental,
}

string_enum!(ChallengeType, "challenge type", {
    Physical => "PHYSICAL",
    Intellectual => "INTELLECTUAL",
    Social => "SOCIAL",
    Creative => "CREATIVE",
    Environmental => "ENVIRONMENTAL",
});
