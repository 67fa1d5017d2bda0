//! Link status - closed set of lifecycle states

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Lifecycle state of a user-plan link.
///
/// Stored as lowercase `TEXT` (guarded by a CHECK constraint) and
/// serialized the same way in API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    /// Every variant, in declaration order.
    pub const ALL: [Self; 3] = [Self::Active, Self::Cancelled, Self::Expired];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            _ => Err(ValidationError::InvalidVariant {
                field: "status",
                value: s.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for SubscriptionStatus {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
