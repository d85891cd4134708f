//! Asset domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Supported currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Cny,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Cny => "CNY",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "CNY" => Ok(Currency::Cny),
            other => Err(format!("unknown currency '{}'", other)),
        }
    }
}

/// Owned asset record
#[derive(Debug, Clone, Serialize)]
pub struct Asset {
    pub id: Uuid,
    pub category: String,
    pub name: String,
    pub currency: Currency,
    /// Amount in minor units (cents)
    pub amount_cents: i64,
    /// Owning identity; fixed at creation
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload built by the asset service
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub category: String,
    pub name: String,
    pub currency: Currency,
    pub amount_cents: i64,
}

/// Create asset request
#[derive(Debug, Deserialize, validator::Validate)]
pub struct CreateAssetRequest {
    #[validate(length(min = 1, max = 255))]
    pub category: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub currency: Currency,
    #[validate(range(min = 0))]
    pub amount_cents: i64,
}

/// Update asset request
///
/// Carries no owner field: ownership is read from the stored record.
#[derive(Debug, Default, Deserialize, validator::Validate)]
pub struct UpdateAssetRequest {
    #[validate(length(min = 1, max = 255))]
    pub category: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub currency: Option<Currency>,
    #[validate(range(min = 0))]
    pub amount_cents: Option<i64>,
}
