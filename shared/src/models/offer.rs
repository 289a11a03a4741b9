//! Special Offer Model

use serde::{Deserialize, Serialize};

/// Offer component: a number of portions of some dish kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OfferItem {
    pub kind: i64,
    pub quantity: i64,
}

/// Special offer (套餐优惠)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Offer {
    pub id: i64,
    pub description: String,
    pub price: i64,
    /// Expiry, UTC epoch milliseconds
    pub expires: i64,
    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<OfferItem>,
}

/// Create offer payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferCreate {
    pub description: String,
    pub price: i64,
    /// Expiry, UTC epoch milliseconds
    pub expires: i64,
    #[serde(default)]
    pub items: Vec<OfferItem>,
}
