//! Dish Model

use serde::{Deserialize, Serialize};

/// Dish kind (品类：汤、主菜、饮品等), carries the price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DishKind {
    pub id: i64,
    pub repr: String,
    /// Price in minor currency units
    pub price: i64,
}

/// Dish entity
///
/// `quantity` is the number of portions in stock and never drops below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Dish {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub quantity: i64,
    /// Dish kind id
    pub kind: i64,
}

/// Create dish payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DishCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quantity: i64,
    pub kind: i64,
}

/// Create dish kind payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DishKindCreate {
    pub repr: String,
    pub price: i64,
}

/// Restock / write-off payload
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StockAdjust {
    pub delta: i64,
}
