//! Order Model

use serde::{Deserialize, Serialize};

/// Order line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub dish_id: i64,
    pub quantity: i64,
}

impl OrderItem {
    pub fn new(dish_id: i64, quantity: i64) -> Self {
        Self { dish_id, quantity }
    }
}

/// Inbound order request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub buyer_id: i64,
    pub items: Vec<OrderItem>,
}

/// Recorded order (header + items)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub buyer_id: i64,
    /// UTC epoch milliseconds
    pub ordered_at: i64,
    pub items: Vec<OrderItem>,
}

/// Order header row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderHeader {
    pub id: i64,
    pub buyer_id: i64,
    pub ordered_at: i64,
}

/// Order registration result
///
/// ```json
/// {"status":"ok","order_id":12}
/// {"status":"out_of_stock","message":"..."}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OrderOutcome {
    Ok { order_id: i64 },
    UnknownDish { message: String },
    OutOfStock { message: String },
    InternalError { message: String },
}

impl OrderOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_is_tagged_by_status() {
        let ok = serde_json::to_value(OrderOutcome::Ok { order_id: 12 }).unwrap();
        assert_eq!(ok, serde_json::json!({"status": "ok", "order_id": 12}));

        let rejected = serde_json::to_value(OrderOutcome::OutOfStock {
            message: "not enough".into(),
        })
        .unwrap();
        assert_eq!(rejected["status"], "out_of_stock");
        assert_eq!(rejected["message"], "not enough");

        let unknown: OrderOutcome =
            serde_json::from_str(r#"{"status":"unknown_dish","message":"no such dish"}"#)
                .unwrap();
        assert!(!unknown.is_ok());
    }

    #[test]
    fn test_request_requires_items_field() {
        assert!(serde_json::from_str::<OrderRequest>(r#"{"buyer_id":1}"#).is_err());
        let req: OrderRequest =
            serde_json::from_str(r#"{"buyer_id":1,"items":[{"dish_id":3,"quantity":2}]}"#)
                .unwrap();
        assert_eq!(req.items, vec![OrderItem::new(3, 2)]);
    }
}
