//! 订单登记
//!
//! - [`ledger`]: 单个订单的事务写入（订单头 + 订单项 + 库存扣减）
//! - [`serializer`]: 单消费者队列，所有订单按到达顺序逐个写入
//!
//! ```text
//! API / Bot ──► OrderSerializer ──mpsc──► OrderWorker ──► ledger::place_order
//!      ▲                                       │
//!      └────────────── oneshot reply ──────────┘
//! ```

mod error;
pub mod ledger;
pub mod serializer;

pub use error::{OrderError, OrderValidationError};
pub use serializer::{OrderSerializer, OrderWorker};

use shared::models::{OrderItem, OrderRequest};

/// Upper bound on line items per order
pub const MAX_ORDER_ITEMS: usize = 50;

/// An order request that passed validation
///
/// Non-empty, at most [`MAX_ORDER_ITEMS`] items, every quantity positive.
/// The queue and the ledger only accept this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedOrder {
    buyer_id: i64,
    items: Vec<OrderItem>,
}

impl CheckedOrder {
    pub fn new(request: OrderRequest) -> Result<Self, OrderValidationError> {
        if request.items.is_empty() {
            return Err(OrderValidationError::Empty);
        }
        if request.items.len() > MAX_ORDER_ITEMS {
            return Err(OrderValidationError::TooManyItems(request.items.len()));
        }
        if let Some(bad) = request.items.iter().find(|item| item.quantity <= 0) {
            return Err(OrderValidationError::NonPositiveQuantity {
                dish_id: bad.dish_id,
                quantity: bad.quantity,
            });
        }
        Ok(Self {
            buyer_id: request.buyer_id,
            items: request.items,
        })
    }

    pub fn buyer_id(&self) -> i64 {
        self.buyer_id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }
}
