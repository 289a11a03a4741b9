use crate::inventory::InventoryError;
use shared::error::{AppError, ErrorCode};
use shared::models::OrderOutcome;
use std::time::Duration;
use thiserror::Error;

/// Order request rejected before reaching the queue
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderValidationError {
    #[error("order has no items")]
    Empty,

    #[error("order has {0} items, at most {max} allowed", max = super::MAX_ORDER_ITEMS)]
    TooManyItems(usize),

    #[error("quantity of dish {dish_id} must be positive, got {quantity}")]
    NonPositiveQuantity { dish_id: i64, quantity: i64 },
}

impl From<OrderValidationError> for AppError {
    fn from(err: OrderValidationError) -> Self {
        match err {
            OrderValidationError::Empty => AppError::new(ErrorCode::OrderEmpty),
            OrderValidationError::TooManyItems(n) => {
                AppError::with_message(ErrorCode::ValueOutOfRange, err.to_string())
                    .with_detail("items", n)
            }
            OrderValidationError::NonPositiveQuantity { dish_id, .. } => {
                AppError::validation(err.to_string()).with_detail("dish_id", dish_id)
            }
        }
    }
}

/// Order registration errors
///
/// `UnknownDish` / `OutOfStock` reject the order; everything else is a
/// server fault. None of them is retried.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("no such dish: {0}")]
    UnknownDish(i64),

    #[error("cannot subtract more portions of dish {0} than there is in stock")]
    OutOfStock(i64),

    #[error("order worker is not running")]
    WorkerUnavailable,

    #[error("order was not processed within {0:?}")]
    Timeout(Duration),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<InventoryError> for OrderError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::UnknownDish(id) => OrderError::UnknownDish(id),
            InventoryError::OutOfStock(id) => OrderError::OutOfStock(id),
            InventoryError::Database(e) => OrderError::Database(e),
            // 订单只扣减库存，不会触及上限
            e @ InventoryError::StockLimit(_) => {
                OrderError::Database(sqlx::Error::Protocol(e.to_string()))
            }
        }
    }
}

impl OrderError {
    pub fn is_client_fault(&self) -> bool {
        matches!(self, Self::UnknownDish(_) | Self::OutOfStock(_))
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownDish(_) => ErrorCode::DishNotFound,
            Self::OutOfStock(_) => ErrorCode::OutOfStock,
            Self::WorkerUnavailable => ErrorCode::OrderQueueUnavailable,
            Self::Timeout(_) => ErrorCode::OrderTimeout,
            Self::Database(_) => ErrorCode::DatabaseError,
        }
    }

    /// Caller-facing result; server-fault details stay in the log
    pub fn to_outcome(&self) -> OrderOutcome {
        match self {
            Self::UnknownDish(_) => OrderOutcome::UnknownDish {
                message: self.to_string(),
            },
            Self::OutOfStock(_) => OrderOutcome::OutOfStock {
                message: self.to_string(),
            },
            _ => OrderOutcome::InternalError {
                message: self.code().message().to_string(),
            },
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::UnknownDish(id) => AppError::dish_not_found(id),
            OrderError::OutOfStock(id) => AppError::out_of_stock(id),
            OrderError::Database(e) => AppError::database(e.to_string()),
            other => AppError::with_message(other.code(), other.to_string()),
        }
    }
}
