//! Shared types for the korm ordering service
//!
//! Domain models, the unified error system and small utilities used by the
//! server and by any client talking to its HTTP API.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::{Dish, DishKind, Order, OrderItem, OrderOutcome, OrderRequest};
