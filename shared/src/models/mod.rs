//! Data models
//!
//! Shared between the server, bot front ends and the admin panel.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod dish;
pub mod offer;
pub mod order;
pub mod user;

// Re-exports
pub use dish::*;
pub use offer::*;
pub use order::*;
pub use user::*;
