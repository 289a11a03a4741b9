//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 管理员登录
//! - [`dishes`] - 菜品查询、管理与库存调整
//! - [`kinds`] - 品类查询与管理
//! - [`offers`] - 优惠套餐
//! - [`orders`] - 下单与订单查询
//! - [`bot`] - 聊天平台 webhook

pub mod auth;
pub mod bot;
pub mod dishes;
pub mod health;
pub mod kinds;
pub mod offers;
pub mod orders;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};
