//! 管理后台认证：JWT + Argon2

pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, CurrentAdmin, JwtConfig, JwtError, JwtService};
pub use middleware::{authenticate, require_admin};
