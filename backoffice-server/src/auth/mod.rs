//! 认证模块
//!
//! JWT 令牌服务 + Axum 中间件 (require_auth / require_admin)

pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{require_admin, require_auth};
