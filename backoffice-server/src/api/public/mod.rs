//! Public Tracking API 模块
//!
//! 小票二维码指向的公开订单查询，无需认证
//! (认证中间件对 `/api/public/` 前缀放行)。

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/public/orders/{order_number}", get(handler::track_order))
}
