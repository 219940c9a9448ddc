//! Price Catalog API 模块
//!
//! 价目表写操作仅限管理员。

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/prices", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new().route("/", get(handler::list));

    let write_routes = Router::new()
        .route("/", axum::routing::post(handler::create_or_update))
        .route("/{id}", axum::routing::put(handler::update))
        .layer(middleware::from_fn(require_admin));

    read_routes.merge(write_routes)
}
