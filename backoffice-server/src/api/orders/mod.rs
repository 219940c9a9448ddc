//! Order API 模块

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/delayed", get(handler::delayed))
        .route("/customer/{id}", get(handler::by_customer))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route("/{id}/status", put(handler::update_status))
        .route("/{id}/note", put(handler::update_note))
        .route("/{id}/items", put(handler::update_items))
        .route("/{id}/ticket", get(handler::ticket))
}
