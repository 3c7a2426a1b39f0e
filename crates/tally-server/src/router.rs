//! Axum router wiring.

use axum::{
    routing::{get, post},
    Router,
};

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .route("/v1/counters", get(transport::http::list_counters))
        .route(
            "/v1/counters/:name",
            get(transport::http::get_counter).delete(transport::http::reset_counter),
        )
        .route(
            "/v1/counters/:name/increment",
            post(transport::http::increment_counter),
        )
        .route("/v1/ws", get(transport::ws::ws_upgrade))
        .with_state(state)
}
