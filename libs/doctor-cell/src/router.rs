// libs/doctor-cell/src/router.rs
use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    // Slot queries are tenant-scoped, so every route requires authentication
    let protected_routes = Router::new()
        .route(
            "/{doctor_id}/available-slots",
            get(handlers::get_available_slots),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
