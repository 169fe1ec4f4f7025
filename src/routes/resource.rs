//! Resource CRUD routes. Handlers resolve the resource by path segment against the registry.

use crate::handlers::resource::{create, delete as delete_handler, list, read, resources, update};
use crate::state::AppState;
use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

pub fn resource_routes(state: AppState) -> Router {
    let limit = state.max_body_bytes;
    Router::new()
        .route("/resources", get(resources))
        .route("/:resource", get(list).post(create))
        .route(
            "/:resource/:id",
            get(read).patch(update).delete(delete_handler),
        )
        .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(limit)))
        .with_state(state)
}
