//! Router builders.

mod common;
mod resource;

pub use common::common_routes;
pub use resource::resource_routes;

use crate::state::AppState;
use axum::Router;

/// Full admin API: common routes at the root, resources under `/api/v1`.
pub fn admin_router(state: AppState) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .nest("/api/v1", resource_routes(state))
}
