//! Liveness, readiness and build info for the admin API.

use crate::config::Resource;
use crate::error::ErrorKind;
use crate::query::Pagination;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct Liveness {
    status: &'static str,
}

#[derive(Serialize)]
struct Readiness {
    status: &'static str,
    backend: &'static str,
}

#[derive(Serialize)]
struct BuildInfo {
    name: &'static str,
    version: &'static str,
    resources: Vec<&'static str>,
}

/// The process is up; says nothing about the backend.
async fn live() -> Json<Liveness> {
    Json(Liveness { status: "ok" })
}

/// Ready when the backend answers a one-row list. Any answer other than a transport failure counts.
async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Readiness>) {
    let answered = state
        .adapter
        .list(Resource::SiteSettings, &[], None, Some(Pagination::new(0, 1)))
        .await;
    match answered {
        Err(e) if e.kind == ErrorKind::BackendUnavailable => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(Readiness {
                status: "degraded",
                backend: "unavailable",
            }),
        ),
        _ => (
            StatusCode::OK,
            Json(Readiness {
                status: "ok",
                backend: "ok",
            }),
        ),
    }
}

async fn build_info() -> Json<BuildInfo> {
    Json(BuildInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        resources: Resource::ALL.iter().map(|r| r.name()).collect(),
    })
}

/// GET /health, GET /ready, GET /version.
pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(live))
        .route("/ready", get(ready))
        .route("/version", get(build_info))
        .with_state(state)
}
