//! Health check handlers.

use axum::{extract::State, response::Json, routing::get, Router};

use crate::service::Health;
use crate::state::AppState;

/// Create health routes.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

/// Liveness check with service description
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up", body = Health)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<Health> {
    Json(state.app.get_health())
}
