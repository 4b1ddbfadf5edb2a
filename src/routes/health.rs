use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use tracing::error;
use utoipa::OpenApi;

use crate::{
    models::{dto::Message, Error},
    AppState,
};

#[derive(OpenApi)]
#[openapi(paths(health_checker_handler))]
/// Defines the OpenAPI spec for the health endpoint
pub struct HealthApi;

/// Liveness check; also makes sure the database still answers
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "HEALTH",
    responses(
        (status = OK, description = "Service and database are up", body = Message),
        (status = SERVICE_UNAVAILABLE, description = "Database does not answer", body = Message)
    )
)]
pub async fn health_checker_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Message>, Error> {
    state.db.ping().await.map_err(|e| {
        error!(error = %e, "health check: database unavailable");
        Error::new(StatusCode::SERVICE_UNAVAILABLE, "Database unavailable")
    })?;
    Ok(Json(Message::new("OK, I'm alive!")))
}
