use axum::{extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::middleware::ApiResponse;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    status: &'static str,
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'static str>,
}

/// GET /health - storage gateway reachability
pub async fn health(State(state): State<AppState>) -> ApiResponse<HealthReport> {
    let timestamp = Utc::now();

    match state.services.health.check().await {
        Ok(()) => ApiResponse::success(HealthReport {
            status: "ok",
            timestamp,
            database: Some("ok"),
        }),
        Err(_) => ApiResponse::failure(
            StatusCode::SERVICE_UNAVAILABLE,
            "database unavailable",
            HealthReport {
                status: "degraded",
                timestamp,
                database: None,
            },
        ),
    }
}
