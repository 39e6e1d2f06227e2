use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::domain::podcast::{PodcastService, PodcastServiceApi};

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn health_ready(State(service): State<Arc<PodcastService>>) -> impl IntoResponse {
    let readiness = service.readiness().await;
    let (status, label) = if readiness.is_ready() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready")
    };

    (
        status,
        Json(json!({
            "status": label,
            "queue": if readiness.queue_accepting { "accepting" } else { "closed" },
            "storage": if readiness.output_dir_ready { "available" } else { "unavailable" },
            "trackedJobs": readiness.tracked_jobs,
        })),
    )
}
