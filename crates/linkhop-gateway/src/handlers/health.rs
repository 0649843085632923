use crate::model::HealthResponse;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache = if state.links().cache_healthy().await {
        "up"
    } else {
        "down"
    };
    Json(HealthResponse {
        status: "ok",
        cache,
    })
}
