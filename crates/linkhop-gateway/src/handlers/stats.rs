use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use linkhop_core::{Link, ShortCode};
use linkhop_shortener::LinkStats;

pub async fn list_stats_handler(State(state): State<AppState>) -> Result<Json<Vec<Link>>> {
    let links = state.links().list().await?;
    Ok(Json(state.stats().join_stats_onto_links(links).await))
}

pub async fn link_stats_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LinkStats>> {
    let code = ShortCode::new(id.as_str()).map_err(|_| AppError::InvalidId(id))?;
    Ok(Json(state.stats().aggregate_by_link(&code).await?))
}
