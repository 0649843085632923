use crate::error::{AppError, Result};
use crate::model::CreateLinkRequest;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, LOCATION, REFERER, USER_AGENT};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use linkhop_core::{Link, Platform, ShortCode};
use linkhop_shortener::LinkError;
use tracing::warn;

/// Browsers and CDNs may reuse a redirect for this long.
const REDIRECT_CACHE_CONTROL: &str = "public, max-age=300";

fn header_str(headers: &HeaderMap, name: HeaderName) -> Option<&str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

pub async fn create_link_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Link>)> {
    let request: CreateLinkRequest =
        serde_json::from_slice(&body).map_err(|_| AppError::InvalidJson)?;

    let link = state.links().create(&request.long).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response> {
    // An id that could never have been issued is simply unknown.
    let code = ShortCode::new(id.as_str()).map_err(|_| LinkError::NotFound(id))?;
    let original_url = state.links().resolve(&code).await?;

    let platform = Platform::detect(
        header_str(&headers, USER_AGENT),
        header_str(&headers, REFERER),
    );
    state.stats().record(&code, platform);

    Ok((
        StatusCode::MOVED_PERMANENTLY,
        [
            (LOCATION, original_url),
            (CACHE_CONTROL, REDIRECT_CACHE_CONTROL.to_string()),
        ],
    )
        .into_response())
}

pub async fn delete_link_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let code = ShortCode::new(id.as_str()).map_err(|_| AppError::InvalidId(id))?;

    state.links().delete(&code).await?;

    if let Err(e) = state.stats().delete_for_link(&code).await {
        warn!(code = %code, error = %e, "Link deleted but its stats were not");
        return Ok((StatusCode::NO_CONTENT, "Link deleted but stats deletion failed").into_response());
    }

    Ok(StatusCode::NO_CONTENT.into_response())
}
