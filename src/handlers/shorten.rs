use crate::{
    codegen::ShortenError,
    models::{ShortenRequest, ShortenResponse},
    AppState,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// POST /shorten
///
/// Validates the payload (the core assumes validated input), asks the
/// shortener for a freshly claimed code, and returns the composed short URL.
pub async fn shorten(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ShortenRequest>,
) -> Response {
    let url = request.url.trim().to_owned();
    if url.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "url is required" })),
        )
            .into_response();
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "url must start with http:// or https://" })),
        )
            .into_response();
    }
    // Control characters can't be sent back in a Location header, so a
    // mapping for such a URL could never be redirected to.
    if url.chars().any(|c| c.is_ascii_control()) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "url must not contain control characters" })),
        )
            .into_response();
    }

    match state.shortener.shorten(state.store.as_ref(), &url).await {
        Ok(code) => {
            let body = ShortenResponse {
                short_url: format!("{}/{}", state.config.base_url, code),
                code,
                url,
            };
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(e @ ShortenError::ExhaustedRetries { .. }) => {
            // Code space too small for the store size; retrying the same
            // request won't help until the configuration changes.
            tracing::error!("shorten failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
        Err(ShortenError::Store(e)) => {
            tracing::error!("store error while shortening '{}': {:?}", url, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}
