use crate::AppState;
use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// GET /:code
///
/// Resolve the code in the mapping store and redirect. An unknown code is a
/// plain 404 — the store reports it as `None`, never as an error.
pub async fn redirect(State(state): State<Arc<AppState>>, Path(code): Path<String>) -> Response {
    match state.store.get(&code).await {
        // The Location header is built fallibly: a stored URL that isn't a
        // valid header value must surface as an error, not a panic.
        Ok(Some(mapping)) => match HeaderValue::try_from(mapping.long_url.as_str()) {
            Ok(location) => {
                (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response()
            }
            Err(_) => {
                tracing::error!(
                    "stored URL for code '{}' is not a valid Location header",
                    code
                );
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        },
        Ok(None) => (StatusCode::NOT_FOUND, "Short link not found").into_response(),
        Err(e) => {
            tracing::error!("store error looking up code '{}': {:?}", code, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}
