//! Error-response post-processing.
//!
//! Internal errors carry their collaborator detail in the body; this layer
//! strips it before the response leaves the process unless the deployment
//! explicitly exposes it (development only by default).

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::header::CONTENT_LENGTH,
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use crate::state::AppState;

const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

pub async fn redact_error_details(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    if state.config.api.expose_error_details || !response.status().is_server_error() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_ERROR_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            parts.headers.remove(CONTENT_LENGTH);
            return Response::from_parts(parts, Body::empty());
        }
    };

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(mut json) if json.get("detail").is_some() => {
            if let Some(obj) = json.as_object_mut() {
                obj.remove("detail");
            }
            let redacted = serde_json::to_vec(&json).unwrap_or_default();
            parts.headers.remove(CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(redacted))
        }
        _ => Response::from_parts(parts, Body::from(bytes)),
    }
}
