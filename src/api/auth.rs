//! Optional `X-Api-Key` authentication.
//!
//! When `api.api_key` is configured every route, `/health` included, requires
//! the header to match exactly (case-sensitive, no trimming).

use crate::error::ApiError;
use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Header carrying the key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Middleware rejecting requests whose `X-Api-Key` does not match `expected`
pub async fn require_api_key(
    State(expected): State<Option<String>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = expected else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    match provided {
        Some(key) if keys_match(key.as_bytes(), expected.as_bytes()) => next.run(request).await,
        Some(_) => reject("Invalid API key"),
        None => reject("Missing X-Api-Key header"),
    }
}

/// Compare without short-circuiting on the first differing byte
fn keys_match(provided: &[u8], expected: &[u8]) -> bool {
    provided.len() == expected.len()
        && provided
            .iter()
            .zip(expected)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

fn reject(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(ApiError::unauthorized(message))).into_response()
}
