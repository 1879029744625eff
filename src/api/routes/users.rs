//! Registration and stored text handlers.

use super::{RegisterUserRequest, RegisterUserResponse};
use crate::api::AppState;
use crate::error::Result;
use crate::types::TextPair;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// POST /users - Register a user (idempotent)
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User registered (or already registered)", body = RegisterUserResponse),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<RegisterUserResponse>)> {
    let created = state
        .worker
        .register_user(request.user_id, request.username.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterUserResponse {
            user_id: request.user_id,
            created,
        }),
    ))
}

/// GET /users/:id/texts - Stored pairs of a user, oldest first
#[utoipa::path(
    get,
    path = "/users/{id}/texts",
    tag = "users",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Stored text pairs", body = Vec<TextPair>),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn get_user_texts(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<TextPair>>> {
    Ok(Json(state.worker.get_texts(user_id).await?))
}
