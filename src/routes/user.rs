use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::user_dto::{CreateUserPayload, UserLookupQuery, UserResponse},
    error::{Error, Result},
    utils::crypto::hash_password,
    AppState,
};

#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Email already registered")
    )
)]
#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let password_hash = payload
        .password
        .as_deref()
        .map(hash_password)
        .transpose()?;
    let user = state
        .store
        .create_user(&payload.name, &payload.email, password_hash)
        .await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user = state
        .store
        .get_user(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User {} not found", id)))?;
    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/users",
    params(UserLookupQuery),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn find_user_by_email(
    State(state): State<AppState>,
    Query(query): Query<UserLookupQuery>,
) -> Result<impl IntoResponse> {
    let user = state
        .store
        .get_user_by_email(&query.email)
        .await?
        .ok_or_else(|| Error::NotFound(format!("No user with email {}", query.email)))?;
    Ok(Json(UserResponse::from(user)))
}
