use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::{
    dto::filter_dto::{FilterResponse, SaveFilterPayload},
    error::Result,
    middleware::identity::CurrentUser,
    AppState,
};

#[utoipa::path(
    get,
    path = "/filters",
    responses(
        (status = 200, description = "Saved search filters", body = [FilterResponse])
    )
)]
#[axum::debug_handler]
pub async fn list_filters(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<impl IntoResponse> {
    let items = state.store.list_filters(user_id).await?;
    Ok(Json(
        items.into_iter().map(FilterResponse::from).collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    post,
    path = "/filters",
    request_body = SaveFilterPayload,
    responses(
        (status = 201, description = "Filter saved", body = FilterResponse),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn save_filter(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(payload): Json<SaveFilterPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let filter = state.store.save_filter(user_id, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(FilterResponse::from(filter))))
}
