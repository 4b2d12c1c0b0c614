use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
    Extension,
};

use crate::{
    dto::log_dto::{LogListQuery, LogResponse},
    error::Result,
    middleware::identity::CurrentUser,
    AppState,
};

#[utoipa::path(
    get,
    path = "/logs",
    params(LogListQuery),
    responses(
        (status = 200, description = "Audit trail, newest first", body = [LogResponse])
    )
)]
#[axum::debug_handler]
pub async fn list_logs(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Query(query): Query<LogListQuery>,
) -> Result<impl IntoResponse> {
    let items = state.store.list_logs(user_id, query.limit()).await?;
    Ok(Json(
        items.into_iter().map(LogResponse::from).collect::<Vec<_>>(),
    ))
}
