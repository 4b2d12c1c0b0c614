use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::{
    dto::vacancy_dto::{
        SaveVacancyPayload, VacancyListQuery, VacancyListResponse, VacancyResponse,
        VacancySearchQuery,
    },
    error::Result,
    middleware::identity::CurrentUser,
    AppState,
};

#[utoipa::path(
    post,
    path = "/vacancies/search",
    request_body = VacancySearchQuery,
    responses(
        (status = 200, description = "Job-board search results, passed through", body = Object),
        (status = 401, description = "Job board is not authorized for this user")
    )
)]
#[axum::debug_handler]
pub async fn search_vacancies(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(payload): Json<VacancySearchQuery>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let result = state.hh.search_vacancies(user_id, &payload).await?;
    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/vacancies",
    request_body = SaveVacancyPayload,
    responses(
        (status = 201, description = "Vacancy stored", body = VacancyResponse),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn save_vacancy(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(payload): Json<SaveVacancyPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let vacancy = state.store.save_vacancy(user_id, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(VacancyResponse::from(vacancy))))
}

#[utoipa::path(
    get,
    path = "/vacancies",
    params(VacancyListQuery),
    responses(
        (status = 200, description = "Stored vacancies, newest first", body = VacancyListResponse)
    )
)]
#[axum::debug_handler]
pub async fn list_vacancies(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Query(query): Query<VacancyListQuery>,
) -> Result<impl IntoResponse> {
    let items = state.store.list_vacancies(user_id, query.limit()).await?;
    Ok(Json(VacancyListResponse {
        items: items.into_iter().map(VacancyResponse::from).collect(),
    }))
}
