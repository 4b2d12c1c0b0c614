use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::application_dto::{
        ApplicationDetail, ApplicationListQuery, ApplicationListResponse, ApplicationResponse,
        CreateApplicationPayload,
    },
    error::{Error, Result},
    middleware::identity::CurrentUser,
    models::application::{ApplicationFilter, ApplicationStatus},
    AppState,
};

#[utoipa::path(
    post,
    path = "/applications",
    request_body = CreateApplicationPayload,
    responses(
        (status = 201, description = "Application created", body = ApplicationResponse),
        (status = 400, description = "Invalid payload or missing resume"),
        (status = 401, description = "Job board or LLM is not authorized"),
        (status = 422, description = "Job board rejected the application")
    )
)]
#[axum::debug_handler]
pub async fn create_application(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(payload): Json<CreateApplicationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let submission = state.applications.submit(user_id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApplicationResponse {
            application_id: submission.application.id,
            status: submission.application.status,
            upstream_response: submission.upstream_response,
            cover_letter: submission.application.cover_letter,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/applications",
    params(ApplicationListQuery),
    responses(
        (status = 200, description = "Applications, newest first", body = ApplicationListResponse),
        (status = 400, description = "Unknown status filter")
    )
)]
#[axum::debug_handler]
pub async fn list_applications(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Query(query): Query<ApplicationListQuery>,
) -> Result<impl IntoResponse> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            s.parse::<ApplicationStatus>()
                .map_err(|_| Error::BadRequest(format!("Unknown application status: {}", s)))
        })
        .transpose()?;
    let items = state
        .applications
        .list(
            user_id,
            ApplicationFilter {
                vacancy_id: query.vacancy_id,
                status,
            },
        )
        .await?;
    Ok(Json(ApplicationListResponse {
        items: items.into_iter().map(ApplicationDetail::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/applications/{id}",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Application found", body = ApplicationDetail),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn get_application(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let application = state.applications.get(user_id, id).await?;
    Ok(Json(ApplicationDetail::from(application)))
}
