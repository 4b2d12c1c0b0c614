use axum::{response::IntoResponse, Json};
use utoipa::OpenApi;

use crate::dto::{
    application_dto::{
        ApplicationDetail, ApplicationListResponse, ApplicationResponse, CreateApplicationPayload,
    },
    auth_dto::{AuthorizeResponse, CallbackResponse},
    cover_letter_dto::{CoverLetterRequest, CoverLetterResponse},
    filter_dto::{FilterResponse, SaveFilterPayload},
    log_dto::LogResponse,
    user_dto::{CreateUserPayload, UserResponse},
    vacancy_dto::{SaveVacancyPayload, VacancyListResponse, VacancyResponse, VacancySearchQuery},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::health::health,
        super::auth::authorize,
        super::auth::callback,
        super::vacancy::search_vacancies,
        super::vacancy::save_vacancy,
        super::vacancy::list_vacancies,
        super::cover_letter::generate_cover_letter,
        super::application::create_application,
        super::application::list_applications,
        super::application::get_application,
        super::filter::list_filters,
        super::filter::save_filter,
        super::log::list_logs,
        super::user::create_user,
        super::user::get_user,
        super::user::find_user_by_email,
    ),
    components(schemas(
        AuthorizeResponse,
        CallbackResponse,
        VacancySearchQuery,
        SaveVacancyPayload,
        VacancyResponse,
        VacancyListResponse,
        CoverLetterRequest,
        CoverLetterResponse,
        CreateApplicationPayload,
        ApplicationResponse,
        ApplicationDetail,
        ApplicationListResponse,
        SaveFilterPayload,
        FilterResponse,
        LogResponse,
        CreateUserPayload,
        UserResponse,
    )),
    tags((name = "applier-backend", description = "Job-board auto applier"))
)]
pub struct ApiDoc;

#[axum::debug_handler]
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
