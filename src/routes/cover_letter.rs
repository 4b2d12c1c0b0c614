use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::{
    dto::cover_letter_dto::{CoverLetterRequest, CoverLetterResponse},
    error::Result,
    middleware::identity::CurrentUser,
    AppState,
};

#[utoipa::path(
    post,
    path = "/cover-letter/generate",
    request_body = CoverLetterRequest,
    responses(
        (status = 200, description = "Generated cover letter", body = CoverLetterResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "LLM credentials were rejected")
    )
)]
#[axum::debug_handler]
pub async fn generate_cover_letter(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(payload): Json<CoverLetterRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let cover_letter = state
        .gigachat
        .generate_cover_letter(user_id, &payload)
        .await?;
    Ok(Json(CoverLetterResponse { cover_letter }))
}
