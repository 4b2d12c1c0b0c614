use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json, Redirect, Response},
    Extension,
};
use tracing::info;

use crate::{
    dto::auth_dto::{AuthorizeQuery, AuthorizeResponse, CallbackQuery, CallbackResponse},
    error::{Error, Result},
    middleware::identity::CurrentUser,
    models::log::ACTION_TOKEN_AUTHORIZED,
    services::hh_oauth::HH_SERVICE,
    utils::token::generate_state,
    AppState,
};

/// Maps the public provider slug to the stored service name.
fn service_for(provider: &str) -> Result<&'static str> {
    match provider {
        "hh" => Ok(HH_SERVICE),
        other => Err(Error::NotFound(format!("Unknown OAuth provider: {}", other))),
    }
}

#[utoipa::path(
    get,
    path = "/auth/{provider}/authorize",
    params(
        ("provider" = String, Path, description = "OAuth provider, `hh`"),
        AuthorizeQuery
    ),
    responses(
        (status = 307, description = "Redirect to the provider's consent page"),
        (status = 200, description = "Authorization URL", body = AuthorizeResponse),
        (status = 404, description = "Unknown provider")
    )
)]
#[axum::debug_handler]
pub async fn authorize(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<AuthorizeQuery>,
) -> Result<Response> {
    service_for(&provider)?;
    let oauth_state = generate_state();
    let url = state
        .hh_oauth
        .authorize_url(&oauth_state, query.skip_choose_account, query.force_login)?;

    if query.redirect {
        return Ok(Redirect::temporary(&url).into_response());
    }
    Ok(Json(AuthorizeResponse {
        authorize_url: url,
        state: oauth_state,
    })
    .into_response())
}

#[utoipa::path(
    get,
    path = "/auth/{provider}/callback",
    params(
        ("provider" = String, Path, description = "OAuth provider, `hh`"),
        CallbackQuery
    ),
    responses(
        (status = 200, description = "Token stored", body = CallbackResponse),
        (status = 400, description = "Provider reported an error or no code was given"),
        (status = 401, description = "Code exchange was rejected")
    )
)]
#[axum::debug_handler]
pub async fn callback(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Result<impl IntoResponse> {
    let service = service_for(&provider)?;
    if let Some(error) = query.error {
        return Err(Error::BadRequest(format!("Authorization was not granted: {}", error)));
    }
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| Error::BadRequest("Missing authorization code".to_string()))?;

    let token = state
        .tokens
        .complete_authorization(user_id, service, &code)
        .await?;
    state
        .store
        .add_log(
            user_id,
            ACTION_TOKEN_AUTHORIZED,
            &format!("Authorized {} access", service),
        )
        .await?;
    info!(%user_id, service, "OAuth authorization completed");

    Ok(Json(CallbackResponse {
        status: "authorized".to_string(),
        service: service.to_string(),
        expires_at: token.expires_at,
    }))
}
