use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    AppState,
};

pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller identity, inserted as a request extension by [`resolve_user`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

/// Identity comes from `X-User-Id`, else the configured development user.
/// Makes sure a row exists for it so foreign keys hold.
pub async fn resolve_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let user_id = user_id_from_headers(req.headers(), state.config.dev_user_id)?;
    state.store.ensure_user(user_id).await?;
    req.extensions_mut().insert(CurrentUser(user_id));
    Ok(next.run(req).await)
}

fn user_id_from_headers(headers: &HeaderMap, fallback: Option<Uuid>) -> Result<Uuid> {
    match headers.get(USER_ID_HEADER) {
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|raw| raw.trim().parse::<Uuid>().ok())
            .ok_or_else(|| Error::BadRequest("X-User-Id must be a UUID".to_string())),
        None => fallback.ok_or_else(|| Error::Unauthorized("missing X-User-Id header".to_string())),
    }
}
