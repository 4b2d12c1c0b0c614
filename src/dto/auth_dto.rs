use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

fn default_redirect() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuthorizeQuery {
    /// Answer with a 307 redirect (default) or with the URL as JSON.
    #[serde(default = "default_redirect")]
    pub redirect: bool,
    #[serde(default)]
    pub skip_choose_account: bool,
    #[serde(default)]
    pub force_login: bool,
}

/// The provider also echoes `state`; it is not checked and not listed here.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackQuery {
    pub code: Option<String>,
    /// Set by the provider when the user declined access.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthorizeResponse {
    pub authorize_url: String,
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CallbackResponse {
    pub status: String,
    pub service: String,
    pub expires_at: Option<DateTime<Utc>>,
}
