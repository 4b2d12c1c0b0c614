use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::instrument;
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::services::token_manager::{Lifetime, TokenGrant, TokenProvider};
use crate::services::upstream::{as_i64_lenient, read_json};

pub const HH_SERVICE: &str = "hh.ru";

/// hh.ru OAuth2: authorization-code grant plus refresh-token grant.
#[derive(Clone)]
pub struct HhOAuthProvider {
    client: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    authorize_url: String,
    token_url: String,
    user_agent: String,
    timeout: Duration,
}

impl HhOAuthProvider {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            client_id: config.hh_client_id.clone(),
            client_secret: config.hh_client_secret.clone(),
            redirect_uri: config.hh_redirect_uri.clone(),
            authorize_url: config.hh_authorize_url.clone(),
            token_url: format!("{}/token", config.hh_api_base.trim_end_matches('/')),
            user_agent: config.hh_user_agent.clone(),
            timeout: Duration::from_secs(config.http_timeout_secs),
        }
    }

    /// URL the user is sent to in order to grant access.
    pub fn authorize_url(
        &self,
        state: &str,
        skip_choose_account: bool,
        force_login: bool,
    ) -> Result<String> {
        let mut url = Url::parse(&self.authorize_url)
            .map_err(|e| Error::Config(format!("Invalid HH_AUTHORIZE_URL: {}", e)))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", self.client_id.as_str())
                .append_pair("redirect_uri", self.redirect_uri.as_str())
                .append_pair("state", state);
            if skip_choose_account {
                query.append_pair("skip_choose_account", "true");
            }
            if force_login {
                query.append_pair("force_login", "true");
            }
        }
        Ok(url.into())
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenGrant> {
        let response = self
            .client
            .post(&self.token_url)
            .header("HH-User-Agent", &self.user_agent)
            .form(form)
            .timeout(self.timeout)
            .send()
            .await?;
        let body = read_json(response).await?;
        parse_token_response(&body)
    }
}

#[async_trait]
impl TokenProvider for HhOAuthProvider {
    fn service_name(&self) -> &'static str {
        HH_SERVICE
    }

    fn can_refresh(&self) -> bool {
        true
    }

    #[instrument(skip(self, code))]
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ])
        .await
    }

    #[instrument(skip(self, refresh_token))]
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ])
        .await
    }
}

fn parse_token_response(body: &JsonValue) -> Result<TokenGrant> {
    let access_token = body
        .get("access_token")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Auth(format!("{} token response has no access_token", HH_SERVICE)))?;

    let lifetime = match body.get("expires_in").and_then(as_i64_lenient) {
        Some(secs) if secs > 0 => Lifetime::ExpiresIn(secs),
        _ => Lifetime::Unspecified,
    };

    Ok(TokenGrant {
        access_token: access_token.to_string(),
        refresh_token: body
            .get("refresh_token")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        lifetime,
    })
}
