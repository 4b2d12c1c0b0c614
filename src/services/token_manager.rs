//! Bearer-token lifecycle for the external services.
//!
//! Each service is backed by a [`TokenProvider`]. Providers that can refresh
//! (OAuth2 with a refresh token) never re-authenticate on their own: when no
//! token is stored the caller gets [`Error::Auth`] and has to go through the
//! authorization-code flow. Providers that cannot refresh acquire a brand new
//! token from a static credential whenever the stored one is missing or stale.
//!
//! There is no locking. Two requests racing on the same expired token may both
//! renew it; the last upsert wins.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::database::store::TokenStore;
use crate::error::{Error, Result};
use crate::models::api_token::{ApiToken, TokenUpdate};

pub type Clock = fn() -> DateTime<Utc>;

/// How long a freshly issued token lives, as reported by the provider.
#[derive(Debug, Clone, PartialEq)]
pub enum Lifetime {
    ExpiresIn(i64),
    ExpiresAt(DateTime<Utc>),
    Unspecified,
}

/// Outcome of a successful token-endpoint call.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub lifetime: Lifetime,
}

impl TokenGrant {
    /// A relative lifetime that does not fit a timestamp is treated as unspecified.
    pub fn expires_at(&self, now: DateTime<Utc>, default: Option<Duration>) -> Option<DateTime<Utc>> {
        let fallback = || default.and_then(|d| now.checked_add_signed(d));
        match self.lifetime {
            Lifetime::ExpiresIn(secs) => Duration::try_seconds(secs)
                .and_then(|d| now.checked_add_signed(d))
                .or_else(fallback),
            Lifetime::ExpiresAt(at) => Some(at),
            Lifetime::Unspecified => fallback(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Key of the `api_tokens` row owned by this provider.
    fn service_name(&self) -> &'static str;

    fn can_refresh(&self) -> bool;

    /// Lifetime applied when the provider does not report one.
    fn default_lifetime(&self) -> Option<Duration> {
        None
    }

    async fn exchange_code(&self, _code: &str) -> Result<TokenGrant> {
        Err(Error::Auth(format!(
            "{} does not support the authorization-code grant",
            self.service_name()
        )))
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<TokenGrant> {
        Err(Error::Auth(format!(
            "{} does not support the refresh-token grant",
            self.service_name()
        )))
    }

    async fn acquire(&self) -> Result<TokenGrant> {
        Err(Error::Auth(format!(
            "{} cannot issue tokens without user authorization",
            self.service_name()
        )))
    }
}

#[derive(Clone)]
pub struct TokenManager {
    store: Arc<dyn TokenStore>,
    providers: HashMap<&'static str, Arc<dyn TokenProvider>>,
    clock: Clock,
}

impl TokenManager {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            providers: HashMap::new(),
            clock: Utc::now,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.providers.insert(provider.service_name(), provider);
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn provider(&self, service: &str) -> Result<&Arc<dyn TokenProvider>> {
        self.providers
            .get(service)
            .ok_or_else(|| Error::Auth(format!("No token provider registered for {}", service)))
    }

    /// Returns an access token for `service` that is valid at call time,
    /// renewing it first when the stored one is missing or expired.
    #[instrument(skip(self))]
    pub async fn ensure_token(&self, user_id: Uuid, service: &str) -> Result<String> {
        let provider = self.provider(service)?;
        let now = (self.clock)();
        let stored = self.store.get_token(user_id, service).await?;

        match stored {
            Some(token) if token.is_usable(now) => Ok(token.access_token),
            Some(token) if provider.can_refresh() => {
                let refresh_token = token.refresh_token.clone().ok_or_else(|| {
                    Error::Auth(format!(
                        "Stored {} token expired and has no refresh token; authorize again",
                        service
                    ))
                })?;
                info!(%user_id, service, expired_at = ?token.expires_at, "Refreshing access token");
                let grant = provider.refresh(&refresh_token).await.map_err(|e| {
                    warn!(%user_id, service, error = %e, "Token refresh failed");
                    into_auth_error(service, e)
                })?;
                let saved = self.persist(user_id, provider.as_ref(), grant, Some(&token)).await?;
                Ok(saved.access_token)
            }
            None if provider.can_refresh() => Err(Error::Auth(format!(
                "No {} token stored; complete the authorization flow first",
                service
            ))),
            _ => {
                info!(%user_id, service, "Acquiring new access token");
                let grant = provider.acquire().await.map_err(|e| {
                    warn!(%user_id, service, error = %e, "Token exchange failed");
                    into_auth_error(service, e)
                })?;
                let saved = self.persist(user_id, provider.as_ref(), grant, None).await?;
                Ok(saved.access_token)
            }
        }
    }

    /// Finishes the authorization-code flow: trades `code` for a token pair and stores it.
    #[instrument(skip(self, code))]
    pub async fn complete_authorization(
        &self,
        user_id: Uuid,
        service: &str,
        code: &str,
    ) -> Result<ApiToken> {
        let provider = self.provider(service)?;
        let grant = provider
            .exchange_code(code)
            .await
            .map_err(|e| into_auth_error(service, e))?;
        let saved = self.persist(user_id, provider.as_ref(), grant, None).await?;
        info!(%user_id, service, expires_at = ?saved.expires_at, "Authorization completed");
        Ok(saved)
    }

    async fn persist(
        &self,
        user_id: Uuid,
        provider: &dyn TokenProvider,
        grant: TokenGrant,
        previous: Option<&ApiToken>,
    ) -> Result<ApiToken> {
        let now = (self.clock)();
        let expires_at = grant.expires_at(now, provider.default_lifetime());
        let refresh_token = grant
            .refresh_token
            .or_else(|| previous.and_then(|p| p.refresh_token.clone()));

        self.store
            .upsert_token(
                user_id,
                provider.service_name(),
                TokenUpdate {
                    access_token: grant.access_token,
                    refresh_token,
                    expires_at,
                },
            )
            .await
    }
}

/// Token-endpoint rejections surface as `Auth` so callers can tell
/// "authorize again" apart from "try later". Transport failures pass through.
fn into_auth_error(service: &str, err: Error) -> Error {
    match err {
        Error::Upstream { status, body } => Error::Auth(format!(
            "{} token endpoint rejected the request ({}): {}",
            service, status, body
        )),
        other => other,
    }
}
