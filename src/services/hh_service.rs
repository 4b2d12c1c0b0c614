use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value as JsonValue};
use tracing::{info, instrument};
use url::Url;
use uuid::Uuid;

use crate::config::Config;
use crate::dto::vacancy_dto::VacancySearchQuery;
use crate::error::{Error, Result};
use crate::models::vacancy::NewVacancy;
use crate::services::hh_oauth::HH_SERVICE;
use crate::services::token_manager::TokenManager;
use crate::services::upstream::read_json;
use crate::utils::time::parse_provider_timestamp;

/// hh.ru REST API on behalf of a user. One outbound call per method.
#[derive(Clone)]
pub struct HhClient {
    client: Client,
    tokens: Arc<TokenManager>,
    api_base: String,
    user_agent: String,
    timeout: Duration,
}

impl HhClient {
    pub fn new(config: &Config, client: Client, tokens: Arc<TokenManager>) -> Self {
        Self {
            client,
            tokens,
            api_base: config.hh_api_base.trim_end_matches('/').to_string(),
            user_agent: config.hh_user_agent.clone(),
            timeout: Duration::from_secs(config.http_timeout_secs),
        }
    }

    /// `api_base` joined with `segments`, each one percent-encoded as a
    /// single path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        if segments.iter().any(|s| s.is_empty() || *s == "." || *s == "..") {
            return Err(Error::BadRequest(format!(
                "Invalid path segment in {:?}",
                segments
            )));
        }
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| Error::Config(format!("Invalid HH_API_BASE: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config("HH_API_BASE cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn authorized(&self, user_id: Uuid, builder: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.tokens.ensure_token(user_id, HH_SERVICE).await?;
        Ok(builder
            .bearer_auth(token)
            .header("HH-User-Agent", &self.user_agent)
            .timeout(self.timeout))
    }

    /// Proxies `GET /vacancies`. The payload is returned untouched.
    #[instrument(skip(self))]
    pub async fn search_vacancies(
        &self,
        user_id: Uuid,
        query: &VacancySearchQuery,
    ) -> Result<JsonValue> {
        let params = query.to_params();
        let mut builder = self.client.get(self.endpoint(&["vacancies"])?);
        if !params.is_empty() {
            builder = builder.query(&params);
        }
        let response = self.authorized(user_id, builder).await?.send().await?;
        read_json(response).await
    }

    #[instrument(skip(self))]
    pub async fn get_vacancy(&self, user_id: Uuid, external_id: &str) -> Result<NewVacancy> {
        let builder = self.client.get(self.endpoint(&["vacancies", external_id])?);
        let response = self.authorized(user_id, builder).await?.send().await?;
        let body = read_json(response).await?;
        Ok(vacancy_from_payload(external_id, &body))
    }

    /// Sends an application (a "negotiation") for `vacancy_id` with `resume_id`.
    #[instrument(skip(self, message))]
    pub async fn apply(
        &self,
        user_id: Uuid,
        vacancy_id: &str,
        resume_id: &str,
        message: &str,
    ) -> Result<JsonValue> {
        let builder = self
            .client
            .post(self.endpoint(&["negotiations"])?)
            .json(&json!({
                "vacancy_id": vacancy_id,
                "resume_id": resume_id,
                "message": message,
            }));
        let response = self.authorized(user_id, builder).await?.send().await?;
        let body = read_json(response).await?;
        info!(%user_id, vacancy_id, "Application accepted by hh.ru");
        Ok(body)
    }
}

fn vacancy_from_payload(external_id: &str, body: &JsonValue) -> NewVacancy {
    let text = |pointer: &str| {
        body.pointer(pointer)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };
    NewVacancy {
        external_id: external_id.to_string(),
        title: text("/name"),
        company: text("/employer/name"),
        description: text("/description"),
        url: text("/alternate_url"),
        published_at: text("/published_at").and_then(|s| parse_provider_timestamp(&s)),
    }
}
