use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde_json::{json, Value as JsonValue};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::dto::cover_letter_dto::CoverLetterRequest;
use crate::error::{Error, Result};
use crate::services::token_manager::{Lifetime, TokenGrant, TokenManager, TokenProvider};
use crate::services::upstream::{as_i64_lenient, read_json};
use crate::utils::time::parse_provider_timestamp;

pub const GIGACHAT_SERVICE: &str = "gigaChat";

/// Tokens issued by the Basic exchange live about 30 minutes.
pub const DEFAULT_TOKEN_LIFETIME_MINUTES: i64 = 29;

/// GigaChat's Basic-credential-to-bearer exchange. Needs no user input, so
/// a missing or stale token is simply replaced.
#[derive(Clone)]
pub struct GigaChatAuthProvider {
    client: Client,
    auth_url: String,
    basic_credential: String,
    scope: String,
    timeout: Duration,
}

impl GigaChatAuthProvider {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            auth_url: config.gigachat_auth_url.clone(),
            basic_credential: config.gigachat_auth_basic.clone(),
            scope: config.gigachat_scope.clone(),
            timeout: Duration::from_secs(config.http_timeout_secs),
        }
    }
}

#[async_trait]
impl TokenProvider for GigaChatAuthProvider {
    fn service_name(&self) -> &'static str {
        GIGACHAT_SERVICE
    }

    fn can_refresh(&self) -> bool {
        false
    }

    fn default_lifetime(&self) -> Option<chrono::Duration> {
        Some(chrono::Duration::minutes(DEFAULT_TOKEN_LIFETIME_MINUTES))
    }

    #[instrument(skip(self))]
    async fn acquire(&self) -> Result<TokenGrant> {
        let response = self
            .client
            .post(&self.auth_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header("RqUID", Uuid::new_v4().to_string())
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Basic {}", self.basic_credential),
            )
            .form(&[("scope", self.scope.as_str())])
            .timeout(self.timeout)
            .send()
            .await?;
        let body = read_json(response).await?;
        parse_exchange_response(&body)
    }
}

fn parse_exchange_response(body: &JsonValue) -> Result<TokenGrant> {
    let access_token = body
        .get("access_token")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            Error::Auth(format!("{} exchange response has no access_token", GIGACHAT_SERVICE))
        })?;

    let lifetime = if let Some(raw) = body.get("expires_at") {
        parse_expires_at(raw)
            .map(Lifetime::ExpiresAt)
            .unwrap_or(Lifetime::Unspecified)
    } else if let Some(secs) = body
        .get("expires_in")
        .and_then(as_i64_lenient)
        .filter(|secs| *secs > 0)
    {
        Lifetime::ExpiresIn(secs)
    } else {
        Lifetime::Unspecified
    };

    Ok(TokenGrant {
        access_token: access_token.to_string(),
        refresh_token: None,
        lifetime,
    })
}

/// `expires_at` arrives as epoch milliseconds; seconds and RFC 3339 strings
/// are accepted as well.
fn parse_expires_at(raw: &JsonValue) -> Option<DateTime<Utc>> {
    if let Some(s) = raw.as_str() {
        if let Some(ts) = parse_provider_timestamp(s) {
            return Some(ts);
        }
    }
    let n = as_i64_lenient(raw)?;
    if n > 10_000_000_000 {
        Utc.timestamp_millis_opt(n).single()
    } else {
        Utc.timestamp_opt(n, 0).single()
    }
}

/// Cover-letter generation through GigaChat chat completions.
#[derive(Clone)]
pub struct GigaChatClient {
    client: Client,
    tokens: Arc<TokenManager>,
    api_base: String,
    model: String,
    timeout: Duration,
}

impl GigaChatClient {
    pub fn new(config: &Config, client: Client, tokens: Arc<TokenManager>) -> Self {
        Self {
            client,
            tokens,
            api_base: config.gigachat_api_base.trim_end_matches('/').to_string(),
            model: config.gigachat_model.clone(),
            timeout: Duration::from_secs(config.llm_timeout_secs),
        }
    }

    #[instrument(skip(self, request), fields(tone = ?request.tone))]
    pub async fn generate_cover_letter(
        &self,
        user_id: Uuid,
        request: &CoverLetterRequest,
    ) -> Result<String> {
        let bearer = self.tokens.ensure_token(user_id, GIGACHAT_SERVICE).await?;
        let payload = build_chat_payload(&self.model, request);

        let response = self
            .client
            .post(format!("{}/api/v1/chat/completions", self.api_base))
            .bearer_auth(bearer)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await?;
        let body = read_json(response).await?;
        let letter = extract_cover_letter(&body);
        info!(%user_id, chars = letter.len(), "Cover letter generated");
        Ok(letter)
    }
}

fn build_chat_payload(model: &str, request: &CoverLetterRequest) -> JsonValue {
    let tone = match request.tone.as_deref() {
        None | Some("formal") => "formal and businesslike",
        Some(_) => "friendly and warm",
    };
    let system_prompt = format!(
        "You are an assistant that writes cover letters for job applications. \
         Using the vacancy description and the candidate's resume, write a short, \
         specific letter in the language of the vacancy. Tone: {}.",
        tone
    );
    let user_prompt = format!(
        "Vacancy:\n{}\n\nResume:\n{}\n\nWrite the cover letter.",
        request.vacancy_description, request.resume_text
    );

    let mut payload = json!({
        "model": model,
        "messages": [
            {"role": "system", "content": system_prompt},
            {"role": "user", "content": user_prompt}
        ],
        "temperature": 0.5
    });
    if let Some(max_length) = request.max_length {
        payload["max_tokens"] = json!(max_length);
    }
    payload
}

/// `choices[0].message.content`, or the whole payload when it has another shape.
fn extract_cover_letter(body: &JsonValue) -> String {
    body.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| body.to_string())
}
