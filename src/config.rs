use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use dotenvy::dotenv;
use std::env;
use uuid::Uuid;

pub const DEFAULT_HH_AUTHORIZE_URL: &str = "https://hh.ru/oauth/authorize";
pub const DEFAULT_HH_API_BASE: &str = "https://api.hh.ru";
pub const DEFAULT_GIGACHAT_AUTH_URL: &str = "https://ngw.devices.sberbank.ru:9443/api/v2/oauth";
pub const DEFAULT_GIGACHAT_API_BASE: &str = "https://gigachat.devices.sberbank.ru";

/// Process configuration. Built once in `main` and handed to every component
/// that needs it; nothing below the bootstrap reads the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub dev_user_id: Option<Uuid>,
    pub http_timeout_secs: u64,
    pub llm_timeout_secs: u64,

    pub hh_client_id: String,
    pub hh_client_secret: String,
    pub hh_redirect_uri: String,
    pub hh_authorize_url: String,
    pub hh_api_base: String,
    pub hh_user_agent: String,
    pub hh_default_resume_id: Option<String>,

    pub gigachat_auth_basic: String,
    pub gigachat_scope: String,
    pub gigachat_auth_url: String,
    pub gigachat_api_base: String,
    pub gigachat_model: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:8000"),
            database_url: get_env("DATABASE_URL")?,
            dev_user_id: get_env_opt("DEV_USER_ID")
                .map(|raw| {
                    raw.parse::<Uuid>()
                        .map_err(|e| Error::Config(format!("Invalid value for DEV_USER_ID: {}", e)))
                })
                .transpose()?,
            http_timeout_secs: get_env_parse_or("HTTP_TIMEOUT_SECS", 30)?,
            llm_timeout_secs: get_env_parse_or("LLM_TIMEOUT_SECS", 60)?,

            hh_client_id: get_env("HH_CLIENT_ID")?,
            hh_client_secret: get_env("HH_CLIENT_SECRET")?,
            hh_redirect_uri: get_env_or("HH_REDIRECT_URI", "http://localhost:8000/auth/hh/callback"),
            hh_authorize_url: get_env_or("HH_AUTHORIZE_URL", DEFAULT_HH_AUTHORIZE_URL),
            hh_api_base: get_env_or("HH_API_BASE", DEFAULT_HH_API_BASE),
            hh_user_agent: get_env_or("HH_USER_AGENT", "applier-backend/0.1 (dev@localhost)"),
            hh_default_resume_id: get_env_opt("HH_DEFAULT_RESUME_ID"),

            gigachat_auth_basic: gigachat_basic_credential()?,
            gigachat_scope: get_env_or("GIGACHAT_SCOPE", "GIGACHAT_API_PERS"),
            gigachat_auth_url: get_env_or("GIGACHAT_AUTH_URL", DEFAULT_GIGACHAT_AUTH_URL),
            gigachat_api_base: get_env_or("GIGACHAT_API_BASE", DEFAULT_GIGACHAT_API_BASE),
            gigachat_model: get_env_or("GIGACHAT_MODEL", "GigaChat"),
        })
    }
}

/// The Basic key is either given as-is or assembled from the client id/secret pair.
fn gigachat_basic_credential() -> Result<String> {
    if let Some(key) = get_env_opt("GIGACHAT_AUTH_BASIC") {
        return Ok(key);
    }
    match (
        get_env_opt("GIGACHAT_CLIENT_ID"),
        get_env_opt("GIGACHAT_CLIENT_SECRET"),
    ) {
        (Some(id), Some(secret)) => Ok(BASE64.encode(format!("{}:{}", id, secret))),
        _ => Err(Error::Config(
            "Missing environment variable: GIGACHAT_AUTH_BASIC (or GIGACHAT_CLIENT_ID and GIGACHAT_CLIENT_SECRET)"
                .to_string(),
        )),
    }
}

fn get_env(name: &str) -> Result<String> {
    get_env_opt(name)
        .ok_or_else(|| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or(name: &str, default: &str) -> String {
    get_env_opt(name).unwrap_or_else(|| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_opt(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(default),
    }
}
