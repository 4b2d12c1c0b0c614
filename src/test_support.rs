//! Fixtures shared by the unit and integration tests.

use crate::config::{Config, DEFAULT_HH_AUTHORIZE_URL};

/// Config pointing both providers at local mock servers.
pub fn test_config(hh_base: &str, gigachat_base: &str) -> Config {
    Config {
        server_address: "127.0.0.1:0".to_string(),
        database_url: "postgres://localhost/applier_test".to_string(),
        dev_user_id: None,
        http_timeout_secs: 5,
        llm_timeout_secs: 5,
        hh_client_id: "hh-client".to_string(),
        hh_client_secret: "hh-secret".to_string(),
        hh_redirect_uri: "http://localhost:8000/auth/hh/callback".to_string(),
        hh_authorize_url: DEFAULT_HH_AUTHORIZE_URL.to_string(),
        hh_api_base: hh_base.to_string(),
        hh_user_agent: "applier-tests/1.0".to_string(),
        hh_default_resume_id: None,
        gigachat_auth_basic: "dGVzdDp0ZXN0".to_string(),
        gigachat_scope: "GIGACHAT_API_PERS".to_string(),
        gigachat_auth_url: format!("{}/api/v2/oauth", gigachat_base),
        gigachat_api_base: gigachat_base.to_string(),
        gigachat_model: "GigaChat".to_string(),
    }
}
