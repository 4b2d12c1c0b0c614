#![allow(dead_code)]

use std::sync::Arc;

use applier_backend::{
    build_router,
    config::Config,
    database::{memory::MemoryStore, store::TokenStore},
    models::api_token::TokenUpdate,
    services::token_manager::Clock,
    AppState,
};
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value as JsonValue;
use tower::ServiceExt;
use uuid::Uuid;

pub use applier_backend::test_support::test_config;

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub user_id: Uuid,
}

pub fn spawn_app(config: Config) -> TestApp {
    spawn_app_with_clock(config, chrono::Utc::now)
}

pub fn spawn_app_with_clock(config: Config, clock: Clock) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::with_clock(config, store.clone(), clock).expect("app state");
    TestApp {
        router: build_router(state),
        store,
        user_id: Uuid::new_v4(),
    }
}

impl TestApp {
    pub async fn seed_hh_token(&self) {
        self.store
            .upsert_token(
                self.user_id,
                "hh.ru",
                TokenUpdate {
                    access_token: "hh-access".into(),
                    refresh_token: Some("hh-refresh".into()),
                    expires_at: None,
                },
            )
            .await
            .expect("seed token");
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, JsonValue) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .header("x-user-id", self.user_id.to_string())
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post_json(&self, uri: &str, body: &JsonValue) -> (StatusCode, JsonValue) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-user-id", self.user_id.to_string())
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, JsonValue) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
        (status, body)
    }
}
