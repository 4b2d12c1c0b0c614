pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

#[doc(hidden)]
pub mod test_support;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use reqwest::Client;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::database::store::{Store, TokenStore};
use crate::error::Result;
use crate::middleware::{cors::permissive_cors, identity::resolve_user};
use crate::services::{
    application_service::ApplicationService,
    gigachat_service::{GigaChatAuthProvider, GigaChatClient},
    hh_oauth::HhOAuthProvider,
    hh_service::HhClient,
    token_manager::{Clock, TokenManager},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn Store>,
    pub tokens: Arc<TokenManager>,
    pub hh_oauth: Arc<HhOAuthProvider>,
    pub hh: HhClient,
    pub gigachat: GigaChatClient,
    pub applications: ApplicationService,
}

impl AppState {
    pub fn new<S: Store + 'static>(config: Config, store: Arc<S>) -> Result<Self> {
        Self::with_clock(config, store, crate::utils::time::now)
    }

    /// Same as [`AppState::new`] with the token manager reading time from `clock`.
    pub fn with_clock<S: Store + 'static>(
        config: Config,
        store: Arc<S>,
        clock: Clock,
    ) -> Result<Self> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        let token_store: Arc<dyn TokenStore> = store.clone();
        let store: Arc<dyn Store> = store;

        let hh_oauth = Arc::new(HhOAuthProvider::new(&config, http_client.clone()));
        let gigachat_auth = Arc::new(GigaChatAuthProvider::new(&config, http_client.clone()));
        let tokens = Arc::new(
            TokenManager::new(token_store)
                .with_provider(hh_oauth.clone())
                .with_provider(gigachat_auth)
                .with_clock(clock),
        );

        let hh = HhClient::new(&config, http_client.clone(), tokens.clone());
        let gigachat = GigaChatClient::new(&config, http_client, tokens.clone());
        let applications = ApplicationService::new(
            store.clone(),
            hh.clone(),
            gigachat.clone(),
            config.hh_default_resume_id.clone(),
        );

        Ok(Self {
            config: Arc::new(config),
            store,
            tokens,
            hh_oauth,
            hh,
            gigachat,
            applications,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let user_api = Router::new()
        .route("/auth/:provider/authorize", get(routes::auth::authorize))
        .route("/auth/:provider/callback", get(routes::auth::callback))
        .route("/vacancies/search", post(routes::vacancy::search_vacancies))
        .route(
            "/vacancies",
            get(routes::vacancy::list_vacancies).post(routes::vacancy::save_vacancy),
        )
        .route(
            "/cover-letter/generate",
            post(routes::cover_letter::generate_cover_letter),
        )
        .route(
            "/applications",
            get(routes::application::list_applications)
                .post(routes::application::create_application),
        )
        .route(
            "/applications/:id",
            get(routes::application::get_application),
        )
        .route(
            "/filters",
            get(routes::filter::list_filters).post(routes::filter::save_filter),
        )
        .route("/logs", get(routes::log::list_logs))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            resolve_user,
        ));

    let open_api = Router::new()
        .route("/health", get(routes::health::health))
        .route(
            "/users",
            get(routes::user::find_user_by_email).post(routes::user::create_user),
        )
        .route("/users/:id", get(routes::user::get_user))
        .route("/api-docs/openapi.json", get(routes::openapi::openapi_json));

    open_api
        .merge(user_api)
        .with_state(state)
        .layer(permissive_cors())
        .layer(TraceLayer::new_for_http())
}
