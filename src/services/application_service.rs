use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::database::store::Store;
use crate::dto::application_dto::CreateApplicationPayload;
use crate::dto::cover_letter_dto::CoverLetterRequest;
use crate::error::{Error, Result};
use crate::models::{
    application::{Application, ApplicationFilter, ApplicationStatus, NewApplication},
    log::{ACTION_APPLICATION_ERROR, ACTION_APPLICATION_SENT},
    vacancy::Vacancy,
};
use crate::services::{gigachat_service::GigaChatClient, hh_service::HhClient};

/// Outcome of a submission: the final row plus whatever the board answered.
#[derive(Debug, Clone)]
pub struct ApplicationSubmission {
    pub application: Application,
    pub upstream_response: Option<JsonValue>,
}

#[derive(Clone)]
pub struct ApplicationService {
    store: Arc<dyn Store>,
    hh: HhClient,
    gigachat: GigaChatClient,
    default_resume_id: Option<String>,
}

impl ApplicationService {
    pub fn new(
        store: Arc<dyn Store>,
        hh: HhClient,
        gigachat: GigaChatClient,
        default_resume_id: Option<String>,
    ) -> Self {
        Self {
            store,
            hh,
            gigachat,
            default_resume_id,
        }
    }

    /// Creates the application row and, when `send_now` is set, submits it.
    /// The row only ever moves `pending -> sent` or `pending -> error`; a
    /// failed send is recorded and then returned to the caller.
    #[instrument(skip(self, payload), fields(vacancy = %payload.vacancy_id, send_now = payload.send_now))]
    pub async fn submit(
        &self,
        user_id: Uuid,
        payload: CreateApplicationPayload,
    ) -> Result<ApplicationSubmission> {
        let resume_id = if payload.send_now {
            Some(
                payload
                    .resume_id
                    .clone()
                    .or_else(|| self.default_resume_id.clone())
                    .ok_or_else(|| {
                        Error::BadRequest(
                            "resume_id is required when send_now is set".to_string(),
                        )
                    })?,
            )
        } else {
            None
        };

        let vacancy = self.resolve_vacancy(user_id, &payload.vacancy_id).await?;
        let cover_letter = self.cover_letter(user_id, &vacancy, &payload).await?;

        let application = self
            .store
            .create_application(NewApplication {
                user_id,
                vacancy_id: Some(vacancy.id),
                cover_letter: Some(cover_letter.clone()),
            })
            .await?;

        let Some(resume_id) = resume_id else {
            info!(application_id = %application.id, "Application stored as pending");
            return Ok(ApplicationSubmission {
                application,
                upstream_response: None,
            });
        };

        let (application, response) = match self
            .send(user_id, &application, &vacancy, &resume_id, &cover_letter)
            .await
        {
            Ok(sent) => sent,
            Err(err) => {
                warn!(application_id = %application.id, error = %err, "Application submission failed");
                self.record_failure(user_id, &application, &err).await;
                return Err(err);
            }
        };

        // Accepted upstream; the audit write is best effort from here on.
        if let Err(e) = self
            .store
            .add_log(
                user_id,
                ACTION_APPLICATION_SENT,
                &format!(
                    "Application {} for vacancy {} sent: {}",
                    application.id, vacancy.external_id, response
                ),
            )
            .await
        {
            tracing::error!(application_id = %application.id, error = %e, "Failed to write application log");
        }
        info!(application_id = %application.id, "Application sent");
        Ok(ApplicationSubmission {
            application,
            upstream_response: Some(response),
        })
    }

    /// Submits to the board and moves the row to `sent`. Everything that can
    /// fail here happens while the row is still `pending`.
    async fn send(
        &self,
        user_id: Uuid,
        application: &Application,
        vacancy: &Vacancy,
        resume_id: &str,
        cover_letter: &str,
    ) -> Result<(Application, JsonValue)> {
        let response = self
            .hh
            .apply(user_id, &vacancy.external_id, resume_id, cover_letter)
            .await?;
        let application = self
            .store
            .update_application_status(application.id, ApplicationStatus::Sent)
            .await?;
        Ok((application, response))
    }

    /// Best effort: the original failure is what the caller sees.
    async fn record_failure(&self, user_id: Uuid, application: &Application, err: &Error) {
        if let Err(e) = self
            .store
            .update_application_status(application.id, ApplicationStatus::Error)
            .await
        {
            tracing::error!(application_id = %application.id, error = %e, "Failed to mark application as error");
        }
        if let Err(e) = self
            .store
            .add_log(
                user_id,
                ACTION_APPLICATION_ERROR,
                &format!("Application {} failed: {}", application.id, err),
            )
            .await
        {
            tracing::error!(application_id = %application.id, error = %e, "Failed to write application log");
        }
    }

    async fn resolve_vacancy(&self, user_id: Uuid, external_id: &str) -> Result<Vacancy> {
        if let Some(vacancy) = self
            .store
            .find_vacancy_by_external_id(user_id, external_id)
            .await?
        {
            return Ok(vacancy);
        }
        let fetched = self.hh.get_vacancy(user_id, external_id).await?;
        self.store.save_vacancy(user_id, fetched).await
    }

    async fn cover_letter(
        &self,
        user_id: Uuid,
        vacancy: &Vacancy,
        payload: &CreateApplicationPayload,
    ) -> Result<String> {
        if let Some(letter) = payload.cover_letter.as_ref().filter(|l| !l.trim().is_empty()) {
            return Ok(letter.clone());
        }
        let resume_text = payload
            .resume_text
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                Error::BadRequest(
                    "resume_text is required when no cover_letter is supplied".to_string(),
                )
            })?;
        let request = CoverLetterRequest {
            vacancy_description: vacancy.prompt_text(),
            resume_text,
            tone: payload.tone.clone(),
            max_length: None,
        };
        self.gigachat.generate_cover_letter(user_id, &request).await
    }

    pub async fn list(&self, user_id: Uuid, filter: ApplicationFilter) -> Result<Vec<Application>> {
        self.store.list_applications(user_id, filter).await
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Application> {
        self.store
            .get_application(id)
            .await?
            .filter(|a| a.user_id == user_id)
            .ok_or_else(|| Error::NotFound(format!("Application {} not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::Client;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::database::memory::MemoryStore;
    use crate::database::store::{
        ApplicationStore, FilterStore, LogStore, TokenStore, UserStore, VacancyStore,
    };
    use crate::models::{
        api_token::{ApiToken, TokenUpdate},
        filter_settings::{FilterSettings, NewFilterSettings},
        log::Log,
        user::User,
        vacancy::NewVacancy,
    };
    use crate::services::{
        hh_oauth::{HhOAuthProvider, HH_SERVICE},
        token_manager::TokenManager,
    };
    use crate::test_support::test_config;

    /// Memory store whose `application_sent` audit writes fail.
    struct SentLogFails(MemoryStore);

    #[async_trait]
    impl UserStore for SentLogFails {
        async fn create_user(&self, name: &str, email: &str, hash: Option<String>) -> Result<User> {
            self.0.create_user(name, email, hash).await
        }
        async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
            self.0.get_user(id).await
        }
        async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
            self.0.get_user_by_email(email).await
        }
        async fn ensure_user(&self, id: Uuid) -> Result<()> {
            self.0.ensure_user(id).await
        }
    }

    #[async_trait]
    impl FilterStore for SentLogFails {
        async fn list_filters(&self, user_id: Uuid) -> Result<Vec<FilterSettings>> {
            self.0.list_filters(user_id).await
        }
        async fn save_filter(&self, user_id: Uuid, filter: NewFilterSettings) -> Result<FilterSettings> {
            self.0.save_filter(user_id, filter).await
        }
    }

    #[async_trait]
    impl VacancyStore for SentLogFails {
        async fn save_vacancy(&self, user_id: Uuid, vacancy: NewVacancy) -> Result<Vacancy> {
            self.0.save_vacancy(user_id, vacancy).await
        }
        async fn find_vacancy_by_external_id(
            &self,
            user_id: Uuid,
            external_id: &str,
        ) -> Result<Option<Vacancy>> {
            self.0.find_vacancy_by_external_id(user_id, external_id).await
        }
        async fn list_vacancies(&self, user_id: Uuid, limit: i64) -> Result<Vec<Vacancy>> {
            self.0.list_vacancies(user_id, limit).await
        }
    }

    #[async_trait]
    impl ApplicationStore for SentLogFails {
        async fn create_application(&self, application: NewApplication) -> Result<Application> {
            self.0.create_application(application).await
        }
        async fn get_application(&self, id: Uuid) -> Result<Option<Application>> {
            self.0.get_application(id).await
        }
        async fn update_application_status(
            &self,
            id: Uuid,
            status: ApplicationStatus,
        ) -> Result<Application> {
            self.0.update_application_status(id, status).await
        }
        async fn list_applications(
            &self,
            user_id: Uuid,
            filter: ApplicationFilter,
        ) -> Result<Vec<Application>> {
            self.0.list_applications(user_id, filter).await
        }
    }

    #[async_trait]
    impl LogStore for SentLogFails {
        async fn add_log(&self, user_id: Uuid, action: &str, description: &str) -> Result<Log> {
            if action == ACTION_APPLICATION_SENT {
                return Err(Error::Internal("log table unavailable".to_string()));
            }
            self.0.add_log(user_id, action, description).await
        }
        async fn list_logs(&self, user_id: Uuid, limit: i64) -> Result<Vec<Log>> {
            self.0.list_logs(user_id, limit).await
        }
    }

    #[async_trait]
    impl TokenStore for SentLogFails {
        async fn get_token(&self, user_id: Uuid, service_name: &str) -> Result<Option<ApiToken>> {
            self.0.get_token(user_id, service_name).await
        }
        async fn upsert_token(
            &self,
            user_id: Uuid,
            service_name: &str,
            update: TokenUpdate,
        ) -> Result<ApiToken> {
            self.0.upsert_token(user_id, service_name, update).await
        }
    }

    #[tokio::test]
    async fn accepted_application_survives_a_failed_audit_write() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/negotiations"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let config = test_config(&server.uri(), &server.uri());
        let store = Arc::new(SentLogFails(MemoryStore::new()));
        let user_id = Uuid::new_v4();
        store
            .upsert_token(
                user_id,
                HH_SERVICE,
                TokenUpdate {
                    access_token: "hh-access".into(),
                    refresh_token: None,
                    expires_at: None,
                },
            )
            .await
            .unwrap();
        store
            .save_vacancy(
                user_id,
                NewVacancy {
                    external_id: "123".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let client = Client::new();
        let tokens = Arc::new(
            TokenManager::new(store.clone())
                .with_provider(Arc::new(HhOAuthProvider::new(&config, client.clone()))),
        );
        let service = ApplicationService::new(
            store.clone(),
            HhClient::new(&config, client.clone(), tokens.clone()),
            GigaChatClient::new(&config, client, tokens),
            None,
        );

        let submission = service
            .submit(
                user_id,
                CreateApplicationPayload {
                    vacancy_id: "123".into(),
                    resume_id: Some("r-1".into()),
                    resume_text: None,
                    cover_letter: Some("Hello".into()),
                    tone: None,
                    send_now: true,
                },
            )
            .await
            .unwrap();

        assert_eq!(submission.application.status(), Some(ApplicationStatus::Sent));
        assert_eq!(submission.upstream_response, Some(json!(null)));

        let stored = store.get_application(submission.application.id).await.unwrap().unwrap();
        assert_eq!(stored.status(), Some(ApplicationStatus::Sent));
        assert!(store.list_logs(user_id, 10).await.unwrap().is_empty());
    }
}
