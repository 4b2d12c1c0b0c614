//! Repository traits. Every method commits on its own; nothing here spans a
//! multi-statement transaction.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    api_token::{ApiToken, TokenUpdate},
    application::{Application, ApplicationFilter, ApplicationStatus, NewApplication},
    filter_settings::{FilterSettings, NewFilterSettings},
    log::Log,
    user::User,
    vacancy::{NewVacancy, Vacancy},
};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: Option<String>,
    ) -> Result<User>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Creates a placeholder row for `id` unless one exists.
    async fn ensure_user(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait FilterStore: Send + Sync {
    async fn list_filters(&self, user_id: Uuid) -> Result<Vec<FilterSettings>>;

    async fn save_filter(&self, user_id: Uuid, filter: NewFilterSettings) -> Result<FilterSettings>;
}

#[async_trait]
pub trait VacancyStore: Send + Sync {
    /// Upsert on `(user_id, external_id)`; refreshes `fetched_at`.
    async fn save_vacancy(&self, user_id: Uuid, vacancy: NewVacancy) -> Result<Vacancy>;

    async fn find_vacancy_by_external_id(
        &self,
        user_id: Uuid,
        external_id: &str,
    ) -> Result<Option<Vacancy>>;

    async fn list_vacancies(&self, user_id: Uuid, limit: i64) -> Result<Vec<Vacancy>>;
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn create_application(&self, application: NewApplication) -> Result<Application>;

    async fn get_application(&self, id: Uuid) -> Result<Option<Application>>;

    /// Moves a `pending` application to `status`. Any other transition is a
    /// `Conflict`; an unknown id is `NotFound`.
    async fn update_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Application>;

    async fn list_applications(
        &self,
        user_id: Uuid,
        filter: ApplicationFilter,
    ) -> Result<Vec<Application>>;
}

#[async_trait]
pub trait LogStore: Send + Sync {
    async fn add_log(&self, user_id: Uuid, action: &str, description: &str) -> Result<Log>;

    async fn list_logs(&self, user_id: Uuid, limit: i64) -> Result<Vec<Log>>;
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get_token(&self, user_id: Uuid, service_name: &str) -> Result<Option<ApiToken>>;

    /// Single conditional write keyed on `(user_id, service_name)`.
    async fn upsert_token(
        &self,
        user_id: Uuid,
        service_name: &str,
        update: TokenUpdate,
    ) -> Result<ApiToken>;
}

pub trait Store:
    UserStore + FilterStore + VacancyStore + ApplicationStore + LogStore + TokenStore
{
}

impl<T> Store for T where
    T: UserStore + FilterStore + VacancyStore + ApplicationStore + LogStore + TokenStore
{
}
